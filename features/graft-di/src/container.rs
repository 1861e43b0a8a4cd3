use std::{
    any::type_name,
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    dependency_list::DependencyList,
    errors::{ProductionError, ResolveError},
    instantiator::Instantiator,
    metadata::TypeMetadata,
    reference::Reference,
    rulebook::Rulebook,
    setter::SetterInjector,
    types::Instance,
};

const DEFAULT_FRAME_BUDGET: usize = 10_000;

/// The resolution engine and sole entry point.
///
/// Holds the rulebook and metadata immutably and the singleton cache behind
/// one mutex, so concurrent first use of a singleton constructs it exactly
/// once. Dependency graphs are walked with an explicit work stack instead of
/// native recursion, so arbitrarily deep graphs cannot overflow the call
/// stack, and every call is bounded by a frame budget that turns a rule set
/// expanding without limit into a deterministic error.
pub struct Container {
    rulebook: Rulebook,
    metadata: Arc<dyn TypeMetadata>,
    state: Mutex<State>,
    frame_budget: usize,
}

#[derive(Default)]
struct State {
    cache: HashMap<String, Instance>,
}

/// One in-flight resolution step on the work stack
struct Frame {
    reference: Reference,
    parent: Option<usize>,
    instantiator: Option<Arc<dyn Instantiator>>,
    setter: Option<SetterInjector>,
    dependencies: Option<DependencyList>,
}

impl Frame {
    fn new(reference: Reference, parent: Option<usize>) -> Self {
        Frame {
            reference,
            parent,
            instantiator: None,
            setter: None,
            dependencies: None,
        }
    }
}

impl Container {
    pub fn new(rulebook: Rulebook, metadata: Arc<dyn TypeMetadata>) -> Self {
        Container {
            rulebook,
            metadata,
            state: Mutex::new(State::default()),
            frame_budget: DEFAULT_FRAME_BUDGET,
        }
    }

    /// Caps the number of frames one `get` call may process
    pub fn with_frame_budget(mut self, frames: usize) -> Self {
        self.frame_budget = frames;
        self
    }

    /// Resolves `reference`, building its whole dependency graph.
    ///
    /// Singletons come from the cache once built; transients are rebuilt on
    /// every call. Any failure aborts the whole call and leaves the cache
    /// untouched by the failing branch.
    pub fn get(&self, reference: &Reference) -> Result<Instance, ResolveError> {
        let mut state = self.lock_state();
        self.resolve(&mut state, reference)
    }

    /// Resolves and downcasts to the expected Rust type
    pub fn get_as<T: Send + Sync + 'static>(
        &self,
        reference: &Reference,
    ) -> Result<Arc<T>, ResolveError> {
        let instance = self.get(reference)?;
        instance
            .downcast::<T>()
            .map_err(|actual| ResolveError::Downcast {
                expected: type_name::<T>(),
                actual: actual.to_string(),
            })
    }

    /// Whether a cached instance, an explicit override, or an automatic
    /// rule path exists for `reference`. Never instantiates anything.
    pub fn has(&self, reference: &Reference) -> bool {
        if self.lock_state().cache.contains_key(reference.id()) {
            return true;
        }
        self.rulebook
            .instantiator_for(reference, self.metadata.as_ref())
            .is_some()
    }

    /// Clears the singleton cache, for test isolation
    pub fn reset(&self) {
        self.lock_state().cache.clear();
        tracing::debug!("Cleared singleton cache");
    }

    pub fn metadata(&self) -> &Arc<dyn TypeMetadata> {
        &self.metadata
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        // The cache is only written after a frame fully succeeds, so the
        // state a panicking thread leaves behind is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The iterative resolution loop.
    ///
    /// Frames reference their parent by stack index. A frame pushes one
    /// child for its next unresolved dependency and is revisited once that
    /// child completed; completed singletons are offered to every frame
    /// still waiting on the same id, transients only to their single parent.
    fn resolve(
        &self,
        state: &mut State,
        requested: &Reference,
    ) -> Result<Instance, ResolveError> {
        if requested.is_singleton() {
            if let Some(cached) = state.cache.get(requested.id()) {
                tracing::trace!("Cache hit for {}", requested.id());
                return Ok(cached.clone());
            }
        }

        let meta = self.metadata.as_ref();
        let mut stack = vec![Frame::new(requested.clone(), None)];
        let mut in_progress: HashSet<String> = HashSet::new();
        in_progress.insert(requested.id().to_string());
        let mut frames_processed = 0usize;

        while !stack.is_empty() {
            let top = stack.len() - 1;
            frames_processed += 1;
            if frames_processed > self.frame_budget {
                return Err(ResolveError::FrameBudgetExceeded {
                    limit: self.frame_budget,
                    chain: chain_of(&stack, top),
                });
            }

            // Singleton already built by an earlier frame of this pass
            if stack[top].reference.is_singleton() {
                if let Some(cached) = state.cache.get(stack[top].reference.id()) {
                    let instance = cached.clone();
                    if let Some(result) =
                        self.complete(&mut stack, &mut in_progress, state, instance, false)
                    {
                        return Ok(result);
                    }
                    continue;
                }
            }

            // First visit: look up the instantiator, the setter, and the
            // combined dependency list
            if stack[top].instantiator.is_none() {
                let reference = stack[top].reference.clone();
                let Some(instantiator) = self.rulebook.instantiator_for(&reference, meta) else {
                    tracing::debug!("No rule can produce {}", reference.id());
                    return Err(ResolveError::Unresolvable {
                        reference: reference.id().to_string(),
                        chain: chain_of(&stack, top),
                    });
                };
                let setter = self.rulebook.setter_for(&reference, meta);
                let mut dependencies =
                    instantiator
                        .dependency_list(meta)
                        .map_err(|source| ResolveError::Production {
                            reference: reference.id().to_string(),
                            chain: chain_of(&stack, top),
                            source,
                        })?;
                if let Some(setter) = &setter {
                    setter.list_references(reference.class(), meta, &mut dependencies);
                }
                let frame = &mut stack[top];
                frame.instantiator = Some(instantiator);
                frame.setter = setter;
                frame.dependencies = Some(dependencies);
            }

            // Push a child frame for the next unresolved dependency. One at
            // a time keeps the stack a pure ancestor path, so the
            // in-progress set detects real cycles and never a sibling.
            let next_child = stack[top]
                .dependencies
                .as_ref()
                .and_then(|list| list.unresolved().next().cloned());
            if let Some(child) = next_child {
                if in_progress.contains(child.id()) {
                    let mut chain = chain_of(&stack, top);
                    chain.push(child.id().to_string());
                    return Err(ResolveError::Circular { chain });
                }
                in_progress.insert(child.id().to_string());
                stack.push(Frame::new(child, Some(top)));
                continue;
            }

            // All dependencies fulfilled: produce, run setters, cache
            let frame = &stack[top];
            let reference = frame.reference.clone();
            let dependencies = frame
                .dependencies
                .as_ref()
                .ok_or_else(|| ResolveError::Production {
                    reference: reference.id().to_string(),
                    chain: chain_of(&stack, top),
                    source: ProductionError::List(crate::errors::ListError::NotYetResolved(
                        reference.id().to_string(),
                    )),
                })?;
            let instantiator = frame.instantiator.as_ref().ok_or_else(|| {
                ResolveError::Unresolvable {
                    reference: reference.id().to_string(),
                    chain: chain_of(&stack, top),
                }
            })?;

            let instance = instantiator
                .produce(dependencies, meta)
                .map_err(|source| ResolveError::Production {
                    reference: reference.id().to_string(),
                    chain: chain_of(&stack, top),
                    source,
                })?;
            if let Some(setter) = &frame.setter {
                setter
                    .inject(&instance, dependencies, meta)
                    .map_err(|source| ResolveError::Setter {
                        reference: reference.id().to_string(),
                        chain: chain_of(&stack, top),
                        source,
                    })?;
            }
            tracing::debug!("Produced {} as {}", reference.id(), instance.class());

            if let Some(result) =
                self.complete(&mut stack, &mut in_progress, state, instance, true)
            {
                return Ok(result);
            }
        }

        // The loop only exits by completing the bottom frame
        Err(ResolveError::Unresolvable {
            reference: requested.id().to_string(),
            chain: vec![requested.id().to_string()],
        })
    }

    /// Pops the top frame and hands its instance to the waiting frames.
    ///
    /// Returns the instance when the popped frame was the bottom one, which
    /// ends the resolution pass.
    fn complete(
        &self,
        stack: &mut Vec<Frame>,
        in_progress: &mut HashSet<String>,
        state: &mut State,
        instance: Instance,
        produced: bool,
    ) -> Option<Instance> {
        let frame = stack.pop()?;
        in_progress.remove(frame.reference.id());

        if produced && frame.reference.is_singleton() {
            state
                .cache
                .insert(frame.reference.id().to_string(), instance.clone());
        }

        let Some(parent) = frame.parent else {
            return Some(instance);
        };

        if frame.reference.is_singleton() {
            // Offer the result to every frame waiting on this id
            for waiting in stack.iter_mut() {
                if let Some(list) = waiting.dependencies.as_mut() {
                    list.fill(frame.reference.id(), &instance);
                }
            }
        } else if let Some(list) = stack[parent].dependencies.as_mut() {
            // A transient is handed only to its single dependent
            list.fill(frame.reference.id(), &instance);
        }
        None
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.lock_state().cache.len();
        f.debug_struct("Container")
            .field("cached_singletons", &cached)
            .field("frame_budget", &self.frame_budget)
            .finish()
    }
}

/// The reference-id chain from the bottom frame to `top`, following parent
/// links
fn chain_of(stack: &[Frame], top: usize) -> Vec<String> {
    let mut chain = Vec::new();
    let mut cursor = Some(top);
    while let Some(index) = cursor {
        chain.push(stack[index].reference.id().to_string());
        cursor = stack[index].parent;
    }
    chain.reverse();
    chain
}
