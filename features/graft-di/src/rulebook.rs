use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    sync::Arc,
};

use crate::{
    context::Context,
    errors::ConfigError,
    instantiator::{Argument, ConstructorInstantiator, Instantiator, PointerInstantiator},
    metadata::TypeMetadata,
    reference::Reference,
    setter::{SetterCall, SetterInjector},
};

/// An automatic default for one constructor parameter, scoped by a context
struct AutoRule {
    context: Context,
    variable: String,
    argument: Argument,
}

/// A contextual post-construction call
struct SetterRule {
    context: Context,
    method: String,
    arguments: BTreeMap<String, Argument>,
}

/// Layered rule table the container consults for every reference.
///
/// Explicit overrides registered for an exact reference id always win.
/// Without one, an instantiator is assembled automatically from the target
/// class's constructor metadata plus the most specific matching automatic
/// rule per parameter. Lookups never instantiate anything and have no side
/// effects.
#[derive(Default)]
pub struct Rulebook {
    overrides: HashMap<String, Arc<dyn Instantiator>>,
    /// Target ids claimed by pointers; pointers take precedence over every
    /// other override kind
    pointers: HashMap<String, String>,
    setter_overrides: HashMap<String, SetterInjector>,
    auto_rules: Vec<AutoRule>,
    setter_rules: Vec<SetterRule>,
}

impl fmt::Debug for Rulebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rulebook")
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field("pointers", &self.pointers)
            .field(
                "setter_overrides",
                &self.setter_overrides.keys().collect::<Vec<_>>(),
            )
            .field("auto_rules", &self.auto_rules.len())
            .field("setter_rules", &self.setter_rules.len())
            .finish()
    }
}

impl Rulebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an explicit instantiator for its target reference.
    ///
    /// Re-registering replaces the previous entry, except where a pointer
    /// already claims the id. Pointers go through
    /// [`register_pointer`](Rulebook::register_pointer).
    pub fn register<I: Instantiator + 'static>(
        &mut self,
        instantiator: I,
    ) -> Result<&mut Self, ConfigError> {
        self.register_shared(Arc::new(instantiator))
    }

    pub fn register_shared(
        &mut self,
        instantiator: Arc<dyn Instantiator>,
    ) -> Result<&mut Self, ConfigError> {
        let id = instantiator.target().id().to_string();
        if self.pointers.contains_key(&id) {
            return Err(ConfigError::PointerShadowed { id });
        }
        tracing::debug!("Registered instantiator for {}", id);
        self.overrides.insert(id, instantiator);
        Ok(self)
    }

    /// Registers a pointer, replacing any previous override for the target.
    ///
    /// The whole pointer chain is walked here so loops fail at registration
    /// time instead of looping the resolver.
    pub fn register_pointer(
        &mut self,
        pointer: PointerInstantiator,
    ) -> Result<&mut Self, ConfigError> {
        let start = pointer.target().id().to_string();
        let mut chain = vec![start.clone()];
        let mut current = pointer.pointed().id().to_string();
        loop {
            chain.push(current.clone());
            if current == start {
                return Err(ConfigError::PointerCycle { chain });
            }
            match self.pointers.get(&current) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }
        if self.overrides.contains_key(&start) && !self.pointers.contains_key(&start) {
            tracing::warn!("Pointer for {} replaces an existing override", start);
        }
        self.pointers
            .insert(start.clone(), pointer.pointed().id().to_string());
        self.overrides.insert(start, Arc::new(pointer));
        Ok(self)
    }

    pub fn register_setter(
        &mut self,
        reference: &Reference,
        setter: SetterInjector,
    ) -> &mut Self {
        self.setter_overrides
            .insert(reference.id().to_string(), setter);
        self
    }

    /// Adds an automatic default for every constructor parameter named
    /// `variable` on references the context matches
    pub fn add_rule(
        &mut self,
        context: Context,
        variable: impl Into<String>,
        argument: Argument,
    ) -> &mut Self {
        self.auto_rules.push(AutoRule {
            context,
            variable: variable.into(),
            argument,
        });
        self
    }

    /// Adds a contextual post-construction call
    pub fn add_setter_rule(
        &mut self,
        context: Context,
        method: impl Into<String>,
        arguments: impl IntoIterator<Item = (String, Argument)>,
    ) -> &mut Self {
        self.setter_rules.push(SetterRule {
            context,
            method: method.into(),
            arguments: arguments.into_iter().collect(),
        });
        self
    }

    /// The instantiator to use for `reference`, or `None` when neither an
    /// override nor automatic construction can produce it
    pub fn instantiator_for(
        &self,
        reference: &Reference,
        meta: &dyn TypeMetadata,
    ) -> Option<Arc<dyn Instantiator>> {
        if let Some(explicit) = self.overrides.get(reference.id()) {
            return Some(explicit.clone());
        }
        self.automatic_for(reference, meta)
    }

    /// Assembles a constructor instantiator from class metadata and the
    /// matching automatic rules. Deterministic and side-effect-free.
    fn automatic_for(
        &self,
        reference: &Reference,
        meta: &dyn TypeMetadata,
    ) -> Option<Arc<dyn Instantiator>> {
        let spec = meta.class(reference.class())?;
        if spec.is_interface() || spec.is_abstract() {
            tracing::debug!(
                "{} is not instantiable, no automatic rule applies",
                reference.class()
            );
            return None;
        }
        let constructor = spec.constructor()?;

        let mut instantiator = ConstructorInstantiator::new(reference.clone());
        for param in constructor.params() {
            if let Some(argument) = self.best_rule(reference, param.name(), meta) {
                instantiator = instantiator.with_argument(param.name(), argument.clone());
            } else if param.has_default() || param.class().is_some() {
                // the declared default applies, or the container resolves a
                // synthesized reference for the class-typed parameter
            } else {
                tracing::debug!(
                    "No rule, default, or type hint for parameter {} of {}",
                    param.name(),
                    reference.class()
                );
                return None;
            }
        }
        Some(Arc::new(instantiator))
    }

    /// The most specific automatic rule for `(reference, variable)`.
    ///
    /// Ties in specificity resolve to the most recently registered rule.
    fn best_rule(
        &self,
        reference: &Reference,
        variable: &str,
        meta: &dyn TypeMetadata,
    ) -> Option<&Argument> {
        self.auto_rules
            .iter()
            .filter(|rule| rule.variable == variable && rule.context.matches(reference, meta))
            .max_by(|a, b| a.context.compare_specificity(&b.context))
            .map(|rule| &rule.argument)
    }

    /// The setter injector to run for `reference`, if any.
    ///
    /// An explicit setter registration wins outright. Otherwise the
    /// contextual entries are grouped per method name, the most specific
    /// matching entry per method wins, and the winning calls run in
    /// registration order.
    pub fn setter_for(
        &self,
        reference: &Reference,
        meta: &dyn TypeMetadata,
    ) -> Option<SetterInjector> {
        if let Some(explicit) = self.setter_overrides.get(reference.id()) {
            return Some(explicit.clone());
        }

        let mut winners: HashMap<&str, (usize, &SetterRule)> = HashMap::new();
        for (index, rule) in self.setter_rules.iter().enumerate() {
            if !rule.context.matches(reference, meta) {
                continue;
            }
            match winners.get(rule.method.as_str()) {
                Some((_, current))
                    if rule.context.compare_specificity(&current.context).is_lt() => {}
                _ => {
                    winners.insert(rule.method.as_str(), (index, rule));
                }
            }
        }
        if winners.is_empty() {
            return None;
        }

        let mut ordered: Vec<(usize, &SetterRule)> = winners.into_values().collect();
        ordered.sort_by_key(|(index, _)| *index);

        let mut injector = SetterInjector::new();
        for (_, rule) in ordered {
            let mut call = SetterCall::new(rule.method.clone());
            for (parameter, argument) in &rule.arguments {
                call = call.with_argument(parameter.clone(), argument.clone());
            }
            injector = injector.with_call(call);
        }
        Some(injector)
    }

    /// Ids with explicit overrides, used by diagnostics
    pub fn override_ids(&self) -> impl Iterator<Item = &str> {
        self.overrides.keys().map(String::as_str)
    }

    /// Ids reachable by following pointers from `id`, excluding `id` itself
    pub fn pointer_chain(&self, id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = id.to_string();
        while let Some(next) = self.pointers.get(&current) {
            if !seen.insert(next.clone()) {
                break;
            }
            chain.push(next.clone());
            current = next.clone();
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dependency_list::DependencyList,
        metadata::{arg_value, ClassSpec, MetadataRegistry, ParamSpec},
    };

    struct Flag {
        mode: String,
    }

    fn meta() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .register(
                ClassSpec::of::<Flag>("app::Flag").with_constructor(
                    [ParamSpec::untyped("mode")],
                    |values| {
                        Ok(Arc::new(Flag {
                            mode: arg_value::<String>(&values, 0)?,
                        }))
                    },
                ),
            )
            .unwrap();
        registry
            .register(ClassSpec::interface("app::Port"))
            .unwrap();
        registry
    }

    fn produced_mode(rulebook: &Rulebook, meta: &MetadataRegistry) -> String {
        let reference = Reference::new("app::Flag");
        let instantiator = rulebook.instantiator_for(&reference, meta).unwrap();
        let instance = instantiator
            .produce(&DependencyList::new(), meta)
            .unwrap();
        instance.downcast::<Flag>().unwrap().mode.clone()
    }

    #[test]
    fn the_most_specific_rule_wins_regardless_of_registration_order() {
        let meta = meta();

        let mut general_first = Rulebook::new();
        general_first
            .add_rule(Context::wildcard(), "mode", Argument::value("general".to_string()))
            .add_rule(
                Context::class("app::Flag"),
                "mode",
                Argument::value("specific".to_string()),
            );
        assert_eq!(produced_mode(&general_first, &meta), "specific");

        let mut specific_first = Rulebook::new();
        specific_first
            .add_rule(
                Context::class("app::Flag"),
                "mode",
                Argument::value("specific".to_string()),
            )
            .add_rule(Context::wildcard(), "mode", Argument::value("general".to_string()));
        assert_eq!(produced_mode(&specific_first, &meta), "specific");
    }

    #[test]
    fn equal_specificity_resolves_to_the_latest_registration() {
        let meta = meta();
        let mut rulebook = Rulebook::new();
        rulebook
            .add_rule(Context::wildcard(), "mode", Argument::value("first".to_string()))
            .add_rule(Context::wildcard(), "mode", Argument::value("second".to_string()));
        assert_eq!(produced_mode(&rulebook, &meta), "second");
    }

    #[test]
    fn explicit_overrides_beat_automatic_rules() {
        let meta = meta();
        let mut rulebook = Rulebook::new();
        rulebook
            .add_rule(Context::wildcard(), "mode", Argument::value("auto".to_string()))
            .register(
                ConstructorInstantiator::new(Reference::new("app::Flag"))
                    .with_value("mode", "explicit".to_string()),
            )
            .unwrap();
        assert_eq!(produced_mode(&rulebook, &meta), "explicit");
    }

    #[test]
    fn unsatisfiable_parameters_yield_no_instantiator() {
        let meta = meta();
        let rulebook = Rulebook::new();
        assert!(rulebook
            .instantiator_for(&Reference::new("app::Flag"), &meta)
            .is_none());
    }

    #[test]
    fn interfaces_are_never_constructed_automatically() {
        let meta = meta();
        let rulebook = Rulebook::new();
        assert!(rulebook
            .instantiator_for(&Reference::new("app::Port"), &meta)
            .is_none());
    }

    #[test]
    fn pointer_cycles_fail_at_registration() {
        let a = Reference::new("app::A");
        let b = Reference::new("app::B");
        let c = Reference::new("app::C");

        let mut rulebook = Rulebook::new();
        rulebook
            .register_pointer(PointerInstantiator::new(a.clone(), b.clone()).unwrap())
            .unwrap();
        rulebook
            .register_pointer(PointerInstantiator::new(b.clone(), c.clone()).unwrap())
            .unwrap();
        let err = rulebook
            .register_pointer(PointerInstantiator::new(c.clone(), a.clone()).unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::PointerCycle { chain } if chain.len() == 4));
    }

    #[test]
    fn pointers_shadow_later_overrides() {
        let target = Reference::new("app::Flag");
        let mut rulebook = Rulebook::new();
        rulebook
            .register_pointer(
                PointerInstantiator::new(target.clone(), Reference::new("app::Other")).unwrap(),
            )
            .unwrap();
        let err = rulebook
            .register(ConstructorInstantiator::new(target))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PointerShadowed { .. }));
    }
}
