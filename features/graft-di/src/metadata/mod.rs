//! Class metadata, the engine's substitute for runtime reflection.
//!
//! Rust has no reflection to inspect constructors with, so every class the
//! engine can build is described up front: its constructor parameters, its
//! public methods, and its place in the class hierarchy. The [`TypeMetadata`]
//! trait is the capability the rulebook and the instantiators consume;
//! [`MetadataRegistry`] is the builder-populated implementation.

use std::{
    any::TypeId,
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use crate::types::{DynError, Object};

mod registry;

pub use registry::MetadataRegistry;

/// Constructor closure, called with positional values in declaration order
pub type ConstructFn = Arc<dyn Fn(Vec<Object>) -> Result<Object, DynError> + Send + Sync>;

/// Method closure, called with the receiver and positional values.
///
/// Returning `None` marks a method without a return value, which is fine
/// for setters but fails a provider's return-type check.
pub type InvokeFn = Arc<dyn Fn(&Object, Vec<Object>) -> Result<Option<Object>, DynError> + Send + Sync>;

/// What kind of type a class entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

/// One declared parameter of a constructor or method
#[derive(Clone)]
pub struct ParamSpec {
    name: String,
    class: Option<String>,
    default: Option<Object>,
}

impl ParamSpec {
    /// A parameter without a class type hint
    pub fn untyped(name: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            class: None,
            default: None,
        }
    }

    /// A parameter declared with a class type
    pub fn typed(name: impl Into<String>, class: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            class: Some(class.into()),
            default: None,
        }
    }

    pub fn with_default<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.default = Some(Arc::new(value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared class type, if any
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn default(&self) -> Option<&Object> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// A class's constructor: its parameter list plus the closure that builds it
#[derive(Clone)]
pub struct ConstructorSpec {
    params: Vec<ParamSpec>,
    construct: ConstructFn,
}

impl ConstructorSpec {
    pub fn new(
        params: impl IntoIterator<Item = ParamSpec>,
        construct: impl Fn(Vec<Object>) -> Result<Object, DynError> + Send + Sync + 'static,
    ) -> Self {
        ConstructorSpec {
            params: params.into_iter().collect(),
            construct: Arc::new(construct),
        }
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn call(&self, values: Vec<Object>) -> Result<Object, DynError> {
        (self.construct)(values)
    }
}

/// A public method: parameter list plus the closure that invokes it
#[derive(Clone)]
pub struct MethodSpec {
    name: String,
    params: Vec<ParamSpec>,
    invoke: InvokeFn,
}

impl MethodSpec {
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        invoke: impl Fn(&Object, Vec<Object>) -> Result<Option<Object>, DynError> + Send + Sync + 'static,
    ) -> Self {
        MethodSpec {
            name: name.into(),
            params: params.into_iter().collect(),
            invoke: Arc::new(invoke),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn call(&self, receiver: &Object, values: Vec<Object>) -> Result<Option<Object>, DynError> {
        (self.invoke)(receiver, values)
    }
}

/// Everything the engine knows about one class
#[derive(Clone)]
pub struct ClassSpec {
    name: String,
    kind: ClassKind,
    parent: Option<String>,
    interfaces: Vec<String>,
    constructor: Option<ConstructorSpec>,
    methods: BTreeMap<String, MethodSpec>,
    type_id: Option<TypeId>,
}

impl ClassSpec {
    /// A concrete class backed by the Rust type `T`
    pub fn of<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
        ClassSpec {
            name: name.into(),
            kind: ClassKind::Concrete,
            parent: None,
            interfaces: Vec::new(),
            constructor: None,
            methods: BTreeMap::new(),
            type_id: Some(TypeId::of::<T>()),
        }
    }

    /// An interface, never instantiable on its own
    pub fn interface(name: impl Into<String>) -> Self {
        ClassSpec {
            name: name.into(),
            kind: ClassKind::Interface,
            parent: None,
            interfaces: Vec::new(),
            constructor: None,
            methods: BTreeMap::new(),
            type_id: None,
        }
    }

    /// An abstract class, only usable as an ancestor
    pub fn abstract_class(name: impl Into<String>) -> Self {
        ClassSpec {
            name: name.into(),
            kind: ClassKind::Abstract,
            parent: None,
            interfaces: Vec::new(),
            constructor: None,
            methods: BTreeMap::new(),
            type_id: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_constructor(
        mut self,
        params: impl IntoIterator<Item = ParamSpec>,
        construct: impl Fn(Vec<Object>) -> Result<Object, DynError> + Send + Sync + 'static,
    ) -> Self {
        self.constructor = Some(ConstructorSpec::new(params, construct));
        self
    }

    pub fn with_method(mut self, method: MethodSpec) -> Self {
        self.methods.insert(method.name().to_string(), method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == ClassKind::Abstract
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(String::as_str)
    }

    pub fn constructor(&self) -> Option<&ConstructorSpec> {
        self.constructor.as_ref()
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }
}

/// Read-only view of the class metadata the engine resolves against
pub trait TypeMetadata: Send + Sync {
    fn class(&self, name: &str) -> Option<&ClassSpec>;

    /// Reverse lookup from a concrete Rust type to its registered class name
    fn class_name_of(&self, type_id: TypeId) -> Option<&str>;

    /// Whether `class` is `ancestor` or transitively extends/implements it
    fn is_assignable(&self, class: &str, ancestor: &str) -> bool {
        if class == ancestor {
            return true;
        }
        let mut seen = HashSet::new();
        let mut queue = vec![class.to_string()];
        while let Some(current) = queue.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(spec) = self.class(&current) else {
                continue;
            };
            for next in spec.parent().into_iter().chain(spec.interfaces()) {
                if next == ancestor {
                    return true;
                }
                queue.push(next.to_string());
            }
        }
        false
    }
}

/// Downcasts one positional argument inside a constructor or method closure
pub fn arg<T: Send + Sync + 'static>(values: &[Object], index: usize) -> Result<Arc<T>, DynError> {
    let object = values
        .get(index)
        .ok_or_else(|| format!("missing argument {index}"))?;
    Arc::downcast::<T>(object.clone()).map_err(|_| {
        format!(
            "argument {index} is not a {}",
            std::any::type_name::<T>()
        )
        .into()
    })
}

/// Like [`arg`], but clones the value out of its shared wrapper
pub fn arg_value<T: Clone + Send + Sync + 'static>(
    values: &[Object],
    index: usize,
) -> Result<T, DynError> {
    Ok(arg::<T>(values, index)?.as_ref().clone())
}

/// Downcasts the receiver inside a method closure
pub fn receiver<T: Send + Sync + 'static>(object: &Object) -> Result<Arc<T>, DynError> {
    Arc::downcast::<T>(object.clone())
        .map_err(|_| format!("receiver is not a {}", std::any::type_name::<T>()).into())
}
