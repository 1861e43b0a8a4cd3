//! Production strategies.
//!
//! An [`Instantiator`] turns a fulfilled [`DependencyList`] into one
//! instance. Four strategies exist: calling the target's constructor,
//! calling a method on another resolved instance, calling a user closure,
//! and aliasing another reference.

use std::{any::Any, collections::BTreeMap, fmt, sync::Arc};

use crate::{
    dependency_list::DependencyList,
    errors::ProductionError,
    metadata::{ParamSpec, TypeMetadata},
    reference::Reference,
    types::{Instance, Object},
};

mod callback;
mod constructor;
mod pointer;
mod provider;

pub use callback::CallbackInstantiator;
pub use constructor::ConstructorInstantiator;
pub use pointer::PointerInstantiator;
pub use provider::ProviderInstantiator;

/// A configured value for one parameter, either a literal or a reference
/// the container resolves first
#[derive(Clone)]
pub enum Argument {
    Value(Object),
    Ref(Reference),
}

impl Argument {
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Argument::Value(Arc::new(value))
    }

    pub fn reference(reference: Reference) -> Self {
        Argument::Ref(reference)
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(_) => f.write_str("Argument::Value"),
            Argument::Ref(reference) => f.debug_tuple("Argument::Ref").field(reference).finish(),
        }
    }
}

/// Produces one instance from its resolved dependencies
pub trait Instantiator: Send + Sync {
    fn target(&self) -> &Reference;

    /// Every reference this step needs resolved first, including references
    /// synthesized for unconfigured class-typed parameters
    fn dependency_list(&self, meta: &dyn TypeMetadata)
        -> Result<DependencyList, ProductionError>;

    fn produce(
        &self,
        dependencies: &DependencyList,
        meta: &dyn TypeMetadata,
    ) -> Result<Instance, ProductionError>;
}

/// Adds every reference a parameter list needs to `list`: configured
/// reference arguments plus a synthesized unnamed singleton reference for
/// each unconfigured class-typed parameter without a default.
pub(crate) fn list_parameter_references(
    params: &[ParamSpec],
    named: &BTreeMap<String, Argument>,
    list: &mut DependencyList,
) {
    for param in params {
        match named.get(param.name()) {
            Some(Argument::Ref(reference)) => list.add(reference.clone()),
            Some(Argument::Value(_)) => {}
            None => {
                if !param.has_default() {
                    if let Some(class) = param.class() {
                        list.add(Reference::new(class));
                    }
                }
            }
        }
    }
}

/// Fallback when no parameter metadata is available yet: only the
/// configured reference arguments can be listed.
pub(crate) fn list_configured_references(
    arguments: impl IntoIterator<Item = impl std::borrow::Borrow<Argument>>,
    list: &mut DependencyList,
) {
    for argument in arguments {
        if let Argument::Ref(reference) = argument.borrow() {
            list.add(reference.clone());
        }
    }
}

/// Collects positional values for `params` in declaration order.
///
/// Per parameter: the configured argument wins, then the declared default,
/// then the synthesized reference resolved by the container; anything else
/// is a missing argument.
pub(crate) fn collect_arguments(
    class: &str,
    params: &[ParamSpec],
    named: &BTreeMap<String, Argument>,
    dependencies: &DependencyList,
) -> Result<Vec<Object>, ProductionError> {
    params
        .iter()
        .map(|param| match named.get(param.name()) {
            Some(Argument::Value(value)) => Ok(value.clone()),
            Some(Argument::Ref(reference)) => {
                Ok(dependencies.resolved(reference.id())?.value().clone())
            }
            None => {
                if let Some(default) = param.default() {
                    return Ok(default.clone());
                }
                if let Some(class_name) = param.class() {
                    let synthesized = Reference::new(class_name);
                    return Ok(dependencies.resolved(synthesized.id())?.value().clone());
                }
                Err(ProductionError::MissingArgument {
                    class: class.to_string(),
                    parameter: param.name().to_string(),
                })
            }
        })
        .collect()
}

/// Checks a provider or callback result against the target's declared
/// class and tags it with its concrete class name
pub(crate) fn check_return_type(
    target_class: &str,
    value: &Object,
    meta: &dyn TypeMetadata,
) -> Result<Instance, ProductionError> {
    let type_id = Any::type_id(value.as_ref());
    match meta.class_name_of(type_id) {
        Some(actual) if meta.is_assignable(actual, target_class) => {
            Ok(Instance::new(actual, value.clone()))
        }
        Some(actual) => Err(ProductionError::WrongReturnType {
            expected: target_class.to_string(),
            actual: actual.to_string(),
        }),
        None => Err(ProductionError::WrongReturnType {
            expected: target_class.to_string(),
            actual: "<unregistered type>".to_string(),
        }),
    }
}
