use std::sync::Arc;

use crate::{
    dependency_list::DependencyList,
    errors::ProductionError,
    instantiator::{check_return_type, list_configured_references, Argument, Instantiator},
    metadata::TypeMetadata,
    reference::Reference,
    types::{DynError, Instance, Object},
};

/// The user closure a [`CallbackInstantiator`] invokes
pub type Callback = Arc<dyn Fn(Vec<Object>) -> Result<Object, DynError> + Send + Sync>;

/// Produces the target by calling an arbitrary user closure.
///
/// Arguments are positional; reference arguments are substituted with their
/// resolved values before the call. The returned value must be assignable
/// to the target's declared class.
pub struct CallbackInstantiator {
    target: Reference,
    callback: Callback,
    arguments: Vec<Argument>,
}

impl CallbackInstantiator {
    pub fn new(
        target: Reference,
        callback: impl Fn(Vec<Object>) -> Result<Object, DynError> + Send + Sync + 'static,
    ) -> Self {
        CallbackInstantiator {
            target,
            callback: Arc::new(callback),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_value<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.with_argument(Argument::value(value))
    }

    pub fn with_reference(self, reference: Reference) -> Self {
        self.with_argument(Argument::reference(reference))
    }
}

impl Instantiator for CallbackInstantiator {
    fn target(&self) -> &Reference {
        &self.target
    }

    fn dependency_list(
        &self,
        _meta: &dyn TypeMetadata,
    ) -> Result<DependencyList, ProductionError> {
        let mut list = DependencyList::new();
        list_configured_references(&self.arguments, &mut list);
        Ok(list)
    }

    fn produce(
        &self,
        dependencies: &DependencyList,
        meta: &dyn TypeMetadata,
    ) -> Result<Instance, ProductionError> {
        let values = self
            .arguments
            .iter()
            .map(|argument| match argument {
                Argument::Value(value) => Ok(value.clone()),
                Argument::Ref(reference) => {
                    Ok(dependencies.resolved(reference.id())?.value().clone())
                }
            })
            .collect::<Result<Vec<_>, ProductionError>>()?;
        let returned = (self.callback)(values).map_err(ProductionError::User)?;
        check_return_type(self.target.class(), &returned, meta)
    }
}
