use std::collections::BTreeMap;

use crate::{
    dependency_list::DependencyList,
    errors::ProductionError,
    instantiator::{
        check_return_type, collect_arguments, list_configured_references,
        list_parameter_references, Argument, Instantiator,
    },
    metadata::TypeMetadata,
    reference::Reference,
    types::Instance,
};

/// Produces the target by calling a method on another resolved instance.
///
/// The provider reference is resolved like any other dependency; the method
/// is looked up on the provider's concrete class, so a provider declared as
/// an interface still dispatches to its implementation's metadata. The
/// returned value must be assignable to the target's declared class.
pub struct ProviderInstantiator {
    target: Reference,
    provider: Reference,
    method: String,
    arguments: BTreeMap<String, Argument>,
}

impl ProviderInstantiator {
    pub fn new(target: Reference, provider: Reference, method: impl Into<String>) -> Self {
        ProviderInstantiator {
            target,
            provider,
            method: method.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, parameter: impl Into<String>, argument: Argument) -> Self {
        self.arguments.insert(parameter.into(), argument);
        self
    }

    pub fn with_value<T: Send + Sync + 'static>(
        self,
        parameter: impl Into<String>,
        value: T,
    ) -> Self {
        self.with_argument(parameter, Argument::value(value))
    }

    pub fn with_reference(self, parameter: impl Into<String>, reference: Reference) -> Self {
        self.with_argument(parameter, Argument::reference(reference))
    }

    pub fn provider(&self) -> &Reference {
        &self.provider
    }
}

impl Instantiator for ProviderInstantiator {
    fn target(&self) -> &Reference {
        &self.target
    }

    fn dependency_list(
        &self,
        meta: &dyn TypeMetadata,
    ) -> Result<DependencyList, ProductionError> {
        let mut list = DependencyList::new();
        list.add(self.provider.clone());
        // Parameter synthesis needs the method's signature. The declared
        // provider class carries it in the common case; when the method only
        // exists on the concrete class resolved later, the configured
        // reference arguments are all that can be listed up front.
        match meta
            .class(self.provider.class())
            .and_then(|spec| spec.method(&self.method))
        {
            Some(method) => {
                list_parameter_references(method.params(), &self.arguments, &mut list)
            }
            None => list_configured_references(self.arguments.values(), &mut list),
        }
        Ok(list)
    }

    fn produce(
        &self,
        dependencies: &DependencyList,
        meta: &dyn TypeMetadata,
    ) -> Result<Instance, ProductionError> {
        let provider = dependencies.resolved(self.provider.id())?;
        let method = meta
            .class(provider.class())
            .and_then(|spec| spec.method(&self.method))
            .ok_or_else(|| ProductionError::ProviderMethodNotFound {
                class: provider.class().to_string(),
                method: self.method.clone(),
            })?;
        let values = collect_arguments(
            provider.class(),
            method.params(),
            &self.arguments,
            dependencies,
        )?;
        let returned = method
            .call(provider.value(), values)
            .map_err(ProductionError::User)?
            .ok_or_else(|| ProductionError::WrongReturnType {
                expected: self.target.class().to_string(),
                actual: "nothing".to_string(),
            })?;
        check_return_type(self.target.class(), &returned, meta)
    }
}
