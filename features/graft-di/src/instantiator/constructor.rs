use std::collections::BTreeMap;

use crate::{
    dependency_list::DependencyList,
    errors::ProductionError,
    instantiator::{collect_arguments, list_parameter_references, Argument, Instantiator},
    metadata::{ConstructorSpec, TypeMetadata},
    reference::Reference,
    types::Instance,
};

/// Produces the target by calling its own constructor.
///
/// Arguments are configured by parameter name; anything left unconfigured
/// falls back to the parameter's declared default or, for class-typed
/// parameters, to a synthesized reference the container resolves.
pub struct ConstructorInstantiator {
    target: Reference,
    arguments: BTreeMap<String, Argument>,
}

impl ConstructorInstantiator {
    pub fn new(target: Reference) -> Self {
        ConstructorInstantiator {
            target,
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

    fn constructor<'a>(
        &self,
        meta: &'a dyn TypeMetadata,
    ) -> Result<&'a ConstructorSpec, ProductionError> {
        let class = self.target.class();
        let spec = meta
            .class(class)
            .ok_or_else(|| ProductionError::UnknownClass(class.to_string()))?;
        if spec.is_interface() {
            return Err(ProductionError::NotInstantiable {
                class: class.to_string(),
                reason: "it is an interface",
            });
        }
        if spec.is_abstract() {
            return Err(ProductionError::NotInstantiable {
                class: class.to_string(),
                reason: "it is abstract",
            });
        }
        spec.constructor()
            .ok_or_else(|| ProductionError::NotInstantiable {
                class: class.to_string(),
                reason: "no constructor is registered",
            })
    }
}

impl Instantiator for ConstructorInstantiator {
    fn target(&self) -> &Reference {
        &self.target
    }

    fn dependency_list(
        &self,
        meta: &dyn TypeMetadata,
    ) -> Result<DependencyList, ProductionError> {
        let constructor = self.constructor(meta)?;
        let mut list = DependencyList::new();
        list_parameter_references(constructor.params(), &self.arguments, &mut list);
        Ok(list)
    }

    fn produce(
        &self,
        dependencies: &DependencyList,
        meta: &dyn TypeMetadata,
    ) -> Result<Instance, ProductionError> {
        let constructor = self.constructor(meta)?;
        let values = collect_arguments(
            self.target.class(),
            constructor.params(),
            &self.arguments,
            dependencies,
        )?;
        let value = constructor.call(values).map_err(ProductionError::User)?;
        Ok(Instance::new(self.target.class(), value))
    }
}
