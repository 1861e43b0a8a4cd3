use std::collections::BTreeMap;

use crate::{
    dependency_list::DependencyList,
    errors::ProductionError,
    instantiator::{
        collect_arguments, list_configured_references, list_parameter_references, Argument,
    },
    metadata::TypeMetadata,
    types::Instance,
};

/// One queued post-construction method call
#[derive(Clone)]
pub struct SetterCall {
    method: String,
    arguments: BTreeMap<String, Argument>,
}

impl SetterCall {
    pub fn new(method: impl Into<String>) -> Self {
        SetterCall {
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

    pub fn with_reference(
        self,
        parameter: impl Into<String>,
        reference: crate::reference::Reference,
    ) -> Self {
        self.with_argument(parameter, Argument::reference(reference))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn arguments(&self) -> &BTreeMap<String, Argument> {
        &self.arguments
    }
}

/// Queued method calls executed right after an instantiator produced its
/// instance, in registration order.
///
/// Arguments follow the same rules as constructor arguments, so setter
/// calls can pull in further resolved references.
#[derive(Clone, Default)]
pub struct SetterInjector {
    calls: Vec<SetterCall>,
}

impl SetterInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call(mut self, call: SetterCall) -> Self {
        self.calls.push(call);
        self
    }

    pub fn calls(&self) -> &[SetterCall] {
        &self.calls
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Adds every reference the queued calls need to `list`, alongside the
    /// owning instantiator's own dependencies
    pub fn list_references(
        &self,
        target_class: &str,
        meta: &dyn TypeMetadata,
        list: &mut DependencyList,
    ) {
        for call in &self.calls {
            match meta
                .class(target_class)
                .and_then(|spec| spec.method(call.method()))
            {
                Some(method) => {
                    list_parameter_references(method.params(), call.arguments(), list)
                }
                None => list_configured_references(call.arguments().values(), list),
            }
        }
    }

    /// Runs the queued calls against a freshly produced instance.
    ///
    /// Methods are looked up on the instance's concrete class, so instances
    /// that arrived through a pointer or provider still dispatch correctly.
    pub fn inject(
        &self,
        instance: &Instance,
        dependencies: &DependencyList,
        meta: &dyn TypeMetadata,
    ) -> Result<(), ProductionError> {
        for call in &self.calls {
            let spec = meta
                .class(instance.class())
                .ok_or_else(|| ProductionError::UnknownClass(instance.class().to_string()))?;
            let method =
                spec.method(call.method())
                    .ok_or_else(|| ProductionError::SetterMethodNotFound {
                        class: instance.class().to_string(),
                        method: call.method().to_string(),
                    })?;
            let values = collect_arguments(
                instance.class(),
                method.params(),
                call.arguments(),
                dependencies,
            )?;
            method
                .call(instance.value(), values)
                .map_err(ProductionError::User)?;
            tracing::trace!(
                "Ran setter {} on {}",
                call.method(),
                instance.class()
            );
        }
        Ok(())
    }
}
