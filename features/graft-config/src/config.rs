use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use graft_di::{
    Argument, ConfigError, Container, Context, Instantiator, PointerInstantiator, Reference,
    Rulebook, SetterInjector, TypeMetadata,
};

use crate::errors::RegisterError;

/// Declarative container configuration, collected before the first resolve.
///
/// Entries are validated as they are added, so a malformed context pattern
/// or a self-referential pointer fails where it is written, not later
/// during resolution. The collected entries are applied to a rulebook in
/// one pass; the container takes that rulebook by value, which keeps the
/// configuration append-only by construction.
#[derive(Default)]
pub struct ContainerConfig {
    instantiators: Vec<Arc<dyn Instantiator>>,
    pointers: Vec<PointerInstantiator>,
    setters: Vec<(Reference, SetterInjector)>,
    rules: Vec<(Context, String, Argument)>,
    setter_rules: Vec<(Context, String, BTreeMap<String, Argument>)>,
    claimed_ids: HashSet<String>,
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an explicit instantiator for its target reference
    pub fn instantiate(
        &mut self,
        instantiator: impl Instantiator + 'static,
    ) -> Result<&mut Self, RegisterError> {
        self.claim(instantiator.target().id())?;
        self.instantiators.push(Arc::new(instantiator));
        Ok(self)
    }

    /// Aliases `target` to `pointed`; self-pointers fail immediately
    pub fn point(
        &mut self,
        target: Reference,
        pointed: Reference,
    ) -> Result<&mut Self, RegisterError> {
        let pointer = PointerInstantiator::new(target, pointed)?;
        self.claim(pointer.target().id())?;
        self.pointers.push(pointer);
        Ok(self)
    }

    /// Queues post-construction calls for one reference
    pub fn setters(&mut self, reference: Reference, setter: SetterInjector) -> &mut Self {
        self.setters.push((reference, setter));
        self
    }

    /// Adds an automatic default for a constructor parameter, scoped by a
    /// textual context pattern
    pub fn rule(
        &mut self,
        context: &str,
        variable: &str,
        argument: Argument,
    ) -> Result<&mut Self, RegisterError> {
        let context = Context::parse(context)?;
        self.rules.push((context, variable.to_string(), argument));
        Ok(self)
    }

    /// Adds a contextual post-construction call
    pub fn setter_rule(
        &mut self,
        context: &str,
        method: &str,
        arguments: impl IntoIterator<Item = (String, Argument)>,
    ) -> Result<&mut Self, RegisterError> {
        let context = Context::parse(context)?;
        self.setter_rules
            .push((context, method.to_string(), arguments.into_iter().collect()));
        Ok(self)
    }

    /// Writes every collected entry into `rulebook`.
    ///
    /// Pointers are applied last so they take precedence over any override
    /// the same configuration or an earlier one registered.
    pub fn apply(self, rulebook: &mut Rulebook) -> Result<(), ConfigError> {
        tracing::debug!(
            "Applying configuration with {} instantiators, {} pointers, {} rules",
            self.instantiators.len(),
            self.pointers.len(),
            self.rules.len() + self.setter_rules.len()
        );
        for instantiator in self.instantiators {
            rulebook.register_shared(instantiator)?;
        }
        for pointer in self.pointers {
            rulebook.register_pointer(pointer)?;
        }
        for (reference, setter) in self.setters {
            rulebook.register_setter(&reference, setter);
        }
        for (context, variable, argument) in self.rules {
            rulebook.add_rule(context, variable, argument);
        }
        for (context, method, arguments) in self.setter_rules {
            rulebook.add_setter_rule(context, method, arguments);
        }
        Ok(())
    }

    /// Applies onto a fresh rulebook and wraps it in a container
    pub fn build_container(
        self,
        metadata: Arc<dyn TypeMetadata>,
    ) -> Result<Container, ConfigError> {
        let mut rulebook = Rulebook::new();
        self.apply(&mut rulebook)?;
        Ok(Container::new(rulebook, metadata))
    }

    fn claim(&mut self, id: &str) -> Result<(), RegisterError> {
        if !self.claimed_ids.insert(id.to_string()) {
            return Err(RegisterError::AlreadyRegistered(id.to_string()));
        }
        Ok(())
    }
}
