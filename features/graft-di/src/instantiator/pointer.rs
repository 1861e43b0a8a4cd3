use crate::{
    dependency_list::DependencyList,
    errors::{ConfigError, ProductionError},
    instantiator::Instantiator,
    metadata::TypeMetadata,
    reference::Reference,
    types::Instance,
};

/// Aliases the target to another reference.
///
/// Resolving the target yields exactly the instance produced for the
/// pointed-to reference. Used to bind an interface reference to a concrete
/// implementation, or to expose one instance under an additional id.
#[derive(Debug)]
pub struct PointerInstantiator {
    target: Reference,
    pointed: Reference,
}

impl PointerInstantiator {
    /// Fails fast when the pointer would alias itself; chains across
    /// several pointers are checked by the rulebook at registration time.
    pub fn new(target: Reference, pointed: Reference) -> Result<Self, ConfigError> {
        if target.id() == pointed.id() {
            return Err(ConfigError::SelfPointer(target.id().to_string()));
        }
        Ok(PointerInstantiator { target, pointed })
    }

    pub fn pointed(&self) -> &Reference {
        &self.pointed
    }
}

impl Instantiator for PointerInstantiator {
    fn target(&self) -> &Reference {
        &self.target
    }

    fn dependency_list(
        &self,
        _meta: &dyn TypeMetadata,
    ) -> Result<DependencyList, ProductionError> {
        let mut list = DependencyList::new();
        list.add(self.pointed.clone());
        Ok(list)
    }

    fn produce(
        &self,
        dependencies: &DependencyList,
        _meta: &dyn TypeMetadata,
    ) -> Result<Instance, ProductionError> {
        Ok(dependencies.resolved(self.pointed.id())?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_pointer_cannot_alias_itself() {
        let target = Reference::new("app::Bar");
        let err = PointerInstantiator::new(target.clone(), target).unwrap_err();
        assert!(matches!(err, ConfigError::SelfPointer(_)));
    }

    #[test]
    fn lifecycle_distinguishes_otherwise_equal_references() {
        let target = Reference::new("app::Bar");
        let pointed = Reference::transient("app::Bar");
        assert!(PointerInstantiator::new(target, pointed).is_ok());
    }
}
