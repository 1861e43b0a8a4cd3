use std::{
    any::TypeId,
    collections::{BTreeMap, HashMap},
    fmt,
};

use crate::errors::ConfigError;
use crate::metadata::{ClassSpec, TypeMetadata};

/// The builder-populated implementation of [`TypeMetadata`].
///
/// Registered once at startup, read-only afterwards. Each concrete class
/// records the `TypeId` of its backing Rust type so provider and callback
/// return values can be mapped back to a class name.
#[derive(Default)]
pub struct MetadataRegistry {
    classes: BTreeMap<String, ClassSpec>,
    by_type: HashMap<TypeId, String>,
}

impl fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("by_type", &self.by_type.values().collect::<Vec<_>>())
            .finish()
    }
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ClassSpec) -> Result<&mut Self, ConfigError> {
        let name = spec.name().to_string();
        if self.classes.contains_key(&name) {
            return Err(ConfigError::DuplicateClass(name));
        }
        tracing::debug!("Registered class metadata for {}", name);
        if let Some(type_id) = spec.type_id() {
            self.by_type.insert(type_id, name.clone());
        }
        self.classes.insert(name, spec);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeMetadata for MetadataRegistry {
    fn class(&self, name: &str) -> Option<&ClassSpec> {
        self.classes.get(name)
    }

    fn class_name_of(&self, type_id: TypeId) -> Option<&str> {
        self.by_type.get(&type_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::ParamSpec;

    struct Plain;
    struct Child;

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .register(ClassSpec::interface("app::Transport"))
            .unwrap();
        registry
            .register(ClassSpec::abstract_class("app::BaseMailer").implements("app::Transport"))
            .unwrap();
        registry
            .register(
                ClassSpec::of::<Child>("app::SmtpMailer")
                    .with_parent("app::BaseMailer")
                    .with_constructor([ParamSpec::untyped("host")], |_| Ok(Arc::new(Child))),
            )
            .unwrap();
        registry
            .register(ClassSpec::of::<Plain>("app::Plain").with_constructor([], |_| Ok(Arc::new(Plain))))
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register(ClassSpec::of::<Plain>("app::Plain"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateClass(name) if name == "app::Plain"));
    }

    #[test]
    fn assignability_walks_parents_and_interfaces() {
        let registry = registry();
        assert!(registry.is_assignable("app::SmtpMailer", "app::SmtpMailer"));
        assert!(registry.is_assignable("app::SmtpMailer", "app::BaseMailer"));
        assert!(registry.is_assignable("app::SmtpMailer", "app::Transport"));
        assert!(!registry.is_assignable("app::Plain", "app::Transport"));
        assert!(!registry.is_assignable("app::Transport", "app::SmtpMailer"));
    }

    #[test]
    fn concrete_classes_map_back_from_type_ids() {
        let registry = registry();
        assert_eq!(
            registry.class_name_of(TypeId::of::<Child>()),
            Some("app::SmtpMailer")
        );
        assert_eq!(registry.class_name_of(TypeId::of::<String>()), None);
    }
}
