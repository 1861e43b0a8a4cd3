use std::{fmt, hash::Hash};

use crate::errors::ConfigError;

/// How long a resolved instance lives.
///
/// Singletons are built once per container and served from the cache
/// afterwards. Transients are rebuilt on every request and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Singleton,
    Transient,
}

impl Lifecycle {
    /// Parses the textual form used by configuration input
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "singleton" | "Singleton" => Ok(Lifecycle::Singleton),
            "transient" | "Transient" => Ok(Lifecycle::Transient),
            other => Err(ConfigError::InvalidLifecycle(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Singleton => "singleton",
            Lifecycle::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable identity of a requested instance.
///
/// The canonical id concatenates class, lifecycle, and name, so two
/// references with identical fields always carry identical ids. Cache
/// lookups, rule lookups, and cycle detection all key on the id.
#[derive(Debug, Clone)]
pub struct Reference {
    class: String,
    lifecycle: Lifecycle,
    name: String,
    id: String,
}

impl Reference {
    /// An unnamed singleton reference to `class`
    pub fn new(class: impl Into<String>) -> Self {
        Self::build(class.into(), Lifecycle::Singleton, String::new())
    }

    /// An unnamed transient reference to `class`
    pub fn transient(class: impl Into<String>) -> Self {
        Self::build(class.into(), Lifecycle::Transient, String::new())
    }

    /// Builds a reference from the textual lifecycle form, failing fast on
    /// unknown lifecycle strings
    pub fn parse(class: &str, lifecycle: &str, name: &str) -> Result<Self, ConfigError> {
        Ok(Self::build(
            class.to_string(),
            Lifecycle::parse(lifecycle)?,
            name.to_string(),
        ))
    }

    pub fn with_lifecycle(self, lifecycle: Lifecycle) -> Self {
        Self::build(self.class, lifecycle, self.name)
    }

    /// Distinguishes multiple configurations of the same class
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self::build(self.class, self.lifecycle, name.into())
    }

    fn build(class: String, lifecycle: Lifecycle, name: String) -> Self {
        let id = format!("{class}#{lifecycle}#{name}");
        Reference {
            class,
            lifecycle,
            name,
            id,
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical id, deterministic over the three fields
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_singleton(&self) -> bool {
        self.lifecycle == Lifecycle::Singleton
    }

    /// The namespace portion of the class path, empty for top-level classes
    pub fn namespace(&self) -> &str {
        match self.class.rfind("::") {
            Some(split) => &self.class[..split],
            None => "",
        }
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Reference {}

impl Hash for Reference {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_fields_yield_identical_ids() {
        let a = Reference::new("app::Bar").with_name("primary");
        let b = Reference::new("app::Bar").with_name("primary");
        assert_eq!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn lifecycle_and_name_are_part_of_the_id() {
        let singleton = Reference::new("app::Bar");
        let transient = Reference::transient("app::Bar");
        let named = Reference::new("app::Bar").with_name("backup");
        assert_ne!(singleton.id(), transient.id());
        assert_ne!(singleton.id(), named.id());
    }

    #[test]
    fn unknown_lifecycle_string_is_rejected() {
        let err = Reference::parse("app::Bar", "scoped", "").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLifecycle(value) if value == "scoped"));
    }

    #[test]
    fn namespace_splits_off_the_class_name() {
        assert_eq!(Reference::new("app::mail::Smtp").namespace(), "app::mail");
        assert_eq!(Reference::new("Bar").namespace(), "");
    }
}
