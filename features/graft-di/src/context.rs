use std::cmp::Ordering;

use crate::{errors::ConfigError, metadata::TypeMetadata, reference::Reference};

/// Where a context pattern sits in the total specificity order.
///
/// When two contexts both match a reference for the same variable, the one
/// with the higher specificity wins, so a blanket default can be overridden
/// for one namespace or one exact class without touching the blanket rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    Wildcard,
    NamespaceGreedy,
    NamespaceExact,
    ClassGreedy,
    ClassExact,
    Identifier,
}

/// A pattern over [`Reference`]s, scoping an automatic configuration rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Matches every reference
    Wildcard,
    /// Matches a class, optionally including its subclasses
    Class { name: String, greedy: bool },
    /// Matches every class in a namespace, optionally including nested ones
    Namespace { path: String, greedy: bool },
    /// Matches one exact reference id
    Identifier { reference_id: String },
}

impl Context {
    pub fn wildcard() -> Self {
        Context::Wildcard
    }

    pub fn class(name: impl Into<String>) -> Self {
        Context::Class {
            name: name.into(),
            greedy: false,
        }
    }

    /// Matches the class and everything assignable to it
    pub fn subclasses_of(name: impl Into<String>) -> Self {
        Context::Class {
            name: name.into(),
            greedy: true,
        }
    }

    pub fn namespace(path: impl Into<String>) -> Self {
        Context::Namespace {
            path: path.into(),
            greedy: false,
        }
    }

    /// Matches the namespace and everything nested below it
    pub fn namespace_tree(path: impl Into<String>) -> Self {
        Context::Namespace {
            path: path.into(),
            greedy: true,
        }
    }

    pub fn identifier(reference: &Reference) -> Self {
        Context::Identifier {
            reference_id: reference.id().to_string(),
        }
    }

    /// Parses the textual form used by configuration input.
    ///
    /// `*`, `class:Name`, `class+:Name`, `ns:Path`, `ns+:Path`, and
    /// `id=<reference-id>`; the `+` marks the greedy variant.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidContext(pattern.to_string());
        if pattern == "*" {
            return Ok(Context::Wildcard);
        }
        if let Some(id) = pattern.strip_prefix("id=") {
            if id.is_empty() {
                return Err(invalid());
            }
            return Ok(Context::Identifier {
                reference_id: id.to_string(),
            });
        }
        let (rest, greedy, class) = if let Some(rest) = pattern.strip_prefix("class+:") {
            (rest, true, true)
        } else if let Some(rest) = pattern.strip_prefix("class:") {
            (rest, false, true)
        } else if let Some(rest) = pattern.strip_prefix("ns+:") {
            (rest, true, false)
        } else if let Some(rest) = pattern.strip_prefix("ns:") {
            (rest, false, false)
        } else {
            return Err(invalid());
        };
        if rest.is_empty() {
            return Err(invalid());
        }
        Ok(if class {
            Context::Class {
                name: rest.to_string(),
                greedy,
            }
        } else {
            Context::Namespace {
                path: rest.to_string(),
                greedy,
            }
        })
    }

    /// Whether the pattern applies to `reference`.
    ///
    /// Pure predicate; the metadata handle is only consulted by greedy class
    /// contexts for the subclass walk.
    pub fn matches(&self, reference: &Reference, meta: &dyn TypeMetadata) -> bool {
        match self {
            Context::Wildcard => true,
            Context::Identifier { reference_id } => reference.id() == reference_id,
            Context::Class { name, greedy: false } => reference.class() == name,
            Context::Class { name, greedy: true } => meta.is_assignable(reference.class(), name),
            Context::Namespace { path, greedy } => {
                let namespace = reference.namespace();
                match namespace.strip_prefix(path.as_str()) {
                    Some(rest) => rest.is_empty() || (*greedy && rest.starts_with("::")),
                    None => false,
                }
            }
        }
    }

    pub fn specificity(&self) -> Specificity {
        match self {
            Context::Wildcard => Specificity::Wildcard,
            Context::Namespace { greedy: true, .. } => Specificity::NamespaceGreedy,
            Context::Namespace { greedy: false, .. } => Specificity::NamespaceExact,
            Context::Class { greedy: true, .. } => Specificity::ClassGreedy,
            Context::Class { greedy: false, .. } => Specificity::ClassExact,
            Context::Identifier { .. } => Specificity::Identifier,
        }
    }

    pub fn compare_specificity(&self, other: &Self) -> Ordering {
        self.specificity().cmp(&other.specificity())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::metadata::{ClassSpec, MetadataRegistry};

    struct Smtp;

    fn meta() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .register(ClassSpec::interface("app::mail::Transport"))
            .unwrap();
        registry
            .register(ClassSpec::of::<Smtp>("app::mail::Smtp").implements("app::mail::Transport"))
            .unwrap();
        registry
    }

    #[rstest]
    #[case(Context::wildcard(), "app::mail::Smtp", true)]
    #[case(Context::class("app::mail::Smtp"), "app::mail::Smtp", true)]
    #[case(Context::class("app::mail::Transport"), "app::mail::Smtp", false)]
    #[case(Context::subclasses_of("app::mail::Transport"), "app::mail::Smtp", true)]
    #[case(Context::subclasses_of("app::mail::Transport"), "app::Other", false)]
    #[case(Context::namespace("app::mail"), "app::mail::Smtp", true)]
    #[case(Context::namespace("app"), "app::mail::Smtp", false)]
    #[case(Context::namespace_tree("app"), "app::mail::Smtp", true)]
    #[case(Context::namespace_tree("ap"), "app::mail::Smtp", false)]
    fn matching(#[case] context: Context, #[case] class: &str, #[case] expected: bool) {
        let reference = Reference::new(class);
        assert_eq!(context.matches(&reference, &meta()), expected);
    }

    #[test]
    fn identifier_matches_the_exact_reference_only() {
        let reference = Reference::new("app::mail::Smtp").with_name("primary");
        let other = Reference::new("app::mail::Smtp");
        let context = Context::identifier(&reference);
        assert!(context.matches(&reference, &meta()));
        assert!(!context.matches(&other, &meta()));
    }

    #[test]
    fn specificity_is_totally_ordered() {
        let reference = Reference::new("app::mail::Smtp");
        let ordered = [
            Context::wildcard(),
            Context::namespace_tree("app"),
            Context::namespace("app::mail"),
            Context::subclasses_of("app::mail::Transport"),
            Context::class("app::mail::Smtp"),
            Context::identifier(&reference),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].compare_specificity(&pair[1]), Ordering::Less);
            assert_eq!(pair[1].compare_specificity(&pair[0]), Ordering::Greater);
        }
    }

    #[rstest]
    #[case("*", Context::wildcard())]
    #[case("class:app::Bar", Context::class("app::Bar"))]
    #[case("class+:app::Bar", Context::subclasses_of("app::Bar"))]
    #[case("ns:app::mail", Context::namespace("app::mail"))]
    #[case("ns+:app", Context::namespace_tree("app"))]
    #[case("id=app::Bar#singleton#", Context::Identifier { reference_id: "app::Bar#singleton#".to_string() })]
    fn parsing(#[case] pattern: &str, #[case] expected: Context) {
        assert_eq!(Context::parse(pattern).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("app::Bar")]
    #[case("class:")]
    #[case("id=")]
    #[case("namespace:app")]
    fn invalid_patterns_fail_fast(#[case] pattern: &str) {
        assert!(matches!(
            Context::parse(pattern),
            Err(ConfigError::InvalidContext(_))
        ));
    }
}
