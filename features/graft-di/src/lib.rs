//! Graft resolves object graphs from symbolic references.
//!
//! Given a [`Reference`] naming a class, a lifecycle, and an optional name,
//! the [`Container`] builds the instance and its whole transitive dependency
//! graph. Explicit overrides beat automatic rules, more specific rules beat
//! general ones, singletons are built once and cached, transients are
//! rebuilt per request, and the graph is walked iteratively so deep chains
//! cannot overflow the call stack.
//!
//! The engine is split into:
//! 1. Reference and Context, the identity and pattern vocabulary rules are
//!    written in
//! 2. The metadata registry, describing constructors and methods in place
//!    of runtime reflection
//! 3. The instantiators and setter injector, the production strategies
//! 4. The Rulebook, deciding which strategy applies to a reference
//! 5. The Container, driving resolution with a work stack and owning the
//!    singleton cache
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use graft_di::{ClassSpec, Container, MetadataRegistry, Reference, Rulebook};
//!
//! struct Clock;
//!
//! let mut registry = MetadataRegistry::new();
//! registry
//!     .register(ClassSpec::of::<Clock>("app::Clock").with_constructor([], |_| Ok(Arc::new(Clock))))
//!     .unwrap();
//!
//! let container = Container::new(Rulebook::new(), Arc::new(registry));
//! let clock = container.get_as::<Clock>(&Reference::new("app::Clock")).unwrap();
//! let again = container.get_as::<Clock>(&Reference::new("app::Clock")).unwrap();
//! assert!(Arc::ptr_eq(&clock, &again));
//! ```

pub mod container;
pub mod context;
pub mod dependency_list;
pub mod errors;
pub mod instantiator;
pub mod metadata;
pub mod reference;
pub mod rulebook;
pub mod setter;
pub mod types;

pub use container::Container;
pub use context::{Context, Specificity};
pub use dependency_list::DependencyList;
pub use errors::{ConfigError, ListError, ProductionError, ResolveError};
pub use instantiator::{
    Argument, CallbackInstantiator, ConstructorInstantiator, Instantiator, PointerInstantiator,
    ProviderInstantiator,
};
pub use metadata::{
    ClassKind, ClassSpec, ConstructorSpec, MetadataRegistry, MethodSpec, ParamSpec, TypeMetadata,
};
pub use reference::{Lifecycle, Reference};
pub use rulebook::Rulebook;
pub use setter::{SetterCall, SetterInjector};
pub use types::{DynError, Instance, Object};
