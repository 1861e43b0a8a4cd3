use thiserror::Error;

use crate::types::DynError;

/// Errors raised while registering rules, classes, or pointers.
///
/// Configuration problems fail fast at registration time and never surface
/// during resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The lifecycle string is neither "singleton" nor "transient"
    #[error("'{0}' is not a valid lifecycle, expected 'singleton' or 'transient'")]
    InvalidLifecycle(String),
    /// The context pattern could not be parsed
    #[error("'{0}' is not a valid context pattern")]
    InvalidContext(String),
    /// A pointer must redirect to a different reference
    #[error("pointer for '{0}' points at itself")]
    SelfPointer(String),
    /// Following the pointer chain leads back to its start
    #[error("pointer chain loops: {}", .chain.join(" -> "))]
    PointerCycle { chain: Vec<String> },
    /// A pointer already claims this reference and pointers take precedence
    #[error("'{id}' is aliased by a pointer, remove the pointer before overriding")]
    PointerShadowed { id: String },
    /// Class metadata has been registered twice
    #[error("class '{0}' is registered twice")]
    DuplicateClass(String),
    /// A configuration entry names a class the registry does not know
    #[error("class '{0}' is not registered")]
    UnknownClass(String),
}

/// Errors from misusing a [`DependencyList`](crate::DependencyList) slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// The id was never added to the list
    #[error("'{0}' was never added to this dependency list")]
    UnknownDependency(String),
    /// Each slot is written at most once
    #[error("'{0}' is already resolved")]
    AlreadyResolved(String),
    /// The slot has no value yet
    #[error("'{0}' is not resolved yet")]
    NotYetResolved(String),
}

/// Failures inside a single production step.
///
/// The container wraps these into a [`ResolveError`] annotated with the
/// chain of reference ids that led to the failing frame.
#[derive(Error, Debug)]
pub enum ProductionError {
    /// The target class has no metadata
    #[error("class '{0}' is not registered")]
    UnknownClass(String),
    /// Interfaces, abstract classes, and classes without a constructor
    /// cannot be produced directly
    #[error("class '{class}' cannot be instantiated, {reason}")]
    NotInstantiable { class: String, reason: &'static str },
    /// A required parameter has no configured value, no default, and no
    /// type hint to synthesize a reference from
    #[error("no value for parameter '{parameter}' of '{class}'")]
    MissingArgument { class: String, parameter: String },
    /// The provider's concrete class does not expose the method
    #[error("provider class '{class}' has no method '{method}'")]
    ProviderMethodNotFound { class: String, method: String },
    /// The produced instance's concrete class does not expose the method
    #[error("class '{class}' has no method '{method}'")]
    SetterMethodNotFound { class: String, method: String },
    /// A provider or callback returned something not assignable to the
    /// target's declared class
    #[error("expected an instance assignable to '{expected}', got '{actual}'")]
    WrongReturnType { expected: String, actual: String },
    #[error(transparent)]
    List(#[from] ListError),
    /// A user-supplied constructor, provider, or callback failed; the
    /// original error is carried unchanged
    #[error("construction step failed: {0}")]
    User(DynError),
}

/// Errors aborting an entire [`Container::get`](crate::Container::get) call.
///
/// Every variant carries the chain of reference ids from the requested root
/// down to the failing frame.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No explicit override and no automatic rule can produce the reference
    #[error("no rule can produce '{reference}', chain: {}", .chain.join(" -> "))]
    Unresolvable {
        reference: String,
        chain: Vec<String>,
    },
    /// The reference is already being resolved further up the stack
    #[error("circular dependency: {}", .chain.join(" -> "))]
    Circular { chain: Vec<String> },
    /// Producing the instance failed
    #[error("producing '{reference}' failed, chain: {}", .chain.join(" -> "))]
    Production {
        reference: String,
        chain: Vec<String>,
        #[source]
        source: ProductionError,
    },
    /// A queued setter call failed after production
    #[error("setter on '{reference}' failed, chain: {}", .chain.join(" -> "))]
    Setter {
        reference: String,
        chain: Vec<String>,
        #[source]
        source: ProductionError,
    },
    /// The per-call frame budget ran out; the rule set most likely expands
    /// without bound
    #[error("resolution exceeded the frame budget of {limit}, chain: {}", .chain.join(" -> "))]
    FrameBudgetExceeded { limit: usize, chain: Vec<String> },
    /// The resolved instance is not of the requested Rust type
    #[error("failed to downcast, required: '{expected}' actual: '{actual}'")]
    Downcast {
        expected: &'static str,
        actual: String,
    },
}

impl ResolveError {
    /// The reference-id chain from the requested root to the failure
    pub fn chain(&self) -> &[String] {
        match self {
            ResolveError::Unresolvable { chain, .. }
            | ResolveError::Circular { chain }
            | ResolveError::Production { chain, .. }
            | ResolveError::Setter { chain, .. }
            | ResolveError::FrameBudgetExceeded { chain, .. } => chain,
            ResolveError::Downcast { .. } => &[],
        }
    }
}
