//! Graft Config collects a container's configuration up front and applies
//! it in one go.
//!
//! The engine itself takes registrations through the
//! [`Rulebook`](graft_di::Rulebook) API with already-built contexts and
//! references. This crate is the declarative
//! layer on top: contexts arrive as strings (`"class:app::Bar"`,
//! `"ns+:app"`), malformed entries fail at the moment they are added, and
//! the finished configuration is applied to a rulebook before the container
//! ever resolves anything.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use graft_config::ContainerConfig;
//! use graft_di::{Argument, ClassSpec, MetadataRegistry, ParamSpec, Reference};
//! use graft_di::metadata::arg_value;
//!
//! struct Mailer { host: String }
//!
//! let mut registry = MetadataRegistry::new();
//! registry
//!     .register(ClassSpec::of::<Mailer>("app::Mailer").with_constructor(
//!         [ParamSpec::untyped("host")],
//!         |values| Ok(Arc::new(Mailer { host: arg_value::<String>(&values, 0)? })),
//!     ))
//!     .unwrap();
//!
//! let mut config = ContainerConfig::new();
//! config
//!     .rule("class:app::Mailer", "host", Argument::value("smtp.local".to_string()))
//!     .unwrap();
//!
//! let container = config.build_container(Arc::new(registry)).unwrap();
//! let mailer = container.get_as::<Mailer>(&Reference::new("app::Mailer")).unwrap();
//! assert_eq!(mailer.host, "smtp.local");
//! ```

pub mod config;
pub mod errors;

pub use config::ContainerConfig;
pub use errors::RegisterError;
