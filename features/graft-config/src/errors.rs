use graft_di::ConfigError;

/// Errors when adding entries to a
/// [`ContainerConfig`](crate::ContainerConfig)
#[derive(thiserror::Error, Debug)]
pub enum RegisterError {
    /// The reference already has an instantiator in this configuration
    #[error("'{0}' already has an instantiator in this configuration")]
    AlreadyRegistered(String),
    /// The entry itself is malformed
    #[error(transparent)]
    Config(#[from] ConfigError),
}
