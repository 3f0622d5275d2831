/// Error types for the RAVEN daemon
use thiserror::Error;

pub type Result<T, E = DaemonError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("controller: {0}")]
    Controller(#[from] raven_control::Error),
    #[error("core: {0}")]
    Core(#[from] raven_core::Error),
    #[error("destination {0} has no match address")]
    MissingAddress(String),
}
