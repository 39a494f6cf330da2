//! Error types for the executor

use thiserror::Error;

use crate::backend::BackendError;

/// Result type alias for executor operations
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Errors surfaced to the host engine
///
/// Per-job failures are never returned here; they travel through the
/// reporter. These errors concern setup and submission.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Settings are unusable (missing working directory, bad values)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The job request could not be turned into a backend spec
    #[error("Failed to build job spec: {0}")]
    Build(String),

    /// The backend rejected an operation
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The backend handed out an identifier that was already used
    #[error("Backend reused job identifier '{0}'")]
    DuplicateId(String),

    /// No plugin is registered under the requested name
    #[error("Unknown executor backend '{0}'")]
    UnknownBackend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
