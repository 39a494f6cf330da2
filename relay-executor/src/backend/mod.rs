//! Backend layer
//!
//! A backend accepts job specs and hands back a [`RemoteHandle`] that the
//! status poller can query without knowing which resource manager sits
//! behind it.
//!
//! Two backends ship with the executor:
//! - [`FluxBackend`]: submits through the `flux` command-line tools
//! - [`LocalBackend`]: runs jobs as child processes of the host

pub mod flux;
pub mod local;

pub use flux::FluxBackend;
pub use local::LocalBackend;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Backend job specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Human readable job name
    pub name: String,
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub environment: BTreeMap<String, String>,
    /// Always at least 1
    pub cpus_per_task: u32,
    /// Zero means unlimited
    pub duration: Duration,
    /// File receiving standard error
    pub stderr: PathBuf,
}

impl JobSpec {
    /// Creates a spec for `argv` with single-CPU, unlimited defaults
    pub fn from_command(argv: Vec<String>) -> Self {
        let name = argv.first().cloned().unwrap_or_default();
        Self {
            name,
            argv,
            cwd: PathBuf::from("."),
            environment: BTreeMap::new(),
            cpus_per_task: 1,
            duration: Duration::ZERO,
            stderr: PathBuf::new(),
        }
    }
}

/// Errors raised by backend operations
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend cannot be reached at all; fatal at construction
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The client connection was closed by a cancellation pass
    #[error("Backend client is closed")]
    Closed,

    /// A backend command exited unsuccessfully
    #[error("{command} failed (exit code {code}): {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The backend does not know the identifier
    #[error("Unknown job '{0}'")]
    UnknownJob(String),

    /// Unexpected output from the backend
    #[error("Failed to parse backend output: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when retrieving a finished job's exit code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The job ended without producing an exit code
    #[error("job did not complete: {0}")]
    Incomplete(String),

    /// The result was not available within the timeout
    #[error("result not ready")]
    NotReady,

    /// The status query itself failed
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<BackendError> for FetchError {
    fn from(err: BackendError) -> Self {
        FetchError::Backend(err.to_string())
    }
}

/// Opaque reference to a submitted job
#[async_trait]
pub trait RemoteHandle: Send + Sync {
    /// Checks whether the job has finished, without waiting for it
    async fn is_done(&mut self) -> Result<bool, BackendError>;

    /// Retrieves the exit code, waiting at most `timeout`
    ///
    /// A zero timeout only inspects the current state.
    async fn fetch_result(&mut self, timeout: Duration) -> Result<i32, FetchError>;

    /// Backend-assigned identifier
    fn identifier(&self) -> &str;
}

/// A remote execution backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short backend name, as registered with the plugin registry
    fn name(&self) -> &str;

    /// Creates a default-filled spec for `argv`
    fn build_spec_from_command(&self, argv: Vec<String>) -> JobSpec {
        JobSpec::from_command(argv)
    }

    /// Hands a spec to the backend
    ///
    /// May block briefly while the backend accepts the job.
    async fn submit(&self, spec: JobSpec) -> Result<Box<dyn RemoteHandle>, BackendError>;

    /// Requests cancellation, without waiting for confirmation
    async fn cancel(&self, identifier: &str) -> Result<(), BackendError>;

    /// Releases the client connection; later submissions fail with `Closed`
    async fn close(&self) -> Result<(), BackendError>;
}
