//! Relay executor
//!
//! Runs workflow-engine jobs on a remote resource manager and reports their
//! lifecycle back to the engine.
//!
//! - `descriptor`: turns engine requests into backend job specs
//! - `service`: submission, cancellation and upward reporting
//! - `scheduler`: the per-cycle status poller
//! - `backend`: the Flux and local backends behind a common trait
//! - `registry`: backend plugins selectable by name
//!
//! ```no_run
//! use relay_core::domain::job::JobRequest;
//! use relay_executor::{ExecutorRegistry, ExecutorSettings, RemoteExecutor, TracingReporter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ExecutorRegistry::with_builtin();
//!     let settings = ExecutorSettings::new("flux");
//!     let mut executor =
//!         RemoteExecutor::create(&registry, settings, Arc::new(TracingReporter)).await?;
//!
//!     executor.run_job(JobRequest::new(1, "hello", "echo hi")).await?;
//!     while executor.has_active_jobs() {
//!         tokio::time::sleep(executor.settings().poll_interval).await;
//!         executor.check_active_jobs().await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod registry;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use backend::{Backend, BackendError, FetchError, JobSpec, RemoteHandle};
pub use config::ExecutorSettings;
pub use error::{ExecutorError, Result};
pub use executor::RemoteExecutor;
pub use registry::{BackendFactory, CommonSettings, ExecutorRegistry};
pub use scheduler::PollSummary;
pub use service::{CancelSummary, CompositeReporter, HttpReporter, JobReporter, TracingReporter};
