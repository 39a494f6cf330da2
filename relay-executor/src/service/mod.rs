//! Service layer for the executor
//!
//! - `submission`: builds specs and hands them to the backend
//! - `cancellation`: best-effort shutdown of unfinished jobs
//! - `reporter`: the upward reporting contract and its implementations

pub mod cancellation;
pub mod reporter;
pub mod submission;

pub use cancellation::{CancelSummary, cancel_jobs};
pub use reporter::{CompositeReporter, HttpReporter, JobReporter, TracingReporter};
pub use submission::{SubmissionGateway, SubmittedJob};
