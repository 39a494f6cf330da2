//! Cancellation coordinator
//!
//! Best-effort shutdown: one cancel request per unfinished job, no retries
//! and no waiting for confirmation, then the backend client is closed.

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::service::SubmittedJob;

/// Result of a cancellation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelSummary {
    /// Cancel requests sent
    pub requested: usize,
    /// Jobs that had already finished
    pub skipped: usize,
    /// Identifier and error of every request the backend refused
    pub failed: Vec<(String, String)>,
}

impl CancelSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cancels every unfinished job in `jobs` and closes the backend
///
/// Jobs whose status cannot be determined are cancelled as well.
pub async fn cancel_jobs(backend: &dyn Backend, jobs: Vec<SubmittedJob>) -> CancelSummary {
    let mut summary = CancelSummary::default();

    for mut job in jobs {
        match job.handle.is_done().await {
            Ok(true) => {
                debug!("Job {} already finished, not cancelling", job.external_id());
                summary.skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => debug!(
                "Status of job {} unknown, cancelling anyway: {}",
                job.external_id(),
                e
            ),
        }

        summary.requested += 1;
        if let Err(e) = backend.cancel(job.external_id()).await {
            warn!("Failed to cancel job {}: {}", job.external_id(), e);
            summary
                .failed
                .push((job.external_id().to_string(), e.to_string()));
        }
    }

    if let Err(e) = backend.close().await {
        warn!("Failed to close {} backend: {}", backend.name(), e);
    }

    info!(
        "Cancellation finished: {} requested, {} already done, {} failed",
        summary.requested,
        summary.skipped,
        summary.failed.len()
    );
    summary
}
