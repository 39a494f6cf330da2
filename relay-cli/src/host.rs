//! Host loop
//!
//! Submits a batch of jobs and polls until none is active. Ctrl-C cancels
//! whatever is still running.

use anyhow::{Context, Result};
use relay_core::domain::job::JobRequest;
use relay_executor::{CancelSummary, RemoteExecutor};
use tracing::{debug, info, warn};

/// Totals of one host run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when the run was interrupted
    pub cancelled: Option<CancelSummary>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled.is_none()
    }
}

/// Submits `jobs` and drives the executor until every job finished
///
/// If a submission fails, the jobs already submitted are cancelled before
/// the error is returned. Ctrl-C is honoured from the first submission on.
pub async fn drive(executor: RemoteExecutor, jobs: Vec<JobRequest>) -> Result<RunReport> {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    drive_until(executor, jobs, ctrl_c).await
}

/// Like [`drive`], but stops and cancels when `interrupted` resolves
pub async fn drive_until<F>(
    mut executor: RemoteExecutor,
    jobs: Vec<JobRequest>,
    interrupted: F,
) -> Result<RunReport>
where
    F: Future<Output = ()>,
{
    let mut report = RunReport::default();
    tokio::pin!(interrupted);

    for job in jobs {
        let job_id = job.job_id;
        let submitted = tokio::select! {
            biased;
            _ = &mut interrupted => None,
            result = executor.run_job(job) => Some(result),
        };

        match submitted {
            None => {
                report.cancelled = Some(interrupt(&mut executor).await);
                return Ok(report);
            }
            Some(Err(e)) => {
                let cancelled = executor.cancel_jobs().await;
                return Err(e).with_context(|| submission_failure(job_id, &cancelled));
            }
            Some(Ok(_)) => report.submitted += 1,
        }
    }

    let init_delay = executor.settings().init_delay;
    let mut interval = tokio::time::interval(executor.settings().poll_interval);

    if !init_delay.is_zero() {
        debug!("Waiting {:?} before the first status check", init_delay);
        tokio::select! {
            _ = tokio::time::sleep(init_delay) => {}
            _ = &mut interrupted => {
                report.cancelled = Some(interrupt(&mut executor).await);
                return Ok(report);
            }
        }
    }

    while executor.has_active_jobs() {
        tokio::select! {
            _ = interval.tick() => {
                let summary = executor.check_active_jobs().await;
                report.succeeded += summary.succeeded;
                report.failed += summary.failed;
            }
            _ = &mut interrupted => {
                report.cancelled = Some(interrupt(&mut executor).await);
                break;
            }
        }
    }

    info!(
        "Run finished: {} submitted, {} succeeded, {} failed",
        report.submitted, report.succeeded, report.failed
    );
    Ok(report)
}

/// Error context for an aborted batch, naming jobs that may still run
fn submission_failure(job_id: u64, cancelled: &CancelSummary) -> String {
    let mut message = format!(
        "Failed to submit job {}; cancelled {} submitted job(s)",
        job_id, cancelled.requested
    );
    if !cancelled.is_clean() {
        let stuck: Vec<String> = cancelled
            .failed
            .iter()
            .map(|(id, error)| format!("{} ({})", id, error))
            .collect();
        message.push_str(&format!("; could not cancel {}", stuck.join(", ")));
    }
    message
}

async fn interrupt(executor: &mut RemoteExecutor) -> CancelSummary {
    warn!(
        "Interrupted, cancelling {} active job(s)",
        executor.active_count()
    );
    executor.cancel_jobs().await
}
