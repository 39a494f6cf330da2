//! Status poller
//!
//! Checks every tracked job once per cycle, reports the ones that reached a
//! terminal state and hands the rest back for the next cycle.

use relay_core::domain::job::Outcome;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, FetchError};
use crate::service::{JobReporter, SubmittedJob};

/// Counts from one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Jobs still tracked after the cycle
    pub active: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl PollSummary {
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Polls remote handles and classifies their results
#[derive(Debug, Clone)]
pub struct StatusPoller {
    /// Label used in failure messages (e.g., "Flux")
    label: String,
}

impl StatusPoller {
    /// Creates a poller for the named backend
    pub fn new(backend: &str) -> Self {
        let mut chars = backend.chars();
        let label = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Self { label }
    }

    /// Maps a fetched result to an outcome
    ///
    /// Any fetch error is a failure; so is any nonzero exit code.
    pub fn classify(
        &self,
        external_id: &str,
        result: Result<i32, FetchError>,
        aux_logs: Vec<PathBuf>,
    ) -> Outcome {
        match result {
            Ok(0) => Outcome::Succeeded,
            Ok(code) => Outcome::Failed {
                message: format!(
                    "{} job '{}' finished with non-zero exit code {}.",
                    self.label, external_id, code
                ),
                aux_logs,
            },
            Err(e) => {
                debug!("Result of job {} unavailable: {}", external_id, e);
                Outcome::Failed {
                    message: format!("{} job '{}' failed.", self.label, external_id),
                    aux_logs,
                }
            }
        }
    }

    /// Checks a single job without waiting
    ///
    /// A failed status query is treated as transient and keeps the job
    /// running, unless the backend no longer knows the job at all.
    pub async fn poll_job(&self, job: &mut SubmittedJob) -> Outcome {
        match job.handle.is_done().await {
            Err(e @ BackendError::UnknownJob(_)) => {
                warn!("Job {} vanished from the backend: {}", job.external_id(), e);
                self.classify(job.external_id(), Err(e.into()), job.info.aux_logs())
            }
            Err(e) => {
                warn!(
                    "Status query for job {} failed, will retry: {}",
                    job.external_id(),
                    e
                );
                Outcome::Running
            }
            Ok(false) => Outcome::Running,
            Ok(true) => {
                let result = job.handle.fetch_result(Duration::ZERO).await;
                self.classify(job.external_id(), result, job.info.aux_logs())
            }
        }
    }

    /// Runs one polling cycle over `jobs`
    ///
    /// Terminal jobs are reported exactly once and dropped; the returned list
    /// holds the jobs that are still running, in their original order.
    pub async fn check_active_jobs(
        &self,
        jobs: Vec<SubmittedJob>,
        reporter: &dyn JobReporter,
    ) -> (Vec<SubmittedJob>, PollSummary) {
        let mut still_active = Vec::with_capacity(jobs.len());
        let mut summary = PollSummary::default();

        for mut job in jobs {
            match self.poll_job(&mut job).await {
                Outcome::Running => still_active.push(job),
                Outcome::Succeeded => {
                    info!(
                        "Job {} ({}) succeeded",
                        job.info.request.job_id,
                        job.external_id()
                    );
                    reporter.report_success(&job.info).await;
                    summary.succeeded += 1;
                }
                Outcome::Failed { message, aux_logs } => {
                    reporter.report_failure(&job.info, &message, &aux_logs).await;
                    summary.failed += 1;
                }
            }
        }

        summary.active = still_active.len();
        (still_active, summary)
    }
}
