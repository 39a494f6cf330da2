//! Result reporting
//!
//! The [`JobReporter`] trait is the contract between the executor and the
//! workflow engine. The executor calls it exactly once per submission and
//! exactly once per terminal outcome; reporters only forward.

use async_trait::async_trait;
use relay_client::EngineClient;
use relay_core::domain::job::JobRequest;
use relay_core::domain::submission::SubmittedJobInfo;
use relay_core::dto::job::{CompletionEvent, SubmissionEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Upward reporting contract implemented by the host engine
#[async_trait]
pub trait JobReporter: Send + Sync {
    /// The backend accepted the job
    async fn report_submission(&self, job: &SubmittedJobInfo);

    /// The job finished with exit code 0
    async fn report_success(&self, job: &SubmittedJobInfo);

    /// The job failed; `aux_logs` point at captured output
    async fn report_failure(&self, job: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]);

    /// Suggests where a job's log file should live under `base_dir`
    fn suggest_log_file_path(&self, request: &JobRequest, base_dir: &Path) -> PathBuf {
        base_dir
            .join(&request.rule)
            .join(format!("{}.log", request.job_id))
    }
}

/// Reporter that writes structured log lines
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

#[async_trait]
impl JobReporter for TracingReporter {
    async fn report_submission(&self, job: &SubmittedJobInfo) {
        info!(
            job_id = job.request.job_id,
            external_id = %job.external_id,
            "Submitted job {} ({})",
            job.request.job_id,
            job.request.rule
        );
    }

    async fn report_success(&self, job: &SubmittedJobInfo) {
        info!(
            job_id = job.request.job_id,
            external_id = %job.external_id,
            "Job {} succeeded",
            job.request.job_id
        );
    }

    async fn report_failure(&self, job: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]) {
        error!(
            job_id = job.request.job_id,
            external_id = %job.external_id,
            logs = ?aux_logs,
            "Job {} failed: {}",
            job.request.job_id,
            message
        );
    }
}

/// Reporter that forwards events to an engine's HTTP API
///
/// Delivery failures are logged and dropped; they never affect polling.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: EngineClient,
}

impl HttpReporter {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobReporter for HttpReporter {
    async fn report_submission(&self, job: &SubmittedJobInfo) {
        if let Err(e) = self
            .client
            .report_submitted(&SubmissionEvent::from(job))
            .await
        {
            warn!(
                "Failed to report submission of job {} to {}: {}",
                job.request.job_id,
                self.client.base_url(),
                e
            );
        }
    }

    async fn report_success(&self, job: &SubmittedJobInfo) {
        if let Err(e) = self
            .client
            .report_completed(&CompletionEvent::succeeded(job))
            .await
        {
            warn!(
                "Failed to report success of job {}: {}",
                job.request.job_id, e
            );
        }
    }

    async fn report_failure(&self, job: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]) {
        if let Err(e) = self
            .client
            .report_completed(&CompletionEvent::failed(job, message, aux_logs))
            .await
        {
            warn!(
                "Failed to report failure of job {}: {}",
                job.request.job_id, e
            );
        }
    }
}

/// Reporter that forwards every event to several reporters in order
///
/// Log path suggestions come from the first reporter.
#[derive(Clone, Default)]
pub struct CompositeReporter {
    reporters: Vec<Arc<dyn JobReporter>>,
}

impl CompositeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn JobReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

#[async_trait]
impl JobReporter for CompositeReporter {
    async fn report_submission(&self, job: &SubmittedJobInfo) {
        for reporter in &self.reporters {
            reporter.report_submission(job).await;
        }
    }

    async fn report_success(&self, job: &SubmittedJobInfo) {
        for reporter in &self.reporters {
            reporter.report_success(job).await;
        }
    }

    async fn report_failure(&self, job: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]) {
        for reporter in &self.reporters {
            reporter.report_failure(job, message, aux_logs).await;
        }
    }

    fn suggest_log_file_path(&self, request: &JobRequest, base_dir: &Path) -> PathBuf {
        match self.reporters.first() {
            Some(reporter) => reporter.suggest_log_file_path(request, base_dir),
            None => TracingReporter.suggest_log_file_path(request, base_dir),
        }
    }
}
