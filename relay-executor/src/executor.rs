//! Remote executor
//!
//! The facade the host engine drives. It owns the backend, the reporter and
//! the collection of in-flight jobs; the host calls [`RemoteExecutor::run_job`]
//! for new work and [`RemoteExecutor::check_active_jobs`] once per cycle.

use relay_core::domain::job::JobRequest;
use relay_core::domain::submission::SubmittedJobInfo;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::config::ExecutorSettings;
use crate::descriptor::DescriptorBuilder;
use crate::error::Result;
use crate::registry::ExecutorRegistry;
use crate::scheduler::{PollSummary, StatusPoller};
use crate::service::{CancelSummary, JobReporter, SubmissionGateway, SubmittedJob, cancel_jobs};

/// Runs engine jobs on a remote backend
pub struct RemoteExecutor {
    settings: ExecutorSettings,
    backend: Box<dyn Backend>,
    reporter: Arc<dyn JobReporter>,
    gateway: SubmissionGateway,
    poller: StatusPoller,
    active: Vec<SubmittedJob>,
}

impl RemoteExecutor {
    /// Creates an executor around an already connected backend
    pub fn new(
        settings: ExecutorSettings,
        backend: Box<dyn Backend>,
        reporter: Arc<dyn JobReporter>,
    ) -> Result<Self> {
        settings.validate()?;

        let builder = DescriptorBuilder::new(&settings)?;
        let log_dir = settings.clone().with_workdir(builder.workdir()).log_dir();
        debug!("Job logs go to {}", log_dir.display());

        let poller = StatusPoller::new(backend.name());
        Ok(Self {
            settings,
            backend,
            reporter,
            gateway: SubmissionGateway::new(builder, log_dir),
            poller,
            active: Vec::new(),
        })
    }

    /// Connects the backend named in `settings` and creates an executor
    pub async fn create(
        registry: &ExecutorRegistry,
        settings: ExecutorSettings,
        reporter: Arc<dyn JobReporter>,
    ) -> Result<Self> {
        let backend = registry.create(&settings).await?;
        Self::new(settings, backend, reporter)
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Submits a job and starts tracking it
    ///
    /// The submission has been reported by the time this returns.
    pub async fn run_job(&mut self, request: JobRequest) -> Result<SubmittedJobInfo> {
        let job = self
            .gateway
            .submit(self.backend.as_ref(), self.reporter.as_ref(), request)
            .await?;

        info!(
            "Job {} submitted to {} as {}",
            job.info.request.job_id,
            self.backend.name(),
            job.external_id()
        );

        let info = job.info.clone();
        self.active.push(job);
        Ok(info)
    }

    /// Runs one polling cycle over every tracked job
    pub async fn check_active_jobs(&mut self) -> PollSummary {
        let jobs = std::mem::take(&mut self.active);
        let (still_active, summary) = self
            .poller
            .check_active_jobs(jobs, self.reporter.as_ref())
            .await;
        self.active = still_active;

        if summary.finished() > 0 {
            debug!(
                "Poll cycle: {} succeeded, {} failed, {} active",
                summary.succeeded, summary.failed, summary.active
            );
        }
        summary
    }

    /// Cancels every unfinished job and closes the backend
    ///
    /// Tracking is cleared afterwards; cancelled jobs are not reported.
    pub async fn cancel_jobs(&mut self) -> CancelSummary {
        let jobs = std::mem::take(&mut self.active);
        info!("Cancelling {} tracked job(s)", jobs.len());
        cancel_jobs(self.backend.as_ref(), jobs).await
    }

    /// Tracked jobs, in submission order
    pub fn active_jobs(&self) -> impl Iterator<Item = &SubmittedJobInfo> {
        self.active.iter().map(|job| &job.info)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn has_active_jobs(&self) -> bool {
        !self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, FetchError};
    use crate::error::ExecutorError;
    use crate::testing::{RecordingReporter, ReportEvent, ScriptedBackend};
    use std::time::Duration;

    fn executor(
        workdir: &std::path::Path,
        backend: &ScriptedBackend,
    ) -> (RemoteExecutor, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::default());
        let settings = ExecutorSettings::new("scripted")
            .with_workdir(workdir)
            .with_namespace("test");
        let executor =
            RemoteExecutor::new(settings, Box::new(backend.clone()), reporter.clone()).unwrap();
        (executor, reporter)
    }

    #[tokio::test]
    async fn test_echo_job_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();
        let (mut executor, reporter) = executor(dir.path(), &backend);
        backend.queue_id("42");

        let request = JobRequest::new(1, "hello", "echo hi").with_threads(2);
        let info = executor.run_job(request).await.unwrap();

        let spec = &backend.submitted()[0];
        assert_eq!(spec.argv, vec!["echo", "hi"]);
        assert_eq!(spec.cpus_per_task, 2);
        assert_eq!(spec.duration, Duration::ZERO);
        assert_eq!(spec.name, "relayjob-test-hello-1");
        assert_eq!(info.external_id, "42");
        assert_eq!(reporter.events(), vec![ReportEvent::Submitted("42".to_string())]);

        let summary = executor.check_active_jobs().await;
        assert_eq!(summary.active, 1);
        assert!(executor.has_active_jobs());

        backend.finish("42", Ok(0));
        let summary = executor.check_active_jobs().await;

        assert_eq!(summary.succeeded, 1);
        assert!(!executor.has_active_jobs());
        assert_eq!(
            reporter.events(),
            vec![
                ReportEvent::Submitted("42".to_string()),
                ReportEvent::Succeeded("42".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_log_dir_is_backend_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();
        let (mut executor, _reporter) = executor(dir.path(), &backend);

        let info = executor
            .run_job(JobRequest::new(9, "align", "bwa mem ref.fa reads.fq"))
            .await
            .unwrap();

        let workdir = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(
            info.aux.log_file,
            workdir.join(".relay/scripted_logs/align/9.log")
        );
    }

    #[tokio::test]
    async fn test_cancel_clears_tracking_and_closes_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();
        let (mut executor, reporter) = executor(dir.path(), &backend);

        executor
            .run_job(JobRequest::new(1, "a", "sleep 60"))
            .await
            .unwrap();
        executor
            .run_job(JobRequest::new(2, "b", "sleep 60"))
            .await
            .unwrap();
        backend.finish("2", Ok(0));

        let summary = executor.cancel_jobs().await;

        assert_eq!(summary.requested, 1);
        assert_eq!(backend.cancelled(), vec!["1"]);
        assert!(backend.is_closed());
        assert_eq!(executor.active_count(), 0);
        assert_eq!(reporter.terminal_count("1"), 0);

        let result = executor.run_job(JobRequest::new(3, "c", "true")).await;
        assert!(matches!(
            result,
            Err(ExecutorError::Backend(BackendError::Closed))
        ));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();
        let (mut executor, reporter) = executor(dir.path(), &backend);

        for job_id in 1..=3 {
            executor
                .run_job(JobRequest::new(job_id, "r", "true"))
                .await
                .unwrap();
        }
        backend.finish("1", Err(FetchError::Incomplete("canceled".into())));
        backend.finish("3", Ok(0));

        let summary = executor.check_active_jobs().await;

        assert_eq!(
            summary,
            PollSummary {
                active: 1,
                succeeded: 1,
                failed: 1
            }
        );
        let ids: Vec<&str> = executor
            .active_jobs()
            .map(|j| j.external_id.as_str())
            .collect();
        assert_eq!(ids, vec!["2"]);
        assert_eq!(reporter.terminal_count("1"), 1);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ExecutorSettings::new("scripted").with_workdir(dir.path());
        settings.poll_interval = Duration::ZERO;

        let result = RemoteExecutor::new(
            settings,
            Box::new(ScriptedBackend::new()),
            Arc::new(RecordingReporter::default()),
        );
        assert!(matches!(result, Err(ExecutorError::Config(_))));
    }
}
