//! Helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use relay_core::domain::submission::SubmittedJobInfo;
use relay_executor::JobReporter;
use relay_executor::RemoteExecutor;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Submitted(u64),
    Succeeded(u64),
    Failed(u64, String, Vec<PathBuf>),
}

/// Reporter that keeps every event in memory
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobReporter for Recorder {
    async fn report_submission(&self, job: &SubmittedJobInfo) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Submitted(job.request.job_id));
    }

    async fn report_success(&self, job: &SubmittedJobInfo) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Succeeded(job.request.job_id));
    }

    async fn report_failure(&self, job: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]) {
        self.events.lock().unwrap().push(Event::Failed(
            job.request.job_id,
            message.to_string(),
            aux_logs.to_vec(),
        ));
    }
}

/// Polls until every job finished, failing the test after `limit`
pub async fn drain(executor: &mut RemoteExecutor, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while executor.has_active_jobs() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "jobs still active after {:?}",
            limit
        );
        executor.check_active_jobs().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
