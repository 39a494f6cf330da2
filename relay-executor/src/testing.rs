//! Test doubles shared by the unit tests

use async_trait::async_trait;
use relay_core::domain::submission::SubmittedJobInfo;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{Backend, BackendError, FetchError, JobSpec, RemoteHandle};
use crate::service::JobReporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Submitted(String),
    Succeeded(String),
    Failed(String, String),
}

/// Reporter that records every call
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
    aux_logs: Mutex<Vec<Vec<PathBuf>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Aux logs of every failure report, in order
    pub fn failure_logs(&self) -> Vec<Vec<PathBuf>> {
        self.aux_logs.lock().unwrap().clone()
    }

    pub fn terminal_count(&self, external_id: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| match event {
                ReportEvent::Succeeded(id) | ReportEvent::Failed(id, _) => id == external_id,
                ReportEvent::Submitted(_) => false,
            })
            .count()
    }
}

#[async_trait]
impl JobReporter for RecordingReporter {
    async fn report_submission(&self, job: &SubmittedJobInfo) {
        self.events
            .lock()
            .unwrap()
            .push(ReportEvent::Submitted(job.external_id.clone()));
    }

    async fn report_success(&self, job: &SubmittedJobInfo) {
        self.events
            .lock()
            .unwrap()
            .push(ReportEvent::Succeeded(job.external_id.clone()));
    }

    async fn report_failure(&self, job: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]) {
        self.events.lock().unwrap().push(ReportEvent::Failed(
            job.external_id.clone(),
            message.to_string(),
        ));
        self.aux_logs.lock().unwrap().push(aux_logs.to_vec());
    }
}

/// Scripted state of one job
#[derive(Debug, Clone)]
struct Script {
    done: bool,
    result: Result<i32, FetchError>,
    status_error: bool,
    lost: bool,
}

#[derive(Default)]
struct ScriptedState {
    scripts: HashMap<String, Script>,
    queued_ids: VecDeque<String>,
    submitted: Vec<JobSpec>,
    cancelled: Vec<String>,
    counter: u64,
    closed: bool,
}

/// Backend whose jobs change state only when a test says so
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next submission receives `id`
    pub fn queue_id(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .queued_ids
            .push_back(id.to_string());
    }

    /// Marks a job as finished with `result`
    pub fn finish(&self, id: &str, result: Result<i32, FetchError>) {
        let mut state = self.state.lock().unwrap();
        let script = state.scripts.get_mut(id).expect("unknown scripted job");
        script.done = true;
        script.result = result;
    }

    /// Makes status queries for a job fail
    pub fn break_status(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .scripts
            .get_mut(id)
            .expect("unknown scripted job")
            .status_error = true;
    }

    /// Makes the backend forget a job
    pub fn lose(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.scripts.get_mut(id).expect("unknown scripted job").lost = true;
    }

    pub fn submitted(&self) -> Vec<JobSpec> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(&self, spec: JobSpec) -> Result<Box<dyn RemoteHandle>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(BackendError::Closed);
        }

        state.counter += 1;
        let id = match state.queued_ids.pop_front() {
            Some(id) => id,
            None => state.counter.to_string(),
        };

        // A reused identifier shares the script of the first job
        state.scripts.entry(id.clone()).or_insert(Script {
            done: false,
            result: Err(FetchError::NotReady),
            status_error: false,
            lost: false,
        });
        state.submitted.push(spec);

        Ok(Box::new(ScriptedHandle {
            id,
            state: Arc::clone(&self.state),
        }))
    }

    async fn cancel(&self, identifier: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.cancelled.push(identifier.to_string());
        match state.scripts.get(identifier) {
            Some(script) if script.status_error => {
                Err(BackendError::UnknownJob(identifier.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

struct ScriptedHandle {
    id: String,
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedHandle {
    fn script(&self) -> Script {
        self.state.lock().unwrap().scripts[&self.id].clone()
    }
}

#[async_trait]
impl RemoteHandle for ScriptedHandle {
    async fn is_done(&mut self) -> Result<bool, BackendError> {
        let script = self.script();
        if script.lost {
            return Err(BackendError::UnknownJob(self.id.clone()));
        }
        if script.status_error {
            return Err(BackendError::Parse("scripted status failure".to_string()));
        }
        Ok(script.done)
    }

    async fn fetch_result(&mut self, _timeout: Duration) -> Result<i32, FetchError> {
        let script = self.script();
        if !script.done {
            return Err(FetchError::NotReady);
        }
        script.result
    }

    fn identifier(&self) -> &str {
        &self.id
    }
}
