//! Job event DTOs sent to the workflow engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::job::JobStatus;
use crate::domain::submission::SubmittedJobInfo;

/// Body of a submission report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionEvent {
    pub job_id: u64,
    pub rule: String,
    pub external_id: String,
    pub log_file: PathBuf,
    pub timestamp: DateTime<Utc>,
}

impl From<&SubmittedJobInfo> for SubmissionEvent {
    fn from(info: &SubmittedJobInfo) -> Self {
        Self {
            job_id: info.request.job_id,
            rule: info.request.rule.clone(),
            external_id: info.external_id.clone(),
            log_file: info.aux.log_file.clone(),
            timestamp: info.submitted_at,
        }
    }
}

/// Terminal state carried by a completion report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Succeeded,
    Failed,
}

impl From<CompletionStatus> for JobStatus {
    fn from(status: CompletionStatus) -> Self {
        match status {
            CompletionStatus::Succeeded => JobStatus::Succeeded,
            CompletionStatus::Failed => JobStatus::Failed,
        }
    }
}

/// Body of a terminal report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub job_id: u64,
    pub external_id: String,
    pub status: CompletionStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub aux_logs: Vec<PathBuf>,
    pub timestamp: DateTime<Utc>,
}

impl CompletionEvent {
    pub fn succeeded(info: &SubmittedJobInfo) -> Self {
        Self {
            job_id: info.request.job_id,
            external_id: info.external_id.clone(),
            status: CompletionStatus::Succeeded,
            message: None,
            aux_logs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(info: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]) -> Self {
        Self {
            job_id: info.request.job_id,
            external_id: info.external_id.clone(),
            status: CompletionStatus::Failed,
            message: Some(message.to_string()),
            aux_logs: aux_logs.to_vec(),
            timestamp: Utc::now(),
        }
    }
}
