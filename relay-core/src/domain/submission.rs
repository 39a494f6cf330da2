//! Submission records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::job::JobRequest;

/// Auxiliary metadata kept alongside a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxData {
    /// File receiving the job's standard error
    pub log_file: PathBuf,
}

/// What the engine learns about a job once the backend accepted it
///
/// This is the handle-free view of a tracked job; the executor keeps the
/// backend handle next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedJobInfo {
    pub request: JobRequest,

    /// Identifier assigned by the backend
    pub external_id: String,

    pub aux: AuxData,

    pub submitted_at: DateTime<Utc>,
}

impl SubmittedJobInfo {
    pub fn new(request: JobRequest, external_id: impl Into<String>, aux: AuxData) -> Self {
        Self {
            request,
            external_id: external_id.into(),
            aux,
            submitted_at: Utc::now(),
        }
    }

    /// Log paths attached to failure reports
    pub fn aux_logs(&self) -> Vec<PathBuf> {
        vec![self.aux.log_file.clone()]
    }
}
