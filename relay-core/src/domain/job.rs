//! Job domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A unit of work handed over by the workflow engine
///
/// Immutable once submitted. Deserializable so that hosts can load job
/// lists from JSON; everything except the command has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Engine-side job number
    #[serde(default)]
    pub job_id: u64,

    /// Name of the workflow step this job belongs to
    #[serde(default = "default_rule")]
    pub rule: String,

    /// Full shell command line to execute
    pub command: String,

    /// Threads the engine allotted to the job
    #[serde(default = "default_threads")]
    pub threads: u32,

    #[serde(default)]
    pub resources: Resources,

    /// Extra environment variables declared by the engine
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl JobRequest {
    /// Creates a request with default resources
    pub fn new(job_id: u64, rule: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            job_id,
            rule: rule.into(),
            command: command.into(),
            threads: default_threads(),
            resources: Resources::default(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

fn default_rule() -> String {
    "job".to_string()
}

fn default_threads() -> u32 {
    1
}

/// Resource hints attached to a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Explicit CPU count, overriding `threads` when present
    #[serde(default)]
    pub cpus_per_task: Option<u32>,

    /// Wall-clock limit in minutes, 0 means unlimited
    #[serde(default)]
    pub runtime: u64,

    #[serde(default)]
    pub mem_mb: Option<u64>,

    #[serde(default)]
    pub disk_mb: Option<u64>,
}

/// Lifecycle status of a submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Returns true once no further transitions can occur
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Succeeded => write!(f, "Succeeded"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Classification of a job after one status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not finished yet, keep tracking
    Running,
    Succeeded,
    Failed {
        message: String,
        aux_logs: Vec<PathBuf>,
    },
}

impl Outcome {
    pub fn status(&self) -> JobStatus {
        match self {
            Outcome::Running => JobStatus::Running,
            Outcome::Succeeded => JobStatus::Succeeded,
            Outcome::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}
