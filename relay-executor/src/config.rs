//! Executor settings
//!
//! Defines every configurable parameter of the executor: which backend to
//! use, where jobs run and log, and how often the host should poll.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ExecutorError, Result};

/// Executor settings
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Registered backend name (e.g., "flux", "local")
    pub backend: String,

    /// Working directory every job starts in
    pub workdir: PathBuf,

    /// Root for executor-owned files; relative paths are resolved against `workdir`
    pub log_root: PathBuf,

    /// Run namespace embedded in job names
    pub namespace: String,

    /// Environment variables the engine declared for remote jobs
    pub envvars: Vec<String>,

    /// How often the host should check active jobs
    pub poll_interval: Duration,

    /// Delay before the first status check
    pub init_delay: Duration,

    /// Workflow engine reporting API (e.g., "http://localhost:8080")
    pub engine_url: Option<String>,

    /// `flux` executable used by the Flux backend
    pub flux_program: PathBuf,
}

impl ExecutorSettings {
    /// Creates settings for a backend with defaults for everything else
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            workdir: PathBuf::from("."),
            log_root: PathBuf::from(".relay"),
            namespace: default_namespace(),
            envvars: Vec::new(),
            poll_interval: Duration::from_secs(10),
            init_delay: Duration::ZERO,
            engine_url: None,
            flux_program: PathBuf::from("flux"),
        }
    }

    /// Creates settings from environment variables
    ///
    /// Recognized environment variables (all optional):
    /// - RELAY_BACKEND (default: flux)
    /// - RELAY_WORKDIR (default: current directory)
    /// - RELAY_LOG_ROOT (default: .relay)
    /// - RELAY_NAMESPACE (default: random)
    /// - RELAY_ENVVARS (comma separated names)
    /// - RELAY_POLL_INTERVAL (seconds, default: 10)
    /// - RELAY_INIT_DELAY (seconds, default: 0)
    /// - RELAY_ENGINE_URL
    /// - RELAY_FLUX_BIN (default: flux)
    pub fn from_env() -> Result<Self> {
        let mut settings =
            Self::new(std::env::var("RELAY_BACKEND").unwrap_or_else(|_| "flux".to_string()));

        settings.workdir = match std::env::var("RELAY_WORKDIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()?,
        };

        if let Ok(root) = std::env::var("RELAY_LOG_ROOT") {
            settings.log_root = PathBuf::from(root);
        }

        if let Ok(namespace) = std::env::var("RELAY_NAMESPACE") {
            settings.namespace = namespace;
        }

        if let Ok(names) = std::env::var("RELAY_ENVVARS") {
            settings.envvars = parse_envvar_list(&names);
        }

        settings.poll_interval = std::env::var("RELAY_POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(settings.poll_interval);

        settings.init_delay = std::env::var("RELAY_INIT_DELAY")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(settings.init_delay);

        settings.engine_url = std::env::var("RELAY_ENGINE_URL").ok();

        if let Ok(program) = std::env::var("RELAY_FLUX_BIN") {
            settings.flux_program = PathBuf::from(program);
        }

        Ok(settings)
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Declares an environment variable that must reach every job
    pub fn with_envvar(mut self, name: impl Into<String>) -> Self {
        self.envvars.push(name.into());
        self
    }

    /// Directory handed to the reporter when it suggests log paths
    pub fn log_dir(&self) -> PathBuf {
        let root = if self.log_root.is_absolute() {
            self.log_root.clone()
        } else {
            self.workdir.join(&self.log_root)
        };
        root.join(format!("{}_logs", self.backend))
    }

    /// Validates the settings
    pub fn validate(&self) -> Result<()> {
        if self.backend.is_empty() {
            return Err(ExecutorError::Config("backend cannot be empty".to_string()));
        }

        if self.namespace.is_empty() || self.namespace.contains(char::is_whitespace) {
            return Err(ExecutorError::Config(
                "namespace must be a non-empty word".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ExecutorError::Config(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.engine_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ExecutorError::Config(
                    "engine_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::new("flux")
    }
}

fn default_namespace() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn parse_envvar_list(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
