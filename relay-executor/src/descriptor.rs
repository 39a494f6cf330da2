//! Job descriptor builder
//!
//! Translates an engine [`JobRequest`] into a backend [`JobSpec`]:
//! - Splits the command line into argv
//! - Pins the working directory
//! - Passes the full process environment plus engine-declared variables
//! - Converts resource hints (CPU count, wall-clock limit)
//! - Routes standard error into the job's log file

use relay_core::domain::job::JobRequest;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::{Backend, JobSpec};
use crate::config::ExecutorSettings;
use crate::error::{ExecutorError, Result};

/// Builds backend job specs from engine requests
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    workdir: PathBuf,
    namespace: String,
    envvars: Vec<String>,
}

impl DescriptorBuilder {
    /// Creates a builder from executor settings
    ///
    /// Fails if the working directory does not exist.
    pub fn new(settings: &ExecutorSettings) -> Result<Self> {
        let workdir = std::fs::canonicalize(&settings.workdir).map_err(|e| {
            ExecutorError::Config(format!(
                "working directory '{}' is not accessible: {}",
                settings.workdir.display(),
                e
            ))
        })?;

        Ok(Self {
            workdir,
            namespace: settings.namespace.clone(),
            envvars: settings.envvars.clone(),
        })
    }

    /// Canonical working directory
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Human readable, namespaced job name
    pub fn job_name(&self, request: &JobRequest) -> String {
        format!(
            "relayjob-{}-{}-{}",
            self.namespace, request.rule, request.job_id
        )
    }

    /// CPUs to request: the explicit override or the thread count, never below 1
    pub fn cpus_per_task(request: &JobRequest) -> u32 {
        request
            .resources
            .cpus_per_task
            .unwrap_or(request.threads)
            .max(1)
    }

    /// Wall-clock limit; zero stays zero and means unlimited
    pub fn duration(request: &JobRequest) -> Duration {
        Duration::from_secs(request.resources.runtime.saturating_mul(60))
    }

    /// Full process environment plus the request's extra variables
    pub fn environment(&self, request: &JobRequest) -> BTreeMap<String, String> {
        let mut environment: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(key, value)| {
                Some((key.into_string().ok()?, value.into_string().ok()?))
            })
            .collect();

        for name in &self.envvars {
            if !environment.contains_key(name) && !request.env.contains_key(name) {
                warn!("Declared environment variable {} is not set", name);
            }
        }

        environment.extend(
            request
                .env
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        environment
    }

    /// Builds the backend spec for a request
    ///
    /// Creates the parent directory of `log_file` if it is missing.
    pub fn build(
        &self,
        backend: &dyn Backend,
        request: &JobRequest,
        log_file: &Path,
    ) -> Result<JobSpec> {
        let argv = shlex::split(&request.command).ok_or_else(|| {
            ExecutorError::Build(format!("cannot split command '{}'", request.command))
        })?;

        if argv.is_empty() {
            return Err(ExecutorError::Build("command is empty".to_string()));
        }

        if !self.workdir.is_dir() {
            return Err(ExecutorError::Build(format!(
                "working directory '{}' does not exist",
                self.workdir.display()
            )));
        }

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // The backends have no memory or disk requests
        if request.resources.mem_mb.is_some() || request.resources.disk_mb.is_some() {
            debug!(
                "Ignoring mem_mb/disk_mb for job {}: not supported by {}",
                request.job_id,
                backend.name()
            );
        }

        let mut spec = backend.build_spec_from_command(argv);
        spec.name = self.job_name(request);
        spec.cwd = self.workdir.clone();
        spec.environment = self.environment(request);
        spec.cpus_per_task = Self::cpus_per_task(request);
        spec.duration = Self::duration(request);
        spec.stderr = log_file.to_path_buf();

        Ok(spec)
    }
}
