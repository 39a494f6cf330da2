//! Configuration module
//!
//! Merges command-line flags over the environment-derived executor settings.

use anyhow::{Context, Result};
use relay_executor::ExecutorSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Settings given on the command line; unset fields keep their env/default value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub workdir: Option<PathBuf>,
    pub log_root: Option<PathBuf>,
    pub namespace: Option<String>,
    /// Replaces the configured list when non-empty
    pub envvars: Vec<String>,
    pub engine_url: Option<String>,
    pub poll_interval: Option<u64>,
    pub init_delay: Option<u64>,
    pub flux_bin: Option<PathBuf>,
}

impl Overrides {
    /// Applies the overrides to `settings`
    pub fn apply(&self, mut settings: ExecutorSettings) -> ExecutorSettings {
        if let Some(backend) = &self.backend {
            settings.backend = backend.clone();
        }
        if let Some(workdir) = &self.workdir {
            settings.workdir = workdir.clone();
        }
        if let Some(root) = &self.log_root {
            settings.log_root = root.clone();
        }
        if let Some(namespace) = &self.namespace {
            settings.namespace = namespace.clone();
        }
        let envvars: Vec<String> = self
            .envvars
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if !envvars.is_empty() {
            settings.envvars = envvars;
        }
        if let Some(url) = &self.engine_url {
            settings.engine_url = Some(url.clone());
        }
        if let Some(secs) = self.poll_interval {
            settings.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.init_delay {
            settings.init_delay = Duration::from_secs(secs);
        }
        if let Some(program) = &self.flux_bin {
            settings.flux_program = program.clone();
        }
        settings
    }
}

/// Loads executor settings from the environment, then applies `overrides`
pub fn load_settings(overrides: &Overrides) -> Result<ExecutorSettings> {
    let settings = ExecutorSettings::from_env().context("Failed to read executor settings")?;
    let settings = overrides.apply(settings);
    settings.validate().context("Invalid executor settings")?;
    Ok(settings)
}
