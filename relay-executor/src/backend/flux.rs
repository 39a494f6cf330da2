//! Flux backend
//!
//! Drives a running Flux instance through its command-line tools:
//! - Checking that `flux` is installed and an instance is reachable
//! - Submitting jobs with `flux submit`
//! - Querying job state with `flux jobs`
//! - Cancelling jobs with `flux cancel`

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{Backend, BackendError, FetchError, JobSpec, RemoteHandle};

/// Output format used for status queries
const STATUS_FORMAT: &str = "{state}|{result}|{returncode}";

/// Delay between status queries while waiting for a result
const STATUS_RECHECK: Duration = Duration::from_millis(500);

/// Checks that the flux tools are installed and an instance is reachable
///
/// # Returns
/// The first line of `flux --version`
pub async fn check_flux_available(program: &Path) -> Result<String, BackendError> {
    let output = Command::new(program)
        .arg("--version")
        .output()
        .await
        .map_err(|e| {
            BackendError::Unavailable(format!(
                "Failed to execute '{} --version': {}. Are the flux tools installed?",
                program.display(),
                e
            ))
        })?;

    if !output.status.success() {
        return Err(BackendError::Unavailable(
            "flux is not working correctly".to_string(),
        ));
    }

    let version = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    // getattr only succeeds when connected to an instance
    let output = Command::new(program)
        .args(["getattr", "rank"])
        .output()
        .await
        .map_err(|e| BackendError::Unavailable(format!("Failed to query flux instance: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BackendError::Unavailable(format!(
            "Cannot connect to a Flux instance: {}",
            stderr.trim()
        )));
    }

    info!("Flux is available: {}", version);
    Ok(version)
}

/// Builds the `flux submit` argument list for a spec
pub fn submit_args(spec: &JobSpec) -> Vec<String> {
    let mut args = vec![
        "submit".to_string(),
        format!("--job-name={}", spec.name),
        format!("--cwd={}", spec.cwd.display()),
    ];

    if !spec.stderr.as_os_str().is_empty() {
        args.push(format!("--error={}", spec.stderr.display()));
    }

    args.push("--ntasks=1".to_string());
    args.push(format!("--cores-per-task={}", spec.cpus_per_task));

    // No time limit means unlimited
    if !spec.duration.is_zero() {
        args.push(format!("--time-limit={}s", spec.duration.as_secs()));
    }

    args.push("--".to_string());
    args.extend(spec.argv.iter().cloned());
    args
}

/// Runs a flux subcommand and returns its stdout
///
/// When `env` is given the child sees exactly that environment.
async fn run_flux(
    program: &Path,
    args: &[String],
    env: Option<&BTreeMap<String, String>>,
) -> Result<String, BackendError> {
    let mut command = Command::new(program);
    command.args(args);

    if let Some(env) = env {
        command.env_clear().envs(env);
    }

    let output = command.output().await?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(BackendError::CommandFailed {
            command: format!(
                "flux {}",
                args.first().map(String::as_str).unwrap_or_default()
            ),
            code: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    if !stderr.trim().is_empty() {
        debug!("flux stderr: {}", stderr.trim());
    }

    Ok(stdout)
}

/// Whether `flux jobs` stderr says the job id is not known
fn is_unknown_job(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("unknown job") || stderr.contains("jobid not found")
}

/// One line of `flux jobs` output in [`STATUS_FORMAT`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxJobStatus {
    pub state: String,
    pub result: Option<String>,
    pub returncode: Option<i32>,
}

impl FluxJobStatus {
    pub fn parse(line: &str) -> Result<Self, BackendError> {
        let mut fields = line.trim().split('|').map(str::trim);

        let state = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BackendError::Parse(format!("empty status line '{}'", line)))?
            .to_string();

        let result = fields
            .next()
            .filter(|s| !s.is_empty() && *s != "-")
            .map(str::to_string);

        let returncode = match fields.next().filter(|s| !s.is_empty() && *s != "-") {
            Some(code) => Some(code.parse::<i32>().map_err(|_| {
                BackendError::Parse(format!("invalid return code '{}'", code))
            })?),
            None => None,
        };

        Ok(Self {
            state,
            result,
            returncode,
        })
    }

    /// Inactive jobs will never change state again
    pub fn is_inactive(&self) -> bool {
        self.state == "INACTIVE"
    }

    /// Exit code of an inactive job
    pub fn exit_code(&self) -> Result<i32, FetchError> {
        match (self.result.as_deref(), self.returncode) {
            (Some("CANCELED"), _) => Err(FetchError::Incomplete("job was canceled".to_string())),
            (_, Some(code)) => Ok(code),
            (result, None) => Err(FetchError::Incomplete(format!(
                "job ended with result {} and no exit code",
                result.unwrap_or("UNKNOWN")
            ))),
        }
    }
}

/// Handle for a job submitted to Flux
pub struct FluxHandle {
    program: PathBuf,
    jobid: String,
    last_status: Option<FluxJobStatus>,
}

impl FluxHandle {
    fn new(program: PathBuf, jobid: String) -> Self {
        Self {
            program,
            jobid,
            last_status: None,
        }
    }

    async fn refresh(&mut self) -> Result<&FluxJobStatus, BackendError> {
        let args = vec![
            "jobs".to_string(),
            "--no-header".to_string(),
            format!("--format={}", STATUS_FORMAT),
            self.jobid.clone(),
        ];

        let stdout = match run_flux(&self.program, &args, None).await {
            Ok(stdout) => stdout,
            Err(BackendError::CommandFailed { stderr, .. }) if is_unknown_job(&stderr) => {
                return Err(BackendError::UnknownJob(self.jobid.clone()));
            }
            Err(e) => return Err(e),
        };

        // Purged jobs produce no line at all
        let Some(line) = stdout.lines().find(|line| !line.trim().is_empty()) else {
            return Err(BackendError::UnknownJob(self.jobid.clone()));
        };
        let status = FluxJobStatus::parse(line)?;

        debug!("Flux job {} is {}", self.jobid, status.state);
        Ok(self.last_status.insert(status))
    }
}

#[async_trait]
impl RemoteHandle for FluxHandle {
    async fn is_done(&mut self) -> Result<bool, BackendError> {
        if self
            .last_status
            .as_ref()
            .is_some_and(FluxJobStatus::is_inactive)
        {
            return Ok(true);
        }

        Ok(self.refresh().await?.is_inactive())
    }

    async fn fetch_result(&mut self, timeout: Duration) -> Result<i32, FetchError> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.is_done().await? {
                return match &self.last_status {
                    Some(status) => status.exit_code(),
                    None => Err(FetchError::NotReady),
                };
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(FetchError::NotReady);
            }

            tokio::time::sleep(STATUS_RECHECK.min(deadline - now)).await;
        }
    }

    fn identifier(&self) -> &str {
        &self.jobid
    }
}

/// Backend that submits jobs to a Flux instance
pub struct FluxBackend {
    program: PathBuf,
    closed: AtomicBool,
}

impl FluxBackend {
    /// Connects using the `flux` found on `PATH`
    pub async fn connect() -> Result<Self, BackendError> {
        Self::with_program("flux").await
    }

    /// Connects using a specific `flux` executable
    pub async fn with_program(program: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let program = program.into();
        check_flux_available(&program).await?;

        Ok(Self {
            program,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FluxBackend {
    fn name(&self) -> &str {
        "flux"
    }

    async fn submit(&self, spec: JobSpec) -> Result<Box<dyn RemoteHandle>, BackendError> {
        self.ensure_open()?;

        let args = submit_args(&spec);
        debug!("flux {}", args.join(" "));

        let env = (!spec.environment.is_empty()).then_some(&spec.environment);
        let stdout = run_flux(&self.program, &args, env).await?;

        let jobid = stdout.trim().to_string();
        if jobid.is_empty() {
            return Err(BackendError::Parse(
                "flux submit printed no job id".to_string(),
            ));
        }

        info!("Submitted flux job {} ({})", jobid, spec.name);
        Ok(Box::new(FluxHandle::new(self.program.clone(), jobid)))
    }

    async fn cancel(&self, identifier: &str) -> Result<(), BackendError> {
        self.ensure_open()?;

        let args = vec!["cancel".to_string(), identifier.to_string()];
        run_flux(&self.program, &args, None).await?;

        info!("Requested cancellation of flux job {}", identifier);
        Ok(())
    }

    async fn close(&self) -> Result<(), BackendError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closed flux client");
        }
        Ok(())
    }
}
