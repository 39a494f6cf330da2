//! Local process backend
//!
//! Runs each job as a child process of the host. Used when no Flux instance
//! is available, and by tests that need real processes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info};

use super::{Backend, BackendError, FetchError, JobSpec, RemoteHandle};

/// Delay between exit checks while waiting for a result
const EXIT_RECHECK: Duration = Duration::from_millis(50);

type SharedChild = Arc<Mutex<Child>>;

/// Handle for a local child process
pub struct LocalHandle {
    id: String,
    child: SharedChild,
}

impl LocalHandle {
    /// Checks the child without blocking
    fn try_exit(&self) -> Result<Option<std::process::ExitStatus>, BackendError> {
        let mut child = self
            .child
            .lock()
            .map_err(|_| BackendError::Parse("child process lock poisoned".to_string()))?;
        Ok(child.try_wait()?)
    }
}

#[async_trait]
impl RemoteHandle for LocalHandle {
    async fn is_done(&mut self) -> Result<bool, BackendError> {
        Ok(self.try_exit()?.is_some())
    }

    async fn fetch_result(&mut self, timeout: Duration) -> Result<i32, FetchError> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(status) = self.try_exit()? {
                // No code means the process was killed by a signal
                return status.code().ok_or_else(|| {
                    FetchError::Incomplete(format!("process terminated by signal ({})", status))
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(FetchError::NotReady);
            }

            tokio::time::sleep(EXIT_RECHECK.min(deadline - now)).await;
        }
    }

    fn identifier(&self) -> &str {
        &self.id
    }
}

/// Backend that runs jobs on the local machine
///
/// Identifiers are sequential and never reused. The backend keeps only weak
/// references to children, so a child whose handle was dropped can no
/// longer be cancelled through it.
pub struct LocalBackend {
    next_id: AtomicU64,
    children: Mutex<HashMap<String, Weak<Mutex<Child>>>>,
    closed: AtomicBool,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            children: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn submit(&self, spec: JobSpec) -> Result<Box<dyn RemoteHandle>, BackendError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }

        let (program, args) = spec
            .argv
            .split_first()
            .ok_or_else(|| BackendError::Parse("empty command".to_string()))?;

        let stderr = if spec.stderr.as_os_str().is_empty() {
            Stdio::null()
        } else {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&spec.stderr)?
                .into()
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr);

        if !spec.environment.is_empty() {
            command.env_clear().envs(&spec.environment);
        }

        let child = command.spawn()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let child = Arc::new(Mutex::new(child));

        let mut children = self
            .children
            .lock()
            .map_err(|_| BackendError::Parse("child registry lock poisoned".to_string()))?;
        // Handles dropped by the executor leave dead entries behind
        children.retain(|_, weak| weak.strong_count() > 0);
        children.insert(id.clone(), Arc::downgrade(&child));
        drop(children);

        info!("Started local job {} ({})", id, spec.name);
        Ok(Box::new(LocalHandle { id, child }))
    }

    async fn cancel(&self, identifier: &str) -> Result<(), BackendError> {
        let child = self
            .children
            .lock()
            .map_err(|_| BackendError::Parse("child registry lock poisoned".to_string()))?
            .remove(identifier)
            .and_then(|weak| weak.upgrade())
            .ok_or_else(|| BackendError::UnknownJob(identifier.to_string()))?;

        child
            .lock()
            .map_err(|_| BackendError::Parse("child process lock poisoned".to_string()))?
            .start_kill()?;

        info!("Killed local job {}", identifier);
        Ok(())
    }

    async fn close(&self) -> Result<(), BackendError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closed local backend");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> JobSpec {
        JobSpec::from_command(vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
        ])
    }

    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let backend = LocalBackend::new();
        let mut handle = backend.submit(sh("exit 3")).await.unwrap();

        let code = handle.fetch_result(Duration::from_secs(10)).await;
        assert_eq!(code, Ok(3));
        assert!(handle.is_done().await.unwrap());
    }

    #[tokio::test]
    async fn test_identifiers_are_sequential() {
        let backend = LocalBackend::new();
        let first = backend.submit(sh("true")).await.unwrap();
        let second = backend.submit(sh("true")).await.unwrap();

        assert_eq!(first.identifier(), "1");
        assert_eq!(second.identifier(), "2");
    }

    #[tokio::test]
    async fn test_dropped_handles_are_forgotten() {
        let backend = LocalBackend::new();
        let first = backend.submit(sh("true")).await.unwrap();
        drop(first);
        let second = backend.submit(sh("true")).await.unwrap();

        let children = backend.children.lock().unwrap();
        assert_eq!(children.len(), 1);
        assert!(children.contains_key(second.identifier()));
    }

    #[tokio::test]
    async fn test_running_job_is_not_ready() {
        let backend = LocalBackend::new();
        let mut handle = backend.submit(sh("sleep 30")).await.unwrap();

        assert!(!handle.is_done().await.unwrap());
        assert_eq!(
            handle.fetch_result(Duration::ZERO).await,
            Err(FetchError::NotReady)
        );

        backend.cancel(handle.identifier()).await.unwrap();
        let result = handle.fetch_result(Duration::from_secs(10)).await;
        assert!(matches!(result, Err(FetchError::Incomplete(_))));
    }

    #[tokio::test]
    async fn test_cancel_unknown_job() {
        let backend = LocalBackend::new();
        let result = backend.cancel("99").await;
        assert!(matches!(result, Err(BackendError::UnknownJob(_))));
    }

    #[tokio::test]
    async fn test_submit_after_close_fails() {
        let backend = LocalBackend::new();
        backend.close().await.unwrap();

        let result = backend.submit(sh("true")).await;
        assert!(matches!(result, Err(BackendError::Closed)));
    }
}
