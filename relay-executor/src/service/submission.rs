//! Submission gateway
//!
//! Hands built specs to the backend and records what came back. Every
//! successful submission is reported upward exactly once, before control
//! returns to the caller.

use relay_core::domain::job::JobRequest;
use relay_core::domain::submission::{AuxData, SubmittedJobInfo};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, warn};

use crate::backend::{Backend, RemoteHandle};
use crate::descriptor::DescriptorBuilder;
use crate::error::{ExecutorError, Result};
use crate::service::JobReporter;

/// A job the backend accepted, together with its handle
pub struct SubmittedJob {
    pub info: SubmittedJobInfo,
    pub handle: Box<dyn RemoteHandle>,
}

impl SubmittedJob {
    pub fn external_id(&self) -> &str {
        &self.info.external_id
    }
}

/// Builds, submits and records jobs
pub struct SubmissionGateway {
    builder: DescriptorBuilder,
    log_dir: PathBuf,
    /// Every identifier handed out during this process lifetime
    seen_ids: HashSet<String>,
}

impl SubmissionGateway {
    /// Creates a gateway
    ///
    /// # Arguments
    /// * `builder` - Descriptor builder for job specs
    /// * `log_dir` - Base directory handed to the reporter for log paths
    pub fn new(builder: DescriptorBuilder, log_dir: PathBuf) -> Self {
        Self {
            builder,
            log_dir,
            seen_ids: HashSet::new(),
        }
    }

    /// Submits a job
    ///
    /// Fails without reporting if the spec cannot be built, the backend
    /// rejects it, or the backend reuses an identifier.
    pub async fn submit(
        &mut self,
        backend: &dyn Backend,
        reporter: &dyn JobReporter,
        request: JobRequest,
    ) -> Result<SubmittedJob> {
        let log_file = reporter.suggest_log_file_path(&request, &self.log_dir);
        let log_file = if log_file.is_absolute() {
            log_file
        } else {
            self.builder.workdir().join(log_file)
        };

        let spec = self.builder.build(backend, &request, &log_file)?;
        debug!("Submitting job {}: {:?}", request.job_id, spec.argv);

        let handle = backend.submit(spec).await?;
        let external_id = handle.identifier().to_string();

        if !self.seen_ids.insert(external_id.clone()) {
            error!(
                "Backend {} returned identifier {} twice",
                backend.name(),
                external_id
            );
            // The new job is untracked from here on
            if let Err(e) = backend.cancel(&external_id).await {
                warn!("Failed to cancel job {}: {}", external_id, e);
            }
            return Err(ExecutorError::DuplicateId(external_id));
        }

        let info = SubmittedJobInfo::new(request, external_id, AuxData { log_file });
        reporter.report_submission(&info).await;

        Ok(SubmittedJob { info, handle })
    }
}
