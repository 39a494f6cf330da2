//! Job lifecycle reporting endpoints

use crate::EngineClient;
use crate::error::Result;
use relay_core::dto::job::{CompletionEvent, CompletionStatus, SubmissionEvent};
use tracing::debug;

impl EngineClient {
    /// Report that a job was accepted by the backend
    pub async fn report_submitted(&self, event: &SubmissionEvent) -> Result<()> {
        let url = format!("{}/api/jobs/{}/submitted", self.base_url, event.job_id);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(event).send().await?;

        self.handle_empty_response(response).await
    }

    /// Report a terminal outcome
    ///
    /// The endpoint is chosen from the event status (`succeeded` or `failed`).
    pub async fn report_completed(&self, event: &CompletionEvent) -> Result<()> {
        let url = format!(
            "{}/api/jobs/{}/{}",
            self.base_url,
            event.job_id,
            completion_path(event.status)
        );
        debug!("POST {}", url);
        let response = self.client.post(&url).json(event).send().await?;

        self.handle_empty_response(response).await
    }
}

fn completion_path(status: CompletionStatus) -> &'static str {
    match status {
        CompletionStatus::Succeeded => "succeeded",
        CompletionStatus::Failed => "failed",
    }
}
