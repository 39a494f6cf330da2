//! Relay Engine Client
//!
//! A small, type-safe HTTP client for workflow engines that accept job
//! lifecycle reports over HTTP.
//!
//! The executor uses it to forward submission and completion events when an
//! engine URL is configured.
//!
//! # Example
//!
//! ```no_run
//! use relay_client::EngineClient;
//! use relay_core::domain::job::JobRequest;
//! use relay_core::domain::submission::{AuxData, SubmittedJobInfo};
//! use relay_core::dto::job::SubmissionEvent;
//!
//! #[tokio::main]
//! async fn main() -> relay_client::Result<()> {
//!     let client = EngineClient::new("http://localhost:8080");
//!
//!     let info = SubmittedJobInfo::new(
//!         JobRequest::new(1, "hello", "echo hi"),
//!         "42",
//!         AuxData { log_file: "/tmp/hello.log".into() },
//!     );
//!     client.report_submitted(&SubmissionEvent::from(&info)).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

pub use error::{ClientError, Result};

use reqwest::Client;

/// HTTP client for a workflow engine's reporting API
#[derive(Debug, Clone)]
pub struct EngineClient {
    /// Base URL of the engine (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl EngineClient {
    /// Create a new engine client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the engine API (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new engine client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use relay_client::EngineClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = EngineClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the engine
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle a response that carries no body worth reading
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
