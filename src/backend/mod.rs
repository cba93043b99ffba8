use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Snapshot, WorkReceipt};

pub mod http;
pub use http::HttpBackend;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {status}{}", detail(.message))]
    Api {
        status: u16,
        message: Option<String>,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl BackendError {
    /// Text for the activity log: the server's own error message when it sent
    /// one, otherwise the transport error.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// The routing server, as seen by the dashboard.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Succeeds only when the server answers `GET /health` with 200.
    async fn health(&self) -> Result<(), BackendError>;

    /// Fetches and decodes one snapshot from the configured endpoint.
    async fn fetch_snapshot(&self) -> Result<Snapshot, BackendError>;

    /// Submits one unit of work with the given intensity.
    async fn submit_work(&self, intensity: u32) -> Result<WorkReceipt, BackendError>;
}
