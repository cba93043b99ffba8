use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{Backend, BackendError};
use crate::config::{Config, SnapshotSource};
use crate::types::{ErrorBody, GraphResponse, Snapshot, StatusResponse, WorkReceipt, WorkRequest};

/// [`Backend`] talking JSON over HTTP to the routing server.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    source: SnapshotSource,
    request_timeout: Duration,
    health_timeout: Duration,
    work_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            source: config.source,
            request_timeout: config.request_timeout(),
            health_timeout: config.health_timeout(),
            work_timeout: config.work_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(self.health_timeout)
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(BackendError::Api {
                status: response.status().as_u16(),
                message: None,
            });
        }
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, BackendError> {
        let url = self.url(self.source.path());
        debug!("Fetching snapshot from {}", url);
        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let snapshot: Snapshot = match self.source {
            SnapshotSource::Status => Self::decode::<StatusResponse>(response).await?.into(),
            SnapshotSource::Graph => Self::decode::<GraphResponse>(response).await?.into(),
        };
        Ok(snapshot)
    }

    async fn submit_work(&self, intensity: u32) -> Result<WorkReceipt, BackendError> {
        let response = self
            .client
            .post(self.url("/work"))
            .timeout(self.work_timeout)
            .json(&WorkRequest { intensity })
            .send()
            .await?;
        Self::decode(response).await
    }
}
