use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::PipelineError;

/// Downloads document bytes over HTTP with a bounded wait. Non-2xx
/// responses and transport errors are both fetch failures.
pub struct DocumentFetcher {
    client: reqwest::Client,
}

impl DocumentFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        tracing::debug!(url = %url, "fetching document");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Fetch(format!("download of {} timed out", url))
            } else {
                PipelineError::Fetch(format!("download of {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Fetch(format!(
                "download of {} returned HTTP {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Fetch(format!("failed to read body of {}: {}", url, e)))?;

        tracing::debug!(url = %url, bytes = bytes.len(), "document downloaded");
        Ok(bytes.to_vec())
    }
}
