//! Elexon BMRS Insights Solution client.
//!
//! Fetches dataset payloads from the public `datasets/{NAME}` endpoints.
//! See: https://bmrs.elexon.co.uk/api-documentation

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;

use crate::errors::AppError;
use crate::models::Dataset;

/// Client for the Elexon BMRS dataset API.
#[derive(Debug, Clone)]
pub struct ElexonClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl ElexonClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    pub fn dataset_url(&self, dataset: Dataset) -> String {
        format!("{}/datasets/{}", self.base_url, dataset.name())
    }

    /// Fetch the raw response body for a dataset.
    ///
    /// Any transport error or non-2xx status is a `RetrievalFailure`; the
    /// body is not inspected here.
    pub async fn fetch_dataset_body(&self, dataset: Dataset) -> Result<Vec<u8>, AppError> {
        let url = self.dataset_url(dataset);
        let source_name = format!("remote {}", url);

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|e| AppError::InternalError(format!("Invalid User-Agent: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        tracing::debug!("Requesting {}", url);
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| AppError::retrieval(&source_name, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::retrieval(
                &source_name,
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::retrieval(&source_name, format!("body read failed: {}", e)))?;

        Ok(body.to_vec())
    }
}
