//! Gradio prediction API plumbing
//!
//! Every remote backend in this pipeline is a hosted Gradio space. This
//! client covers the slice of the prediction API the adapters need: posting
//! a positional data payload to an endpoint and resolving server-side file
//! references to fetchable URLs.

use crate::models::{GradioFile, PredictRequest, PredictResponse};
use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Generation on a shared space can sit in a queue for a while before the
/// actual inference even starts.
const PREDICT_TIMEOUT: Duration = Duration::from_secs(300);

/// How a prediction endpoint is addressed on a space.
#[derive(Debug, Clone, Copy)]
pub enum PredictRoute {
    FnIndex(u32),
    ApiName(&'static str),
}

pub struct GradioClient {
    client: Client,
    base_url: String,
    hf_token: Option<String>,
}

impl GradioClient {
    pub fn new(base_url: String, hf_token: Option<String>) -> Self {
        Self::new_with_client(base_url, hf_token, Client::new())
    }

    pub fn new_with_client(base_url: String, hf_token: Option<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hf_token,
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.hf_token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Invoke a prediction endpoint with a positional data payload.
    pub async fn predict(&self, route: PredictRoute, data: Vec<Value>) -> Result<Vec<Value>> {
        let (url, fn_index) = match route {
            PredictRoute::FnIndex(index) => {
                (format!("{}/run/predict", self.base_url), Some(index))
            }
            PredictRoute::ApiName(name) => (
                format!("{}/run/{}", self.base_url, name.trim_start_matches('/')),
                None,
            ),
        };

        let request = PredictRequest { data, fn_index };
        let response = self
            .authorize(self.client.post(&url).timeout(PREDICT_TIMEOUT))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach space {}: {}", self.base_url, e);
                if e.is_timeout() {
                    Error::BackendInvocation(format!("{} timed out: {}", self.base_url, e))
                } else {
                    Error::BackendUnavailable(format!("{}: {}", self.base_url, e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            let error_text = response.text().await?;
            tracing::warn!("Space {} not ready: {}", self.base_url, error_text);
            return Err(Error::BackendNotReady(format!(
                "{}: {}",
                self.base_url, error_text
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await?;
            tracing::error!("Space {} error (status {}): {}", self.base_url, status, error_text);
            return Err(Error::BackendInvocation(format!(
                "{} (status {}): {}",
                self.base_url, status, error_text
            )));
        }

        let body = response.text().await?;
        let parsed: PredictResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse prediction response: {}\nBody: {}", e, body);
            Error::BackendInvocation(format!("unparseable prediction response: {}", e))
        })?;

        Ok(parsed.data)
    }

    /// Resolve a file name returned by the space to a fetchable URL.
    pub fn file_url(&self, name: &str) -> String {
        if name.starts_with("http://") || name.starts_with("https://") {
            name.to_string()
        } else {
            format!("{}/file={}", self.base_url, name)
        }
    }

    /// Resolve a component output value into a fetchable URL.
    ///
    /// File components return either a bare path string or a
    /// `{name, is_file}` object depending on the space's Gradio version.
    pub fn resolve_file(&self, value: &Value) -> Result<String> {
        if let Some(path) = value.as_str() {
            return Ok(self.file_url(path));
        }
        let file: GradioFile = serde_json::from_value(value.clone()).map_err(|_| {
            Error::BackendInvocation(format!("unexpected file reference: {}", value))
        })?;
        Ok(self.file_url(&file.name))
    }

    /// Fetch a space-hosted file into memory.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::BackendInvocation(format!(
                "download failed (status {}): {}",
                response.status(),
                url
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
