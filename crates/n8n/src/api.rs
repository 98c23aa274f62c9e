//! HTTP client for the n8n workflow engine.
//!
//! Wraps the engine's REST API (execution status, cancellation, listing)
//! plus the start webhook and resume URLs using [`reqwest`]. Nothing is
//! retried; callers decide how to surface a failure.

use reqwest::Url;
use serde_json::Value;

use crate::config::N8nConfig;
use crate::summary::{parse_execution_list, ExecutionSummary};

/// Header carrying the engine API key.
const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Header carrying the start webhook key.
const WEBHOOK_KEY_HEADER: &str = "X-API-Key";

/// Errors from the workflow engine client.
#[derive(Debug, thiserror::Error)]
pub enum N8nError {
    /// A setting needed for the call is missing.
    #[error("Workflow engine is not configured: missing {0}")]
    NotConfigured(&'static str),

    /// A URL could not be built from configuration or input.
    #[error("Invalid workflow engine URL: {0}")]
    InvalidUrl(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("Workflow engine error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Client for one workflow engine deployment.
#[derive(Clone)]
pub struct N8nApi {
    client: reqwest::Client,
    config: N8nConfig,
}

impl N8nApi {
    pub fn new(config: N8nConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch one execution including its run data.
    ///
    /// `GET {base}/api/v1/executions/{id}?includeData=true`
    pub async fn get_execution(&self, execution_id: &str) -> Result<Value, N8nError> {
        let url = self.execution_url(execution_id, None)?;
        tracing::debug!(execution_id, "Fetching execution from workflow engine");
        let response = self
            .client
            .get(url)
            .query(&[("includeData", "true")])
            .header(reqwest::header::ACCEPT, "application/json")
            .header(API_KEY_HEADER, self.api_key()?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ask the engine to stop an execution.
    ///
    /// `POST {base}/api/v1/executions/{id}/cancel`
    pub async fn cancel_execution(&self, execution_id: &str) -> Result<(), N8nError> {
        let url = self.execution_url(execution_id, Some("cancel"))?;
        tracing::debug!(execution_id, "Canceling execution on workflow engine");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key()?)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// List recent executions of a workflow without run data.
    ///
    /// `GET {base}/api/v1/executions?workflowId=..&limit=..&includeData=false`
    pub async fn list_executions(
        &self,
        workflow_id: &str,
        limit: i64,
    ) -> Result<Vec<ExecutionSummary>, N8nError> {
        let url = self.api_url()?;
        let limit = limit.to_string();
        let response = self
            .client
            .get(url)
            .query(&[
                ("workflowId", workflow_id),
                ("limit", limit.as_str()),
                ("includeData", "false"),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .header(API_KEY_HEADER, self.api_key()?)
            .send()
            .await?;

        let body = Self::parse_response(response).await?;
        Ok(parse_execution_list(&body))
    }

    /// Trigger the workflow through its start webhook.
    ///
    /// Returns the webhook's response body, which usually carries the new
    /// execution id under `executionId`, top-level or nested in `data`.
    pub async fn start_workflow(&self, payload: &Value) -> Result<Value, N8nError> {
        let url = self
            .config
            .webhook_url
            .as_deref()
            .ok_or(N8nError::NotConfigured("N8N_WEBHOOK_URL"))?;

        tracing::debug!("Triggering workflow start webhook");
        let response = self
            .client
            .post(url)
            .header(
                WEBHOOK_KEY_HEADER,
                self.config.webhook_api_key.as_deref().unwrap_or_default(),
            )
            .json(payload)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Post `body` to a resume URL handed out by a paused execution.
    pub async fn resume(&self, resume_url: &str, body: &Value) -> Result<Value, N8nError> {
        let url = Url::parse(resume_url).map_err(|e| N8nError::InvalidUrl(e.to_string()))?;
        tracing::debug!(%url, "Posting to resume URL");
        let response = self.client.post(url).json(body).send().await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn api_key(&self) -> Result<&str, N8nError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(N8nError::NotConfigured("N8N_API_KEY"))
    }

    /// `{base}/api/v1/executions`, ignoring trailing slashes on the base.
    fn api_url(&self) -> Result<Url, N8nError> {
        let base = self
            .config
            .api_base_url
            .as_deref()
            .ok_or(N8nError::NotConfigured("N8N_API_BASE_URL"))?;

        Url::parse(&format!("{}/api/v1/executions", base.trim_end_matches('/')))
            .map_err(|e| N8nError::InvalidUrl(e.to_string()))
    }

    /// `{base}/api/v1/executions/{id}[/{action}]` with the id path-encoded.
    fn execution_url(&self, execution_id: &str, action: Option<&str>) -> Result<Url, N8nError> {
        let mut url = self.api_url()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| N8nError::InvalidUrl("base URL cannot carry a path".into()))?;
            segments.push(execution_id);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    /// Ensure the response has a success status code, or turn it into an
    /// [`N8nError::ApiError`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, N8nError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(N8nError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Read a successful response body as JSON.
    ///
    /// Webhooks may answer with plain text; such bodies come back as a JSON
    /// string and an empty body as `null`.
    async fn parse_response(response: reqwest::Response) -> Result<Value, N8nError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), N8nError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
