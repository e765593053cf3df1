//! HTTP client for the pizza API, used by the offline sync agent.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client as HttpClient};
use serde_json::Value;

use crate::models::NewPizza;
use crate::offline_queue::OfflineQueue;

/// Why an upload did not land.
///
/// The sync coordinator treats every variant the same way (keep the queue,
/// log, wait for the next reconnect). [`submit`] only queues transient ones.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server rejected upload (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl UploadError {
    /// Worth retrying later: the server was unreachable or failed on its
    /// side. A 4xx is a verdict on the payload and will not change.
    pub fn is_transient(&self) -> bool {
        match self {
            UploadError::Transport(_) => true,
            UploadError::Rejected { status, .. } => *status >= 500,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// True when `GET /healthz` answers with a success status.
    pub async fn health(&self) -> bool {
        match self.http_client.get(self.url("/healthz")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health probe failed");
                false
            }
        }
    }

    /// POST a batch of pizza payloads as one JSON array.
    ///
    /// Any non-success status, or a body carrying a `message` field, counts
    /// as a rejection.
    pub async fn create_pizzas(&self, batch: &[Value]) -> Result<Value, UploadError> {
        self.post_pizzas(&Value::Array(batch.to_vec())).await
    }

    pub async fn create_pizza(&self, payload: &Value) -> Result<Value, UploadError> {
        self.post_pizzas(payload).await
    }

    async fn post_pizzas(&self, body: &Value) -> Result<Value, UploadError> {
        let response = self
            .http_client
            .post(self.url("/api/pizzas"))
            .header(header::ACCEPT, "application/json, text/plain, */*")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let Ok(json) = serde_json::from_str::<Value>(&text) else {
            // e.g. the plain-text 413 from the body limit layer
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        };

        if let Some(message) = error_message(&json) {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message: json.to_string(),
            });
        }
        Ok(json)
    }

    pub async fn list_pizzas(&self) -> Result<Vec<Value>> {
        let resp = self
            .http_client
            .get(self.url("/api/pizzas"))
            .send()
            .await
            .context("Failed to reach pizza API")?
            .error_for_status()
            .context("Pizza API returned an error")?;
        let pizzas: Vec<Value> = resp.json().await.context("Failed to parse pizza list")?;
        Ok(pizzas)
    }
}

/// The API signals failure with a `message` field; created records never
/// carry one.
fn error_message(body: &Value) -> Option<String> {
    let message = body.as_object()?.get("message")?;
    Some(match message.as_str() {
        Some(s) => s.to_string(),
        None => message.to_string(),
    })
}

/// Where a submission ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Accepted by the API; the created record.
    Sent(Value),
    /// Kept locally under this id until the next successful drain.
    Queued(u64),
}

/// Send a pizza straight to the API, falling back to the offline queue
/// when the API cannot be reached.
///
/// A payload the server rejects, or one that would fail the server's
/// checks, is returned as an error and never queued; it would fail every
/// later batch it was part of.
pub async fn submit(client: &ApiClient, queue: &OfflineQueue, payload: Value) -> Result<Submission> {
    match client.create_pizza(&payload).await {
        Ok(created) => Ok(Submission::Sent(created)),
        Err(e) if e.is_transient() => {
            NewPizza::check(&payload).context("pizza cannot be saved offline")?;
            tracing::warn!(error = %e, "submission failed, saving offline");
            let local_id = queue.enqueue(&payload)?;
            Ok(Submission::Queued(local_id))
        }
        Err(e) => Err(e).context("pizza rejected by the API"),
    }
}
