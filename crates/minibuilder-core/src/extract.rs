use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::blueprint::Blueprint;
use crate::session::{Event, ExtractRequest};
use crate::verification::VerificationToken;

#[derive(Serialize)]
struct ExtractRequestBody<'a> {
    description: &'a str,
    verification: &'a str,
}

/// Failures talking to the extraction service
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request timed out")]
    Timeout,

    #[error("extraction service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid blueprint: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExtractError::Timeout
        } else if err.is_connect() {
            ExtractError::Transport(format!("connection failed: {}", err))
        } else {
            ExtractError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Decode(err.to_string())
    }
}

#[derive(Clone)]
pub struct ExtractClient {
    client: Client,
    endpoint: String,
}

impl ExtractClient {
    /// `timeout` bounds the whole exchange, body included
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn extract(
        &self,
        description: &str,
        verification: &VerificationToken,
    ) -> Result<Blueprint, ExtractError> {
        let body = ExtractRequestBody {
            description,
            verification: verification.as_str(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "extraction response received");

        if status != StatusCode::OK {
            return Err(ExtractError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(Blueprint::from_json(&text)?)
    }

    /// Perform a session's extract effect and wrap the outcome for the session
    pub async fn run(&self, request: ExtractRequest) -> Event {
        let result = self
            .extract(&request.description, &request.verification)
            .await;
        Event::Completed {
            seq: request.seq,
            result,
        }
    }
}
