//! Provider implementations for the chat and places APIs.

pub mod google_places;
pub mod openai;

use crate::error::Error;
use crate::types::{CompletionResult, Message, PlaceRecord, Tool};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;
use std::time::Duration;

/// A chat-completion backend that supports function calling.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Run one chat round over the full conversation.
    async fn complete(&self, messages: &[Message], tools: &[Tool])
        -> Result<CompletionResult, Error>;
}

/// A places text-search backend.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Search for places matching `query` within `radius` meters of `location` ("lat,lng").
    async fn search(
        &self,
        query: &str,
        location: &str,
        radius: u32,
    ) -> Result<Vec<PlaceRecord>, Error>;
}

/// Request configuration for chat rounds.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub tool_choice: ToolChoice,
}

/// Tool choice configuration.
#[derive(Debug, Clone, Default)]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Required,
    Function(String),
}

impl ToolChoice {
    pub fn to_value(&self) -> Value {
        match self {
            ToolChoice::Auto => Value::String("auto".to_string()),
            ToolChoice::None => Value::String("none".to_string()),
            ToolChoice::Required => Value::String("required".to_string()),
            ToolChoice::Function(name) => serde_json::json!({
                "type": "function",
                "function": {"name": name}
            }),
        }
    }
}

/// Build the pooled HTTP client shared by a provider.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_nodelay(true)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(e.to_string()))
}

/// Convert a non-success response to an Error.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();

    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(status, body = %body, "provider returned error status");

    match status {
        401 => Error::Unauthorized,
        429 => {
            let retry_after = parse_retry_after(&headers);
            Error::RateLimited { retry_after }
        }
        500..=599 => Error::Server(status),
        _ => {
            // Try to extract error message from JSON
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v["error"]["message"]
                        .as_str()
                        .or_else(|| v["error_message"].as_str())
                        .map(std::string::ToString::to_string)
                })
                .unwrap_or(body);
            Error::api(status, message)
        }
    }
}

/// Parse Retry-After header (seconds form only).
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
