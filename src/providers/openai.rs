//! OpenAI chat completions provider.
//!
//! Non-streaming `/v1/chat/completions` with function calling. Also works with
//! OpenAI-compatible servers when pointed at a different base URL.

use crate::error::Error;
use crate::providers::{error_from_response, ChatProvider, RequestConfig};
use crate::types::*;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat completions provider.
pub struct OpenAIProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    config: RequestConfig,
}

impl OpenAIProvider {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            config: RequestConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(auth) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, auth);
        }
        headers
    }

    fn build_body<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [Tool],
    ) -> Result<ChatRequest<'a>, Error> {
        if messages.is_empty() {
            return Err(Error::InvalidInput("conversation is empty".into()));
        }
        if !messages
            .iter()
            .any(|m| matches!(m.role, Role::System | Role::User))
        {
            return Err(Error::InvalidInput(
                "conversation needs a system or user message".into(),
            ));
        }
        for tool in tools {
            tool.validate()?;
        }

        Ok(ChatRequest {
            model: &self.model,
            messages,
            tool_choice: (!tools.is_empty()).then(|| self.config.tool_choice.to_value()),
            tools,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        })
    }

    /// Decode a 2xx response body.
    pub(crate) fn parse_response(body: &str) -> Result<CompletionResult, Error> {
        let resp: ChatResponse =
            serde_json::from_str(body).map_err(|e| Error::malformed(e.to_string()))?;

        if let Some(error) = resp.error {
            return Err(Error::upstream("openai", error.message));
        }

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::malformed("no choices"))?;

        Ok(CompletionResult {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
            model: resp.model.unwrap_or_default(),
            finish_reason: FinishReason::parse(choice.finish_reason.as_deref()),
            usage: resp
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<CompletionResult, Error> {
        let body = self.build_body(messages, tools)?;
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending chat completion request"
        );

        let resp = self
            .http
            .post(self.url())
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .map_err(Error::from_transport)?;

        let status = resp.status();
        info!(status = status.as_u16(), "chat completion response");
        if !status.is_success() {
            return Err(error_from_response(resp).await);
        }

        let text = resp.text().await.map_err(Error::from_transport)?;
        debug!(body = %text, "chat completion body");
        Self::parse_response(&text)
    }
}

// --- Serde types for the chat completions API ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "<[Tool]>::is_empty")]
    tools: &'a [Tool],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    error: Option<ChatError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}
