use std::time::Duration;
use thiserror::Error;

/// Unified error type for both providers, tool dispatch and orchestration.
#[derive(Error, Debug)]
pub enum Error {
    /// Rate limited by the provider. Check `retry_after` for suggested wait time.
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Invalid or missing API key.
    #[error("unauthorized")]
    Unauthorized,

    /// Server error (5xx status codes).
    #[error("server error ({0})")]
    Server(u16),

    /// Non-success status with provider-specific message.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Provider answered 2xx but reported a failure in the payload.
    #[error("{provider}: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },

    /// Request or connection timeout.
    #[error("timeout")]
    Timeout,

    /// HTTP/network error.
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered 2xx with a payload we cannot use.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Tool call arguments did not decode or lack required keys.
    #[error("bad arguments for {tool}: {message}")]
    ArgumentDecode { tool: String, message: String },

    /// Caller-supplied input violates a precondition.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing API key for provider.
    #[error("missing API key for {0}")]
    MissingApiKey(String),

    /// Invalid configuration.
    #[error("config: {0}")]
    Config(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The run was cancelled before it finished.
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Returns true if the error came from a provider (transport, status or payload rejection).
    #[inline]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. }
                | Error::Unauthorized
                | Error::Server(_)
                | Error::Api { .. }
                | Error::Upstream { .. }
                | Error::Timeout
                | Error::Http(_)
        )
    }

    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a payload-level rejection error.
    pub fn upstream(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
        }
    }

    /// Create a malformed response error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an argument decode error for a tool.
    pub fn argument_decode(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArgumentDecode {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Map a transport error, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}
