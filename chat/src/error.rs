//! Error taxonomy for portal calls and chat operations.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here is fatal to the panel. The router turns every [`ChatError`]
//! on its paths into an assistant message; registry operations log and keep
//! prior state. `error_code`/`retryable` give callers a grepable code and a
//! retry hint without matching on variants.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Grepable error code and retryable flag.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Configuration could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A numeric setting held a non-numeric value.
    #[error("invalid value for {key}: {value:?}")]
    Parse { key: String, value: String },

    /// A setting was present but empty.
    #[error("{key} must not be empty")]
    Empty { key: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "E_CONFIG_PARSE",
            Self::Empty { .. } => "E_CONFIG_EMPTY",
        }
    }
}

/// Errors produced by portal service calls and chat operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    /// Network failure or timeout; the request may not have reached the server.
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-success payload or HTTP status.
    #[error("{message}")]
    Server { status: Option<u16>, message: String },

    /// Caller input was rejected before any network round-trip.
    #[error("{0}")]
    Validation(String),

    /// Required documents carried no usable extracted text.
    #[error("{0}")]
    Content(String),

    /// The response body was not the JSON shape expected.
    #[error("response parse failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ChatError {
    /// Server failure carrying the payload's message, if any.
    #[must_use]
    pub fn server(status: Option<u16>, message: Option<String>) -> Self {
        Self::Server {
            status,
            message: message.unwrap_or_else(|| match status {
                Some(code) => format!("request failed: {code}"),
                None => "request failed".to_owned(),
            }),
        }
    }
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Server { .. } => "E_SERVER",
            Self::Validation(_) => "E_VALIDATION",
            Self::Content(_) => "E_CONTENT",
            Self::Decode(_) => "E_DECODE",
            Self::Config(_) => "E_CONFIG",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Decode(_) => true,
            Self::Server { status, .. } => matches!(status, Some(429 | 500..=599)),
            Self::Validation(_) | Self::Content(_) | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
