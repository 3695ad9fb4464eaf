// src/error.rs

//! Unified error handling for the pitch generator.

use std::fmt;

use thiserror::Error;

/// Result type alias for pitchcraft operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The generation endpoint kept answering 429
    #[error("Rate limit exceeded after {attempts} attempt(s); try again later")]
    RateLimited { attempts: u32 },

    /// The generation endpoint rejected the API key (403)
    #[error("Invalid or unauthorized API key: {0}")]
    Credentials(String),

    /// The generation endpoint kept failing with a server error
    #[error("Generation service unavailable (HTTP {status}) after {attempts} attempt(s)")]
    Upstream { status: u16, attempts: u32 },

    /// Non-retryable HTTP status from the generation endpoint
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The model answered without any candidate text
    #[error("Empty response from the generation service")]
    EmptyResponse,

    /// Model output could not be turned into a pitch
    #[error("Could not parse model output: {0}")]
    Parse(String),

    /// Authentication failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Backend table API rejected the request
    #[error("Backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    /// An operation needs a signed-in user
    #[error("Not signed in; run `pitchcraft login` first")]
    NotAuthenticated,

    /// A record was not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a parse error for unusable model output.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create an authentication error.
    pub fn auth(message: impl fmt::Display) -> Self {
        Self::Auth(message.to_string())
    }

    /// Create a backend error with the HTTP status.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Whether the generation client retries this failure class.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RateLimited { .. } | Self::Upstream { .. } => true,
            _ => false,
        }
    }
}
