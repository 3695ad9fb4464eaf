//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generative-AI endpoint settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Retry and backoff behavior for the generative-AI endpoint
    #[serde(default)]
    pub retry: RetryConfig,

    /// Auth and pitch table backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Local file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Console and log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Recognized keys: `GEMINI_API_KEY`, `GEMINI_MODEL`, `SUPABASE_URL`,
    /// `SUPABASE_ANON_KEY`, `PITCHCRAFT_BACKEND`. Blank values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = get("SUPABASE_URL") {
            self.backend.url = Some(url);
        }
        if let Some(key) = get("SUPABASE_ANON_KEY") {
            self.backend.anon_key = Some(key.trim().to_string());
        }
        if let Some(kind) = get("PITCHCRAFT_BACKEND") {
            match kind.to_lowercase().as_str() {
                "local" => self.backend.kind = BackendKind::Local,
                "supabase" => self.backend.kind = BackendKind::Supabase,
                other => log::warn!("Ignoring unknown PITCHCRAFT_BACKEND '{}'", other),
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.gemini.model.trim().is_empty() {
            return Err(AppError::validation("gemini.model is empty"));
        }
        Url::parse(&self.gemini.base_url)
            .map_err(|e| AppError::validation(format!("gemini.base_url is invalid: {e}")))?;
        if self.gemini.timeout_secs == 0 {
            return Err(AppError::validation("gemini.timeout_secs must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(AppError::validation("retry.multiplier must be >= 1.0"));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(AppError::validation(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms",
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(AppError::validation("backend.timeout_secs must be > 0"));
        }
        if self.backend.table.trim().is_empty() {
            return Err(AppError::validation("backend.table is empty"));
        }
        if self.backend.kind == BackendKind::Supabase {
            let url = self
                .backend
                .url
                .as_deref()
                .ok_or_else(|| AppError::validation("backend.url is required for supabase"))?;
            Url::parse(url)
                .map_err(|e| AppError::validation(format!("backend.url is invalid: {e}")))?;
            if self.backend.anon_key.as_deref().is_none_or(str::is_empty) {
                return Err(AppError::validation(
                    "backend.anon_key is required for supabase",
                ));
            }
        }
        Ok(())
    }

    /// The Gemini API key, or a configuration error naming how to set it.
    pub fn gemini_api_key(&self) -> Result<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::config("Gemini API key missing (set GEMINI_API_KEY)"))
    }
}

/// Generative-AI endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Scheme and host of the generateContent API
    #[serde(default = "defaults::gemini_base_url")]
    pub base_url: String,

    /// Model name placed in the request path
    #[serde(default = "defaults::gemini_model")]
    pub model: String,

    /// API key sent as the `key` query parameter
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::gemini_timeout")]
    pub timeout_secs: u64,

    /// Minimum spacing between two requests in milliseconds
    #[serde(default = "defaults::min_interval")]
    pub min_interval_ms: u64,

    /// Optional sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::gemini_base_url(),
            model: defaults::gemini_model(),
            api_key: None,
            timeout_secs: defaults::gemini_timeout(),
            min_interval_ms: defaults::min_interval(),
            temperature: None,
        }
    }
}

/// Retry and backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "defaults::initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound on any single delay in milliseconds
    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays
    #[serde(default = "defaults::multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_delay_ms: defaults::initial_delay(),
            max_delay_ms: defaults::max_delay(),
            multiplier: defaults::multiplier(),
        }
    }
}

/// Which pitch store to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted Supabase project (auth + PostgREST)
    #[default]
    Supabase,
    /// JSON file in the data directory, no sign-in
    Local,
}

/// Backend-as-a-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: Option<String>,

    /// Public anon key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Table holding pitch rows
    #[serde(default = "defaults::table")]
    pub table: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: None,
            anon_key: None,
            table: defaults::table(),
            timeout_secs: defaults::backend_timeout(),
        }
    }
}

/// Local file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for the session, local pitches and previews
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
}

impl PathsConfig {
    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn previews_dir(&self) -> PathBuf {
        self.data_dir.join("previews")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `debug`, `info`, `warn`, `error`
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Gemini defaults
    pub fn gemini_base_url() -> String {
        "https://generativelanguage.googleapis.com".into()
    }
    pub fn gemini_model() -> String {
        "gemini-2.5-pro".into()
    }
    pub fn gemini_timeout() -> u64 {
        120
    }
    pub fn min_interval() -> u64 {
        1000
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn initial_delay() -> u64 {
        1000
    }
    pub fn max_delay() -> u64 {
        16_000
    }
    pub fn multiplier() -> f64 {
        2.0
    }

    // Backend defaults
    pub fn table() -> String {
        "pitches".into()
    }
    pub fn backend_timeout() -> u64 {
        30
    }

    pub fn data_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn log_level() -> String {
        "info".into()
    }
}
