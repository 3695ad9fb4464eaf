// src/services/gemini.rs

//! Client for the Gemini `generateContent` endpoint.
//!
//! Every call is spaced by the client's [`RateLimiter`] and retried per its
//! [`RetryPolicy`]:
//!
//! | Status | Handling                                      |
//! |--------|-----------------------------------------------|
//! | 2xx    | first candidate text, blank -> `EmptyResponse` |
//! | 429    | backoff and retry, then `RateLimited`         |
//! | 403    | `Credentials`, no retry                       |
//! | 5xx    | backoff and retry, then `Upstream`            |
//! | other  | `Api`, no retry                               |

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, GeminiConfig};
use crate::utils::http::{create_async_client, error_message, retry_after};
use crate::utils::retry::{RateLimiter, RetryPolicy};
use crate::utils::{redact_key, truncate};

/// Anything that turns a prompt into completion text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, if non-blank.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

/// Result of a single unretried test request.
#[derive(Debug, Clone)]
pub struct KeyCheck {
    pub status: u16,
    pub success: bool,
    /// First 200 characters of the raw response body
    pub preview: String,
}

/// Rate-limited, retrying client for the generation endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    model: String,
    temperature: Option<f32>,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl GeminiClient {
    /// Build a client from application configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.gemini_api_key()?;
        let client = create_async_client(config.gemini.timeout_secs)?;
        Self::with_client(
            client,
            &config.gemini,
            api_key,
            RetryPolicy::from(&config.retry),
        )
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_client(
        client: Client,
        gemini: &GeminiConfig,
        api_key: &str,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::config("Gemini API key is empty"));
        }

        let mut endpoint = Url::parse(&format!(
            "{}/v1beta/models/{}:generateContent",
            gemini.base_url.trim_end_matches('/'),
            gemini.model
        ))?;
        endpoint.query_pairs_mut().append_pair("key", api_key);

        Ok(Self {
            client,
            endpoint,
            model: gemini.model.clone(),
            temperature: gemini.temperature,
            retry,
            limiter: RateLimiter::new(std::time::Duration::from_millis(gemini.min_interval_ms)),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: self.temperature.map(|temperature| GenerationConfig { temperature }),
        }
    }

    /// Send `prompt` and return the first candidate's text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = self.request_body(prompt);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.limiter.acquire().await;

            log::debug!(
                "POST {} (attempt {}/{}, prompt: {})",
                redact_key(self.endpoint.as_str()),
                attempt,
                self.retry.max_attempts,
                truncate(prompt, 200)
            );

            let (failure, hint) = match self
                .client
                .post(self.endpoint.clone())
                .json(&body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    let hint = retry_after(response.headers());
                    let text = response.text().await?;
                    log::debug!("Response {}: {}", status.as_u16(), truncate(&text, 200));

                    if status.is_success() {
                        let payload: GenerateResponse = serde_json::from_str(&text)?;
                        return payload.first_text().ok_or(AppError::EmptyResponse);
                    }

                    match status.as_u16() {
                        429 => (AppError::RateLimited { attempts: attempt }, hint),
                        403 => return Err(AppError::Credentials(error_message(&text))),
                        code if status.is_server_error() => (
                            AppError::Upstream {
                                status: code,
                                attempts: attempt,
                            },
                            None,
                        ),
                        code => {
                            return Err(AppError::Api {
                                status: code,
                                message: error_message(&text),
                            });
                        }
                    }
                }
                Err(e) => {
                    let error = AppError::from(e.without_url());
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    (error, None)
                }
            };

            if !self.retry.should_retry(attempt) {
                log::error!("Giving up after {} attempt(s): {}", attempt, failure);
                return Err(failure);
            }

            let delay = self.retry.delay_with_hint(attempt, hint);
            log::warn!(
                "{} - retrying in {} ms (attempt {}/{})",
                failure,
                delay.as_millis(),
                attempt + 1,
                self.retry.max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Send one `"test"` prompt without retrying and report what came back.
    pub async fn check_key(&self) -> Result<KeyCheck> {
        self.limiter.acquire().await;
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&self.request_body("test"))
            .send()
            .await
            .map_err(|e| AppError::from(e.without_url()))?;

        let status = response.status();
        let text = response.text().await?;
        Ok(KeyCheck {
            status: status.as_u16(),
            success: status.is_success(),
            preview: truncate(&text, 200),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        GeminiClient::generate_text(self, prompt).await
    }
}
