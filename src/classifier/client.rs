/// Chat-completions HTTP client implementation.
///
/// This module provides `OpenAiClient` for making synchronous requests to an
/// OpenAI-compatible `/chat/completions` endpoint, along with error types and
/// a builder for configuration.
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4-turbo";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors that can occur when talking to the classification service.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The response body is not the expected JSON shape
    #[error("API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was configured
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}

impl ClassifierError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Builder for constructing `OpenAiClient` instances.
///
/// # Examples
///
/// ```
/// use notetag::classifier::OpenAiClientBuilder;
///
/// let client = OpenAiClientBuilder::new()
///     .base_url("http://localhost:8080/v1")
///     .api_key("sk-test")
///     .model("gpt-4o-mini")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.model(), "gpt-4o-mini");
/// ```
#[derive(Debug, Default)]
pub struct OpenAiClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiClientBuilder {
    /// Creates a new `OpenAiClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the API (e.g., "https://api.openai.com/v1").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model name (e.g., "gpt-4-turbo").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the overall request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `OpenAiClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Values not set on the builder fall back to `OPENAI_BASE_URL`
    /// (default `https://api.openai.com/v1`), `OPENAI_API_KEY` and
    /// `OPENAI_MODEL` (default `gpt-4-turbo`).
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError::InvalidUrl` for a malformed base URL and
    /// `ClassifierError::MissingApiKey` if no key is configured anywhere.
    pub fn build(self) -> Result<OpenAiClient, ClassifierError> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let model = self
            .model
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClassifierError::MissingApiKey)?;

        reqwest::Url::parse(&base_url)
            .map_err(|e| ClassifierError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ClassifierError::Network)?;

        Ok(OpenAiClient {
            client,
            base_url,
            api_key,
            model,
        })
    }
}

/// Synchronous client for an OpenAI-compatible chat-completions API.
///
/// Construct it with `OpenAiClientBuilder`. Requests are sent once; failures
/// are returned to the caller without retrying.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// A chat model that answers a single system + user message exchange.
///
/// This trait is the seam that lets the metadata generator run against a
/// mock in tests.
pub trait ChatClient: Send + Sync {
    /// Sends one exchange and returns the assistant's reply text.
    fn complete(&self, system: &str, user: &str) -> Result<String, ClassifierError>;
}

impl OpenAiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, system: &str, user: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ]
        })
    }
}

impl ChatClient for OpenAiClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, ClassifierError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system, user))
            .send()
            .map_err(ClassifierError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Http {
                status: status.as_u16(),
            });
        }

        let json: serde_json::Value = response.json().map_err(ClassifierError::from_reqwest)?;
        extract_reply(&json)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions response.
fn extract_reply(json: &serde_json::Value) -> Result<String, ClassifierError> {
    json.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ClassifierError::Api {
            message: "Missing 'choices[0].message.content' in API response".to_string(),
        })
}
