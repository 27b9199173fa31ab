//! OpenRouter chat-completions provider (secondary).
//!
//! Speaks the OpenAI-compatible `/chat/completions` endpoint with a bearer key.
//! Key priority: config key → `OPENROUTER_API_KEY`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProdyError, Result};

use super::{parse_provider_error, ProviderClient};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model when none is configured.
pub const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OpenRouterProvider {
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

impl OpenRouterProvider {
    pub fn new(api_key: Option<&str>, model: &str) -> Self {
        Self {
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from),
            model: if model.trim().is_empty() {
                DEFAULT_OPENROUTER_MODEL.to_string()
            } else {
                model.to_string()
            },
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn from_config(api_key: Option<&str>, model: &str) -> Self {
        let key = api_key
            .filter(|k| !k.trim().is_empty())
            .map(String::from)
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        Self::new(key.as_deref(), model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
            "max_tokens": 1024
        })
    }

    /// Pull `choices[0].message.content` out of a completion response.
    pub fn extract_text(response: &Value) -> Option<String> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
    }
}

#[async_trait]
impl ProviderClient for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProdyError::NotConfigured("openrouter".into()))?;

        debug!("OpenRouter request to model {}", self.model);

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(key)
            .header("X-Title", "Prody")
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| ProdyError::Provider(format!("OpenRouter request failed: {}", e)))?;

        if response.status().is_success() {
            let json: Value = response.json().await.map_err(|e| {
                ProdyError::Provider(format!("Failed to parse OpenRouter response: {}", e))
            })?;
            return Self::extract_text(&json)
                .ok_or_else(|| ProdyError::Provider("OpenRouter returned no choices".into()));
        }

        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        let body_msg = serde_json::from_str::<Value>(&error_text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(error_text);

        Err(parse_provider_error(status, &format!("OpenRouter: {}", body_msg)))
    }
}
