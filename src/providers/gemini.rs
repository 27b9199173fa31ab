//! Gemini `generateContent` provider (primary).
//!
//! Key priority: config key → `GEMINI_API_KEY` → `GOOGLE_API_KEY`.
//!
//! Gemini 2.5 models return parts tagged `thought: true`. Those are filtered
//! out and only the final non-thought text is returned.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProdyError, Result};

use super::{parse_provider_error, ProviderClient};

/// Gemini v1beta REST API base.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Per-request timeout. Timeouts surface as ordinary provider errors.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini REST provider authenticated with an API key.
pub struct GeminiProvider {
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    /// Build a provider with an explicit key. An empty key leaves it unconfigured.
    pub fn new(api_key: Option<&str>, model: &str) -> Self {
        Self {
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from),
            model: if model.trim().is_empty() {
                DEFAULT_GEMINI_MODEL.to_string()
            } else {
                model.to_string()
            },
            client: build_client(),
        }
    }

    /// Resolve the key from config first, then the environment.
    pub fn from_config(api_key: Option<&str>, model: &str) -> Self {
        let env_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok();
        let key = api_key
            .filter(|k| !k.trim().is_empty())
            .map(String::from)
            .or(env_key);
        Self::new(key.as_deref(), model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn request body.
    fn build_request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 1024
            }
        })
    }

    /// Extract final answer text from a Gemini API response.
    ///
    /// Falls back to thought text when no final parts exist.
    pub fn extract_text(response: &Value) -> Option<String> {
        let parts = response["candidates"][0]["content"]["parts"].as_array()?;

        let final_parts: Vec<&str> = parts
            .iter()
            .filter(|p| !p["thought"].as_bool().unwrap_or(false))
            .filter_map(|p| p["text"].as_str())
            .collect();

        if !final_parts.is_empty() {
            return Some(final_parts.join(""));
        }

        let thought_parts: Vec<&str> = parts.iter().filter_map(|p| p["text"].as_str()).collect();
        if !thought_parts.is_empty() {
            Some(thought_parts.join(""))
        } else {
            None
        }
    }

    fn api_url(&self) -> String {
        format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

fn build_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[async_trait]
impl ProviderClient for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProdyError::NotConfigured("gemini".into()))?;

        debug!("Gemini request to model {}", self.model);

        let response = self
            .client
            .post(self.api_url())
            .query(&[("key", key)])
            .header("Content-Type", "application/json")
            .json(&Self::build_request_body(prompt))
            .send()
            .await
            .map_err(|e| ProdyError::Provider(format!("Gemini request failed: {}", e)))?;

        if response.status().is_success() {
            let json: Value = response.json().await.map_err(|e| {
                ProdyError::Provider(format!("Failed to parse Gemini response: {}", e))
            })?;
            return Self::extract_text(&json)
                .ok_or_else(|| ProdyError::Provider("Gemini returned no candidates".into()));
        }

        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        let body_msg = serde_json::from_str::<Value>(&error_text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(error_text);

        Err(parse_provider_error(status, &format!("Gemini: {}", body_msg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_unconfigured() {
        assert!(!GeminiProvider::new(Some("  "), DEFAULT_GEMINI_MODEL).is_configured());
        assert!(!GeminiProvider::new(None, DEFAULT_GEMINI_MODEL).is_configured());
        assert!(GeminiProvider::new(Some("key"), DEFAULT_GEMINI_MODEL).is_configured());
    }

    #[test]
    fn test_blank_model_uses_default() {
        let p = GeminiProvider::new(Some("key"), "");
        assert_eq!(p.model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_extract_skips_thought_parts() {
        let response = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "WISDOM: Rest is part of the path." }
                    ]
                }
            }]
        });
        assert_eq!(
            GeminiProvider::extract_text(&response).as_deref(),
            Some("WISDOM: Rest is part of the path.")
        );
    }

    #[test]
    fn test_extract_falls_back_to_thought_text() {
        let response = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "only thought", "thought": true }] } }]
        });
        assert_eq!(
            GeminiProvider::extract_text(&response).as_deref(),
            Some("only thought")
        );
    }

    #[test]
    fn test_extract_none_for_empty_parts() {
        let response = serde_json::json!({ "candidates": [{ "content": { "parts": [] } }] });
        assert!(GeminiProvider::extract_text(&response).is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiProvider::build_request_body("Hi");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hi");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_api_url_format() {
        let p = GeminiProvider::new(Some("key"), "gemini-2.5-flash");
        let url = p.api_url();
        assert!(url.contains("generativelanguage.googleapis.com"));
        assert!(url.ends_with("gemini-2.5-flash:generateContent"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let p = GeminiProvider::new(Some("super-secret"), DEFAULT_GEMINI_MODEL);
        let dbg = format!("{:?}", p);
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_generate_without_key_is_not_configured_error() {
        let p = GeminiProvider::new(None, DEFAULT_GEMINI_MODEL);
        let err = p.generate("hello").await.unwrap_err();
        assert!(matches!(err, ProdyError::NotConfigured(_)));
    }
}
