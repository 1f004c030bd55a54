//! Gemini HTTP client

use super::types::{ApiError, GenerateContentRequest, GenerateContentResponse};
use reqwest::Client;
use signals_core::{CollaboratorError, SignalsError, SignalsResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client. One request per call, no retries: any failure is
/// reported to the caller, which falls back deterministically.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send one prompt to the model and return the reply text.
    pub async fn generate(&self, model: &str, prompt: &str) -> SignalsResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::text(prompt))
            .send()
            .await
            .map_err(|e| {
                SignalsError::Collaborator(CollaboratorError::Transport {
                    provider: "gemini".to_string(),
                    message: e.to_string(),
                })
            })?;

        let status = response.status();
        if status.is_success() {
            let body: GenerateContentResponse = response.json().await.map_err(|e| {
                SignalsError::Collaborator(CollaboratorError::InvalidResponse {
                    provider: "gemini".to_string(),
                    reason: format!("failed to decode response body: {}", e),
                })
            })?;
            Ok(body.text())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            Err(SignalsError::Collaborator(CollaboratorError::RequestFailed {
                provider: "gemini".to_string(),
                status: status.as_u16() as i32,
                message,
            }))
        }
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
