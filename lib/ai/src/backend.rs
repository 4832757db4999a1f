//! Chat inference over the Generative Language API.
//!
//! One request per call, no streaming. The client holds a service-level API
//! key; a per-node key passed at call time takes precedence, so different
//! workflow nodes may bill against different keys.

use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use stackloom_workflow::{CollaboratorError, LanguageModel};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// A Gemini chat client.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiBackend {
    /// Creates a backend with the service-level API key, if any.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Overrides the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Generates a response for `prompt`.
    ///
    /// `api_key` overrides the service-level key for this call.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when no key is available, the request fails, or
    /// the response cannot be interpreted.
    pub async fn generate_content(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
        api_key: Option<&str>,
    ) -> Result<String, LlmError> {
        let key = api_key
            .or(self.api_key.as_deref())
            .ok_or(LlmError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            model_path(model)
        );
        debug!(model, temperature, "generating response");

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_owned(),
                }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                reason: format!("status {status}: {body}"),
            });
        }

        let body: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl LanguageModel for GeminiBackend {
    async fn generate(
        &self,
        prompt: &str,
        api_key: Option<&str>,
        model_name: &str,
        temperature: f32,
    ) -> Result<String, CollaboratorError> {
        self.generate_content(prompt, model_name, temperature, api_key)
            .await
            .map_err(|e| CollaboratorError::new(e.to_string()))
    }
}

/// Normalizes a model identifier into an API resource path.
fn model_path(model: &str) -> String {
    if model.contains('/') {
        model.to_owned()
    } else {
        format!("models/{model}")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
