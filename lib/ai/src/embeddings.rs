//! Embedding generation over the Generative Language API.
//!
//! Document chunks are embedded in one batch call at ingestion time; queries
//! are embedded one at a time at retrieval time, with the *same* model the
//! documents were embedded with — mixing models produces incomparable
//! vectors.

use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// The task type hint attached to an embedding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingTaskType {
    /// Embedding a document chunk for later retrieval.
    RetrievalDocument,
    /// Embedding a query to search against stored documents.
    RetrievalQuery,
}

/// A Gemini embeddings client.
#[derive(Debug, Clone)]
pub struct GeminiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiEmbeddings {
    /// Creates a client with the service-level API key, if any.
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

    /// Embeds a batch of document chunks.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] when no key is available, the request
    /// fails, or the response does not carry one embedding per input.
    pub async fn embed_documents(
        &self,
        model: &str,
        texts: &[String],
        api_key: Option<&str>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let key = self.resolve_key(api_key)?;
        let model = model_path(model);

        let url = format!("{}/v1beta/{}:batchEmbedContents", self.base_url, model);
        debug!(%model, count = texts.len(), "embedding document batch");

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: model.clone(),
                    content: EmbedContent {
                        parts: vec![EmbedPart { text: text.clone() }],
                    },
                    task_type: EmbeddingTaskType::RetrievalDocument,
                })
                .collect(),
        };

        let response: BatchEmbedResponse = self.post_json(&url, key, &request).await?;
        let embeddings: Vec<Vec<f32>> = response
            .embeddings
            .into_iter()
            .map(|e| e.values)
            .collect();

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                received: embeddings.len(),
            });
        }
        Ok(embeddings)
    }

    /// Embeds a single query.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] when no key is available, the request
    /// fails, or the response cannot be interpreted.
    pub async fn embed_query(
        &self,
        model: &str,
        text: &str,
        api_key: Option<&str>,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let key = self.resolve_key(api_key)?;
        let model = model_path(model);

        let url = format!("{}/v1beta/{}:embedContent", self.base_url, model);
        debug!(%model, "embedding query");

        let request = EmbedRequest {
            model: model.clone(),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_owned(),
                }],
            },
            task_type: EmbeddingTaskType::RetrievalQuery,
        };

        let response: EmbedResponse = self.post_json(&url, key, &request).await?;
        Ok(response.embedding.values)
    }

    fn resolve_key<'a>(&'a self, api_key: Option<&'a str>) -> Result<&'a str, EmbeddingError> {
        api_key
            .or(self.api_key.as_deref())
            .ok_or(EmbeddingError::MissingApiKey)
    }

    async fn post_json<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        key: &str,
        request: &T,
    ) -> Result<R, EmbeddingError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", key)])
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed {
                reason: format!("status {status}: {body}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::ResponseParseFailed {
                reason: e.to_string(),
            })
    }
}

/// Computes cosine similarity between two vectors.
///
/// Mismatched lengths and zero vectors yield `0.0` rather than an error, so
/// a malformed stored embedding ranks last instead of failing retrieval.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
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
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
    task_type: EmbeddingTaskType,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_type_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_value(EmbeddingTaskType::RetrievalDocument).expect("serialize"),
            json!("RETRIEVAL_DOCUMENT")
        );
        assert_eq!(
            serde_json::to_value(EmbeddingTaskType::RetrievalQuery).expect("serialize"),
            json!("RETRIEVAL_QUERY")
        );
    }

    #[test]
    fn embed_request_wire_shape() {
        let request = EmbedRequest {
            model: "models/embedding-001".to_string(),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: "chunk".to_string(),
                }],
            },
            task_type: EmbeddingTaskType::RetrievalDocument,
        };
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({
                "model": "models/embedding-001",
                "content": {"parts": [{"text": "chunk"}]},
                "taskType": "RETRIEVAL_DOCUMENT"
            })
        );
    }

    #[test]
    fn batch_response_parses_values() {
        let response: BatchEmbedResponse = serde_json::from_value(json!({
            "embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]
        }))
        .expect("deserialize");
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }
}
