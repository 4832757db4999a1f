//! The context payload threaded through an execution chain.

use serde::{Deserialize, Serialize};

/// The mutable value each node handler reads and replaces.
///
/// The payload starts as plain text (the raw user query), widens to a
/// query/context pair after retrieval, and narrows back to plain text after a
/// language-model call. Handlers must extract the text they need regardless
/// of the current shape; the accessors here centralize that defensive
/// extraction.
///
/// Serialization is untagged so a final payload renders exactly as the chat
/// caller expects: a JSON string, or a `{"query": ..., "context": ...}`
/// object when the chain ended on a retrieval node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextPayload {
    /// Plain text: the evolving query or answer.
    Text(String),
    /// Retrieval output: the query paired with retrieved context.
    QueryWithContext {
        /// The query the context was retrieved for.
        query: String,
        /// Retrieved knowledge text, possibly empty.
        context: String,
    },
}

impl ContextPayload {
    /// Creates a plain-text payload.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates a query/context payload.
    #[must_use]
    pub fn with_context(query: impl Into<String>, context: impl Into<String>) -> Self {
        Self::QueryWithContext {
            query: query.into(),
            context: context.into(),
        }
    }

    /// The text a downstream node should treat as the current query.
    #[must_use]
    pub fn query_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::QueryWithContext { query, .. } => query,
        }
    }

    /// Retrieved knowledge context, empty unless a retrieval node produced one.
    #[must_use]
    pub fn context_text(&self) -> &str {
        match self {
            Self::Text(_) => "",
            Self::QueryWithContext { context, .. } => context,
        }
    }

    /// Renders the payload as plain text for callers that expect a string.
    ///
    /// A query/context pair is rendered as its JSON object form.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            other => serde_json::to_string(&other)
                .unwrap_or_else(|_| other.query_text().to_owned()),
        }
    }
}

impl From<&str> for ContextPayload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_payload_accessors() {
        let payload = ContextPayload::text("what is a ULID?");
        assert_eq!(payload.query_text(), "what is a ULID?");
        assert_eq!(payload.context_text(), "");
    }

    #[test]
    fn structured_payload_accessors() {
        let payload = ContextPayload::with_context("q", "retrieved text");
        assert_eq!(payload.query_text(), "q");
        assert_eq!(payload.context_text(), "retrieved text");
    }

    #[test]
    fn text_serializes_as_json_string() {
        let payload = ContextPayload::text("hello");
        assert_eq!(
            serde_json::to_value(&payload).expect("serialize"),
            json!("hello")
        );
    }

    #[test]
    fn structured_serializes_as_object() {
        let payload = ContextPayload::with_context("q", "c");
        assert_eq!(
            serde_json::to_value(&payload).expect("serialize"),
            json!({"query": "q", "context": "c"})
        );
    }

    #[test]
    fn untagged_deserialize_picks_shape() {
        let text: ContextPayload = serde_json::from_value(json!("plain")).expect("deserialize");
        assert_eq!(text, ContextPayload::text("plain"));

        let pair: ContextPayload =
            serde_json::from_value(json!({"query": "q", "context": "c"})).expect("deserialize");
        assert_eq!(pair, ContextPayload::with_context("q", "c"));
    }

    #[test]
    fn into_text_renders_pair_as_json() {
        let rendered = ContextPayload::with_context("q", "c").into_text();
        assert_eq!(rendered, r#"{"query":"q","context":"c"}"#);
    }
}
