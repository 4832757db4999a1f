//! Workflow node types and per-kind configuration.
//!
//! Nodes arrive from the graph-authoring client as
//! `{"id": "...", "type": "...", "data": {...}}`. The `type` string maps onto
//! [`NodeKind`]; kinds this engine does not understand are preserved verbatim
//! and treated as passthrough at execution time. The free-form `data` map is
//! projected into a typed configuration record per kind, with documented
//! defaults for every absent field.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Default embedding model used when a knowledge-base node names none.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Default chat model used when an LLM engine node names none.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

/// Default sampling temperature for LLM engine nodes.
pub const DEFAULT_TEMPERATURE: f32 = 0.75;

/// The kind of a workflow node.
///
/// The executable kinds form a closed set; any other `type` string is kept in
/// [`NodeKind::Other`] so the persisted graph round-trips unchanged and stays
/// forward-compatible with node kinds this engine does not yet understand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The entry point; resets the payload to the original user query.
    UserQuery,
    /// Retrieves knowledge-base context for the current query.
    KnowledgeBase,
    /// Renders a prompt and invokes the language model.
    LlmEngine,
    /// Terminal node; passes the payload through unchanged.
    Output,
    /// An unrecognized kind, tolerated as passthrough.
    Other(String),
}

impl NodeKind {
    /// Returns the wire representation of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::UserQuery => "userQuery",
            Self::KnowledgeBase => "knowledgeBase",
            Self::LlmEngine => "llmEngine",
            Self::Output => "output",
            Self::Other(kind) => kind,
        }
    }
}

impl From<&str> for NodeKind {
    fn from(value: &str) -> Self {
        match value {
            "userQuery" => Self::UserQuery,
            "knowledgeBase" => Self::KnowledgeBase,
            "llmEngine" => Self::LlmEngine,
            "output" => Self::Output,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let kind = String::deserialize(deserializer)?;
        Ok(Self::from(kind.as_str()))
    }
}

/// A single step in a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the graph, assigned by the authoring client.
    pub id: String,
    /// The node kind.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Free-form per-kind settings as persisted by the authoring client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl Node {
    /// Creates a node with no configuration data.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            data: None,
        }
    }

    /// Creates a node with configuration data.
    #[must_use]
    pub fn with_data(id: impl Into<String>, kind: NodeKind, data: JsonValue) -> Self {
        Self {
            id: id.into(),
            kind,
            data: Some(data),
        }
    }

    /// Returns the configuration data, or `Null` when none was persisted.
    #[must_use]
    pub fn config_data(&self) -> &JsonValue {
        self.data.as_ref().unwrap_or(&JsonValue::Null)
    }

    /// Returns the display label for this node, falling back to its kind.
    #[must_use]
    pub fn label(&self) -> &str {
        self.config_data()
            .get("label")
            .and_then(JsonValue::as_str)
            .unwrap_or_else(|| self.kind.as_str())
    }
}

/// Typed configuration for a knowledge-base node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBaseConfig {
    /// Embedding model identifier, if set by the author.
    pub embedding_model: Option<String>,
    /// Per-node API key for the embedding service.
    pub embedding_api_key: Option<String>,
}

impl KnowledgeBaseConfig {
    /// Projects the free-form `data` map into a typed record.
    ///
    /// Fields of the wrong JSON type are treated as absent.
    #[must_use]
    pub fn from_data(data: &JsonValue) -> Self {
        Self {
            embedding_model: string_field(data, "embeddingModel"),
            embedding_api_key: string_field(data, "embeddingApiKey"),
        }
    }

    /// The embedding model to use, applying the default.
    ///
    /// The authoring client persists the literal string `"undefined"` when the
    /// field was never chosen; that sentinel maps to the default as well.
    #[must_use]
    pub fn embedding_model_or_default(&self) -> &str {
        match self.embedding_model.as_deref() {
            None | Some("") | Some("undefined") => DEFAULT_EMBEDDING_MODEL,
            Some(model) => model,
        }
    }
}

/// The web-search tool configured on an LLM engine node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WebSearchTool {
    /// Web search disabled.
    #[default]
    None,
    /// Search via SerpAPI.
    SerpApi,
}

/// Typed configuration for an LLM engine node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmEngineConfig {
    /// Per-node API key for the language model.
    pub api_key: Option<String>,
    /// Chat model identifier, if set by the author.
    pub model_name: Option<String>,
    /// Sampling temperature, if set by the author.
    pub temperature: Option<f32>,
    /// Prompt template override.
    pub prompt: Option<String>,
    /// Web-search tool selection as persisted.
    pub web_search_tool: Option<String>,
}

impl LlmEngineConfig {
    /// Projects the free-form `data` map into a typed record.
    ///
    /// Fields of the wrong JSON type are treated as absent.
    #[must_use]
    pub fn from_data(data: &JsonValue) -> Self {
        Self {
            api_key: string_field(data, "apiKey"),
            model_name: string_field(data, "modelName"),
            temperature: data
                .get("temperature")
                .and_then(JsonValue::as_f64)
                .map(|t| t as f32),
            prompt: string_field(data, "prompt"),
            web_search_tool: string_field(data, "webSearchTool"),
        }
    }

    /// The chat model to use, applying the default.
    #[must_use]
    pub fn model_name_or_default(&self) -> &str {
        match self.model_name.as_deref() {
            None | Some("") => DEFAULT_CHAT_MODEL,
            Some(model) => model,
        }
    }

    /// The sampling temperature to use, applying the default.
    #[must_use]
    pub fn temperature_or_default(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// The web-search tool selection. Anything other than the SerpAPI marker
    /// (including the persisted `"None"`) disables web search.
    #[must_use]
    pub fn web_search_tool(&self) -> WebSearchTool {
        match self.web_search_tool.as_deref() {
            Some("SerpAPI") => WebSearchTool::SerpApi,
            _ => WebSearchTool::None,
        }
    }
}

fn string_field(data: &JsonValue, key: &str) -> Option<String> {
    data.get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
}
