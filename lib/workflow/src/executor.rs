//! The workflow execution engine.
//!
//! The executor walks a graph from its unique start node, dispatching each
//! visited node to its handler and following the first outgoing edge in
//! persisted order until none remains. A single mutable [`ContextPayload`]
//! threads through the chain; the final payload is the answer.
//!
//! Collaborator failures never surface to the caller. Each handler absorbs
//! them into degraded-but-valid text (empty context, a fixed apology) and
//! records the underlying failure through `tracing` so operators can still
//! see it. Executions are independent: each call owns its payload and reads
//! an immutable graph snapshot, so any number may run concurrently.
//!
//! Collaborator calls carry no deadline of their own; bound them by building
//! the injected clients with request timeouts.

use crate::collaborator::{KnowledgeSearch, LanguageModel, WebSearch};
use crate::error::ExecutionError;
use crate::graph::WorkflowGraph;
use crate::node::{KnowledgeBaseConfig, LlmEngineConfig, Node, NodeKind, WebSearchTool};
use crate::payload::ContextPayload;
use crate::prompt::{self, DEFAULT_PROMPT_TEMPLATE, PromptVars};
use stackloom_core::StackId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answer substituted when the language model fails.
pub const LLM_FAILURE_REPLY: &str = "Sorry, I encountered an error while generating a response.";

/// Web context substituted when the web-search collaborator fails.
pub const WEB_SEARCH_FAILURE_REPLY: &str = "Error performing web search.";

/// Interprets workflow graphs against injected collaborator handles.
///
/// Construct one per service and share it; it holds no per-execution state.
#[derive(Clone)]
pub struct WorkflowExecutor {
    knowledge: Arc<dyn KnowledgeSearch>,
    llm: Arc<dyn LanguageModel>,
    web_search: Arc<dyn WebSearch>,
}

impl WorkflowExecutor {
    /// Creates an executor over the given collaborator handles.
    #[must_use]
    pub fn new(
        knowledge: Arc<dyn KnowledgeSearch>,
        llm: Arc<dyn LanguageModel>,
        web_search: Arc<dyn WebSearch>,
    ) -> Self {
        Self {
            knowledge,
            llm,
            web_search,
        }
    }

    /// Executes `graph` against `query`, returning the final payload.
    ///
    /// Callers are expected to have validated the graph; an unvalidated graph
    /// still fails safely here. The walk is bounded by the node count, so a
    /// cyclic graph terminates with [`ExecutionError::StepLimitExceeded`]
    /// instead of spinning forever.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MissingStartNode`] when no user-query node
    /// without incoming edges exists. The error's display text is the
    /// caller-visible answer for that condition.
    pub async fn execute(
        &self,
        graph: &WorkflowGraph,
        stack_id: StackId,
        query: &str,
    ) -> Result<ContextPayload, ExecutionError> {
        let start = graph.start_node().ok_or(ExecutionError::MissingStartNode)?;

        let mut payload = ContextPayload::text(query);
        let mut current = start;
        let step_limit = graph.node_count();

        for _ in 0..step_limit {
            debug!(node = %current.label(), kind = %current.kind, "executing node");
            payload = self.run_node(current, stack_id, query, payload).await;

            let Some(edge) = graph.first_edge_from(&current.id) else {
                return Ok(payload);
            };
            match graph.node(&edge.target) {
                Some(next) => current = next,
                None => {
                    // Dangling target: end the walk rather than fail the chat.
                    warn!(
                        source = %current.id,
                        target = %edge.target,
                        "edge targets unknown node, terminating walk"
                    );
                    return Ok(payload);
                }
            }
        }

        Err(ExecutionError::StepLimitExceeded { limit: step_limit })
    }

    async fn run_node(
        &self,
        node: &Node,
        stack_id: StackId,
        query: &str,
        payload: ContextPayload,
    ) -> ContextPayload {
        match &node.kind {
            // The entry point resets the payload to the original query,
            // discarding any prior transformation.
            NodeKind::UserQuery => ContextPayload::text(query),
            NodeKind::KnowledgeBase => self.run_knowledge_base(node, stack_id, payload).await,
            NodeKind::LlmEngine => self.run_llm_engine(node, payload).await,
            NodeKind::Output => payload,
            NodeKind::Other(kind) => {
                debug!(node = %node.id, %kind, "unrecognized node kind, passing through");
                payload
            }
        }
    }

    async fn run_knowledge_base(
        &self,
        node: &Node,
        stack_id: StackId,
        payload: ContextPayload,
    ) -> ContextPayload {
        let config = KnowledgeBaseConfig::from_data(node.config_data());
        let query = payload.query_text().to_owned();

        let context = match self
            .knowledge
            .retrieve(
                stack_id,
                &query,
                config.embedding_model_or_default(),
                config.embedding_api_key.as_deref(),
            )
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(node = %node.id, %error, "knowledge retrieval failed, continuing without context");
                String::new()
            }
        };

        ContextPayload::with_context(query, context)
    }

    async fn run_llm_engine(&self, node: &Node, payload: ContextPayload) -> ContextPayload {
        let config = LlmEngineConfig::from_data(node.config_data());
        let query = payload.query_text();
        let context = payload.context_text();

        let web_context = match config.web_search_tool() {
            WebSearchTool::SerpApi => {
                debug!(node = %node.id, "performing web search");
                match self.web_search.search(query).await {
                    Ok(text) => text,
                    Err(error) => {
                        warn!(node = %node.id, %error, "web search failed");
                        WEB_SEARCH_FAILURE_REPLY.to_owned()
                    }
                }
            }
            WebSearchTool::None => String::new(),
        };

        let template = config.prompt.as_deref().unwrap_or(DEFAULT_PROMPT_TEMPLATE);
        let rendered = prompt::render(
            template,
            &PromptVars {
                query,
                context,
                web_context: &web_context,
            },
        );

        let response = match self
            .llm
            .generate(
                &rendered,
                config.api_key.as_deref(),
                config.model_name_or_default(),
                config.temperature_or_default(),
            )
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(node = %node.id, %error, "language model call failed");
                LLM_FAILURE_REPLY.to_owned()
            }
        };

        ContextPayload::text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::error::CollaboratorError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubKnowledge {
        result: Result<String, CollaboratorError>,
        calls: Mutex<Vec<String>>,
    }

    impl StubKnowledge {
        fn returning(text: &str) -> Self {
            Self {
                result: Ok(text.to_owned()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                result: Err(CollaboratorError::new(reason)),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl KnowledgeSearch for StubKnowledge {
        async fn retrieve(
            &self,
            _stack_id: StackId,
            query: &str,
            embedding_model: &str,
            _api_key: Option<&str>,
        ) -> Result<String, CollaboratorError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{query}|{embedding_model}"));
            self.result.clone()
        }
    }

    /// Echoes "ANSWER" when the prompt contains "CTX", else the prompt itself.
    struct StubModel {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    impl StubModel {
        fn new() -> Self {
            Self {
                fail: false,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl LanguageModel for StubModel {
        async fn generate(
            &self,
            prompt: &str,
            _api_key: Option<&str>,
            _model_name: &str,
            _temperature: f32,
        ) -> Result<String, CollaboratorError> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            if self.fail {
                return Err(CollaboratorError::new("model unavailable"));
            }
            if prompt.contains("CTX") {
                Ok("ANSWER".to_owned())
            } else {
                Ok(prompt.to_owned())
            }
        }
    }

    struct StubWebSearch {
        snippets: String,
        calls: Mutex<usize>,
    }

    impl StubWebSearch {
        fn returning(text: &str) -> Self {
            Self {
                snippets: text.to_owned(),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl WebSearch for StubWebSearch {
        async fn search(&self, _query: &str) -> Result<String, CollaboratorError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.snippets.clone())
        }
    }

    fn executor_with(
        knowledge: Arc<StubKnowledge>,
        model: Arc<StubModel>,
        web: Arc<StubWebSearch>,
    ) -> WorkflowExecutor {
        WorkflowExecutor::new(knowledge, model, web)
    }

    fn default_executor() -> WorkflowExecutor {
        executor_with(
            Arc::new(StubKnowledge::returning("")),
            Arc::new(StubModel::new()),
            Arc::new(StubWebSearch::returning("")),
        )
    }

    fn passthrough_graph() -> WorkflowGraph {
        WorkflowGraph::new()
            .with_node(Node::new("1", NodeKind::UserQuery))
            .with_node(Node::new("2", NodeKind::Output))
            .with_edge(Edge::new("1", "2"))
    }

    fn rag_graph() -> WorkflowGraph {
        WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::new("kb", NodeKind::KnowledgeBase))
            .with_node(Node::new("llm", NodeKind::LlmEngine))
            .with_node(Node::new("out", NodeKind::Output))
            .with_edge(Edge::new("q", "kb"))
            .with_edge(Edge::new("kb", "llm"))
            .with_edge(Edge::new("llm", "out"))
    }

    #[tokio::test]
    async fn passthrough_chain_returns_query_unchanged() {
        let result = default_executor()
            .execute(&passthrough_graph(), StackId::new(), "hello")
            .await
            .expect("execute");
        assert_eq!(result, ContextPayload::text("hello"));
    }

    #[tokio::test]
    async fn rag_chain_threads_context_to_answer() {
        let executor = executor_with(
            Arc::new(StubKnowledge::returning("CTX")),
            Arc::new(StubModel::new()),
            Arc::new(StubWebSearch::returning("")),
        );
        let result = executor
            .execute(&rag_graph(), StackId::new(), "what is stackloom?")
            .await
            .expect("execute");
        assert_eq!(result, ContextPayload::text("ANSWER"));
    }

    #[tokio::test]
    async fn execution_is_idempotent_with_deterministic_collaborators() {
        let executor = executor_with(
            Arc::new(StubKnowledge::returning("CTX")),
            Arc::new(StubModel::new()),
            Arc::new(StubWebSearch::returning("")),
        );
        let graph = rag_graph();
        let stack_id = StackId::new();
        let first = executor.execute(&graph, stack_id, "q").await.expect("first");
        let second = executor
            .execute(&graph, stack_id, "q")
            .await
            .expect("second");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_start_node_yields_typed_error() {
        let graph = WorkflowGraph::new()
            .with_node(Node::new("1", NodeKind::Output))
            .with_node(Node::new("2", NodeKind::Output))
            .with_edge(Edge::new("1", "2"));
        let error = default_executor()
            .execute(&graph, StackId::new(), "hi")
            .await
            .expect_err("should fail");
        assert_eq!(error, ExecutionError::MissingStartNode);
        assert_eq!(
            error.to_string(),
            "Error: A 'UserQuery' node must be the start of the workflow."
        );
    }

    #[tokio::test]
    async fn cyclic_graph_hits_step_bound() {
        let graph = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::new("a", NodeKind::LlmEngine))
            .with_node(Node::new("b", NodeKind::LlmEngine))
            .with_edge(Edge::new("q", "a"))
            .with_edge(Edge::new("a", "b"))
            .with_edge(Edge::new("b", "a"));
        let error = default_executor()
            .execute(&graph, StackId::new(), "hi")
            .await
            .expect_err("should hit the bound");
        assert_eq!(error, ExecutionError::StepLimitExceeded { limit: 3 });
    }

    #[tokio::test]
    async fn knowledge_failure_degrades_to_empty_context() {
        let model = Arc::new(StubModel::new());
        let executor = executor_with(
            Arc::new(StubKnowledge::failing("index missing")),
            model.clone(),
            Arc::new(StubWebSearch::returning("")),
        );
        let result = executor
            .execute(&rag_graph(), StackId::new(), "query")
            .await
            .expect("execute");
        // The chain completes; the prompt saw an empty context slot.
        let prompt = model.last_prompt().expect("model was called");
        assert!(prompt.contains("KNOWLEDGE BASE CONTEXT:\n\n"));
        assert!(matches!(result, ContextPayload::Text(_)));
    }

    #[tokio::test]
    async fn model_failure_yields_apology() {
        let executor = executor_with(
            Arc::new(StubKnowledge::returning("CTX")),
            Arc::new(StubModel::failing()),
            Arc::new(StubWebSearch::returning("")),
        );
        let result = executor
            .execute(&rag_graph(), StackId::new(), "query")
            .await
            .expect("execute");
        assert_eq!(result, ContextPayload::text(LLM_FAILURE_REPLY));
    }

    #[tokio::test]
    async fn web_search_runs_only_when_configured() {
        let web = Arc::new(StubWebSearch::returning("fresh snippet"));
        let model = Arc::new(StubModel::new());
        let executor = executor_with(
            Arc::new(StubKnowledge::returning("")),
            model.clone(),
            web.clone(),
        );

        let plain = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::new("llm", NodeKind::LlmEngine))
            .with_node(Node::new("out", NodeKind::Output))
            .with_edge(Edge::new("q", "llm"))
            .with_edge(Edge::new("llm", "out"));
        executor
            .execute(&plain, StackId::new(), "query")
            .await
            .expect("execute");
        assert_eq!(web.call_count(), 0);

        let searching = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::with_data(
                "llm",
                NodeKind::LlmEngine,
                json!({"webSearchTool": "SerpAPI"}),
            ))
            .with_node(Node::new("out", NodeKind::Output))
            .with_edge(Edge::new("q", "llm"))
            .with_edge(Edge::new("llm", "out"));
        executor
            .execute(&searching, StackId::new(), "query")
            .await
            .expect("execute");
        assert_eq!(web.call_count(), 1);
        let prompt = model.last_prompt().expect("model was called");
        assert!(prompt.contains("fresh snippet"));
    }

    #[tokio::test]
    async fn custom_prompt_template_is_used() {
        let model = Arc::new(StubModel::new());
        let executor = executor_with(
            Arc::new(StubKnowledge::returning("")),
            model.clone(),
            Arc::new(StubWebSearch::returning("")),
        );
        let graph = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::with_data(
                "llm",
                NodeKind::LlmEngine,
                json!({"prompt": "Q: {query}"}),
            ))
            .with_node(Node::new("out", NodeKind::Output))
            .with_edge(Edge::new("q", "llm"))
            .with_edge(Edge::new("llm", "out"));
        let result = executor
            .execute(&graph, StackId::new(), "ping")
            .await
            .expect("execute");
        assert_eq!(result, ContextPayload::text("Q: ping"));
    }

    #[tokio::test]
    async fn unknown_kind_passes_payload_through() {
        let graph = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::new("x", NodeKind::Other("futureKind".to_string())))
            .with_node(Node::new("out", NodeKind::Output))
            .with_edge(Edge::new("q", "x"))
            .with_edge(Edge::new("x", "out"));
        let result = default_executor()
            .execute(&graph, StackId::new(), "unchanged")
            .await
            .expect("execute");
        assert_eq!(result, ContextPayload::text("unchanged"));
    }

    #[tokio::test]
    async fn chain_ending_on_retrieval_returns_structured_payload() {
        let executor = executor_with(
            Arc::new(StubKnowledge::returning("found it")),
            Arc::new(StubModel::new()),
            Arc::new(StubWebSearch::returning("")),
        );
        // Output directly after retrieval: the payload stays structured.
        let graph = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::new("kb", NodeKind::KnowledgeBase))
            .with_node(Node::new("out", NodeKind::Output))
            .with_edge(Edge::new("q", "kb"))
            .with_edge(Edge::new("kb", "out"));
        let result = executor
            .execute(&graph, StackId::new(), "where?")
            .await
            .expect("execute");
        assert_eq!(result, ContextPayload::with_context("where?", "found it"));
    }

    #[tokio::test]
    async fn dangling_edge_target_ends_walk() {
        let graph = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_edge(Edge::new("q", "ghost"));
        let result = default_executor()
            .execute(&graph, StackId::new(), "hi")
            .await
            .expect("execute");
        assert_eq!(result, ContextPayload::text("hi"));
    }

    #[tokio::test]
    async fn knowledge_base_sees_node_embedding_config() {
        let knowledge = Arc::new(StubKnowledge::returning("CTX"));
        let executor = executor_with(
            knowledge.clone(),
            Arc::new(StubModel::new()),
            Arc::new(StubWebSearch::returning("")),
        );
        let graph = WorkflowGraph::new()
            .with_node(Node::new("q", NodeKind::UserQuery))
            .with_node(Node::with_data(
                "kb",
                NodeKind::KnowledgeBase,
                json!({"embeddingModel": "models/text-embedding-004"}),
            ))
            .with_node(Node::new("out", NodeKind::Output))
            .with_edge(Edge::new("q", "kb"))
            .with_edge(Edge::new("kb", "out"));
        executor
            .execute(&graph, StackId::new(), "lookup")
            .await
            .expect("execute");
        let calls = knowledge.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["lookup|models/text-embedding-004"]);
    }
}
