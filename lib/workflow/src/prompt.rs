//! Prompt assembly for LLM engine nodes.
//!
//! Templates use single-brace named slots: `{query}`, `{context}` and
//! `{web_context}`. Rendering is tolerant by design: a template that omits a
//! slot simply never receives that value, and unknown placeholders are left
//! as written rather than failing the render.

/// The built-in prompt template used when an LLM engine node carries no
/// override.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
You are a helpful assistant. Your task is to provide a direct answer to the user's query.
Use the following tools and context to construct your answer.
If context from the knowledge base is provided, prioritize it.
If context from a web search is provided, use it for recent information or if the knowledge-base context is insufficient.
If no context is provided, or the context is not relevant, answer using your general knowledge.
Do not explain your own reasoning. Provide only the direct answer.

KNOWLEDGE BASE CONTEXT:
{context}

WEB SEARCH RESULTS:
{web_context}

USER QUERY:
{query}";

/// The values substituted into a prompt template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptVars<'a> {
    /// The user's current query text.
    pub query: &'a str,
    /// Retrieved knowledge text, empty if none.
    pub context: &'a str,
    /// Web search snippets, empty if web search was not invoked.
    pub web_context: &'a str,
}

/// Renders `template`, substituting the three named slots.
#[must_use]
pub fn render(template: &str, vars: &PromptVars<'_>) -> String {
    template
        .replace("{context}", vars.context)
        .replace("{web_context}", vars.web_context)
        .replace("{query}", vars.query)
}
