//! Knowledge-base layer for the stackloom platform.
//!
//! Two halves share one chunk store:
//!
//! - **Ingestion** ([`DocumentIngestor`]): extract text from an uploaded
//!   document, split it into fixed-size chunks, embed the chunks in one
//!   batch, and persist them. Runs in the background relative to any chat
//!   execution — retrieval against a stack whose ingestion is still running
//!   simply sees fewer (or no) chunks.
//! - **Retrieval** ([`KnowledgeIndex`]): embed the query with the same model
//!   the documents used, rank stored chunks by cosine similarity in process,
//!   and return the top chunk texts. Implements the workflow crate's
//!   [`KnowledgeSearch`](stackloom_workflow::KnowledgeSearch) contract.

pub mod chunker;
pub mod error;
pub mod ingest;
pub mod search;
pub mod store;

pub use chunker::{DEFAULT_CHUNK_SIZE, chunk_text};
pub use error::KnowledgeError;
pub use ingest::DocumentIngestor;
pub use search::KnowledgeIndex;
pub use store::{ChunkRecord, ChunkStore};
