//! Database repositories.

pub mod document;
pub mod stack;

pub use document::{DocumentRecord, DocumentRepository, DocumentStatus};
pub use stack::{StackRecord, StackRepository};
