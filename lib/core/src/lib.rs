//! Core domain types for the stackloom platform.
//!
//! This crate provides the foundational identifier types shared by the
//! workflow engine, the knowledge-base layer, and the HTTP server.

pub mod id;

pub use id::{DocumentId, ParseIdError, StackId};
