//! HTTP API server for the stackloom workflow builder.
//!
//! Exposes stacks (a workflow plus its knowledge-base documents) over a JSON
//! API: stack CRUD, workflow validation and persistence, document upload with
//! background ingestion, and chat execution.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use config::ServerConfig;
pub use state::AppState;
