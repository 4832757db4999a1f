//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, e.g. `DATABASE_URL`, `BIND_ADDRESS`,
//! `GOOGLE_API_KEY`, `SERPAPI_API_KEY`.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Maximum database connections in the pool.
    #[serde(default = "default_max_db_connections")]
    pub max_db_connections: u32,

    /// Service-level Google API key for chat and embedding calls.
    /// Per-node keys in a workflow graph take precedence.
    #[serde(default)]
    pub google_api_key: Option<String>,

    /// SerpAPI key for web-search nodes. Absent means web search reports
    /// itself unconfigured rather than failing.
    #[serde(default)]
    pub serpapi_api_key: Option<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_max_db_connections() -> u32 {
    5
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
