use std::env;

use crate::error::FloorsightError;

/// Model used when `LLM_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: String,

    // LLM
    pub anthropic_api_key: String,
    pub llm_model: String,
}

impl Config {
    /// Load configuration from environment variables. Fails fast with a clear
    /// message naming the first missing required variable.
    pub fn from_env() -> Result<Self, FloorsightError> {
        Ok(Self {
            neo4j_uri: required_env("NEO4J_URI")?,
            neo4j_user: required_env("NEO4J_USER")?,
            neo4j_password: required_env("NEO4J_PASSWORD")?,
            neo4j_database: env::var("NEO4J_DATABASE").unwrap_or_else(|_| "neo4j".to_string()),
            anthropic_api_key: required_env("ANTHROPIC_API_KEY")?,
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }
}

fn required_env(key: &str) -> Result<String, FloorsightError> {
    env::var(key)
        .map_err(|_| FloorsightError::Config(format!("{key} environment variable is required")))
}
