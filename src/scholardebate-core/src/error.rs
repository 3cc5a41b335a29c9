//! Error types for the debate system.

use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Generation failed for model '{model}': {source}")]
    GenerationFailed {
        model: String,
        #[source]
        source: GatewayError,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Debate session halted after an earlier failure; start a new session")]
    SessionHalted,
}
