//! Configuration module for loading TOML config files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::DebateError;
use crate::participant::{Agent, Stance};
use crate::postprocess::DEFAULT_CONCESSION_PHRASES;
use crate::prompt::DEFAULT_WORD_LIMIT;

/// Allowed number of rounds, inclusive.
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 10;
pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// Default model server: a local OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "http://localhost:11434/v1";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub debate: DebateSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub concession: ConcessionSettings,
}

/// What is debated, by whom, and for how long.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSettings {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub agent_a: String,
    #[serde(default)]
    pub agent_b: String,
    /// Agent A argues for the topic when true; agent B always takes the other side.
    #[serde(default = "default_true")]
    pub agent_a_supports: bool,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_word_limit")]
    pub word_limit: usize,
    /// Remove `<think>`-style reasoning blocks from model output.
    #[serde(default)]
    pub strip_reasoning: bool,
}

impl Default for DebateSettings {
    fn default() -> Self {
        Self {
            topic: String::new(),
            agent_a: String::new(),
            agent_b: String::new(),
            agent_a_supports: true,
            max_rounds: DEFAULT_MAX_ROUNDS,
            word_limit: DEFAULT_WORD_LIMIT,
            strip_reasoning: false,
        }
    }
}

/// Where the model server lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    /// Per-invocation deadline; no deadline when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            timeout_secs: None,
        }
    }
}

/// Phrases that end the debate when an agent utters them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcessionSettings {
    #[serde(default = "default_phrases")]
    pub phrases: Vec<String>,
}

impl Default for ConcessionSettings {
    fn default() -> Self {
        Self {
            phrases: default_phrases(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

fn default_word_limit() -> usize {
    DEFAULT_WORD_LIMIT
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_phrases() -> Vec<String> {
    DEFAULT_CONCESSION_PHRASES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Config {
    /// A configuration with every setting but the debate itself defaulted.
    pub fn new(
        topic: impl Into<String>,
        agent_a: impl Into<String>,
        agent_b: impl Into<String>,
    ) -> Self {
        Self {
            debate: DebateSettings {
                topic: topic.into(),
                agent_a: agent_a.into(),
                agent_b: agent_b.into(),
                ..DebateSettings::default()
            },
            gateway: GatewaySettings::default(),
            concession: ConcessionSettings::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Load configuration from string content.
    pub fn parse(content: &str) -> Result<Self, DebateError> {
        toml::from_str(content)
            .map_err(|e| DebateError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Check everything that must hold before a session may start.
    pub fn validate(&self) -> Result<(), DebateError> {
        let debate = &self.debate;

        if debate.topic.trim().is_empty() {
            return Err(DebateError::InvalidConfiguration(
                "debate topic must not be empty".to_string(),
            ));
        }
        if debate.agent_a.trim().is_empty() || debate.agent_b.trim().is_empty() {
            return Err(DebateError::InvalidConfiguration(
                "both agents must name a model".to_string(),
            ));
        }
        if debate.agent_a == debate.agent_b {
            return Err(DebateError::InvalidConfiguration(format!(
                "agents must be different models, both are '{}'",
                debate.agent_a
            )));
        }
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&debate.max_rounds) {
            return Err(DebateError::InvalidConfiguration(format!(
                "max_rounds must be between {} and {}, got {}",
                MIN_ROUNDS, MAX_ROUNDS, debate.max_rounds
            )));
        }
        if debate.word_limit == 0 {
            return Err(DebateError::InvalidConfiguration(
                "word_limit must be positive".to_string(),
            ));
        }
        if self.concession.phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(DebateError::InvalidConfiguration(
                "at least one concession phrase is required".to_string(),
            ));
        }

        Ok(())
    }

    pub fn agent_a_stance(&self) -> Stance {
        Stance::from(self.debate.agent_a_supports)
    }

    /// Agent A and agent B with their fixed, opposite stances.
    pub fn agents(&self) -> (Agent, Agent) {
        Agent::pair(
            self.debate.agent_a.as_str(),
            self.debate.agent_b.as_str(),
            self.agent_a_stance(),
        )
    }
}
