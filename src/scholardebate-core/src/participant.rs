//! Debating agents and the side they argue.

use serde::{Deserialize, Serialize};

/// Side of the topic an agent argues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    /// Arguing in favor of the topic.
    Supporting,
    /// Arguing against the topic.
    Opposing,
}

impl Stance {
    pub fn opposite(self) -> Self {
        match self {
            Stance::Supporting => Stance::Opposing,
            Stance::Opposing => Stance::Supporting,
        }
    }

    pub fn is_supporting(self) -> bool {
        self == Stance::Supporting
    }

    /// Lowercase framing used inside prompts and prose ("supporting").
    pub fn label(self) -> &'static str {
        match self {
            Stance::Supporting => "supporting",
            Stance::Opposing => "opposing",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Stance::Supporting => "SUPPORTING",
            Stance::Opposing => "OPPOSING",
        }
    }
}

impl From<bool> for Stance {
    fn from(supports: bool) -> Self {
        if supports {
            Stance::Supporting
        } else {
            Stance::Opposing
        }
    }
}

impl From<Stance> for bool {
    fn from(stance: Stance) -> Self {
        stance.is_supporting()
    }
}

/// A language model taking one side of the debate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Agent {
    /// Model identifier understood by the gateway (e.g. "llama3:8b").
    pub model: String,
    /// The side this agent argues for the whole session.
    pub stance: Stance,
}

impl Agent {
    pub fn new(model: impl Into<String>, stance: Stance) -> Self {
        Self {
            model: model.into(),
            stance,
        }
    }

    /// The two agents of a session: A with the given stance, B always opposite.
    pub fn pair(
        agent_a: impl Into<String>,
        agent_b: impl Into<String>,
        agent_a_stance: Stance,
    ) -> (Self, Self) {
        (
            Self::new(agent_a, agent_a_stance),
            Self::new(agent_b, agent_a_stance.opposite()),
        )
    }

    /// Get the full display name with stance.
    pub fn display_name_with_stance(&self) -> String {
        format!("{} ({})", self.model, self.stance.display_name())
    }
}
