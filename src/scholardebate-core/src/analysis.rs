//! Transcript analysis and the closing report.
//!
//! Scoring is deliberately shallow: a side "prevails" in an exchange only
//! when its opponent concedes, so most debates end in a draw.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DebateError;
use crate::orchestrator::Conclusion;
use crate::participant::{Agent, Stance};
use crate::transcript::{Outcome, Transcript};

/// `(Author, Year)` citations, optionally several authors and several
/// `; `-separated works in one parenthesis.
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((?:\w+(?:,\s\w+)*,\s\d{4}(?:;\s)?)+\)").expect("Invalid citation regex")
});

/// Every citation-shaped substring of `text`, in order of appearance.
///
/// Purely syntactic: invented sources match just as well as real ones.
pub fn extract_citations(text: &str) -> Vec<String> {
    CITATION
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Citations from every turn, in transcript order.
pub fn collect_citations(transcript: &Transcript) -> Vec<String> {
    transcript
        .iter()
        .flat_map(|turn| extract_citations(&turn.content))
        .collect()
}

/// Contents of `agent`'s turns, in the order they were spoken.
pub fn group_by_speaker<'a>(transcript: &'a Transcript, agent: &str) -> Vec<&'a str> {
    transcript
        .iter()
        .filter(|turn| turn.speaker == agent)
        .map(|turn| turn.content.as_str())
        .collect()
}

/// Which side made the stronger case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    SupportingStronger,
    OpposingStronger,
    Draw,
}

/// Prevailed-turn counts per side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tally {
    pub supporting_wins: usize,
    pub opposing_wins: usize,
}

impl Tally {
    pub fn verdict(&self) -> Verdict {
        if self.supporting_wins > self.opposing_wins {
            Verdict::SupportingStronger
        } else if self.opposing_wins > self.supporting_wins {
            Verdict::OpposingStronger
        } else {
            Verdict::Draw
        }
    }
}

/// Count prevailed turns for the supporting and opposing agents.
pub fn tally_outcomes(transcript: &Transcript, supporting_agent: &str, opposing_agent: &str) -> Tally {
    let wins = |agent: &str| {
        transcript
            .iter()
            .filter(|turn| turn.speaker == agent && turn.outcome == Outcome::Prevailed)
            .count()
    };

    Tally {
        supporting_wins: wins(supporting_agent),
        opposing_wins: wins(opposing_agent),
    }
}

/// One agent's arguments in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentSummary {
    pub agent: String,
    pub stance: Stance,
    pub arguments: Vec<String>,
}

/// Everything the presentation layer needs for the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateReport {
    pub topic: String,
    pub conclusion: Conclusion,
    pub total_turns: usize,
    pub supporting_agent: String,
    pub opposing_agent: String,
    pub tally: Tally,
    pub verdict: Verdict,
    /// Agent A first, then agent B.
    pub summaries: Vec<AgentSummary>,
    pub citations: Vec<String>,
}

impl DebateReport {
    pub fn build(
        topic: &str,
        transcript: &Transcript,
        agent_a: &Agent,
        agent_b: &Agent,
        conclusion: Conclusion,
    ) -> Self {
        let (supporting, opposing) = if agent_a.stance.is_supporting() {
            (agent_a, agent_b)
        } else {
            (agent_b, agent_a)
        };

        let tally = tally_outcomes(transcript, &supporting.model, &opposing.model);

        let summaries = [agent_a, agent_b]
            .into_iter()
            .map(|agent| AgentSummary {
                agent: agent.model.clone(),
                stance: agent.stance,
                arguments: group_by_speaker(transcript, &agent.model)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        Self {
            topic: topic.to_string(),
            conclusion,
            total_turns: transcript.len(),
            supporting_agent: supporting.model.clone(),
            opposing_agent: opposing.model.clone(),
            tally,
            verdict: tally.verdict(),
            summaries,
            citations: collect_citations(transcript),
        }
    }

    /// Pretty-printed JSON for export.
    pub fn to_json(&self) -> Result<String, DebateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-sentence overall assessment.
    pub fn verdict_sentence(&self) -> String {
        match self.verdict {
            Verdict::SupportingStronger => format!(
                "The supporting side ({}) presented more compelling arguments.",
                self.supporting_agent
            ),
            Verdict::OpposingStronger => format!(
                "The opposing side ({}) presented more compelling arguments.",
                self.opposing_agent
            ),
            Verdict::Draw => "The debate resulted in a draw, with both sides presenting equally compelling arguments.".to_string(),
        }
    }
}
