//! Turn and transcript model.
//!
//! The transcript is append-only. The single permitted mutation after a turn
//! is appended is [`Transcript::record_concession`], which settles the
//! outcome of the final one or two turns.

use serde::{Deserialize, Serialize};

use crate::participant::Stance;

/// How a turn fared. Only the turns bracketing a concession ever leave
/// `Undecided`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Undecided,
    Prevailed,
    Conceded,
}

/// One agent's post-processed argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    /// Round the turn was produced in (1-indexed).
    pub round: u32,
    /// Model that produced the turn.
    pub speaker: String,
    /// The argument text, after truncation.
    pub content: String,
    pub stance: Stance,
    pub outcome: Outcome,
    /// Whether the model output exceeded the word ceiling and was cut.
    pub truncated: bool,
}

impl Turn {
    pub fn new(
        round: u32,
        speaker: impl Into<String>,
        content: impl Into<String>,
        stance: Stance,
        truncated: bool,
    ) -> Self {
        Self {
            round,
            speaker: speaker.into(),
            content: content.into(),
            stance,
            outcome: Outcome::Undecided,
            truncated,
        }
    }
}

/// Ordered record of every turn in a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Mark the latest turn conceded and the one before it, if any, prevailed.
    ///
    /// Returns the speaker of the prevailing turn, or `None` when the
    /// concession came on the very first turn.
    pub fn record_concession(&mut self) -> Option<&str> {
        let len = self.turns.len();
        let last = self.turns.last_mut()?;
        last.outcome = Outcome::Conceded;

        if len < 2 {
            return None;
        }
        let previous = &mut self.turns[len - 2];
        previous.outcome = Outcome::Prevailed;
        Some(previous.speaker.as_str())
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(round: u32, speaker: &str, stance: Stance) -> Turn {
        Turn::new(round, speaker, "argument", stance, false)
    }

    #[test]
    fn test_new_turn_is_undecided() {
        let t = turn(1, "a", Stance::Supporting);
        assert_eq!(t.outcome, Outcome::Undecided);
    }

    #[test]
    fn test_record_concession_on_first_turn() {
        let mut transcript = Transcript::new();
        transcript.push(turn(1, "a", Stance::Supporting));

        assert_eq!(transcript.record_concession(), None);
        assert_eq!(transcript.turns()[0].outcome, Outcome::Conceded);
    }

    #[test]
    fn test_record_concession_marks_only_bracketing_turns() {
        let mut transcript = Transcript::new();
        transcript.push(turn(1, "a", Stance::Supporting));
        transcript.push(turn(1, "b", Stance::Opposing));
        transcript.push(turn(2, "a", Stance::Supporting));
        transcript.push(turn(2, "b", Stance::Opposing));

        assert_eq!(transcript.record_concession(), Some("a"));

        let outcomes: Vec<Outcome> = transcript.iter().map(|t| t.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Undecided,
                Outcome::Undecided,
                Outcome::Prevailed,
                Outcome::Conceded,
            ]
        );
    }

    #[test]
    fn test_record_concession_on_empty_transcript() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.record_concession(), None);
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_transcript_serializes_outcomes_lowercase() {
        let mut transcript = Transcript::new();
        transcript.push(turn(1, "a", Stance::Supporting));
        transcript.record_concession();

        let json = serde_json::to_string(&transcript).unwrap();
        assert!(json.contains("\"outcome\":\"conceded\""));
        assert!(json.contains("\"stance\":\"supporting\""));
    }
}
