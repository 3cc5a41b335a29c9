//! Instruction prompts for opening arguments and rebuttals.

use crate::participant::Stance;

/// Word ceiling written into every prompt unless configured otherwise.
pub const DEFAULT_WORD_LIMIT: usize = 2000;

/// Builds the single instruction prompt sent to an agent for one turn.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    word_limit: usize,
}

impl PromptBuilder {
    pub fn new(word_limit: usize) -> Self {
        Self { word_limit }
    }

    pub fn word_limit(&self) -> usize {
        self.word_limit
    }

    /// Build the prompt for one turn.
    ///
    /// `opponent_argument` is copied verbatim (empty when there is none).
    /// `rebuttal` selects the rebuttal task, which is also the one that
    /// invites the model to concede.
    pub fn build(
        &self,
        topic: &str,
        stance: Stance,
        opponent_argument: &str,
        rebuttal: bool,
    ) -> String {
        let position = stance.label();
        let task = if rebuttal {
            rebuttal_task(position)
        } else {
            opening_task(position)
        };

        format!(
            r#"Topic: {topic}
Your position: {position} the topic
Opponent's argument: {opponent_argument}
Your task: {task}
IMPORTANT:
- Limit your response to {limit} words or fewer.
- Structure your response with clear introduction, body, and conclusion.
- Use formal academic language appropriate for a scholarly debate.
Your response:"#,
            limit = self.word_limit,
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_WORD_LIMIT)
    }
}

fn opening_task(position: &str) -> String {
    format!(
        r#"Provide a scholarly argument {position} the topic.
Your response should:
1. Present a clear thesis statement.
2. Develop your argument with logical reasoning and evidence from academic sources.
3. Cite relevant studies, papers, or authoritative sources (use format: (Author, Year)).
4. Address potential counterarguments and limitations of your position.
Base your argument on established research and critical thinking."#
    )
}

fn rebuttal_task(position: &str) -> String {
    format!(
        r#"Provide a scholarly rebuttal to the opponent's argument while {position} the topic.
Your response should:
1. Critically analyze the opponent's argument, identifying strengths and weaknesses.
2. Present counter-arguments supported by academic research and established theories.
3. Cite relevant studies, papers, or authoritative sources (use format: (Author, Year)).
4. Consider potential limitations or counterarguments to your own position.
If you cannot find a rational, evidence-based counter-argument, admit that you cannot continue the debate."#
    )
}
