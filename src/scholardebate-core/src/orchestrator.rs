//! Debate orchestration logic.
//!
//! Agent A leads every round with the same stance and agent B answers it.
//! Each call to [`DebateOrchestrator::step`] produces exactly one turn, so a
//! round is two steps unless the leader concedes.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::DebateReport;
use crate::config::Config;
use crate::error::DebateError;
use crate::gateway::LanguageModelGateway;
use crate::participant::Agent;
use crate::postprocess::{self, ConcessionDetector};
use crate::presenter::DebatePresenter;
use crate::prompt::PromptBuilder;
use crate::transcript::{Transcript, Turn};

/// Why a debate ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Conclusion {
    /// `agent` conceded during `round`.
    Concession { agent: String, round: u32 },
    /// All rounds were played without a concession.
    RoundLimit { rounds: u32 },
}

impl Conclusion {
    pub fn by_concession(&self) -> bool {
        matches!(self, Conclusion::Concession { .. })
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conclusion::Concession { agent, .. } => write!(
                f,
                "Debate concluded: {} could not provide a rational, evidence-based counter-argument.",
                agent
            ),
            Conclusion::RoundLimit { rounds } => write!(
                f,
                "The debate reached the maximum number of rounds ({}) without a definitive conclusion.",
                rounds
            ),
        }
    }
}

/// Where a session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebateState {
    /// Agent A is next, opening `round`.
    AwaitingFirstTurn { round: u32 },
    /// Agent B is next, answering agent A in `round`.
    AwaitingRebuttal { round: u32 },
    Concluded(Conclusion),
    /// A generation failure ended the session; it cannot be resumed.
    Halted,
}

/// Orchestrates one debate session between two agents.
pub struct DebateOrchestrator {
    topic: String,
    agent_a: Agent,
    agent_b: Agent,
    max_rounds: u32,
    word_limit: usize,
    strip_reasoning: bool,
    prompts: PromptBuilder,
    detector: ConcessionDetector,
    gateway: Arc<dyn LanguageModelGateway>,
    transcript: Transcript,
    state: DebateState,
    presenter: Option<Arc<dyn DebatePresenter>>,
}

impl DebateOrchestrator {
    /// Create a session. Fails before any turn if the configuration is invalid.
    pub fn new(config: &Config, gateway: Arc<dyn LanguageModelGateway>) -> Result<Self, DebateError> {
        config.validate()?;

        let (agent_a, agent_b) = config.agents();
        let debate = &config.debate;

        Ok(Self {
            topic: debate.topic.clone(),
            agent_a,
            agent_b,
            max_rounds: debate.max_rounds,
            word_limit: debate.word_limit,
            strip_reasoning: debate.strip_reasoning,
            prompts: PromptBuilder::new(debate.word_limit),
            detector: ConcessionDetector::new(&config.concession.phrases),
            gateway,
            transcript: Transcript::new(),
            state: DebateState::AwaitingFirstTurn { round: 1 },
            presenter: None,
        })
    }

    /// Set the presenter that renders the debate.
    pub fn with_presenter(mut self, presenter: Arc<dyn DebatePresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Run the debate to its conclusion and return the closing report.
    pub async fn run(&mut self) -> Result<DebateReport, DebateError> {
        info!(
            topic = %self.topic,
            agent_a = %self.agent_a.display_name_with_stance(),
            agent_b = %self.agent_b.display_name_with_stance(),
            max_rounds = self.max_rounds,
            "starting debate"
        );

        let conclusion = loop {
            if let DebateState::Concluded(conclusion) = &self.state {
                break conclusion.clone();
            }
            self.step().await?;
        };

        let report = self.build_report(conclusion);
        self.present(|p| p.show_report(&report));
        Ok(report)
    }

    /// Produce the next turn and advance the state machine.
    ///
    /// Stepping a concluded session does nothing; stepping a halted one is
    /// an error.
    pub async fn step(&mut self) -> Result<&DebateState, DebateError> {
        match self.state.clone() {
            DebateState::AwaitingFirstTurn { round } => {
                self.present(|p| p.show_round(round));

                let opponent_argument = self
                    .transcript
                    .last()
                    .map(|turn| turn.content.clone())
                    .unwrap_or_default();
                let rebuttal = !self.transcript.is_empty();
                let leader = self.agent_a.clone();

                self.state = if self.take_turn(&leader, round, &opponent_argument, rebuttal).await? {
                    self.conclude_by_concession(&leader, round)
                } else {
                    DebateState::AwaitingRebuttal { round }
                };
            }
            DebateState::AwaitingRebuttal { round } => {
                let opponent_argument = self
                    .transcript
                    .last()
                    .map(|turn| turn.content.clone())
                    .unwrap_or_default();
                let responder = self.agent_b.clone();

                self.state = if self.take_turn(&responder, round, &opponent_argument, true).await? {
                    self.conclude_by_concession(&responder, round)
                } else if round >= self.max_rounds {
                    self.conclude(Conclusion::RoundLimit { rounds: round })
                } else {
                    DebateState::AwaitingFirstTurn { round: round + 1 }
                };
            }
            DebateState::Concluded(_) => {}
            DebateState::Halted => return Err(DebateError::SessionHalted),
        }

        Ok(&self.state)
    }

    /// Invoke `agent`, post-process its answer and append the turn.
    ///
    /// Returns whether the new turn is a concession.
    async fn take_turn(
        &mut self,
        agent: &Agent,
        round: u32,
        opponent_argument: &str,
        rebuttal: bool,
    ) -> Result<bool, DebateError> {
        let prompt = self
            .prompts
            .build(&self.topic, agent.stance, opponent_argument, rebuttal);

        info!(round, speaker = %agent.model, rebuttal, "requesting turn");
        debug!(prompt_bytes = prompt.len(), "built prompt");
        self.present(|p| p.show_pending(agent, round));

        let generation = match self.gateway.invoke(&agent.model, &prompt).await {
            Ok(generation) => generation,
            Err(source) => {
                warn!(round, speaker = %agent.model, error = %source, "generation failed, halting debate");
                self.state = DebateState::Halted;
                return Err(DebateError::GenerationFailed {
                    model: agent.model.clone(),
                    source,
                });
            }
        };

        let text = if self.strip_reasoning {
            postprocess::strip_reasoning(&generation.text)
        } else {
            generation.text
        };

        let truncation = postprocess::truncate(&text, self.word_limit);
        let conceded = self.detector.detect(&truncation.text);
        debug!(
            words = truncation.text.split_whitespace().count(),
            truncated = truncation.truncated,
            conceded,
            "post-processed turn"
        );

        let turn = Turn::new(
            round,
            agent.model.as_str(),
            truncation.text,
            agent.stance,
            truncation.truncated,
        );
        self.transcript.push(turn.clone());
        self.present(|p| p.show_turn(&turn));

        if turn.truncated {
            warn!(speaker = %agent.model, limit = self.word_limit, "turn truncated");
            let message = format!(
                "{}'s response was truncated to {} words.",
                agent.model, self.word_limit
            );
            self.present(|p| p.show_warning(&message));
        }

        Ok(conceded)
    }

    fn conclude_by_concession(&mut self, agent: &Agent, round: u32) -> DebateState {
        let prevailing = self.transcript.record_concession().map(str::to_string);
        info!(round, conceded = %agent.model, prevailed = ?prevailing, "concession detected");

        self.conclude(Conclusion::Concession {
            agent: agent.model.clone(),
            round,
        })
    }

    fn conclude(&self, conclusion: Conclusion) -> DebateState {
        info!(turns = self.transcript.len(), %conclusion, "debate concluded");
        self.present(|p| p.show_conclusion(&conclusion));
        DebateState::Concluded(conclusion)
    }

    fn build_report(&self, conclusion: Conclusion) -> DebateReport {
        DebateReport::build(
            &self.topic,
            &self.transcript,
            &self.agent_a,
            &self.agent_b,
            conclusion,
        )
    }

    /// Call the presenter if one is registered.
    fn present(&self, f: impl FnOnce(&dyn DebatePresenter)) {
        if let Some(ref presenter) = self.presenter {
            f(presenter.as_ref());
        }
    }

    /// The closing report, once the debate has concluded.
    pub fn report(&self) -> Option<DebateReport> {
        self.conclusion()
            .cloned()
            .map(|conclusion| self.build_report(conclusion))
    }

    pub fn conclusion(&self) -> Option<&Conclusion> {
        match &self.state {
            DebateState::Concluded(conclusion) => Some(conclusion),
            _ => None,
        }
    }

    pub fn is_concluded(&self) -> bool {
        self.conclusion().is_some()
    }

    pub fn state(&self) -> &DebateState {
        &self.state
    }

    /// Get the full transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn agents(&self) -> (&Agent, &Agent) {
        (&self.agent_a, &self.agent_b)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}
