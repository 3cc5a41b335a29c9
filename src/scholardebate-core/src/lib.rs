//! ScholarDebate Core Library
//!
//! Runs a turn-based scholarly debate between two language models:
//! prompt construction, post-processing of each turn, the debate state
//! machine, and the closing report. Rendering is left to the host through
//! [`DebatePresenter`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod orchestrator;
pub mod participant;
pub mod postprocess;
pub mod presenter;
pub mod prompt;
pub mod transcript;

pub use analysis::{DebateReport, Tally, Verdict};
pub use config::Config;
pub use error::DebateError;
pub use gateway::{Generation, GatewayError, LanguageModelGateway, OpenAiGateway, TimeoutGateway};
pub use mock::ScriptedGateway;
pub use orchestrator::{Conclusion, DebateOrchestrator, DebateState};
pub use participant::{Agent, Stance};
pub use presenter::DebatePresenter;
pub use prompt::PromptBuilder;
pub use transcript::{Outcome, Transcript, Turn};
