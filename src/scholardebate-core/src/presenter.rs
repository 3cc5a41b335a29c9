//! Presentation boundary.
//!
//! The core never renders anything itself; a host supplies a presenter and
//! the orchestrator calls into it as the debate unfolds.

use crate::analysis::DebateReport;
use crate::orchestrator::Conclusion;
use crate::participant::Agent;
use crate::transcript::Turn;

pub trait DebatePresenter: Send + Sync {
    /// A new round is about to start.
    fn show_round(&self, _round: u32) {}

    /// An agent is about to be invoked. Hosts typically show a spinner here.
    fn show_pending(&self, _agent: &Agent, _round: u32) {}

    /// A turn was appended to the transcript.
    fn show_turn(&self, turn: &Turn);

    /// Something the user should notice, such as a truncated turn.
    fn show_warning(&self, message: &str);

    /// The debate ended.
    fn show_conclusion(&self, conclusion: &Conclusion);

    /// The closing report is ready.
    fn show_report(&self, report: &DebateReport);
}
