//! Read-only projection of a session for render sinks.
//!
//! In review mode the correct option is flagged, and a recorded answer that
//! differs from it is flagged as wrong. Before review only the selection is
//! visible.

use serde::Serialize;

use crate::scoring::{SessionResult, SubmitReason};
use crate::session::SessionState;
use crate::timer::format_clock;

/// Where the session is in its lifecycle, as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Active,
    Paused,
    /// A submission was requested and awaits confirmation.
    ConfirmingSubmit,
    Submitted,
    Reviewing,
}

/// One option as it should be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub text: String,
    /// The test-taker's recorded answer for this question.
    pub selected: bool,
    /// Review only: this is the correct option.
    pub correct: bool,
    /// Review only: this was selected and is not the correct option.
    pub wrong: bool,
}

/// Everything a sink needs to draw the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub title: String,
    pub phase: Phase,
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub question: String,
    pub options: Vec<OptionView>,
    pub answer: Option<usize>,
    pub answered_count: usize,
    pub remaining_secs: u64,
    /// `remaining_secs` as `MM:SS`.
    pub remaining: String,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub result: Option<SessionResult>,
    pub submit_reason: Option<SubmitReason>,
}

impl SessionSnapshot {
    /// Override the phase, e.g. while the controller awaits confirmation.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }
}

/// Build a snapshot of `session` at its current question.
pub fn project(session: &SessionState) -> SessionSnapshot {
    let index = session.current_index();
    let total = session.question_count();
    let answer = session.current_answer();
    let reviewing = session.is_reviewing();

    let phase = if reviewing {
        Phase::Reviewing
    } else if session.is_submitted() {
        Phase::Submitted
    } else if session.is_paused() {
        Phase::Paused
    } else {
        Phase::Active
    };

    let (question, options) = match session.current_question() {
        Ok(q) => {
            let options = q
                .options
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let selected = answer == Some(i);
                    let correct = reviewing && q.is_correct(i);
                    OptionView {
                        text: text.clone(),
                        selected,
                        correct,
                        wrong: reviewing && selected && !q.is_correct(i),
                    }
                })
                .collect();
            (q.prompt.clone(), options)
        }
        Err(_) => (String::new(), Vec::new()),
    };

    let navigable = session.can_navigate();
    let submission = session.submission();

    SessionSnapshot {
        title: session.question_set().title.clone(),
        phase,
        position: index + 1,
        total,
        question,
        options,
        answer,
        answered_count: session.answers().len(),
        remaining_secs: session.remaining_secs(),
        remaining: format_clock(session.remaining_secs()),
        can_go_previous: navigable && index > 0,
        can_go_next: navigable && index + 1 < total,
        result: submission.map(|s| s.result.clone()),
        submit_reason: submission.map(|s| s.reason),
    }
}
