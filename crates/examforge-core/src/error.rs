//! Error types for loading question sets and driving a session.
//!
//! `LoadError` is defined here rather than in `examforge-loaders` so the
//! controller can report loader failures without string matching.

use thiserror::Error;

/// Errors raised while resolving a test identifier to a question set.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No resource backs the requested test identifier.
    #[error("test not found: {0}")]
    NotFound(String),

    /// The resource exists but does not have the expected shape.
    #[error("failed to parse test '{test_id}': {message}")]
    Parse { test_id: String, message: String },

    /// The resource could not be read (I/O or network failure).
    #[error("failed to fetch test '{test_id}': {message}")]
    Transport { test_id: String, message: String },
}

impl LoadError {
    pub fn parse(test_id: impl Into<String>, message: impl ToString) -> Self {
        LoadError::Parse {
            test_id: test_id.into(),
            message: message.to_string(),
        }
    }

    pub fn transport(test_id: impl Into<String>, message: impl ToString) -> Self {
        LoadError::Transport {
            test_id: test_id.into(),
            message: message.to_string(),
        }
    }
}

/// Errors raised by the session state machine.
///
/// Apart from `InvalidTestData`, these describe operations that arrived at
/// the wrong time. The controller turns them into no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The question set is structurally present but semantically invalid.
    #[error("invalid test data: {0}")]
    InvalidTestData(String),

    /// The current index does not point at a question.
    #[error("no active question at index {0}")]
    NoActiveQuestion(usize),

    /// An answer mutation was attempted after submission.
    #[error("session is locked after submission")]
    SessionLocked,

    /// Review was requested before the session was submitted.
    #[error("cannot review answers before the test is submitted")]
    NotSubmittedYet,

    /// The selected option does not exist on the current question.
    #[error("option {option} is out of range for question {question} ({available} options)")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        available: usize,
    },
}

impl SessionError {
    /// Returns `true` for errors caused by user timing (stale input) rather
    /// than bad data. These are expected and never surfaced to the user.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            SessionError::SessionLocked | SessionError::OptionOutOfRange { .. }
        )
    }
}
