//! Result computation for a submitted session.
//!
//! Accuracy is measured against attempted questions only, not the total:
//! leaving a question blank does not lower accuracy, it lowers `attempted`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, Question};

/// The scored outcome of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Number of questions in the set.
    pub total: usize,
    /// Number of questions with a recorded answer.
    pub attempted: usize,
    /// Number of recorded answers equal to the correct option.
    pub correct: usize,
    /// `correct / attempted` as a percentage, rounded to two decimals.
    /// Zero when nothing was attempted.
    pub accuracy: f64,
}

impl SessionResult {
    /// Number of attempted questions answered incorrectly.
    pub fn wrong(&self) -> usize {
        self.attempted - self.correct
    }

    /// Number of questions left blank.
    pub fn unattempted(&self) -> usize {
        self.total - self.attempted
    }
}

/// Why a session was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    /// The test-taker confirmed submission.
    Manual,
    /// The countdown reached zero.
    TimeExpired,
}

impl fmt::Display for SubmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitReason::Manual => write!(f, "submitted"),
            SubmitReason::TimeExpired => write!(f, "time expired"),
        }
    }
}

/// How a single question ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOutcome {
    Correct,
    Wrong,
    Unattempted,
}

/// Classify one question against the answer map.
pub fn outcome_for(index: usize, question: &Question, answers: &AnswerMap) -> QuestionOutcome {
    match answers.get(&index) {
        None => QuestionOutcome::Unattempted,
        Some(&selected) if question.is_correct(selected) => QuestionOutcome::Correct,
        Some(_) => QuestionOutcome::Wrong,
    }
}

/// Score every question index against the answer map.
pub fn compute_result(questions: &[Question], answers: &AnswerMap) -> SessionResult {
    let mut attempted = 0usize;
    let mut correct = 0usize;

    for (i, q) in questions.iter().enumerate() {
        match outcome_for(i, q, answers) {
            QuestionOutcome::Correct => {
                attempted += 1;
                correct += 1;
            }
            QuestionOutcome::Wrong => attempted += 1,
            QuestionOutcome::Unattempted => {}
        }
    }

    SessionResult {
        total: questions.len(),
        attempted,
        correct,
        accuracy: accuracy_percent(correct, attempted),
    }
}

/// `correct / attempted * 100`, rounded to two decimals; zero when
/// `attempted` is zero.
pub fn accuracy_percent(correct: usize, attempted: usize) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    let raw = correct as f64 / attempted as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
