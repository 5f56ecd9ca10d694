//! Core data model types for examforge.
//!
//! A `QuestionSet` is loaded once per session and never mutated; the
//! session shares it through an `Arc` and keys answers by question position.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Duration applied to resources that do not state one.
pub const DEFAULT_DURATION_SECS: u64 = 600;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question text shown to the test-taker.
    #[serde(rename = "question", alias = "prompt")]
    pub prompt: String,
    /// Option texts, in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    #[serde(rename = "correctIndex", alias = "correct_index")]
    pub correct_index: usize,
}

impl Question {
    /// Returns `true` if `option` is the correct answer for this question.
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}

/// An ordered, immutable set of questions with a total allotted duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    /// The identifier the set was loaded under.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Questions in navigation order.
    pub questions: Vec<Question>,
    /// Total duration of the test in seconds.
    pub duration_secs: u64,
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Check the invariants a session relies on: at least one question, and
    /// every correct index points at an existing option.
    pub fn check_integrity(&self) -> Result<(), SessionError> {
        if self.questions.is_empty() {
            return Err(SessionError::InvalidTestData(format!(
                "test '{}' has no questions",
                self.id
            )));
        }

        for (i, q) in self.questions.iter().enumerate() {
            if q.correct_index >= q.options.len() {
                return Err(SessionError::InvalidTestData(format!(
                    "question {} has correct index {} but only {} options",
                    i + 1,
                    q.correct_index,
                    q.options.len()
                )));
            }
        }

        Ok(())
    }
}

/// Selected option per question index. A missing entry means unattempted.
pub type AnswerMap = BTreeMap<usize, usize>;

/// Direction for question navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}
