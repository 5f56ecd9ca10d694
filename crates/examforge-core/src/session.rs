//! The test-session state machine.
//!
//! `SessionState` owns everything that changes during one attempt: the
//! current position, the answer map, the countdown, and the submission.
//! Mode progression is one-way:
//!
//! ```text
//! active -> (paused <-> active)* -> submitted -> reviewing?
//! ```
//!
//! Once submitted, the answer map is frozen and the result is fixed.

use std::sync::Arc;

use crate::error::SessionError;
use crate::model::{AnswerMap, Direction, Question, QuestionSet};
use crate::review::{self, SessionSnapshot};
use crate::scoring::{compute_result, SessionResult, SubmitReason};
use crate::timer::{Countdown, TickOutcome, TimerState};

/// The finalized outcome of a session, computed once at submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub result: SessionResult,
    pub reason: SubmitReason,
    /// Seconds left on the countdown when the session was submitted.
    pub remaining_secs: u64,
}

/// State of a single test attempt.
#[derive(Debug, Clone)]
pub struct SessionState {
    questions: Arc<QuestionSet>,
    current: usize,
    answers: AnswerMap,
    countdown: Countdown,
    submission: Option<Submission>,
    reviewing: bool,
}

impl SessionState {
    /// Start a session over a validated question set.
    ///
    /// Fails with `InvalidTestData` if the set is empty or any correct index
    /// is out of range; no session exists in that case.
    pub fn initialize(questions: Arc<QuestionSet>) -> Result<Self, SessionError> {
        questions.check_integrity()?;

        let countdown = Countdown::start(questions.duration_secs);
        Ok(Self {
            questions,
            current: 0,
            answers: AnswerMap::new(),
            countdown,
            submission: None,
            reviewing: false,
        })
    }

    pub fn question_set(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Result<&Question, SessionError> {
        self.questions
            .get(self.current)
            .ok_or(SessionError::NoActiveQuestion(self.current))
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.answers.get(&self.current).copied()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.countdown.remaining_secs()
    }

    pub fn timer_state(&self) -> TimerState {
        self.countdown.state()
    }

    pub fn is_paused(&self) -> bool {
        self.countdown.state() == TimerState::Paused
    }

    pub fn is_submitted(&self) -> bool {
        self.submission.is_some()
    }

    pub fn is_reviewing(&self) -> bool {
        self.reviewing
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    /// Whether navigation is currently allowed: before submission, or while
    /// reviewing.
    pub fn can_navigate(&self) -> bool {
        !self.is_submitted() || self.reviewing
    }

    fn ensure_unlocked(&self) -> Result<(), SessionError> {
        if self.is_submitted() || self.reviewing {
            Err(SessionError::SessionLocked)
        } else {
            Ok(())
        }
    }

    /// Select `option` for the current question, replacing any prior choice.
    pub fn record_answer(&mut self, option: usize) -> Result<(), SessionError> {
        self.ensure_unlocked()?;

        let question = self.current_question()?;
        if option >= question.options.len() {
            return Err(SessionError::OptionOutOfRange {
                question: self.current,
                option,
                available: question.options.len(),
            });
        }

        self.answers.insert(self.current, option);
        Ok(())
    }

    /// Remove the answer for the current question. Returns `true` if there
    /// was one.
    pub fn clear_answer(&mut self) -> Result<bool, SessionError> {
        self.ensure_unlocked()?;
        Ok(self.answers.remove(&self.current).is_some())
    }

    /// Move one question in `direction`, clamping at both ends.
    ///
    /// Returns `true` if the position changed.
    pub fn move_to(&mut self, direction: Direction) -> bool {
        if !self.can_navigate() {
            return false;
        }

        let last = self.questions.len().saturating_sub(1);
        let target = match direction {
            Direction::Previous => self.current.saturating_sub(1),
            Direction::Next => (self.current + 1).min(last),
        };

        if target == self.current {
            return false;
        }
        self.current = target;
        true
    }

    /// Suspend the countdown. No effect once submitted.
    pub fn pause(&mut self) -> bool {
        self.countdown.pause()
    }

    /// Resume a paused countdown.
    pub fn resume(&mut self) -> bool {
        self.countdown.resume()
    }

    /// Deliver one timer tick. When this tick exhausts the countdown the
    /// session is submitted with `SubmitReason::TimeExpired`.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.countdown.tick();
        if outcome == TickOutcome::Expired {
            self.submit(SubmitReason::TimeExpired);
        }
        outcome
    }

    /// Finalize the session and compute its result.
    ///
    /// Returns `Some` only for the call that actually submitted; every later
    /// call, whatever its reason, returns `None` and changes nothing.
    pub fn submit(&mut self, reason: SubmitReason) -> Option<SessionResult> {
        if self.submission.is_some() {
            return None;
        }

        self.countdown.stop();
        let result = compute_result(&self.questions.questions, &self.answers);
        self.submission = Some(Submission {
            result: result.clone(),
            reason,
            remaining_secs: self.countdown.remaining_secs(),
        });
        Some(result)
    }

    /// Switch a submitted session into read-only review, starting at the
    /// first question.
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        if !self.is_submitted() {
            return Err(SessionError::NotSubmittedYet);
        }
        self.reviewing = true;
        self.current = 0;
        Ok(())
    }

    /// Project the current state for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        review::project(self)
    }
}
