//! Exported result report for a finished session.
//!
//! Reports are written for the test-taker's records only; nothing reads them
//! back into a session.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{outcome_for, QuestionOutcome, SessionResult, SubmitReason};
use crate::session::SessionState;

/// A complete result report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub test_id: String,
    pub title: String,
    pub result: SessionResult,
    pub submit_reason: SubmitReason,
    /// Allotted duration in seconds.
    pub duration_secs: u64,
    /// Seconds spent before submission.
    pub time_used_secs: u64,
    /// Per-question breakdown, in question order.
    pub questions: Vec<QuestionReport>,
}

/// How one question was answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReport {
    /// 1-based question number.
    pub number: usize,
    pub question: String,
    pub selected: Option<usize>,
    pub correct_index: usize,
    pub outcome: QuestionOutcome,
}

impl SessionReport {
    /// Build a report from a submitted session. Returns `None` if the
    /// session has not been submitted.
    pub fn from_session(session: &SessionState) -> Option<Self> {
        let submission = session.submission()?;
        let set = session.question_set();
        let answers = session.answers();

        let questions = set
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionReport {
                number: i + 1,
                question: q.prompt.clone(),
                selected: answers.get(&i).copied(),
                correct_index: q.correct_index,
                outcome: outcome_for(i, q, answers),
            })
            .collect();

        Some(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            test_id: set.id.clone(),
            title: set.title.clone(),
            result: submission.result.clone(),
            submit_reason: submission.reason,
            duration_secs: set.duration_secs,
            time_used_secs: set.duration_secs.saturating_sub(submission.remaining_secs),
            questions,
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}
