//! Seams to the two external collaborators of a session.
//!
//! Loaders are implemented in `examforge-loaders`; render sinks live with
//! whatever front end draws the session (the CLI ships a terminal sink).

use async_trait::async_trait;

use crate::error::LoadError;
use crate::model::QuestionSet;
use crate::review::SessionSnapshot;
use crate::scoring::{SessionResult, SubmitReason};

// ---------------------------------------------------------------------------
// Question set loader
// ---------------------------------------------------------------------------

/// Resolves a test identifier to a question set.
#[async_trait]
pub trait QuestionSetLoader: Send + Sync {
    /// Short name of the backing source (e.g. "filesystem").
    fn name(&self) -> &str;

    /// Load the question set for `test_id`.
    async fn load(&self, test_id: &str) -> Result<QuestionSet, LoadError>;
}

// ---------------------------------------------------------------------------
// Render sink
// ---------------------------------------------------------------------------

/// Receives session state after every change. Sinks never mutate the
/// session; user input reaches the controller separately.
pub trait RenderSink: Send {
    /// Called after every state change with a fresh snapshot.
    fn render(&mut self, snapshot: &SessionSnapshot);

    /// Called once when the session is submitted.
    fn on_submitted(&mut self, result: &SessionResult, reason: SubmitReason);

    /// Called when a start or restart fails; no session exists afterwards.
    fn on_error(&mut self, message: &str);

    /// Called when the session is abandoned or the event loop ends.
    fn on_exit(&mut self);
}

/// Sink that discards everything.
pub struct NoopSink;

impl RenderSink for NoopSink {
    fn render(&mut self, _: &SessionSnapshot) {}
    fn on_submitted(&mut self, _: &SessionResult, _: SubmitReason) {}
    fn on_error(&mut self, _: &str) {}
    fn on_exit(&mut self) {}
}
