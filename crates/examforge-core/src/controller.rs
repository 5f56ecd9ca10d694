//! Session controller and event loop.
//!
//! `SessionController` is the operations surface of a test attempt. It owns
//! at most one `SessionState`, pushes snapshots to a `RenderSink` after every
//! change, and turns ill-timed operations into no-ops.
//!
//! `run_session` serializes the two sources of change, timer ticks and user
//! commands, on a single task: the controller is moved into the loop, so no
//! two mutations ever overlap.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{LoadError, SessionError};
use crate::model::Direction;
use crate::report::SessionReport;
use crate::review::{Phase, SessionSnapshot};
use crate::scoring::SubmitReason;
use crate::session::SessionState;
use crate::timer::TickOutcome;
use crate::traits::{QuestionSetLoader, RenderSink};

/// Default cadence of the countdown.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Why a session could not be (re)started.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// `restart` was called before any `start`.
    #[error("no test has been started")]
    NotStarted,
}

/// A user operation, as delivered to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(String),
    Pause,
    Resume,
    /// 0-based option index.
    SelectOption(usize),
    ClearAnswer,
    Previous,
    Next,
    RequestSubmit,
    ConfirmSubmit,
    CancelSubmit,
    EnterReview,
    Restart,
    Exit,
}

/// Whether the event loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Owns one test attempt and exposes the user-facing operations.
pub struct SessionController {
    loader: Arc<dyn QuestionSetLoader>,
    sink: Box<dyn RenderSink>,
    test_id: Option<String>,
    session: Option<SessionState>,
    confirming_submit: bool,
    report: Option<SessionReport>,
}

impl SessionController {
    pub fn new(loader: Arc<dyn QuestionSetLoader>, sink: Box<dyn RenderSink>) -> Self {
        Self {
            loader,
            sink,
            test_id: None,
            session: None,
            confirming_submit: false,
            report: None,
        }
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn test_id(&self) -> Option<&str> {
        self.test_id.as_deref()
    }

    pub fn is_confirming_submit(&self) -> bool {
        self.confirming_submit
    }

    /// Report of the most recent submission. Survives `exit`, cleared by
    /// `start` and `restart`.
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    /// Whether ticks currently reach a live countdown.
    pub fn timer_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.timer_state().is_terminal())
    }

    /// Snapshot of the current session, if there is one.
    ///
    /// Navigation is reported disabled while the session is paused or a
    /// submission awaits confirmation, since both ignore it.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(|s| {
            let mut snapshot = s.snapshot();
            if self.confirming_submit {
                snapshot = snapshot.with_phase(Phase::ConfirmingSubmit);
            }
            if matches!(snapshot.phase, Phase::Paused | Phase::ConfirmingSubmit) {
                snapshot.can_go_previous = false;
                snapshot.can_go_next = false;
            }
            snapshot
        })
    }

    fn render(&mut self) {
        if let Some(snapshot) = self.snapshot() {
            self.sink.render(&snapshot);
        }
    }

    /// Load `test_id` and begin a fresh session.
    ///
    /// Any existing session is discarded first. On failure no session
    /// exists and no countdown runs.
    pub async fn start(&mut self, test_id: &str) -> Result<(), StartError> {
        self.session = None;
        self.confirming_submit = false;
        self.report = None;
        self.test_id = Some(test_id.to_string());

        let questions = self.loader.load(test_id).await?;
        let session = SessionState::initialize(Arc::new(questions))?;

        tracing::info!(
            test = test_id,
            loader = self.loader.name(),
            questions = session.question_count(),
            duration_secs = session.remaining_secs(),
            "session started"
        );

        self.session = Some(session);
        self.render();
        Ok(())
    }

    /// Throw the current session away and load the same test again.
    pub async fn restart(&mut self) -> Result<(), StartError> {
        let test_id = self.test_id.clone().ok_or(StartError::NotStarted)?;
        self.start(&test_id).await
    }

    /// Abandon the session.
    pub fn exit(&mut self) {
        if self.session.take().is_some() {
            tracing::info!(test = ?self.test_id, "session abandoned");
        }
        self.confirming_submit = false;
        self.sink.on_exit();
    }

    /// Apply a mutation only when the session is live and not hidden behind
    /// a pause or a pending confirmation.
    fn with_interactive<F>(&mut self, op: &str, f: F)
    where
        F: FnOnce(&mut SessionState) -> Result<bool, SessionError>,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_paused() || self.confirming_submit {
            tracing::debug!(op, "ignored while paused");
            return;
        }

        match f(session) {
            Ok(true) => self.render(),
            Ok(false) => {}
            Err(e) if e.is_benign() => tracing::debug!(op, "ignored: {e}"),
            Err(e) => tracing::warn!(op, "rejected: {e}"),
        }
    }

    pub fn pause(&mut self) {
        if self.confirming_submit {
            return;
        }
        if self.session.as_mut().is_some_and(|s| s.pause()) {
            self.render();
        }
    }

    pub fn resume(&mut self) {
        if self.confirming_submit {
            return;
        }
        if self.session.as_mut().is_some_and(|s| s.resume()) {
            self.render();
        }
    }

    /// Record `option` (0-based) for the current question.
    pub fn select_option(&mut self, option: usize) {
        self.with_interactive("select_option", |s| {
            let changed = s.current_answer() != Some(option);
            s.record_answer(option)?;
            Ok(changed)
        });
    }

    pub fn clear_current_answer(&mut self) {
        self.with_interactive("clear_answer", |s| s.clear_answer());
    }

    pub fn go_to_previous(&mut self) {
        self.with_interactive("previous", |s| Ok(s.move_to(Direction::Previous)));
    }

    pub fn go_to_next(&mut self) {
        self.with_interactive("next", |s| Ok(s.move_to(Direction::Next)));
    }

    /// Ask for confirmation before submitting. The countdown is suspended
    /// while the confirmation is pending.
    pub fn request_submit(&mut self) {
        if self.confirming_submit {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_submitted() || !session.pause() {
            return;
        }
        self.confirming_submit = true;
        self.render();
    }

    pub fn cancel_submit(&mut self) {
        if !self.confirming_submit {
            return;
        }
        self.confirming_submit = false;
        if let Some(session) = self.session.as_mut() {
            session.resume();
        }
        self.render();
    }

    pub fn confirm_submit(&mut self) {
        if !self.confirming_submit {
            return;
        }
        self.finish(SubmitReason::Manual);
    }

    /// Submit manually. Does nothing if the session is already submitted.
    fn finish(&mut self, reason: SubmitReason) {
        self.confirming_submit = false;
        let submitted = self
            .session
            .as_mut()
            .is_some_and(|s| s.submit(reason).is_some());
        if submitted {
            self.announce_submission();
        }
    }

    /// Report a submission that just happened, whichever path caused it.
    fn announce_submission(&mut self) {
        self.confirming_submit = false;
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(submission) = session.submission().cloned() else {
            return;
        };

        tracing::info!(
            test = ?self.test_id,
            reason = %submission.reason,
            attempted = submission.result.attempted,
            correct = submission.result.correct,
            accuracy = submission.result.accuracy,
            "session submitted"
        );
        self.report = SessionReport::from_session(session);
        self.sink.on_submitted(&submission.result, submission.reason);
        self.render();
    }

    pub fn enter_review(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.enter_review() {
            Ok(()) => self.render(),
            Err(e) => tracing::warn!("review requested out of order: {e}"),
        }
    }

    /// Deliver one timer tick.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Ignored;
        };

        let outcome = session.tick();
        match outcome {
            TickOutcome::Decremented => self.render(),
            // The session submitted itself on this tick.
            TickOutcome::Expired => self.announce_submission(),
            TickOutcome::Ignored => {}
        }
        outcome
    }

    /// Apply a command. Start failures are reported to the sink and leave
    /// the controller without a session.
    pub async fn apply(&mut self, command: Command) -> Flow {
        match command {
            Command::Start(test_id) => {
                if let Err(e) = self.start(&test_id).await {
                    tracing::error!("failed to start {test_id}: {e}");
                    self.sink.on_error(&e.to_string());
                }
            }
            Command::Restart => {
                if let Err(e) = self.restart().await {
                    tracing::error!("failed to restart: {e}");
                    self.sink.on_error(&e.to_string());
                }
            }
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::SelectOption(option) => self.select_option(option),
            Command::ClearAnswer => self.clear_current_answer(),
            Command::Previous => self.go_to_previous(),
            Command::Next => self.go_to_next(),
            Command::RequestSubmit => self.request_submit(),
            Command::ConfirmSubmit => self.confirm_submit(),
            Command::CancelSubmit => self.cancel_submit(),
            Command::EnterReview => self.enter_review(),
            Command::Exit => {
                self.exit();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }
}

/// Drive `controller` until an `Exit` command arrives or every command
/// sender is dropped, interleaving countdown ticks every `tick_interval`.
///
/// Returns the controller so callers can inspect the final state.
pub async fn run_session(
    mut controller: SessionController,
    mut commands: mpsc::Receiver<Command>,
    tick_interval: Duration,
) -> SessionController {
    let mut ticker = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let timer_active = controller.timer_active();
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else {
                    controller.exit();
                    break;
                };
                let restarts = matches!(command, Command::Start(_) | Command::Restart);
                if controller.apply(command).await == Flow::Exit {
                    break;
                }
                if restarts {
                    // A fresh countdown gets a full first second.
                    ticker.reset();
                }
            }
            _ = ticker.tick(), if timer_active => {
                controller.tick();
            }
        }
    }

    controller
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::fixtures::question_set;
    use crate::model::{QuestionSet, DEFAULT_DURATION_SECS};
    use crate::parser::parse_question_set_json;
    use crate::scoring::SessionResult;
    use crate::timer::TimerState;
    use crate::traits::NoopSink;

    struct StaticLoader {
        sets: HashMap<String, QuestionSet>,
        calls: AtomicU32,
    }

    impl StaticLoader {
        fn with(id: &str, count: usize, duration_secs: u64) -> Arc<Self> {
            let mut set = question_set(count, duration_secs);
            set.id = id.to_string();
            Arc::new(Self {
                sets: HashMap::from([(id.to_string(), set)]),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl QuestionSetLoader for StaticLoader {
        fn name(&self) -> &str {
            "static"
        }

        async fn load(&self, test_id: &str) -> Result<QuestionSet, LoadError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.sets
                .get(test_id)
                .cloned()
                .ok_or_else(|| LoadError::NotFound(test_id.to_string()))
        }
    }

    /// Serves one raw JSON resource through the real parser.
    struct RawJsonLoader(&'static str);

    #[async_trait]
    impl QuestionSetLoader for RawJsonLoader {
        fn name(&self) -> &str {
            "raw"
        }

        async fn load(&self, test_id: &str) -> Result<QuestionSet, LoadError> {
            parse_question_set_json(self.0, test_id, DEFAULT_DURATION_SECS)
        }
    }

    #[derive(Default)]
    struct Recorded {
        snapshots: Vec<SessionSnapshot>,
        submissions: Vec<(SessionResult, SubmitReason)>,
        errors: Vec<String>,
        exits: usize,
    }

    struct RecordingSink(Arc<Mutex<Recorded>>);

    impl RenderSink for RecordingSink {
        fn render(&mut self, snapshot: &SessionSnapshot) {
            self.0.lock().unwrap().snapshots.push(snapshot.clone());
        }

        fn on_submitted(&mut self, result: &SessionResult, reason: SubmitReason) {
            self.0
                .lock()
                .unwrap()
                .submissions
                .push((result.clone(), reason));
        }

        fn on_error(&mut self, message: &str) {
            self.0.lock().unwrap().errors.push(message.to_string());
        }

        fn on_exit(&mut self) {
            self.0.lock().unwrap().exits += 1;
        }
    }

    fn controller(loader: Arc<dyn QuestionSetLoader>) -> (SessionController, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let sink = Box::new(RecordingSink(Arc::clone(&recorded)));
        (SessionController::new(loader, sink), recorded)
    }

    #[tokio::test]
    async fn start_renders_first_question() {
        let (mut c, recorded) = controller(StaticLoader::with("algebra", 3, 600));
        c.start("algebra").await.unwrap();

        let rec = recorded.lock().unwrap();
        assert_eq!(rec.snapshots.len(), 1);
        assert_eq!(rec.snapshots[0].position, 1);
        assert_eq!(rec.snapshots[0].remaining, "10:00");
    }

    #[tokio::test]
    async fn missing_test_creates_no_session() {
        let (mut c, recorded) = controller(StaticLoader::with("algebra", 3, 600));
        let err = c.start("geometry").await.unwrap_err();
        assert!(matches!(err, StartError::Load(LoadError::NotFound(_))));
        assert!(c.session().is_none());
        assert!(!c.timer_active());
        assert!(recorded.lock().unwrap().snapshots.is_empty());
    }

    #[tokio::test]
    async fn invalid_data_creates_no_session() {
        let (mut c, _) = controller(StaticLoader::with("empty", 0, 600));
        let err = c.start("empty").await.unwrap_err();
        assert!(matches!(
            err,
            StartError::Session(SessionError::InvalidTestData(_))
        ));
        assert!(c.session().is_none());
    }

    #[tokio::test]
    async fn malformed_resource_creates_no_session() {
        let loader = Arc::new(RawJsonLoader(r#"{"durationMinutes": 5}"#));
        let (mut c, recorded) = controller(loader);
        let err = c.start("broken").await.unwrap_err();
        assert!(matches!(err, StartError::Load(LoadError::Parse { .. })));
        assert!(err.to_string().contains("questions"));
        assert!(c.session().is_none());
        assert!(!c.timer_active());
        assert_eq!(c.tick(), TickOutcome::Ignored);
        assert!(recorded.lock().unwrap().snapshots.is_empty());
    }

    #[tokio::test]
    async fn confirmation_flow_suspends_timer() {
        let (mut c, recorded) = controller(StaticLoader::with("t", 3, 600));
        c.start("t").await.unwrap();

        c.request_submit();
        assert!(c.is_confirming_submit());
        assert_eq!(c.snapshot().unwrap().phase, Phase::ConfirmingSubmit);
        assert_eq!(c.tick(), TickOutcome::Ignored);

        // Input is blocked while the confirmation is pending.
        c.select_option(1);
        assert!(c.session().unwrap().answers().is_empty());

        c.cancel_submit();
        assert!(!c.is_confirming_submit());
        assert_eq!(c.tick(), TickOutcome::Decremented);
        assert_eq!(c.session().unwrap().remaining_secs(), 599);

        c.request_submit();
        c.confirm_submit();
        assert!(c.session().unwrap().is_submitted());
        assert_eq!(c.session().unwrap().timer_state(), TimerState::Stopped);
        assert_eq!(recorded.lock().unwrap().submissions.len(), 1);
    }

    #[tokio::test]
    async fn confirm_without_request_is_ignored() {
        let mut c = SessionController::new(StaticLoader::with("t", 2, 600), Box::new(NoopSink));
        c.start("t").await.unwrap();
        assert_eq!(c.test_id(), Some("t"));
        c.confirm_submit();
        assert!(!c.session().unwrap().is_submitted());
    }

    #[tokio::test]
    async fn paused_session_ignores_input_and_submit_requests() {
        let (mut c, _) = controller(StaticLoader::with("t", 3, 600));
        c.start("t").await.unwrap();
        c.pause();

        c.select_option(0);
        c.go_to_next();
        c.request_submit();
        let s = c.session().unwrap();
        assert!(s.answers().is_empty());
        assert_eq!(s.current_index(), 0);
        assert!(!c.is_confirming_submit());

        c.resume();
        c.select_option(0);
        assert_eq!(c.session().unwrap().current_answer(), Some(0));
    }

    #[tokio::test]
    async fn navigation_shown_disabled_while_input_is_ignored() {
        let (mut c, _) = controller(StaticLoader::with("t", 3, 600));
        c.start("t").await.unwrap();
        c.go_to_next();
        let active = c.snapshot().unwrap();
        assert!(active.can_go_previous && active.can_go_next);

        c.pause();
        let paused = c.snapshot().unwrap();
        assert_eq!(paused.phase, Phase::Paused);
        assert!(!paused.can_go_previous && !paused.can_go_next);

        c.resume();
        c.request_submit();
        let confirming = c.snapshot().unwrap();
        assert_eq!(confirming.phase, Phase::ConfirmingSubmit);
        assert!(!confirming.can_go_previous && !confirming.can_go_next);

        c.cancel_submit();
        assert!(c.snapshot().unwrap().can_go_next);
    }

    #[tokio::test]
    async fn expiry_reports_like_manual_submission() {
        let (mut c, recorded) = controller(StaticLoader::with("t", 2, 1));
        c.start("t").await.unwrap();
        c.select_option(0);

        assert_eq!(c.tick(), TickOutcome::Expired);
        assert_eq!(c.tick(), TickOutcome::Ignored);

        let report = c.report().unwrap();
        assert_eq!(report.submit_reason, SubmitReason::TimeExpired);
        assert_eq!(report.result.correct, 1);

        let rec = recorded.lock().unwrap();
        assert_eq!(rec.submissions.len(), 1);
        assert_eq!(rec.submissions[0].0, report.result);
        assert_eq!(rec.snapshots.last().unwrap().phase, Phase::Submitted);
    }

    #[tokio::test]
    async fn review_before_submit_is_ignored() {
        let (mut c, _) = controller(StaticLoader::with("t", 3, 600));
        c.start("t").await.unwrap();
        c.enter_review();
        assert!(!c.session().unwrap().is_reviewing());
    }

    #[tokio::test]
    async fn restart_reloads_and_discards_answers() {
        let loader = StaticLoader::with("t", 3, 600);
        let (mut c, _) = controller(Arc::<StaticLoader>::clone(&loader));
        c.start("t").await.unwrap();
        c.select_option(2);
        c.request_submit();
        c.confirm_submit();

        assert!(c.report().is_some());

        c.restart().await.unwrap();
        assert!(c.report().is_none());
        let s = c.session().unwrap();
        assert!(!s.is_submitted());
        assert!(s.answers().is_empty());
        assert_eq!(s.remaining_secs(), 600);
        assert_eq!(loader.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn restart_before_start_fails() {
        let (mut c, _) = controller(StaticLoader::with("t", 3, 600));
        assert!(matches!(c.restart().await, Err(StartError::NotStarted)));
    }

    #[tokio::test(start_paused = true)]
    async fn event_loop_expiry_submits_exactly_once() {
        let (mut c, recorded) = controller(StaticLoader::with("t", 5, 3));
        c.start("t").await.unwrap();

        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_session(c, rx, DEFAULT_TICK_INTERVAL));

        tx.send(Command::SelectOption(0)).await.unwrap();
        tx.send(Command::Next).await.unwrap();
        tx.send(Command::SelectOption(3)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;

        // Late manual submission after expiry changes nothing.
        tx.send(Command::RequestSubmit).await.unwrap();
        tx.send(Command::ConfirmSubmit).await.unwrap();
        drop(tx);
        let c = handle.await.unwrap();

        let rec = recorded.lock().unwrap();
        assert_eq!(rec.submissions.len(), 1);
        let (result, reason) = &rec.submissions[0];
        assert_eq!(*reason, SubmitReason::TimeExpired);
        assert_eq!(result.total, 5);
        assert_eq!(result.attempted, 2);
        assert_eq!(result.correct, 1);
        assert_eq!(rec.exits, 1);
        assert!(c.session().is_none());
        let report = c.report().unwrap();
        assert_eq!(report.submit_reason, SubmitReason::TimeExpired);
        assert_eq!(report.time_used_secs, 3);

        let remaining: Vec<u64> = rec.snapshots.iter().map(|s| s.remaining_secs).collect();
        assert!(remaining.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(remaining.last(), Some(&0));
    }

    #[tokio::test(start_paused = true)]
    async fn event_loop_remaining_time_tracks_running_ticks_only() {
        let (mut c, recorded) = controller(StaticLoader::with("t", 2, 600));
        c.start("t").await.unwrap();

        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_session(c, rx, DEFAULT_TICK_INTERVAL));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        tx.send(Command::Pause).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        tx.send(Command::Resume).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        drop(tx);
        handle.await.unwrap();

        let rec = recorded.lock().unwrap();
        let paused_at = rec
            .snapshots
            .iter()
            .find(|s| s.phase == Phase::Paused)
            .map(|s| s.remaining_secs)
            .unwrap();
        assert_eq!(paused_at, 598);

        let last_running = rec
            .snapshots
            .iter()
            .rev()
            .find(|s| s.phase == Phase::Active)
            .map(|s| s.remaining_secs)
            .unwrap();
        assert_eq!(last_running, 597);
    }

    #[tokio::test(start_paused = true)]
    async fn event_loop_reports_failed_restart() {
        let (c, recorded) = controller(StaticLoader::with("t", 2, 600));
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(run_session(c, rx, DEFAULT_TICK_INTERVAL));

        tx.send(Command::Start("missing".into())).await.unwrap();
        tx.send(Command::Restart).await.unwrap();
        tx.send(Command::Exit).await.unwrap();
        let c = handle.await.unwrap();

        assert!(c.session().is_none());
        assert_eq!(c.test_id(), Some("missing"));
        let rec = recorded.lock().unwrap();
        assert_eq!(rec.errors.len(), 2);
        assert!(rec.errors[0].contains("missing"));
    }
}
