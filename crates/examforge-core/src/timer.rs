//! Countdown timer state machine.
//!
//! The countdown does not own a clock. Something else (the controller's
//! interval) delivers one tick per second; the countdown decides whether a
//! tick counts.
//!
//! ```text
//! Running --pause--> Paused --resume--> Running
//! Running --tick--> Running | Expired (remaining hit zero)
//! Running | Paused --stop--> Stopped
//! ```
//!
//! `Expired` and `Stopped` are terminal.

use serde::{Deserialize, Serialize};

/// State of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Running,
    Paused,
    Expired,
    Stopped,
}

impl TimerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerState::Expired | TimerState::Stopped)
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second was taken off the remaining time.
    Decremented,
    /// Remaining time reached zero on this tick. Happens exactly once.
    Expired,
    /// The countdown is paused or finished; nothing changed.
    Ignored,
}

/// A one-second-resolution countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining_secs: u64,
    state: TimerState,
}

impl Countdown {
    /// Start a countdown in the `Running` state.
    pub fn start(duration_secs: u64) -> Self {
        Self {
            remaining_secs: duration_secs,
            state: TimerState::Running,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Apply one tick. Only a running countdown loses time.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Ignored;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Decremented
        }
    }

    /// Suspend the countdown. Returns `true` if it was running.
    pub fn pause(&mut self) -> bool {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
            true
        } else {
            false
        }
    }

    /// Resume a paused countdown. Returns `true` if it was paused.
    pub fn resume(&mut self) -> bool {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
            true
        } else {
            false
        }
    }

    /// Halt the countdown permanently.
    ///
    /// Returns `true` only for the call that actually stopped it; stopping
    /// an expired or already stopped countdown is a no-op.
    pub fn stop(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = TimerState::Stopped;
        true
    }
}

/// Format seconds as zero-padded `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
