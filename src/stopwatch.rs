//! Stopwatch with an optional 3-2-1 countdown, advanced by an external tick.
//!
//! The countdown shows 3, 2 and 1 for one second each, then "Go!" for half
//! a second, after which the run starts. Callers pass `now` explicitly so
//! the machine has no clock of its own.

use std::time::{Duration, Instant};

pub const COUNTDOWN_FROM: u8 = 3;
const STAGE_LENGTH: Duration = Duration::from_secs(1);
const GO_LENGTH: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// `stage` counts 3, 2, 1 and finally 0 for "Go!"
    Counting { stage: u8, since: Instant },
    Running { started_at: Instant },
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Stopwatch {
    state: RunState,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            elapsed: Duration::ZERO,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running { .. })
    }

    pub fn is_counting(&self) -> bool {
        matches!(self.state, RunState::Counting { .. })
    }

    pub fn countdown_stage(&self) -> Option<u8> {
        match self.state {
            RunState::Counting { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Begin a new run, preceded by the countdown when `countdown` is set.
    /// Ignored while a countdown or run is already in progress.
    pub fn start(&mut self, now: Instant, countdown: bool) {
        if self.is_running() || self.is_counting() {
            return;
        }
        self.elapsed = Duration::ZERO;
        self.state = if countdown {
            RunState::Counting {
                stage: COUNTDOWN_FROM,
                since: now,
            }
        } else {
            RunState::Running { started_at: now }
        };
    }

    /// The single start/stop button: stops a run (yielding its seconds),
    /// cancels a countdown, or starts a new run.
    pub fn toggle(&mut self, now: Instant, countdown: bool) -> Option<f64> {
        match self.state {
            RunState::Running { .. } => self.stop(now),
            RunState::Counting { .. } => {
                self.cancel();
                None
            }
            RunState::Idle | RunState::Stopped => {
                self.start(now, countdown);
                None
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        // a late tick may cross several stage boundaries at once
        while let RunState::Counting { stage, since } = self.state {
            let length = if stage > 0 { STAGE_LENGTH } else { GO_LENGTH };
            let deadline = since + length;
            if now < deadline {
                break;
            }
            self.state = if stage > 0 {
                RunState::Counting {
                    stage: stage - 1,
                    since: deadline,
                }
            } else {
                RunState::Running {
                    started_at: deadline,
                }
            };
        }

        if let RunState::Running { started_at } = self.state {
            self.elapsed = now.saturating_duration_since(started_at);
        }
    }

    /// Stop a run and return its elapsed seconds. `None` when nothing was running.
    pub fn stop(&mut self, now: Instant) -> Option<f64> {
        let RunState::Running { started_at } = self.state else {
            return None;
        };
        self.elapsed = now.saturating_duration_since(started_at);
        self.state = RunState::Stopped;
        Some(self.elapsed_secs())
    }

    /// Abort a countdown without starting a run
    pub fn cancel(&mut self) {
        if self.is_counting() {
            self.state = RunState::Idle;
        }
    }

    /// Leaving the run screen: a running stopwatch is stopped and its time
    /// returned for saving, a countdown is cancelled.
    pub fn dismiss(&mut self, now: Instant) -> Option<f64> {
        match self.state {
            RunState::Running { .. } => self.stop(now),
            RunState::Counting { .. } => {
                self.cancel();
                None
            }
            _ => None,
        }
    }

    /// Throw away the current run without yielding it
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.elapsed = Duration::ZERO;
    }
}

/// `MM:SS.d`
pub fn format_elapsed(secs: f64) -> String {
    let secs = secs.max(0.0);
    let total = secs.trunc() as u64;
    let tenths = ((secs.fract() * 10.0) as u64).min(9);
    format!("{:02}:{:02}.{}", total / 60, total % 60, tenths)
}

/// Text shown for a countdown stage
pub fn countdown_label(stage: u8) -> String {
    if stage > 0 {
        stage.to_string()
    } else {
        "Go!".to_string()
    }
}
