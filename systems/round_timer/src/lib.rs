#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Platformer round countdown that requests the return to stacking on expiry.

use std::time::Duration;

use stackrunner_core::{CellCoord, Command, Event};

/// Countdown state of a platformer round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerState {
    /// No round is running.
    #[default]
    Idle,
    /// A round is counting down.
    Running {
        /// Time spent in the round so far.
        elapsed: Duration,
        /// Length of the round.
        limit: Duration,
    },
    /// The session ended; the timer ignores further arming until the level
    /// restarts.
    Stopped,
}

/// Pure system that accumulates simulated time while a platformer round runs.
#[derive(Debug, Default)]
pub struct RoundTimer {
    state: TimerState,
}

impl RoundTimer {
    /// Creates an idle round timer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TimerState::Idle,
        }
    }

    /// Current countdown state.
    #[must_use]
    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// Time left in the running round, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        match self.state {
            TimerState::Running { elapsed, limit } => Some(limit.saturating_sub(elapsed)),
            TimerState::Idle | TimerState::Stopped => None,
        }
    }

    /// Fraction of the round still available, in `0.0..=1.0`, for timer bars.
    #[must_use]
    pub fn remaining_fraction(&self) -> Option<f32> {
        match self.state {
            TimerState::Running { elapsed, limit } if !limit.is_zero() => {
                let remaining = limit.saturating_sub(elapsed);
                Some(remaining.as_secs_f32() / limit.as_secs_f32())
            }
            TimerState::Running { .. } => Some(0.0),
            TimerState::Idle | TimerState::Stopped => None,
        }
    }

    /// Consumes world events and emits a return request when the round expires.
    ///
    /// `player_cell` is only invoked on expiry; it should report the player's
    /// position rounded to the grid.
    pub fn handle<F>(&mut self, events: &[Event], mut player_cell: F, out: &mut Vec<Command>)
    where
        F: FnMut() -> CellCoord,
    {
        for event in events {
            match event {
                Event::LevelPrepared { .. } => self.state = TimerState::Idle,
                Event::GameOver { .. } => self.state = TimerState::Stopped,
                Event::RoundTimerArmed { duration } => {
                    if self.state != TimerState::Stopped {
                        self.state = TimerState::Running {
                            elapsed: Duration::ZERO,
                            limit: *duration,
                        };
                    }
                }
                Event::RoundTimerDisarmed => {
                    if self.state != TimerState::Stopped {
                        self.state = TimerState::Idle;
                    }
                }
                Event::TimeAdvanced { dt } => {
                    if let TimerState::Running { elapsed, limit } = &mut self.state {
                        *elapsed = elapsed.saturating_add(*dt);
                        if *elapsed >= *limit {
                            let cell = player_cell();
                            log::debug!("platformer round expired with player at {cell:?}");
                            self.state = TimerState::Idle;
                            out.push(Command::SwitchToTetris { player_cell: cell });
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
