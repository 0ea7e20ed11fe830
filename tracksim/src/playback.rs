//! Per-track playback state machine.
//!
//! [`PlaybackState`] advances simulated distance against wall-clock time.
//! Distance is always derived from the absolute elapsed time since the
//! current leg began (`velocity_mps * elapsed`), never accumulated per
//! tick, so scheduler jitter self-corrects instead of drifting.
//!
//! State progression:
//!
//! ```text
//! Pending ──delay──► Running(Forward) ──loop──► Running(Reverse)
//!                        │    ▲                     │
//!                        │    └──────repeat─────────┤
//!                        └────────────► Completed ◄─┘ (no loop/repeat left)
//! ```

use std::time::Instant;

use crate::path::{Fix, Path};
use crate::track::TrackConfig;

/// Traversal direction of the current leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Lifecycle status of a track's playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting out the initial delay; no samples yet.
    Pending,
    /// Actively traversing a leg.
    Running,
    /// Terminal; the runner stops ticking.
    Completed,
}

/// Leg boundary crossed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegEvent {
    /// The forward leg finished and the reverse leg began.
    Reversed,
    /// A full cycle finished and playback restarted from the first waypoint.
    Restarted,
}

/// Outcome of one tick evaluation.
#[derive(Debug, Clone, Copy)]
pub enum Tick {
    /// Initial delay not yet elapsed; nothing to emit.
    Waiting,
    /// A position sample, possibly marking a leg boundary.
    Sample { fix: Fix, event: Option<LegEvent> },
    /// The final sample; playback is complete.
    Final { fix: Fix },
}

/// Mutable playback state, owned exclusively by one track runner.
#[derive(Debug)]
pub struct PlaybackState {
    velocity_mps: f64,
    initial_delay: std::time::Duration,
    loop_path: bool,
    repeat: bool,
    status: Status,
    direction: Direction,
    started: Instant,
    leg_start: Instant,
    /// The reverse leg has already run in the current loop cycle.
    reversed_this_cycle: bool,
}

impl PlaybackState {
    pub fn new(config: &TrackConfig, now: Instant) -> Self {
        Self {
            velocity_mps: config.velocity_mps(),
            initial_delay: config.initial_delay,
            loop_path: config.loop_path,
            repeat: config.repeat,
            status: Status::Pending,
            direction: Direction::Forward,
            started: now,
            leg_start: now,
            reversed_this_cycle: false,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Evaluate one tick at `now`.
    ///
    /// A tick that exhausts the current leg re-evaluates on the new leg
    /// (reverse or restarted), so leg endpoints are always emitted.
    pub fn advance(&mut self, now: Instant, path: &Path) -> Tick {
        match self.status {
            Status::Completed => return Tick::Waiting,
            Status::Pending => {
                if now.duration_since(self.started) < self.initial_delay {
                    return Tick::Waiting;
                }
                self.status = Status::Running;
                self.leg_start = now;
            }
            Status::Running => {}
        }

        let total = path.total_length();
        let mut event = None;

        loop {
            let elapsed = now.duration_since(self.leg_start).as_secs_f64();
            let distance = self.velocity_mps * elapsed;

            if distance < total {
                return Tick::Sample {
                    fix: self.fix_at(path, distance),
                    event,
                };
            }

            // Leg exhausted: reverse, restart, or finish.
            if self.direction == Direction::Forward && self.loop_path && !self.reversed_this_cycle {
                self.direction = Direction::Reverse;
                self.reversed_this_cycle = true;
                self.leg_start = now;
                event = Some(LegEvent::Reversed);
            } else if self.repeat {
                self.direction = Direction::Forward;
                self.reversed_this_cycle = false;
                self.leg_start = now;
                event = Some(LegEvent::Restarted);
            } else {
                self.status = Status::Completed;
                return Tick::Final {
                    fix: self.fix_at(path, total),
                };
            }
        }
    }

    /// Resolve a distance into the current leg to a fix, reversing both
    /// the traversal and the heading on the reverse leg.
    fn fix_at(&self, path: &Path, leg_distance: f64) -> Fix {
        let total = path.total_length();
        let distance = leg_distance.clamp(0.0, total);
        match self.direction {
            Direction::Forward => path.position_at(distance),
            Direction::Reverse => {
                let mut fix = path.position_at(total - distance);
                fix.heading = (fix.heading + 180.0) % 360.0;
                fix
            }
        }
    }
}
