//! Adaptive polling schedule.
//!
//! The scheduler holds at most one pending tick. Arming replaces whatever was
//! pending, and only the owner of the scheduler can await the tick, so a
//! cancelled tick can never fire later.

use crate::clock::MediaClock;
use crate::config::EngineConfig;
use crate::error::Result;
use std::time::Duration;
use tokio::time::Instant;

/// Playback state observed on a tick, which decides the next cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCadence {
    /// Ready and playing: resolve now, tick again soon
    Playing,
    /// Paused, buffering, or a failed tick: skip work, tick again slowly
    Paused,
    /// Clock disconnected: do nothing until restarted
    Idle,
}

impl TickCadence {
    /// Classify the clock's current state.
    ///
    /// # Errors
    ///
    /// Propagates errors from reading the clock.
    pub fn observe(clock: &dyn MediaClock) -> Result<Self> {
        if !clock.is_connected() {
            return Ok(Self::Idle);
        }
        if clock.is_ready_and_playing()? {
            Ok(Self::Playing)
        } else {
            Ok(Self::Paused)
        }
    }
}

/// Single-slot tick timer with playback-dependent intervals
#[derive(Debug)]
pub struct Scheduler {
    deadline: Option<Instant>,
    playing_interval: Duration,
    paused_interval: Duration,
    initial_delay: Duration,
}

impl Scheduler {
    #[must_use]
    pub const fn new(config: &EngineConfig) -> Self {
        Self {
            deadline: None,
            playing_interval: config.playing_interval(),
            paused_interval: config.paused_interval(),
            initial_delay: config.initial_tick_delay(),
        }
    }

    /// Schedule the next tick `delay` from now, replacing any pending tick.
    pub fn arm(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    /// Schedule the first tick after a track loads.
    pub fn arm_initial(&mut self) {
        self.arm(self.initial_delay);
    }

    /// Schedule the follow-up tick for the cadence just observed.
    /// [`TickCadence::Idle`] leaves nothing scheduled.
    pub fn rearm(&mut self, cadence: TickCadence) {
        match cadence {
            TickCadence::Playing => self.arm(self.playing_interval),
            TickCadence::Paused => self.arm(self.paused_interval),
            TickCadence::Idle => self.cancel(),
        }
    }

    /// Drop the pending tick, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolve once the pending tick is due, consuming it. Never resolves
    /// while nothing is armed.
    ///
    /// Cancel safe: dropping the future before completion leaves the tick
    /// pending.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}
