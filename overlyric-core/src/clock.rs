//! Media clock interface and an interpolating implementation.

use crate::error::{CoreError, Result};
use crate::time::DurationExt;
use std::sync::RwLock;
use tokio::time::Instant;

/// Playback clock queried by the scheduler on every tick.
pub trait MediaClock: Send + Sync {
    /// Whether the media player is reachable at all
    fn is_connected(&self) -> bool;

    /// Whether the player is ready and actively playing
    ///
    /// # Errors
    ///
    /// Returns an error if the player state cannot be read.
    fn is_ready_and_playing(&self) -> Result<bool>;

    /// Current playback position in milliseconds
    ///
    /// # Errors
    ///
    /// Returns an error if the position cannot be read.
    fn current_position_ms(&self) -> Result<u64>;
}

#[derive(Debug, Clone)]
struct ClockState {
    connected: bool,
    ready: bool,
    playing: bool,
    position_ms: u64,
    duration_ms: Option<u64>,
    /// When `position_ms` was last reported (for interpolation)
    updated_at: Instant,
}

/// A [`MediaClock`] fed with position reports from a player and
/// interpolated between reports while playing.
#[derive(Debug)]
pub struct InterpolatedClock {
    inner: RwLock<ClockState>,
}

impl Default for InterpolatedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpolatedClock {
    /// A disconnected clock at position zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ClockState {
                connected: false,
                ready: false,
                playing: false,
                position_ms: 0,
                duration_ms: None,
                updated_at: Instant::now(),
            }),
        }
    }

    /// Record a state report from the player. Marks the clock connected and ready.
    pub fn report(&self, playing: bool, position_ms: u64) {
        if let Ok(mut state) = self.inner.write() {
            state.connected = true;
            state.ready = true;
            state.playing = playing;
            state.position_ms = position_ms;
            state.updated_at = Instant::now();
        }
    }

    /// Set the track length used to clamp interpolated positions
    pub fn set_duration_ms(&self, duration_ms: Option<u64>) {
        if let Ok(mut state) = self.inner.write() {
            state.duration_ms = duration_ms;
        }
    }

    /// Mark the player as buffering (connected but not ready)
    pub fn set_ready(&self, ready: bool) {
        if let Ok(mut state) = self.inner.write() {
            state.ready = ready;
        }
    }

    pub fn set_connected(&self, connected: bool) {
        if let Ok(mut state) = self.inner.write() {
            state.connected = connected;
        }
    }

    fn snapshot(&self) -> Result<ClockState> {
        self.inner
            .read()
            .map(|state| state.clone())
            .map_err(|e| CoreError::ClockRead {
                reason: e.to_string(),
            })
    }
}

impl MediaClock for InterpolatedClock {
    fn is_connected(&self) -> bool {
        self.snapshot().is_ok_and(|state| state.connected)
    }

    fn is_ready_and_playing(&self) -> Result<bool> {
        let state = self.snapshot()?;
        if !state.connected {
            return Err(CoreError::ClockUnavailable);
        }
        Ok(state.ready && state.playing)
    }

    fn current_position_ms(&self) -> Result<u64> {
        let state = self.snapshot()?;
        if !state.connected {
            return Err(CoreError::ClockUnavailable);
        }
        if !state.playing {
            return Ok(state.position_ms);
        }

        let elapsed = state.updated_at.elapsed().as_millis_u64();
        let interpolated = state.position_ms.saturating_add(elapsed);

        // Clamp to track duration
        Ok(state
            .duration_ms
            .map_or(interpolated, |duration| interpolated.min(duration)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_clock_is_disconnected() {
        let clock = InterpolatedClock::new();
        assert!(!clock.is_connected());
        assert!(matches!(
            clock.is_ready_and_playing(),
            Err(CoreError::ClockUnavailable)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interpolates_while_playing() {
        let clock = InterpolatedClock::new();
        clock.report(true, 1000);
        tokio::time::advance(Duration::from_millis(250)).await;

        assert!(clock.is_ready_and_playing().unwrap());
        assert_eq!(clock.current_position_ms().unwrap(), 1250);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_report_keeps_playing_from_start() {
        let clock = InterpolatedClock::new();
        clock.report(true, 10_000);
        assert!(clock.is_connected());
        assert_eq!(clock.current_position_ms().unwrap(), 10_000);

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(clock.is_ready_and_playing().unwrap());
        assert_eq!(clock.current_position_ms().unwrap(), 11_500);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(clock.current_position_ms().unwrap(), 71_500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_position_does_not_advance() {
        let clock = InterpolatedClock::new();
        clock.report(false, 1000);
        tokio::time::advance(Duration::from_secs(5)).await;

        assert!(!clock.is_ready_and_playing().unwrap());
        assert_eq!(clock.current_position_ms().unwrap(), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interpolation_clamped_to_duration() {
        let clock = InterpolatedClock::new();
        clock.set_duration_ms(Some(180_000));
        clock.report(true, 178_000);
        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(clock.current_position_ms().unwrap(), 180_000);
    }

    #[test]
    fn test_not_ready_is_not_playing() {
        let clock = InterpolatedClock::new();
        clock.report(true, 0);
        clock.set_ready(false);
        assert!(!clock.is_ready_and_playing().unwrap());
    }
}
