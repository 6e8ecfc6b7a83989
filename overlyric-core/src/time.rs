//! Millisecond conversion utilities.
//!
//! Playback positions are plain `u64` milliseconds inside the engine.

use std::time::Duration;

pub trait DurationExt {
    /// Whole milliseconds, saturating at `u64::MAX`
    fn as_millis_u64(&self) -> u64;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Shift a millisecond timestamp by a signed offset, clamping at zero.
#[must_use]
pub const fn apply_offset_ms(start_ms: u64, offset_ms: i64) -> u64 {
    if offset_ms >= 0 {
        start_ms.saturating_add(offset_ms.unsigned_abs())
    } else {
        start_ms.saturating_sub(offset_ms.unsigned_abs())
    }
}
