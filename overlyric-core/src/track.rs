//! Lyric lines and the per-song track they form.

use tracing::debug;

/// A single lyric entry. Lines without a start time are displayable but
/// never matched by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Start of the line in milliseconds from track start
    pub start: Option<u64>,
    pub text: String,
}

impl Line {
    #[must_use]
    pub fn timed(start: u64, text: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            start: None,
            text: text.into(),
        }
    }
}

/// The ordered lyric lines for one song.
///
/// Present timestamps are non-decreasing in sequence order. The resolver
/// relies on this and never re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricTrack {
    lines: Vec<Line>,
}

impl LyricTrack {
    /// Build a track, demoting any timestamp that goes backwards relative to
    /// an earlier line to `None`.
    #[must_use]
    pub fn new(mut lines: Vec<Line>) -> Self {
        let mut high_water: Option<u64> = None;
        let mut demoted = 0_usize;

        for line in &mut lines {
            let Some(start) = line.start else { continue };
            match high_water {
                Some(previous) if start < previous => {
                    line.start = None;
                    demoted += 1;
                }
                _ => high_water = Some(start),
            }
        }

        if demoted > 0 {
            debug!("Demoted {} out-of-order timestamp(s) to untimed lines", demoted);
        }

        Self { lines }
    }

    /// The "no lyrics" track.
    #[must_use]
    pub const fn empty() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines addressable by position.
    #[must_use]
    pub fn timed_len(&self) -> usize {
        self.lines.iter().filter(|l| l.start.is_some()).count()
    }

    /// Text of the line at `index`, if any.
    #[must_use]
    pub fn text_at(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|l| l.text.as_str())
    }

    /// Text of the lines around `index`: `(previous, current, next)`.
    #[must_use]
    pub fn neighborhood(&self, index: usize) -> (Option<&str>, Option<&str>, Option<&str>) {
        let prev = index.checked_sub(1).and_then(|i| self.text_at(i));
        let next = index.checked_add(1).and_then(|i| self.text_at(i));
        (prev, self.text_at(index), next)
    }
}
