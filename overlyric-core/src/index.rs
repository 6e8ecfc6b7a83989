//! Position-to-line resolution.
//!
//! [`LineIndex`] answers "which line is current at this position" for one
//! immutable [`LyricTrack`]. [`ResolverCache`] carries the last resolved
//! index between ticks so that small forward steps cost a short linear scan
//! instead of a full search. The hint only ever changes how much work a
//! lookup does, never its answer.

use crate::track::LyricTrack;

/// Default distance (ms) within which a hint is trusted for an incremental scan.
pub const HINT_WINDOW_MS: u64 = 5000;

/// Outcome of trying to resolve from a hint.
enum HintScan {
    Resolved(Option<usize>),
    Inapplicable,
}

/// Time index over one lyric track.
#[derive(Debug, Clone)]
pub struct LineIndex {
    track: LyricTrack,
    /// `(start, line index)` for every timestamped line, in track order
    timed: Vec<(u64, usize)>,
    hint_window_ms: u64,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new(LyricTrack::empty())
    }
}

impl LineIndex {
    #[must_use]
    pub fn new(track: LyricTrack) -> Self {
        Self::with_hint_window(track, HINT_WINDOW_MS)
    }

    #[must_use]
    pub fn with_hint_window(track: LyricTrack, hint_window_ms: u64) -> Self {
        let timed = track
            .lines()
            .iter()
            .enumerate()
            .filter_map(|(i, line)| line.start.map(|start| (start, i)))
            .collect();

        Self {
            track,
            timed,
            hint_window_ms,
        }
    }

    #[must_use]
    pub const fn track(&self) -> &LyricTrack {
        &self.track
    }

    /// Index of the last line whose start is at or before `position_ms`.
    ///
    /// Untimed lines are never returned. Among lines sharing a start time the
    /// latest one in track order wins. `hint` may be any value, including a
    /// stale or out-of-range index.
    #[must_use]
    pub fn resolve(&self, position_ms: u64, hint: Option<usize>) -> Option<usize> {
        if let Some(hint) = hint {
            if let HintScan::Resolved(found) = self.scan_from_hint(position_ms, hint) {
                return found;
            }
        }
        self.search(position_ms)
    }

    /// Binary search over timestamped lines, ignoring any hint.
    #[must_use]
    pub fn search(&self, position_ms: u64) -> Option<usize> {
        let upper = self.timed.partition_point(|&(start, _)| start <= position_ms);
        upper
            .checked_sub(1)
            .and_then(|i| self.timed.get(i))
            .map(|&(_, index)| index)
    }

    fn scan_from_hint(&self, position_ms: u64, hint: usize) -> HintScan {
        let lines = self.track.lines();
        let Some(hint_start) = lines.get(hint).and_then(|line| line.start) else {
            return HintScan::Inapplicable;
        };
        if hint_start.abs_diff(position_ms) >= self.hint_window_ms {
            return HintScan::Inapplicable;
        }

        if position_ms >= hint_start {
            let mut best = hint;
            for (i, line) in lines.iter().enumerate().skip(hint + 1) {
                match line.start {
                    Some(start) if start > position_ms => break,
                    Some(_) => best = i,
                    None => {}
                }
            }
            // Running off the end leaves `best` on the final timestamped line
            HintScan::Resolved(Some(best))
        } else {
            HintScan::Resolved(
                lines[..hint]
                    .iter()
                    .rposition(|line| line.start.is_some_and(|start| start <= position_ms)),
            )
        }
    }
}

/// Single-slot cache of the last resolved line index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverCache {
    hint: Option<usize>,
}

impl ResolverCache {
    #[must_use]
    pub const fn new() -> Self {
        Self { hint: None }
    }

    #[must_use]
    pub const fn hint(self) -> Option<usize> {
        self.hint
    }

    pub fn clear(&mut self) {
        self.hint = None;
    }

    /// Resolve `position_ms` against `index`, returning the result and the
    /// cache to use for the next lookup. The hint only moves on a match.
    #[must_use]
    pub fn resolve(self, index: &LineIndex, position_ms: u64) -> (Option<usize>, Self) {
        let resolved = index.resolve(position_ms, self.hint);
        let next = match resolved {
            Some(i) => Self { hint: Some(i) },
            None => self,
        };
        (resolved, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Line;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn abc() -> LineIndex {
        LineIndex::new(LyricTrack::new(vec![
            Line::timed(0, "a"),
            Line::timed(1000, "b"),
            Line::timed(2000, "c"),
        ]))
    }

    fn text(index: &LineIndex, resolved: Option<usize>) -> Option<&str> {
        resolved.and_then(|i| index.track().text_at(i))
    }

    /// Reference answer: last timestamped line at or before the position.
    fn naive(track: &LyricTrack, position_ms: u64) -> Option<usize> {
        track
            .lines()
            .iter()
            .rposition(|line| line.start.is_some_and(|start| start <= position_ms))
    }

    fn random_track(rng: &mut StdRng) -> LyricTrack {
        let len = rng.gen_range(0..40);
        let mut start = rng.gen_range(0..3) * 700;
        let mut lines = Vec::new();
        for i in 0..len {
            if rng.gen_range(0..4) == 0 {
                lines.push(Line::untimed(format!("untimed {i}")));
                continue;
            }
            // Step of zero produces duplicate starts
            start += rng.gen_range(0..4) * 400;
            lines.push(Line::timed(start, format!("line {i}")));
        }
        // Occasional out-of-order stamp exercises demotion
        if len > 3 && rng.gen_range(0..3) == 0 {
            lines.push(Line::timed(rng.gen_range(0..start + 1), "late"));
        }
        LyricTrack::new(lines)
    }

    #[test]
    fn test_scenario_positions() {
        let index = abc();
        let expected = ["a", "a", "b", "b", "c", "c"];
        for (position, want) in [0, 500, 1000, 1999, 2000, 5000].into_iter().zip(expected) {
            assert_eq!(text(&index, index.resolve(position, None)), Some(want));
        }
    }

    #[test]
    fn test_scenario_positions_with_warm_cache() {
        let index = abc();
        let mut cache = ResolverCache::new();
        let mut seen = Vec::new();
        for position in [0, 500, 1000, 1999, 2000, 5000] {
            let (resolved, next) = cache.resolve(&index, position);
            cache = next;
            seen.push(text(&index, resolved).unwrap_or_default().to_string());
        }
        assert_eq!(seen, ["a", "a", "b", "b", "c", "c"]);
        assert_eq!(cache.hint(), Some(2));
    }

    #[test]
    fn test_duplicate_start_is_deterministic() {
        let index = LineIndex::new(LyricTrack::new(vec![
            Line::timed(500, "x"),
            Line::timed(500, "y"),
        ]));
        for hint in [None, Some(0), Some(1), Some(7)] {
            for _ in 0..3 {
                assert_eq!(text(&index, index.resolve(600, hint)), Some("y"));
            }
        }
    }

    #[test]
    fn test_before_first_line() {
        let index = LineIndex::new(LyricTrack::new(vec![
            Line::timed(1000, "a"),
            Line::timed(2000, "b"),
        ]));
        assert_eq!(index.resolve(999, None), None);
        // Backward scan that runs off the front
        assert_eq!(index.resolve(999, Some(1)), None);
    }

    #[test]
    fn test_all_lines_untimed() {
        let index = LineIndex::new(LyricTrack::new(vec![
            Line::untimed("a"),
            Line::untimed("b"),
        ]));
        for position in [0, 1000, u64::MAX] {
            assert_eq!(index.resolve(position, None), None);
            assert_eq!(index.resolve(position, Some(0)), None);
        }
    }

    #[test]
    fn test_empty_track() {
        let index = LineIndex::default();
        assert_eq!(index.resolve(0, None), None);
        assert_eq!(index.resolve(0, Some(0)), None);
    }

    #[test]
    fn test_single_timed_line() {
        let index = LineIndex::new(LyricTrack::new(vec![
            Line::untimed("title"),
            Line::timed(3000, "only"),
            Line::untimed("outro"),
        ]));
        assert_eq!(index.resolve(2999, None), None);
        assert_eq!(index.resolve(3000, None), Some(1));
        assert_eq!(index.resolve(600_000, None), Some(1));
        assert_eq!(index.resolve(4000, Some(1)), Some(1));
    }

    #[test]
    fn test_untimed_lines_skipped_during_scan() {
        let index = LineIndex::new(LyricTrack::new(vec![
            Line::timed(0, "a"),
            Line::untimed("-"),
            Line::untimed("-"),
            Line::timed(1000, "b"),
            Line::untimed("-"),
        ]));
        assert_eq!(index.resolve(1500, Some(0)), Some(3));
        assert_eq!(index.resolve(500, Some(3)), Some(0));
        assert_eq!(index.resolve(1500, None), Some(3));
    }

    #[test]
    fn test_stale_hints_do_not_change_result() {
        let index = abc();
        // Out of range, far away, and pointing past the answer
        assert_eq!(index.resolve(1500, Some(99)), Some(1));
        assert_eq!(index.resolve(9000, Some(0)), Some(2));
        assert_eq!(index.resolve(500, Some(2)), Some(0));
    }

    #[test]
    fn test_hint_window_is_configurable() {
        let track = LyricTrack::new((0..10).map(|i| Line::timed(i * 100, format!("{i}"))).collect());
        let narrow = LineIndex::with_hint_window(track.clone(), 1);
        let wide = LineIndex::new(track);
        assert_eq!(narrow.resolve(950, Some(0)), Some(9));
        assert_eq!(wide.resolve(950, Some(0)), Some(9));
    }

    #[test]
    fn test_cache_only_moves_on_match() {
        let index = LineIndex::new(LyricTrack::new(vec![Line::timed(1000, "a")]));
        let (resolved, cache) = ResolverCache::new().resolve(&index, 1200);
        assert_eq!(resolved, Some(0));
        assert_eq!(cache.hint(), Some(0));

        let (resolved, cache) = cache.resolve(&index, 10);
        assert_eq!(resolved, None);
        assert_eq!(cache.hint(), Some(0));

        let mut cache = cache;
        cache.clear();
        assert_eq!(cache.hint(), None);
    }

    #[test]
    fn test_search_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
        for _ in 0..300 {
            let track = random_track(&mut rng);
            let index = LineIndex::new(track.clone());
            for _ in 0..40 {
                let position = rng.gen_range(0..20_000);
                let want = naive(&track, position);
                assert_eq!(index.resolve(position, None), want, "position {position}");

                let hint = rng.gen_range(0..45_usize);
                assert_eq!(index.resolve(position, Some(hint)), want, "hint {hint}");
            }
        }
    }

    #[test]
    fn test_warm_cache_matches_cold_lookups() {
        let mut rng = StdRng::seed_from_u64(0xD1B5_4A32_D192_ED03);
        for _ in 0..200 {
            let track = random_track(&mut rng);
            let index = LineIndex::new(track);
            let mut cache = ResolverCache::new();
            let mut position = 0;
            for _ in 0..80 {
                position += rng.gen_range(0..700);
                let (warm, next) = cache.resolve(&index, position);
                cache = next;
                assert_eq!(warm, index.resolve(position, None));
            }
        }
    }
}
