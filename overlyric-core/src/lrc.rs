//! LRC lyric text parsing.

use crate::time::apply_offset_ms;
use crate::track::{Line, LyricTrack};

impl LyricTrack {
    /// Parse LRC text into a track.
    ///
    /// Supports `[mm:ss.xx]`, `[mm:ss:xx]` and `[mm:ss]` stamps, several stamps
    /// on one line, and the `[offset:±ms]` tag. Other ID tags are skipped. A
    /// line whose stamp cannot be parsed is kept as an untimed line rather
    /// than rejected.
    #[must_use]
    pub fn parse_lrc(input: &str) -> Self {
        let mut offset_ms: i64 = 0;
        let mut lines = Vec::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // [ti:..], [ar:..], [offset:..]
            if let Some((tag, value)) = parse_id_tag(line) {
                if tag.eq_ignore_ascii_case("offset") {
                    if let Ok(offset) = value.parse::<i64>() {
                        offset_ms = offset;
                    }
                }
                continue;
            }

            lines.extend(parse_lyric_line(line));
        }

        if offset_ms != 0 {
            for line in &mut lines {
                line.start = line.start.map(|start| apply_offset_ms(start, offset_ms));
            }
        }

        Self::new(order_by_start(lines))
    }
}

/// Stable-sort lines by start time. An untimed line sorts with the timed
/// line that preceded it in the file so it stays next to its neighbour.
fn order_by_start(lines: Vec<Line>) -> Vec<Line> {
    let mut anchor = 0;
    let mut keyed: Vec<(u64, Line)> = lines
        .into_iter()
        .map(|line| {
            if let Some(start) = line.start {
                anchor = start;
            }
            (anchor, line)
        })
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, line)| line).collect()
}

/// `[tag:value]` with nothing after it, where the tag starts with a letter
fn parse_id_tag(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with('[') {
        return None;
    }

    let end = line.find(']')?;
    let content = &line[1..end];
    let (tag, value) = content.split_once(':')?;

    // Tags start with a letter; anything else is (an attempt at) a timestamp
    if !tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    // Trailing text means this is a lyric line, not a tag
    if !line[end + 1..].trim().is_empty() {
        return None;
    }

    Some((tag.trim(), value.trim()))
}

/// Expand `[t1][t2]text` into one line per readable stamp.
fn parse_lyric_line(line: &str) -> Vec<Line> {
    let mut remaining = line;
    let mut timestamps = Vec::new();
    let mut malformed = false;

    // Leading run of stamps
    while remaining.starts_with('[') {
        let Some(end) = remaining.find(']') else {
            break;
        };
        if let Some(time) = parse_timestamp(&remaining[1..end]) {
            timestamps.push(time);
        } else {
            malformed = true;
        }
        remaining = &remaining[end + 1..];
    }

    let text = remaining.trim();

    if timestamps.is_empty() {
        // Either plain text or a stamp we could not read
        if malformed && text.is_empty() {
            return Vec::new();
        }
        return vec![Line::untimed(text)];
    }

    // One line per stamp
    timestamps
        .into_iter()
        .map(|start| Line::timed(start, text))
        .collect()
}

/// `mm:ss`, `mm:ss.f+` or `mm:ss:xx` to milliseconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    match parts.as_slice() {
        [minutes, seconds] => {
            let (whole, fraction) = seconds.split_once('.').unwrap_or((*seconds, ""));
            stamp_ms(minutes, whole, parse_fraction_ms(fraction)?)
        }
        [minutes, seconds, hundredths] => {
            // mm:ss:xx (hundredths)
            let hundredths: u64 = hundredths.parse().ok()?;
            stamp_ms(minutes, seconds, hundredths.checked_mul(10)?)
        }
        _ => None,
    }
}

/// Combine minute and second digits with a millisecond part. Any overflow
/// makes the stamp unreadable.
fn stamp_ms(minutes: &str, seconds: &str, millis: u64) -> Option<u64> {
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    minutes
        .checked_mul(60_000)?
        .checked_add(seconds.checked_mul(1000)?)?
        .checked_add(millis)
}

/// ".5" -> 500, ".34" -> 340, ".345" -> 345
fn parse_fraction_ms(fraction: &str) -> Option<u64> {
    if fraction.is_empty() {
        return Some(0);
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
    digits.parse().ok()
}
