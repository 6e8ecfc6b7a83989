//! `OpenSubsonic` structured lyrics payload (`getLyricsBySongId`).
//!
//! Only the first structured lyrics entry is used; choosing between
//! languages or versions is left to whoever serves the payload.

use crate::error::{CoreError, Result};
use crate::time::apply_offset_ms;
use crate::track::{Line, LyricTrack};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Full response envelope as returned by the server
#[derive(Debug, Clone, Deserialize)]
struct ResponseEnvelope {
    #[serde(rename = "subsonic-response")]
    response: ResponseBody,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    #[serde(default)]
    lyrics_list: Option<LyricsList>,
}

/// The `lyricsList` element
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsList {
    #[serde(default)]
    pub structured_lyrics: Vec<StructuredLyrics>,
}

/// One set of lyrics (a language or version) for a song
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredLyrics {
    #[serde(default)]
    pub display_artist: Option<String>,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    /// Milliseconds; positive values make lyrics appear sooner
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub synced: bool,
    #[serde(default)]
    pub line: Vec<StructuredLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredLine {
    #[serde(default, deserialize_with = "lenient_start")]
    pub start: Option<u64>,
    #[serde(default)]
    pub value: String,
}

/// Accept integer, float or numeric-string starts; anything else is untimed.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_start<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

impl LyricsList {
    /// Parse either a bare `lyricsList` object or a full `subsonic-response`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if the payload is not JSON at all, or
    /// [`CoreError::MalformedTrack`] if it is JSON of neither shape.
    pub fn from_json(input: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Wrapped {
            lyrics_list: LyricsList,
        }

        let value: Value = serde_json::from_str(input)?;

        if let Ok(envelope) = ResponseEnvelope::deserialize(&value) {
            return Ok(envelope.response.lyrics_list.unwrap_or_default());
        }
        if let Ok(wrapped) = Wrapped::deserialize(&value) {
            return Ok(wrapped.lyrics_list);
        }

        Self::deserialize(&value).map_err(|e| CoreError::MalformedTrack {
            reason: e.to_string(),
        })
    }

    /// Turn the first structured lyrics entry into a track.
    #[must_use]
    pub fn into_track(self) -> LyricTrack {
        self.structured_lyrics
            .into_iter()
            .next()
            .map_or_else(LyricTrack::empty, StructuredLyrics::into_track)
    }
}

impl StructuredLyrics {
    #[must_use]
    pub fn into_track(self) -> LyricTrack {
        let offset = self.offset;
        let synced = self.synced;
        LyricTrack::new(
            self.line
                .into_iter()
                .map(|line| Line {
                    // Unsynced lyrics carry no usable timing
                    start: line
                        .start
                        .filter(|_| synced)
                        .map(|start| apply_offset_ms(start, offset.saturating_neg())),
                    text: line.value,
                })
                .collect(),
        )
    }
}
