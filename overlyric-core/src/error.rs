use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Media clock errors
    #[error("Media clock is disconnected")]
    ClockUnavailable,

    #[error("Failed to read media clock: {reason}")]
    ClockRead { reason: String },

    // Lyrics errors
    #[error("Failed to fetch lyrics for song {song_id}: {reason}")]
    FetchFailed { song_id: String, reason: String },

    #[error("Malformed lyric track: {reason}")]
    MalformedTrack { reason: String },

    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - edit it if needed and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Failed to parse lyrics payload: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Build a [`CoreError::FetchFailed`] for the given song.
    #[must_use]
    pub fn fetch_failed(song_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            song_id: song_id.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
