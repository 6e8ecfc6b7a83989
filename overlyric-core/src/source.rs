//! Lyrics-fetch collaborator.

use crate::error::Result;
use crate::track::LyricTrack;
use async_trait::async_trait;

/// Trait for collaborators that load the lyric track for a song.
///
/// Implementations may take arbitrarily long; the controller runs each fetch
/// in its own task and discards the result if another song was requested in
/// the meantime. Returning [`LyricTrack::empty`] means "no lyrics", which is
/// not an error.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Load the lyric track for `song_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FetchFailed`](crate::CoreError::FetchFailed) (or
    /// any other error) when the lyrics cannot be loaded.
    async fn fetch_lyrics_for_song(&self, song_id: &str) -> Result<LyricTrack>;
}
