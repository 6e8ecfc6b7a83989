use async_trait::async_trait;
use overlyric_core::{CoreError, LyricTrack, LyricsList, LyricsSource, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads `<song_id>.json` (Subsonic structured lyrics) or `<song_id>.lrc`
/// from a directory.
pub struct FileLyricsSource {
    dir: PathBuf,
}

impl FileLyricsSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a file, mapping "not found" to `None`
    async fn read_optional(path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LyricsSource for FileLyricsSource {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch_lyrics_for_song(&self, song_id: &str) -> Result<LyricTrack> {
        // Song ids come from the command line; keep them inside the directory
        if song_id.contains(['/', '\\']) || song_id.starts_with('.') {
            return Err(CoreError::fetch_failed(song_id, "invalid song id"));
        }

        let json_path = self.dir.join(format!("{song_id}.json"));
        if let Some(content) = Self::read_optional(&json_path).await? {
            debug!("Loading structured lyrics from {}", json_path.display());
            return Ok(LyricsList::from_json(&content)?.into_track());
        }

        let lrc_path = self.dir.join(format!("{song_id}.lrc"));
        if let Some(content) = Self::read_optional(&lrc_path).await? {
            debug!("Loading LRC lyrics from {}", lrc_path.display());
            return Ok(LyricTrack::parse_lrc(&content));
        }

        Err(CoreError::fetch_failed(
            song_id,
            format!("no lyrics file in {}", self.dir.display()),
        ))
    }
}
