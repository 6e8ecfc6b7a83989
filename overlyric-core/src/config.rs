use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlyricConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Timing and buffering parameters of the synchronization engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Re-arm cadence while the media clock reports playing
    #[serde(default = "default_playing_interval")]
    pub playing_interval_ms: u64,
    /// Re-arm cadence while paused, not ready, or after a failed tick
    #[serde(default = "default_paused_interval")]
    pub paused_interval_ms: u64,
    /// Delay before the first tick after a track loads
    #[serde(default = "default_initial_tick_delay")]
    pub initial_tick_delay_ms: u64,
    /// Delay between a song change and the start of the lyrics fetch
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// Maximum distance between the hint line and the position for an incremental scan
    #[serde(default = "default_hint_window")]
    pub hint_window_ms: u64,
    /// Capacity of the controller command channel
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

const fn default_playing_interval() -> u64 {
    300
}

const fn default_paused_interval() -> u64 {
    1000
}

const fn default_initial_tick_delay() -> u64 {
    300
}

const fn default_settle_delay() -> u64 {
    200
}

const fn default_hint_window() -> u64 {
    crate::index::HINT_WINDOW_MS
}

const fn default_command_buffer() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            playing_interval_ms: default_playing_interval(),
            paused_interval_ms: default_paused_interval(),
            initial_tick_delay_ms: default_initial_tick_delay(),
            settle_delay_ms: default_settle_delay(),
            hint_window_ms: default_hint_window(),
            command_buffer: default_command_buffer(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn playing_interval(&self) -> Duration {
        Duration::from_millis(self.playing_interval_ms)
    }

    #[must_use]
    pub const fn paused_interval(&self) -> Duration {
        Duration::from_millis(self.paused_interval_ms)
    }

    #[must_use]
    pub const fn initial_tick_delay(&self) -> Duration {
        Duration::from_millis(self.initial_tick_delay_ms)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reject values that would stall or spin the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] when a polling interval or the
    /// command buffer is zero.
    pub fn validate(&self) -> Result<()> {
        if self.playing_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "engine.playing_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.paused_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "engine.paused_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.command_buffer == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "engine.command_buffer must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for the terminal presentation sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Directory holding `<song_id>.json` or `<song_id>.lrc` files
    #[serde(default = "default_lyrics_dir")]
    pub lyrics_dir: PathBuf,
    /// Where the simulated clock starts playing from
    #[serde(default)]
    pub start_position_ms: u64,
}

fn default_lyrics_dir() -> PathBuf {
    crate::paths::lyrics_dir()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            lyrics_dir: default_lyrics_dir(),
            start_position_ms: 0,
        }
    }
}

impl OverlyricConfig {
    /// Get the config file path (~/.config/overlyric/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default path or create a template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed, or validated.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `config_path` or create a template there.
    ///
    /// # Errors
    ///
    /// See [`OverlyricConfig::load_or_create`].
    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: config_path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(config_path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error on TOML syntax errors or invalid engine values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.engine.validate()?;
        Ok(config)
    }
}

const CONFIG_TEMPLATE: &str = r##"# Overlyric Configuration
# ~/.config/overlyric/config.toml

[engine]
# Poll cadence while the player is playing
playing_interval_ms = 300
# Poll cadence while paused or not ready
paused_interval_ms = 1000
# First poll after lyrics load
initial_tick_delay_ms = 300
# Wait after a song change before fetching lyrics
settle_delay_ms = 200
# Incremental lookup window around the last resolved line
hint_window_ms = 5000
command_buffer = 64

[console]
# Directory containing <song_id>.json (OpenSubsonic lyricsList) or <song_id>.lrc
# lyrics_dir = "/home/me/.config/overlyric/lyrics"
start_position_ms = 0
"##;
