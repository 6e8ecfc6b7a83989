pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod gate;
pub mod index;
pub mod lrc;
pub mod paths;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod subsonic;
pub mod time;
pub mod track;

pub use clock::{InterpolatedClock, MediaClock};
pub use config::{ConsoleConfig, EngineConfig, OverlyricConfig};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use controller::{EngineSnapshot, ResolverState, SyncController, SyncHandle, SyncMode};
pub use error::{CoreError, Result};
pub use gate::{ChangeGate, Emission};
pub use index::{LineIndex, ResolverCache, HINT_WINDOW_MS};
pub use paths::{config_dir, config_path, lyrics_dir, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use scheduler::{Scheduler, TickCadence};
pub use sink::{BroadcastSink, LyricsSink, SinkEvent};
pub use source::LyricsSource;
pub use subsonic::{LyricsList, StructuredLine, StructuredLyrics};
pub use time::DurationExt;
pub use track::{Line, LyricTrack};
