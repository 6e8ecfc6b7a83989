//! Path constants for configuration files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "overlyric";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the default lyrics directory used by the console sink
pub const LYRICS_DIR_NAME: &str = "lyrics";

/// Get the configuration directory path (~/.config/overlyric/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/overlyric/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the default lyrics directory (~/.config/overlyric/lyrics/)
#[must_use]
pub fn lyrics_dir() -> PathBuf {
    config_dir().join(LYRICS_DIR_NAME)
}
