//! Config file discovery and loading.

use std::path::{Path, PathBuf};

use log::{info, warn};

use atlas_core::{Config, ConfigError};

/// Directory under the platform config root.
const APP_DIR: &str = "glyph_atlas";

/// Platform config directory: `%APPDATA%` on Windows, `$XDG_CONFIG_HOME` or
/// `~/.config` elsewhere.
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
        PathBuf::from(".").join(APP_DIR)
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR);
        }
        PathBuf::from(".").join(APP_DIR)
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Read and parse `path`, keeping the distinction between a missing file and
/// a broken one.
pub fn try_load(path: &Path) -> Result<Config, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&data)
}

/// Load `path`, falling back to defaults on any error. A missing file is
/// not worth a warning.
pub fn load(path: &Path) -> Config {
    match try_load(path) {
        Ok(config) => {
            info!("config: loaded from {}", path.display());
            config
        }
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Config::default()
        }
        Err(e) => {
            warn!("config: {e}; using defaults");
            Config::default()
        }
    }
}
