//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a TOML file; environment variables and
//! command-line arguments override individual values. A missing config file is
//! never fatal: a warning is logged and built-in defaults apply.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root (data) folder
pub const ROOT_FOLDER_ENV: &str = "VINYL_ROOT_FOLDER";

/// Environment variable overriding the SQLite database path
pub const DATABASE_ENV: &str = "VINYL_DB";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "records.db";

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable `VINYL_ROOT_FOLDER`
/// 3. TOML config file `root_folder`
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_root: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_root {
        return path.to_path_buf();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/vinyl
        dirs::data_local_dir()
            .map(|d| d.join("vinyl"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/vinyl"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/vinyl
        dirs::data_dir()
            .map(|d| d.join("vinyl"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/vinyl"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\vinyl
        dirs::data_local_dir()
            .map(|d| d.join("vinyl"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\vinyl"))
    } else {
        PathBuf::from("./vinyl_data")
    }
}

/// Locate a config file by name in the platform config directories
///
/// Linux checks `~/.config/vinyl/<name>` then `/etc/vinyl/<name>`; other
/// platforms check the user config directory only.
pub fn find_config_file(file_name: &str) -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("vinyl").join(file_name));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/vinyl").join(file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load a TOML config file, falling back to defaults when it is absent
///
/// A missing path or missing file logs a warning and yields `T::default()`.
/// A file that exists but cannot be read or parsed is a configuration error.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        warn!("No config file found, using built-in defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using built-in defaults");
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Database path: `VINYL_DB` if set, otherwise `<root>/records.db`
pub fn database_path(root_folder: &Path) -> PathBuf {
    match std::env::var(DATABASE_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => root_folder.join(DATABASE_FILE_NAME),
    }
}

/// Standard User-Agent for outbound HTTP clients
///
/// Discogs rejects requests without an identifying User-Agent.
pub fn get_user_agent() -> String {
    format!("VinylRecordTracker/{}", env!("CARGO_PKG_VERSION"))
}

/// Resolve a secret from the environment, then the TOML config
///
/// **Priority:** ENV → TOML. Blank values are ignored. Returns `None` when no
/// source provides a usable value.
pub fn resolve_secret(name: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment ({}) and TOML config. Using environment.",
            name, env_var
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", name);
        return Some(value.trim().to_string());
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", name);
        return Some(value.trim().to_string());
    }

    None
}

/// Validate key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
