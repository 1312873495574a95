//! TOML-based settings persistence for the session manager.
//!
//! Reads and writes `ManagerConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\VhciBridge\config.toml`
//! - Linux:    `~/.config/vhci-bridge/config.toml`
//! - macOS:    `~/Library/Application Support/VhciBridge/config.toml`
//!
//! Example file:
//!
//! ```toml
//! [logging]
//! device_logging = false
//! desktop_logging = true
//! comm_logging = true
//!
//! [manager]
//! log_level = "info"
//! runtime_log_file = "VhciManager.txt"
//! event_queue_depth = 64
//! ```
//!
//! # Serde default values
//!
//! Every field has a default, so a missing file, a missing section or a
//! missing key all fall back to the first-run settings (every logging switch
//! off).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vhci_core::LoggingConfig;

use crate::application::engine::EngineConfig;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level settings stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ManagerConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub manager: ManagerSettings,
}

/// Process-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerSettings {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// File the controller runtime writes its diagnostic log to.
    #[serde(default = "default_runtime_log_file")]
    pub runtime_log_file: String,
    /// Capacity of the controller event queue.
    #[serde(default = "default_event_queue_depth")]
    pub event_queue_depth: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_runtime_log_file() -> String {
    "VhciManager.txt".to_string()
}
fn default_event_queue_depth() -> usize {
    64
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            runtime_log_file: default_runtime_log_file(),
            event_queue_depth: default_event_queue_depth(),
        }
    }
}

impl ManagerConfig {
    /// Engine settings derived from the `[manager]` section.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            runtime_log_file: self.manager.runtime_log_file.clone(),
            event_queue_depth: self.manager.event_queue_depth,
            ..EngineConfig::default()
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads settings from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<ManagerConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads settings from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ManagerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ManagerConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Settings read at process start.
///
/// When the file exists but cannot be read the run falls back to defaults,
/// and the file must be left alone on exit so the user's settings survive.
#[derive(Debug)]
pub struct StartupConfig {
    pub config: ManagerConfig,
    /// Why the file could not be read.  `None` when it was read or absent.
    pub load_error: Option<ConfigError>,
}

impl StartupConfig {
    /// Reads the platform config file.
    pub fn load() -> Self {
        Self::from_result(load_config())
    }

    /// Reads settings from `path`.
    pub fn load_from(path: &Path) -> Self {
        Self::from_result(load_config_from(path))
    }

    fn from_result(result: Result<ManagerConfig, ConfigError>) -> Self {
        match result {
            Ok(config) => Self {
                config,
                load_error: None,
            },
            Err(e) => Self {
                config: ManagerConfig::default(),
                load_error: Some(e),
            },
        }
    }

    /// Whether settings may be written back on exit.
    pub fn may_save(&self) -> bool {
        self.load_error.is_none()
    }
}

/// Persists settings to the platform config file.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &ManagerConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &ManagerConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory, including the `VhciBridge` part.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("VhciBridge"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("vhci-bridge"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("VhciBridge")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
