//! Configuration system for the dotmatrix emulator shell

use crate::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub session: SessionConfig,
    pub input: InputConfig,
    pub paths: PathConfig,
    pub debug: DebugConfig,
}

/// General shell settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Pause the engine right after a ROM has been loaded
    pub start_paused: bool,
}

/// Session lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest time a restart waits for the previous session to
    /// acknowledge that its engine loop has exited
    pub settle_timeout_ms: u64,
}

impl SessionConfig {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

/// Input settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InputConfig {
    pub keyboard_mapping: KeyboardMapping,
}

/// Keyboard to controller button mapping, one key name per button
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyboardMapping {
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub a: String,
    pub b: String,
    pub start: String,
    pub select: String,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory bare ROM names are looked up in
    pub roms: PathBuf,
    pub screenshots: PathBuf,
}

impl PathConfig {
    /// Resolve a ROM path given by the user.
    ///
    /// Absolute paths and paths that exist relative to the working directory
    /// are used as is; anything else is taken relative to `roms`.
    pub fn resolve_rom(&self, rom: &Path) -> PathBuf {
        if rom.is_absolute() || rom.exists() {
            rom.to_path_buf()
        } else {
            self.roms.join(rom)
        }
    }
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(EmulatorError::Config(format!("unknown log level '{other}'"))),
        }
    }
}

// Default implementations

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: 1000,
        }
    }
}

impl Default for KeyboardMapping {
    fn default() -> Self {
        Self {
            left: "Left".to_string(),
            right: "Right".to_string(),
            up: "Up".to_string(),
            down: "Down".to_string(),
            a: "Z".to_string(),
            b: "X".to_string(),
            start: "Return".to_string(),
            select: "Backspace".to_string(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dotmatrix");
        let pictures = dirs::picture_dir()
            .map(|dir| dir.join("dotmatrix"))
            .unwrap_or_else(|| data.join("screenshots"));

        Self {
            roms: data.join("roms"),
            screenshots: pictures,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or create it if it
    /// doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| EmulatorError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| EmulatorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dotmatrix")
            .join("config.toml")
    }
}
