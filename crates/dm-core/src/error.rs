//! Error types for the dotmatrix emulator shell

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the shell
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session {id} did not acknowledge exit within {waited_ms} ms")]
    PreviousSessionStillRunning { id: u64, waited_ms: u64 },

    #[error("Failed to configure engine for {}: {source}", path.display())]
    Configure {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Failed to spawn session thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors reported by an emulation engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("ROM not found: {}", .0.display())]
    RomNotFound(PathBuf),

    #[error("Invalid ROM {}: {reason}", path.display())]
    InvalidRom { path: PathBuf, reason: String },

    #[error("Engine has no ROM configured")]
    NotConfigured,

    #[error("Frame encoding failed: {0}")]
    FrameEncoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Screenshot errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to write screenshot to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prepare screenshot directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free screenshot name left in {}", .0.display())]
    NamesExhausted(PathBuf),
}

/// Key binding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown key '{key}' bound to {button}")]
    UnknownKey { button: &'static str, key: String },

    #[error("No key bound to {0}")]
    UnboundButton(&'static str),

    #[error("Key '{key}' bound to both {first} and {second}")]
    DuplicateKey {
        key: String,
        first: &'static str,
        second: &'static str,
    },
}

/// Result type alias for shell operations
pub type Result<T> = std::result::Result<T, EmulatorError>;
