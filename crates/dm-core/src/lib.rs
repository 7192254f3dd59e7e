//! Core of the dotmatrix emulator shell
//!
//! This crate owns the concurrency-sensitive glue between an emulation
//! engine and the desktop surface that displays it: the session lifecycle,
//! the single-slot frame hand-off, screenshot capture, and the error,
//! configuration and logging infrastructure shared by the other crates.

pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame_bridge;
pub mod logging;
pub mod screenshot;
pub mod session;

pub use cancel::CancellationSignal;
pub use config::Config;
pub use engine::Engine;
pub use error::{
    CaptureError, EmulatorError, EngineError, InputError, Result, SessionError,
};
pub use frame_bridge::{DisplayImage, Frame, FrameBridge, FrameStats, PublishOutcome};
pub use screenshot::{CaptureReport, ScreenshotCapture};
pub use session::{SessionController, SessionState};
