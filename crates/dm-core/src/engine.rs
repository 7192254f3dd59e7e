//! Contract between the shell and an emulation engine

use crate::cancel::CancellationSignal;
use crate::error::EngineError;
use crate::frame_bridge::FrameBridge;
use std::path::Path;

/// An emulation engine driven by [`SessionController`](crate::SessionController).
///
/// `run` executes on the session thread while `toggle_pause` and
/// `is_paused` are called from the UI thread, so implementations keep their
/// run flag in interior-mutable state.
pub trait Engine: Send + Sync {
    /// Point the engine at a ROM before the next `run`
    fn configure(&self, rom_path: &Path) -> Result<(), EngineError>;

    /// Run the emulation loop until `cancel` is raised.
    ///
    /// The loop must check `cancel` at least once per produced frame (and
    /// while paused) and return promptly once it is set. Every completed
    /// frame goes to `display.publish`.
    fn run(&self, cancel: &CancellationSignal, display: &FrameBridge) -> Result<(), EngineError>;

    /// Flip the engine's pause flag
    fn toggle_pause(&self);

    fn is_paused(&self) -> bool;
}
