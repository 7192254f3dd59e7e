//! Desktop-facing side of the dotmatrix emulator shell
//!
//! [`EmulatorShell`] is what a window binds its menu, keyboard and picture
//! surface to. [`TestPatternEngine`] is a self-contained engine for running
//! the shell without an emulation core.

pub mod shell;
pub mod test_pattern;

pub use shell::{EmulatorShell, MenuAction, MenuOutcome};
pub use test_pattern::{RomInfo, TestPatternEngine};
