//! Input handling for the dotmatrix emulator shell
//!
//! Translates host keyboard events into the abstract controller buttons the
//! emulated handheld understands and delivers them to a registered listener.

pub mod button;
pub mod dispatcher;
pub mod keyboard;
pub mod mapping;

pub use button::{Button, Buttons};
pub use dispatcher::{ButtonListener, InputDispatcher};
pub use keyboard::{KeyCode, KeyEvent, KeyEventType};
pub use mapping::ButtonMapping;
