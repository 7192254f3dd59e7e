//! Emulator shell
//!
//! Wires the session controller, frame bridge, screenshot capture and input
//! dispatcher together behind the operations the window exposes: menu
//! actions, key events and the picture surface.

use dm_core::{
    CaptureReport, Config, DisplayImage, Engine, Frame, FrameBridge, FrameStats, Result,
    ScreenshotCapture, SessionController, SessionState,
};
use dm_input::{ButtonListener, ButtonMapping, InputDispatcher, KeyCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const FRAME_POLL: Duration = Duration::from_millis(1);

/// Menu commands issued by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// File > Load ROM
    LoadRom(PathBuf),
    /// File > Pause
    TogglePause,
    /// File > Screenshot, with the destination chosen in the save dialog
    Screenshot(PathBuf),
    /// Screenshot into the configured screenshot directory
    QuickScreenshot,
    /// Window close
    Quit,
}

/// Whether the window should stay open after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Continue,
    Exit,
}

pub struct EmulatorShell {
    config: Config,
    bridge: Arc<FrameBridge>,
    session: Arc<SessionController>,
    screenshots: ScreenshotCapture,
    input: InputDispatcher,
}

impl EmulatorShell {
    pub fn new(config: Config, engine: Arc<dyn Engine>) -> Result<Self> {
        let mapping = ButtonMapping::from_config(&config.input.keyboard_mapping)?;
        let bridge = Arc::new(FrameBridge::new());
        let session = Arc::new(SessionController::new(
            engine,
            Arc::clone(&bridge),
            config.session.settle_timeout(),
        ));
        let screenshots = ScreenshotCapture::new(Arc::clone(&session), Arc::clone(&bridge));

        Ok(Self {
            config,
            bridge,
            session,
            screenshots,
            input: InputDispatcher::new(mapping),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start emulating `rom_path`, replacing whatever is running.
    ///
    /// Bare names that do not exist in the working directory are looked up
    /// in `paths.roms`. The picture surface is blanked once the previous
    /// session has exited and before the new one starts producing frames. If
    /// the previous session does not exit, nothing is changed.
    pub fn load_rom(&self, rom_path: impl AsRef<Path>) -> Result<u64> {
        let rom_path = self.config.paths.resolve_rom(rom_path.as_ref());

        if self.session.session_id().is_some() {
            self.session.settle()?;
            self.bridge.clear_display();
        }

        if self.session.is_paused() != self.config.general.start_paused {
            self.session.toggle_pause();
        }

        Ok(self.session.start(&rom_path)?)
    }

    pub fn toggle_pause(&self) {
        self.session.toggle_pause();
    }

    pub fn is_paused(&self) -> bool {
        self.session.is_paused()
    }

    /// Save the current frame to `destination`
    pub fn screenshot(&self, destination: &Path) -> Result<CaptureReport> {
        Ok(self.screenshots.capture(destination)?)
    }

    /// Save the current frame under the configured screenshot directory
    pub fn quick_screenshot(&self) -> Result<CaptureReport> {
        let destination = ScreenshotCapture::next_destination(&self.config.paths.screenshots)?;
        self.screenshot(&destination)
    }

    /// Forward a key press. Returns `true` if it reached a listener.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.input.on_key_down(key)
    }

    /// Forward a key release. Returns `true` if it reached a listener.
    pub fn key_up(&self, key: KeyCode) -> bool {
        self.input.on_key_up(key)
    }

    pub fn register_listener<L: ButtonListener + 'static>(&self, listener: &Arc<L>) {
        self.input.register_listener(listener);
    }

    pub fn unregister_listener(&self) {
        self.input.unregister_listener();
    }

    /// Raw bytes of the most recent frame
    pub fn latest_frame(&self) -> Option<Frame> {
        self.bridge.read_latest()
    }

    /// Picture currently shown, if any
    pub fn latest_image(&self) -> Option<DisplayImage> {
        self.bridge.latest_image()
    }

    pub fn stats(&self) -> FrameStats {
        self.bridge.stats()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session.session_id()
    }

    /// Block until `count` more frames have been published.
    ///
    /// Gives up early when the engine is paused, the session ends, or
    /// `timeout` elapses. Returns the number of frames published meanwhile.
    pub fn advance_frames(&self, count: u64, timeout: Duration) -> u64 {
        let start = self.bridge.stats().published;
        let deadline = Instant::now() + timeout;

        loop {
            let advanced = self.bridge.stats().published.saturating_sub(start);
            if advanced >= count {
                return advanced;
            }
            if self.session.is_paused() || self.session.state() != SessionState::Running {
                tracing::debug!("No frames coming, stopping after {}", advanced);
                return advanced;
            }
            if Instant::now() >= deadline {
                tracing::warn!("Only {} of {} frames within {:?}", advanced, count, timeout);
                return advanced;
            }
            std::thread::sleep(FRAME_POLL);
        }
    }

    /// Stop the session and join its thread. Returns `false` if the engine
    /// loop did not exit within `timeout`.
    pub fn close(&self, timeout: Duration) -> bool {
        self.session.shutdown(timeout)
    }

    pub fn handle(&self, action: MenuAction) -> Result<MenuOutcome> {
        tracing::debug!("Menu action {:?}", action);
        match action {
            MenuAction::LoadRom(path) => {
                self.load_rom(&path)?;
            }
            MenuAction::TogglePause => self.toggle_pause(),
            MenuAction::Screenshot(path) => {
                self.screenshot(&path)?;
            }
            MenuAction::QuickScreenshot => {
                self.quick_screenshot()?;
            }
            MenuAction::Quit => {
                self.session.stop();
                return Ok(MenuOutcome::Exit);
            }
        }
        Ok(MenuOutcome::Continue)
    }
}

impl Drop for EmulatorShell {
    fn drop(&mut self) {
        self.session.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_core::config::KeyboardMapping;
    use dm_core::{EmulatorError, InputError};

    #[test]
    fn test_bad_key_config_is_rejected() {
        let mut config = Config::default();
        config.input.keyboard_mapping = KeyboardMapping {
            a: "NotAKey".to_string(),
            ..KeyboardMapping::default()
        };

        let engine = Arc::new(crate::TestPatternEngine::new());
        let err = EmulatorShell::new(config, engine).err().unwrap();
        assert!(matches!(
            err,
            EmulatorError::Input(InputError::UnknownKey { button: "A", .. })
        ));
    }

    #[test]
    fn test_idle_shell() {
        let shell = EmulatorShell::new(
            Config::default(),
            Arc::new(crate::TestPatternEngine::new()),
        )
        .unwrap();

        assert_eq!(shell.state(), SessionState::Idle);
        assert!(shell.latest_frame().is_none());
        assert!(shell.latest_image().is_none());
        assert!(!shell.key_down(KeyCode::Z));
        assert_eq!(shell.handle(MenuAction::Quit).unwrap(), MenuOutcome::Exit);
        assert!(shell.close(Duration::from_millis(10)));
    }
}
