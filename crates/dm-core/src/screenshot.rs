//! Screenshot capture
//!
//! Pauses the engine, copies the latest frame out of the bridge while
//! holding the slot, writes it verbatim, and resumes. The resume is tied to
//! a guard so it also happens when the write fails.

use crate::error::CaptureError;
use crate::frame_bridge::FrameBridge;
use crate::session::SessionController;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MAX_SCREENSHOT_INDEX: u32 = 9999;

/// Result of a successful capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Toggles pause on creation and again on drop
struct PauseGuard<'a> {
    session: &'a SessionController,
}

impl<'a> PauseGuard<'a> {
    fn engage(session: &'a SessionController) -> Self {
        session.toggle_pause();
        Self { session }
    }
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.session.toggle_pause();
    }
}

pub struct ScreenshotCapture {
    session: Arc<SessionController>,
    bridge: Arc<FrameBridge>,
}

impl ScreenshotCapture {
    pub fn new(session: Arc<SessionController>, bridge: Arc<FrameBridge>) -> Self {
        Self { session, bridge }
    }

    /// Write the last published frame to `destination`.
    ///
    /// When nothing has been published yet the file is created empty.
    pub fn capture(&self, destination: &Path) -> Result<CaptureReport, CaptureError> {
        let _paused = PauseGuard::engage(&self.session);

        let bytes = self
            .bridge
            .capture_with(|frame| std::fs::write(destination, frame.as_bytes()).map(|()| frame.len()))
            .map_err(|source| CaptureError::Persist {
                path: destination.to_path_buf(),
                source,
            })?;

        tracing::info!("Saved screenshot ({} bytes) to {}", bytes, destination.display());
        Ok(CaptureReport {
            path: destination.to_path_buf(),
            bytes,
        })
    }

    /// First unused `screenshot-NNNN.bmp` in `dir`, creating `dir` if needed
    pub fn next_destination(dir: &Path) -> Result<PathBuf, CaptureError> {
        std::fs::create_dir_all(dir).map_err(|source| CaptureError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        (1..=MAX_SCREENSHOT_INDEX)
            .map(|n| dir.join(format!("screenshot-{n:04}.bmp")))
            .find(|path| !path.exists())
            .ok_or_else(|| CaptureError::NamesExhausted(dir.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationSignal;
    use crate::engine::Engine;
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct PauseCounter {
        paused: AtomicBool,
        toggles: AtomicU32,
    }

    impl Engine for PauseCounter {
        fn configure(&self, _rom_path: &Path) -> Result<(), EngineError> {
            Ok(())
        }

        fn run(&self, _cancel: &CancellationSignal, _display: &FrameBridge) -> Result<(), EngineError> {
            Ok(())
        }

        fn toggle_pause(&self) {
            self.paused.fetch_xor(true, Ordering::SeqCst);
            self.toggles.fetch_add(1, Ordering::SeqCst);
        }

        fn is_paused(&self) -> bool {
            self.paused.load(Ordering::SeqCst)
        }
    }

    fn capture_setup() -> (Arc<PauseCounter>, Arc<FrameBridge>, ScreenshotCapture) {
        let engine = Arc::new(PauseCounter::default());
        let bridge = Arc::new(FrameBridge::new());
        let session = Arc::new(SessionController::new(
            engine.clone(),
            bridge.clone(),
            Duration::from_millis(100),
        ));
        let capture = ScreenshotCapture::new(session, bridge.clone());
        (engine, bridge, capture)
    }

    #[test]
    fn test_capture_writes_latest_frame_verbatim() {
        let (engine, bridge, capture) = capture_setup();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bmp");

        bridge.publish(b"B1".to_vec());
        let report = capture.capture(&path).unwrap();

        assert_eq!(report.bytes, 2);
        assert_eq!(std::fs::read(&path).unwrap(), b"B1");
        assert_eq!(engine.toggles.load(Ordering::SeqCst), 2);
        assert!(!engine.is_paused());
    }

    #[test]
    fn test_capture_before_first_frame_writes_empty_file() {
        let (_, _, capture) = capture_setup();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bmp");

        let report = capture.capture(&path).unwrap();
        assert_eq!(report.bytes, 0);
        assert!(std::fs::read(&path).unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_still_resumes() {
        let (engine, bridge, capture) = capture_setup();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.bmp");

        bridge.publish(vec![1, 2, 3]);
        let err = capture.capture(&path).unwrap_err();

        assert!(matches!(err, CaptureError::Persist { .. }));
        assert_eq!(engine.toggles.load(Ordering::SeqCst), 2);
        assert!(!engine.is_paused());
    }

    #[test]
    fn test_capture_preserves_existing_pause() {
        let (engine, bridge, capture) = capture_setup();
        let dir = tempfile::tempdir().unwrap();
        bridge.publish(vec![9]);

        engine.toggle_pause();
        capture.capture(&dir.path().join("paused.bmp")).unwrap();
        assert!(engine.is_paused());
    }

    #[test]
    fn test_next_destination_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        let shots = dir.path().join("shots");

        let first = ScreenshotCapture::next_destination(&shots).unwrap();
        assert_eq!(first, shots.join("screenshot-0001.bmp"));

        std::fs::write(&first, b"").unwrap();
        let second = ScreenshotCapture::next_destination(&shots).unwrap();
        assert_eq!(second, shots.join("screenshot-0002.bmp"));
    }
}
