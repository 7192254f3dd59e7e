//! Frame Bridge - hand-off of encoded frames from the engine thread to the
//! render surface
//!
//! The bridge is a single slot, not a queue: every successful publish
//! overwrites the previous frame. The producer side never waits. If the slot
//! is busy (a screenshot is being written, or the surface is copying the
//! latest frame) the new frame is dropped and counted.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One encoded still image produced by the engine (e.g. a BMP file in
/// memory). Immutable and cheap to clone.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Frame(Arc<[u8]>);

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for Frame {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Last frame that decoded successfully, ready for the picture surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major
    pub rgba: Arc<[u8]>,
}

/// What happened to a published frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Stored and decoded; the display image was replaced
    Displayed,
    /// Stored, but it did not decode; the previous display image stays
    Undecodable,
    /// Slot was busy; the frame was discarded
    Dropped,
}

/// Bridge counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames stored in the slot
    pub published: u64,
    /// Frames discarded because the slot was busy
    pub dropped: u64,
    /// Stored frames that failed to decode
    pub decode_failures: u64,
}

#[derive(Default)]
struct FrameSlot {
    latest: Option<Frame>,
    display: Option<DisplayImage>,
}

/// Single-slot, most-recent-wins frame buffer
#[derive(Default)]
pub struct FrameBridge {
    slot: Mutex<FrameSlot>,
    published: AtomicU64,
    dropped: AtomicU64,
    decode_failures: AtomicU64,
}

impl FrameBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side. Never blocks.
    pub fn publish(&self, frame: impl Into<Frame>) -> PublishOutcome {
        let frame = frame.into();

        let Some(mut slot) = self.slot.try_lock() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Frame slot busy, dropping {:?}", frame);
            return PublishOutcome::Dropped;
        };

        slot.latest = Some(frame.clone());
        self.published.fetch_add(1, Ordering::Relaxed);

        match decode(&frame) {
            Ok(image) => {
                slot.display = Some(image);
                PublishOutcome::Displayed
            }
            Err(e) => {
                self.decode_failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Ignoring undecodable {:?}: {}", frame, e);
                PublishOutcome::Undecodable
            }
        }
    }

    /// Most recently published frame, if any
    pub fn read_latest(&self) -> Option<Frame> {
        self.slot.lock().latest.clone()
    }

    /// Blocking snapshot of the latest frame. Returns an empty frame when
    /// nothing has been published yet.
    pub fn capture_blocking(&self) -> Frame {
        self.capture_with(Frame::clone)
    }

    /// Run `f` on the latest frame while holding the slot.
    ///
    /// Publishes that arrive while `f` runs are dropped, so `f` sees exactly
    /// the frame that was current when the lock was acquired.
    pub fn capture_with<R>(&self, f: impl FnOnce(&Frame) -> R) -> R {
        let slot = self.slot.lock();
        match slot.latest.as_ref() {
            Some(frame) => f(frame),
            None => f(&Frame::default()),
        }
    }

    /// Last successfully decoded image, for the picture surface
    pub fn latest_image(&self) -> Option<DisplayImage> {
        self.slot.lock().display.clone()
    }

    /// Blank the picture surface. The raw latest frame is kept.
    pub fn clear_display(&self) {
        self.slot.lock().display = None;
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }
}

fn decode(frame: &Frame) -> image::ImageResult<DisplayImage> {
    let rgba = image::load_from_memory(frame.as_bytes())?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DisplayImage {
        width,
        height,
        rgba: rgba.into_raw().into(),
    })
}
