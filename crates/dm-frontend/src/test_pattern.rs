//! Built-in test-pattern engine
//!
//! Stands in for a real emulation core when the shell runs headless or under
//! test. It reads the ROM on configure, derives a pattern seed from its
//! contents, and renders BMP frames at the handheld's refresh rate. Held
//! buttons move and tint the pattern.

use dm_core::{CancellationSignal, Engine, EngineError, FrameBridge};
use dm_input::{Button, ButtonListener, Buttons};
use image::{ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Display width in pixels
pub const SCREEN_WIDTH: u32 = 160;
/// Display height in pixels
pub const SCREEN_HEIGHT: u32 = 144;

/// 4194304 Hz / 70224 cycles per frame
pub const FRAME_TIME: Duration = Duration::from_nanos(16_742_706);

const PAUSE_POLL: Duration = Duration::from_millis(2);

const TITLE_RANGE: std::ops::Range<usize> = 0x134..0x144;

/// Four-shade green palette, lightest first
const PALETTE: [Rgb<u8>; 4] = [
    Rgb([0x9B, 0xBC, 0x0F]),
    Rgb([0x8B, 0xAC, 0x0F]),
    Rgb([0x30, 0x62, 0x30]),
    Rgb([0x0F, 0x38, 0x0F]),
];

/// What the engine learned about the configured ROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomInfo {
    pub path: PathBuf,
    pub size: usize,
    pub title: Option<String>,
    pub seed: u32,
}

impl RomInfo {
    fn from_bytes(path: &Path, data: &[u8]) -> Self {
        let seed = data
            .iter()
            .fold(0u32, |acc, &b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));

        Self {
            path: path.to_path_buf(),
            size: data.len(),
            title: header_title(data),
            seed,
        }
    }
}

/// Cartridge title from the header, if the image is large enough to have one
fn header_title(data: &[u8]) -> Option<String> {
    let raw = data.get(TITLE_RANGE)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let title: String = raw[..end]
        .iter()
        .take_while(|b| b.is_ascii_graphic() || **b == b' ')
        .map(|&b| char::from(b))
        .collect();
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

pub struct TestPatternEngine {
    rom: Mutex<Option<RomInfo>>,
    paused: AtomicBool,
    held: AtomicU8,
    scroll_x: AtomicI32,
    scroll_y: AtomicI32,
    frames: AtomicU64,
    frame_time: Duration,
}

impl TestPatternEngine {
    pub fn new() -> Self {
        Self::with_frame_time(FRAME_TIME)
    }

    /// Engine that paces frames at `frame_time` instead of the hardware rate
    pub fn with_frame_time(frame_time: Duration) -> Self {
        Self {
            rom: Mutex::new(None),
            paused: AtomicBool::new(false),
            held: AtomicU8::new(0),
            scroll_x: AtomicI32::new(0),
            scroll_y: AtomicI32::new(0),
            frames: AtomicU64::new(0),
            frame_time,
        }
    }

    pub fn rom_info(&self) -> Option<RomInfo> {
        self.rom.lock().clone()
    }

    /// Buttons currently held
    pub fn held_buttons(&self) -> Buttons {
        Buttons::from_bits_truncate(self.held.load(Ordering::Acquire))
    }

    /// Frames rendered over the engine's lifetime
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Render one frame of the pattern
    pub fn render(seed: u32, frame: u64, held: Buttons, scroll: (i32, i32)) -> RgbImage {
        let phase = (frame / 4) as u32;
        let invert = held.contains(Buttons::A);
        let checker = held.contains(Buttons::B);
        let tint = u32::from(held.intersects(Buttons::START | Buttons::SELECT));

        RgbImage::from_fn(SCREEN_WIDTH, SCREEN_HEIGHT, |x, y| {
            let px = (x as i32).wrapping_add(scroll.0) as u32;
            let py = (y as i32).wrapping_add(scroll.1) as u32;
            let band = if checker {
                (px / 8) ^ (py / 8)
            } else {
                (px / 8).wrapping_add(py / 16)
            };
            let mut shade = (band.wrapping_add(phase).wrapping_add(seed).wrapping_add(tint) % 4) as usize;
            if invert {
                shade = 3 - shade;
            }
            PALETTE[shade]
        })
    }

    fn encode(image: &RgbImage) -> Result<Vec<u8>, EngineError> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Bmp)
            .map_err(|e| EngineError::FrameEncoding(e.to_string()))?;
        Ok(bytes)
    }

    fn advance_scroll(&self, held: Buttons) {
        let dx = i32::from(held.contains(Buttons::RIGHT)) - i32::from(held.contains(Buttons::LEFT));
        let dy = i32::from(held.contains(Buttons::DOWN)) - i32::from(held.contains(Buttons::UP));
        if dx != 0 {
            self.scroll_x.fetch_add(dx, Ordering::Relaxed);
        }
        if dy != 0 {
            self.scroll_y.fetch_add(dy, Ordering::Relaxed);
        }
    }
}

impl Default for TestPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for TestPatternEngine {
    fn configure(&self, rom_path: &Path) -> Result<(), EngineError> {
        let data = std::fs::read(rom_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EngineError::RomNotFound(rom_path.to_path_buf()),
            _ => EngineError::Io(e),
        })?;
        if data.is_empty() {
            return Err(EngineError::InvalidRom {
                path: rom_path.to_path_buf(),
                reason: "file is empty".to_string(),
            });
        }

        let info = RomInfo::from_bytes(rom_path, &data);
        tracing::info!(
            "Loaded ROM {} ({} bytes, title {:?})",
            rom_path.display(),
            info.size,
            info.title
        );

        self.scroll_x.store(0, Ordering::Relaxed);
        self.scroll_y.store(0, Ordering::Relaxed);
        *self.rom.lock() = Some(info);
        Ok(())
    }

    fn run(&self, cancel: &CancellationSignal, display: &FrameBridge) -> Result<(), EngineError> {
        let seed = self
            .rom
            .lock()
            .as_ref()
            .map(|rom| rom.seed)
            .ok_or(EngineError::NotConfigured)?;

        let mut frame = 0u64;
        while !cancel.is_cancelled() {
            if self.paused.load(Ordering::Acquire) {
                std::thread::sleep(PAUSE_POLL);
                continue;
            }

            let frame_start = Instant::now();

            let held = self.held_buttons();
            self.advance_scroll(held);
            let scroll = (
                self.scroll_x.load(Ordering::Relaxed),
                self.scroll_y.load(Ordering::Relaxed),
            );
            let image = Self::render(seed, frame, held, scroll);
            display.publish(Self::encode(&image)?);

            frame += 1;
            self.frames.fetch_add(1, Ordering::Relaxed);

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }
        }

        tracing::debug!("Test pattern stopped after {} frames", frame);
        Ok(())
    }

    fn toggle_pause(&self) {
        self.paused.fetch_xor(true, Ordering::AcqRel);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

impl ButtonListener for TestPatternEngine {
    fn on_button_press(&self, button: Button) {
        self.held.fetch_or(Buttons::from(button).bits(), Ordering::AcqRel);
    }

    fn on_button_release(&self, button: Button) {
        self.held.fetch_and(!Buttons::from(button).bits(), Ordering::AcqRel);
    }
}
