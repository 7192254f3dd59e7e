//! dotmatrix - handheld emulator shell
//!
//! Headless entry point: runs the built-in test-pattern engine against a ROM
//! for a while, optionally saves a screenshot, and reports frame statistics.

use anyhow::{Context, Result};
use clap::Parser;
use dm_core::config::LogLevel;
use dm_core::{logging, Config};
use dm_frontend::test_pattern::FRAME_TIME;
use dm_frontend::{EmulatorShell, MenuAction, TestPatternEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_FRAMES: u64 = 60;

#[derive(Parser)]
#[command(version, about = "Desktop shell for a handheld console emulator")]
struct Args {
    /// Path to ROM file
    rom: Option<PathBuf>,

    /// Number of frames to run before exiting
    #[arg(long, conflicts_with = "seconds")]
    frames: Option<u64>,

    /// Number of seconds to run before exiting
    #[arg(long, conflicts_with = "frames")]
    seconds: Option<u64>,

    /// Save the last frame here before exiting
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Configuration file to use instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, load_error) = match &args.config {
        Some(path) => (
            Config::load_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None,
        ),
        None => match Config::load() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };

    logging::init(args.log_level.unwrap_or(config.debug.log_level));
    if let Some(e) = load_error {
        tracing::warn!("Using default configuration: {}", e);
    }

    let Some(rom) = args.rom else {
        tracing::info!("No ROM given, nothing to run");
        return Ok(());
    };

    tracing::info!("Starting dotmatrix");

    let engine = Arc::new(TestPatternEngine::new());
    let shell = EmulatorShell::new(config, engine.clone())?;
    shell.register_listener(&engine);

    shell
        .handle(MenuAction::LoadRom(rom.clone()))
        .with_context(|| format!("loading {}", rom.display()))?;

    if shell.is_paused() {
        tracing::info!("Resuming engine for headless run");
        shell.handle(MenuAction::TogglePause)?;
    }

    match args.seconds {
        Some(seconds) => std::thread::sleep(Duration::from_secs(seconds)),
        None => {
            let target = args.frames.unwrap_or(DEFAULT_FRAMES);
            let started = Instant::now();
            let ran = shell.advance_frames(target, frame_budget(target));
            tracing::info!("Ran {} frames in {:?}", ran, started.elapsed());
        }
    }

    if let Some(path) = args.screenshot {
        match shell.screenshot(&path) {
            Ok(report) => println!("Saved {} bytes to {}", report.bytes, report.path.display()),
            Err(e) => tracing::error!("Screenshot failed: {}", e),
        }
    }

    shell.handle(MenuAction::Quit)?;
    let settle_timeout = shell.config().session.settle_timeout();
    if !shell.close(settle_timeout) {
        tracing::warn!("Engine did not stop within {:?}", settle_timeout);
    }

    let stats = shell.stats();
    println!(
        "Frames: {} rendered, {} published, {} dropped, {} undecodable",
        engine.frames_rendered(),
        stats.published,
        stats.dropped,
        stats.decode_failures
    );
    Ok(())
}

/// Generous wall-clock allowance for `frames` frames at the hardware rate
fn frame_budget(frames: u64) -> Duration {
    let frames = u32::try_from(frames).unwrap_or(u32::MAX);
    FRAME_TIME
        .saturating_mul(frames)
        .saturating_mul(2)
        .saturating_add(Duration::from_secs(1))
}
