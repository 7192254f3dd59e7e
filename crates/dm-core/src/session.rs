//! Emulation session lifecycle
//!
//! A session is one run of the engine against one ROM, executed on its own
//! thread. The controller keeps at most one session alive: starting a new
//! ROM cancels the current session and waits for its thread to acknowledge
//! the exit before the engine is reconfigured.

use crate::cancel::CancellationSignal;
use crate::engine::Engine;
use crate::error::SessionError;
use crate::frame_bridge::FrameBridge;
use parking_lot::{Condvar, Mutex};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No engine loop is executing
    Idle,
    /// Engine loop is executing and has not been asked to stop
    Running,
    /// Cancellation was signalled but the engine loop has not returned yet
    Stopping,
}

/// Raised by the session thread once `Engine::run` has returned
#[derive(Default)]
struct ExitLatch {
    exited: Mutex<bool>,
    condvar: Condvar,
}

impl ExitLatch {
    fn signal(&self) {
        *self.exited.lock() = true;
        self.condvar.notify_all();
    }

    fn is_set(&self) -> bool {
        *self.exited.lock()
    }

    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut exited = self.exited.lock();
        while !*exited {
            if self.condvar.wait_until(&mut exited, deadline).timed_out() {
                return *exited;
            }
        }
        true
    }
}

/// Signals the latch when the session thread unwinds, panics included
struct ExitGuard(Arc<ExitLatch>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.signal();
    }
}

struct Session {
    id: u64,
    rom_path: PathBuf,
    signal: CancellationSignal,
    exit: Arc<ExitLatch>,
    handle: Option<JoinHandle<()>>,
}

impl Session {
    fn state(&self) -> SessionState {
        if self.exit.is_set() {
            SessionState::Idle
        } else if self.signal.is_cancelled() {
            SessionState::Stopping
        } else {
            SessionState::Running
        }
    }

    fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(session = self.id, "Session thread panicked");
            }
        }
    }
}

/// Owns the lifecycle of the current emulation session
pub struct SessionController {
    engine: Arc<dyn Engine>,
    bridge: Arc<FrameBridge>,
    settle_timeout: Duration,
    current: Mutex<Option<Session>>,
    /// Serializes `start` calls
    starting: Mutex<()>,
    next_id: AtomicU64,
}

impl SessionController {
    pub fn new(engine: Arc<dyn Engine>, bridge: Arc<FrameBridge>, settle_timeout: Duration) -> Self {
        Self {
            engine,
            bridge,
            settle_timeout,
            current: Mutex::new(None),
            starting: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start a session for `rom_path`, replacing the current one.
    ///
    /// Returns the new session id. The engine loop runs on its own thread;
    /// this call does not wait for it.
    pub fn start(&self, rom_path: impl AsRef<Path>) -> Result<u64, SessionError> {
        let rom_path = rom_path.as_ref();
        let _starting = self.starting.lock();

        self.settle()?;

        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.join();
        }

        self.engine
            .configure(rom_path)
            .map_err(|source| SessionError::Configure {
                path: rom_path.to_path_buf(),
                source,
            })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let signal = CancellationSignal::new();
        let exit = Arc::new(ExitLatch::default());

        let handle = {
            let engine = Arc::clone(&self.engine);
            let bridge = Arc::clone(&self.bridge);
            let signal = signal.clone();
            let guard = ExitGuard(Arc::clone(&exit));
            thread::Builder::new()
                .name(format!("emu-session-{id}"))
                .spawn(move || {
                    let _guard = guard;
                    match engine.run(&signal, &bridge) {
                        Ok(()) => tracing::info!(session = id, "Engine loop exited"),
                        Err(e) => tracing::error!(session = id, "Engine loop failed: {}", e),
                    }
                })
                .map_err(SessionError::Spawn)?
        };

        tracing::info!(session = id, rom = %rom_path.display(), "Session started");
        *current = Some(Session {
            id,
            rom_path: rom_path.to_path_buf(),
            signal,
            exit,
            handle: Some(handle),
        });
        Ok(id)
    }

    /// Stop the current session and wait up to the settle timeout for its
    /// engine loop to return.
    ///
    /// The session lock is not held while waiting, so `state`, `stop` and
    /// friends stay responsive. Returns `Ok` at once when nothing is running.
    pub fn settle(&self) -> Result<(), SessionError> {
        let (id, exit) = {
            let current = self.current.lock();
            match current.as_ref() {
                Some(session) if !session.exit.is_set() => {
                    if session.signal.cancel() {
                        tracing::info!(session = session.id, "Stopping session for restart");
                    }
                    (session.id, Arc::clone(&session.exit))
                }
                _ => return Ok(()),
            }
        };

        if exit.wait(self.settle_timeout) {
            return Ok(());
        }
        tracing::warn!(
            session = id,
            "Session did not exit within {:?}, refusing to start another",
            self.settle_timeout
        );
        Err(SessionError::PreviousSessionStillRunning {
            id,
            waited_ms: self.settle_timeout.as_millis() as u64,
        })
    }

    /// Signal the current session to stop and return immediately.
    ///
    /// Returns `true` if a running session was signalled.
    pub fn stop(&self) -> bool {
        let current = self.current.lock();
        match current.as_ref() {
            Some(session) if !session.exit.is_set() && session.signal.cancel() => {
                tracing::info!(session = session.id, "Session stop requested");
                true
            }
            _ => false,
        }
    }

    pub fn toggle_pause(&self) {
        self.engine.toggle_pause();
        tracing::debug!(paused = self.engine.is_paused(), "Pause toggled");
    }

    pub fn is_paused(&self) -> bool {
        self.engine.is_paused()
    }

    pub fn state(&self) -> SessionState {
        self.current
            .lock()
            .as_ref()
            .map_or(SessionState::Idle, Session::state)
    }

    /// Id of the most recently started session
    pub fn session_id(&self) -> Option<u64> {
        self.current.lock().as_ref().map(|s| s.id)
    }

    pub fn rom_path(&self) -> Option<PathBuf> {
        self.current.lock().as_ref().map(|s| s.rom_path.clone())
    }

    /// Block until the current session's engine loop has returned.
    ///
    /// Returns `false` on timeout. Returns `true` immediately when there is
    /// no session.
    pub fn wait_for_exit(&self, timeout: Duration) -> bool {
        let exit = match self.current.lock().as_ref() {
            Some(session) => Arc::clone(&session.exit),
            None => return true,
        };
        exit.wait(timeout)
    }

    /// Stop the current session, wait for it and join its thread
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.stop();
        if !self.wait_for_exit(timeout) {
            tracing::warn!("Session still running after {:?} at shutdown", timeout);
            return false;
        }
        if let Some(session) = self.current.lock().take() {
            session.join();
        }
        true
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(session) = self.current.get_mut().as_ref() {
            session.signal.cancel();
        }
    }
}
