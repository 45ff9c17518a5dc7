//! The frame loop thread and its request channel.
//!
//! # Architecture
//!
//! ```text
//! Client thread(s)                 Loop thread
//!     |                                |
//!     |--request(json)---------------->| rx.try_recv() / rx.recv_deadline()
//!     |   [tx: bounded(capacity)]      | rpc::dispatch(&mut scene, json)
//!     |<--response via reply channel---|
//!     |                                | clock.begin()
//!     |                                | scene.render_frame()
//!     |                                | sink.update_universe() per universe
//!     |                                | autosave every N frames
//! ```
//!
//! The loop thread owns the [`Scene`] outright. Requests are answered
//! between frames, never during one, so no part of the graph is locked.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use lantern_graph::{Scene, SceneConfig};
use lantern_store::SceneStore;
use log::{error, info, warn};
use serde_json::Value as Json;

use crate::config::{ConfigError, EngineConfig};
use crate::frame::FrameClock;
use crate::metrics::FrameMetrics;
use crate::rpc;
use crate::sink::UniverseSink;

// ── Error types ──────────────────────────────────────────────────

/// Error submitting a request to the loop thread.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The loop thread has shut down.
    Shutdown,
    /// The request queue is full (back-pressure).
    QueueFull,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "scene server has shut down"),
            Self::QueueFull => write!(f, "request queue full"),
        }
    }
}

impl std::error::Error for SubmitError {}

// ── ServerHandle ─────────────────────────────────────────────────

/// A request paired with the channel its response goes back on.
pub(crate) struct PendingRequest {
    body: Json,
    reply: Sender<Json>,
}

/// A cloneable way to submit requests from any thread.
#[derive(Clone)]
pub struct ServerHandle {
    tx: Sender<PendingRequest>,
}

impl ServerHandle {
    /// Submit `body` and wait for its response.
    ///
    /// Fails fast with [`SubmitError::QueueFull`] instead of blocking when
    /// the queue is at capacity. Otherwise blocks until the loop thread
    /// reaches the request, which is at most one frame period plus the
    /// requests queued ahead of it.
    pub fn request(&self, body: Json) -> Result<Json, SubmitError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let pending = PendingRequest {
            body,
            reply: reply_tx,
        };
        self.tx.try_send(pending).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::QueueFull,
            TrySendError::Disconnected(_) => SubmitError::Shutdown,
        })?;
        reply_rx.recv().map_err(|_| SubmitError::Shutdown)
    }
}

// ── FrameLoop ────────────────────────────────────────────────────

/// State owned by the loop thread.
struct FrameLoop {
    scene: Scene,
    sink: Box<dyn UniverseSink>,
    rx: Receiver<PendingRequest>,
    shutdown: Arc<AtomicBool>,
    clock: FrameClock,
    metrics: FrameMetrics,
    published: Arc<Mutex<FrameMetrics>>,
    store_path: Option<PathBuf>,
    autosave_every: u64,
    save_on_shutdown: bool,
    sink_failing: bool,
}

impl FrameLoop {
    /// Run until the shutdown flag is set, then hand the scene back.
    fn run(mut self) -> Scene {
        info!("frame loop started, period {:?}", self.clock.period());
        while !self.stopping() {
            self.drain_requests();
            self.serve_until_deadline();
            if self.stopping() {
                break;
            }
            self.render();
        }
        self.finish()
    }

    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn drain_requests(&mut self) {
        while let Ok(pending) = self.rx.try_recv() {
            self.answer(pending);
        }
    }

    fn serve_until_deadline(&mut self) {
        while self.clock.remaining(Instant::now()).is_some() {
            match self.rx.recv_deadline(self.clock.deadline()) {
                Ok(pending) => self.answer(pending),
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    if let Some(left) = self.clock.remaining(Instant::now()) {
                        thread::sleep(left);
                    }
                    return;
                }
            }
        }
    }

    fn answer(&mut self, pending: PendingRequest) {
        let response = rpc::dispatch(&mut self.scene, &pending.body);
        self.metrics.requests += 1;
        if rpc::is_error(&response) {
            self.metrics.rejected_requests += 1;
        }
        // Best-effort: the submitter may have given up.
        let _ = pending.reply.send(response);
    }

    fn render(&mut self) {
        let start = self.clock.begin(Instant::now());
        if start.resynced {
            warn!(
                "frame {} started {:?} late, resynchronizing",
                self.metrics.frames + 1,
                start.lateness
            );
        }
        let began = Instant::now();
        self.scene.render_frame();

        let mut failed = false;
        for (universe, buffer) in self.scene.universe_buffers() {
            if let Err(e) = self.sink.update_universe(buffer, universe) {
                self.metrics.sink_errors += 1;
                if !self.sink_failing {
                    error!("{e}");
                }
                failed = true;
            }
        }
        if self.sink_failing && !failed {
            info!("output sink recovered");
        }
        self.sink_failing = failed;

        let overdue = self.clock.overdue(Instant::now());
        if let Some(by) = overdue {
            warn!(
                "frame {} behind schedule: next frame due {by:?} ago",
                self.metrics.frames + 1
            );
        }
        self.metrics.record_frame(began.elapsed(), overdue.is_some());
        if self.autosave_every > 0 && self.metrics.frames % self.autosave_every == 0 {
            self.autosave();
        }
        self.publish();
    }

    fn autosave(&mut self) {
        let Some(path) = &self.store_path else {
            return;
        };
        let auto = SceneStore::autosave_path(path);
        match self.scene.store().save(&auto) {
            Ok(()) => self.metrics.autosaves += 1,
            Err(e) => error!("autosave failed: {e}"),
        }
    }

    fn publish(&self) {
        if let Ok(mut shared) = self.published.lock() {
            shared.clone_from(&self.metrics);
        }
    }

    fn finish(mut self) -> Scene {
        self.drain_requests();
        if self.save_on_shutdown {
            if let Some(path) = &self.store_path {
                match self.scene.store().save(path) {
                    Ok(()) => info!("scene saved to {}", path.display()),
                    Err(e) => error!("saving scene on shutdown failed: {e}"),
                }
            }
        }
        self.publish();
        info!("frame loop stopped after {} frames", self.metrics.frames);
        self.scene
    }
}

// ── SceneServer ──────────────────────────────────────────────────

/// Runs a [`Scene`] on a dedicated frame loop thread.
///
/// Frames are rendered at the configured rate and handed to the
/// [`UniverseSink`]; requests submitted through [`request`](Self::request)
/// or a [`ServerHandle`] run on the same thread between frames.
pub struct SceneServer {
    handle: Option<ServerHandle>,
    shutdown: Arc<AtomicBool>,
    metrics: Arc<Mutex<FrameMetrics>>,
    thread: Option<JoinHandle<Scene>>,
}

impl SceneServer {
    /// Move `scene` onto a new loop thread and start rendering.
    pub fn start(
        config: EngineConfig,
        scene: Scene,
        sink: Box<dyn UniverseSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (tx, rx) = crossbeam_channel::bounded(config.request_queue_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));
        let metrics = Arc::new(Mutex::new(FrameMetrics::default()));

        let state = FrameLoop {
            scene,
            sink,
            rx,
            shutdown: Arc::clone(&shutdown),
            clock: FrameClock::new(config.frame_rate_hz, Instant::now()),
            metrics: FrameMetrics::default(),
            published: Arc::clone(&metrics),
            store_path: config.store_path,
            autosave_every: config.autosave_every_frames,
            save_on_shutdown: config.save_on_shutdown,
            sink_failing: false,
        };
        let thread = thread::Builder::new()
            .name("lantern-frame".into())
            .spawn(move || state.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("frame loop: {e}"),
            })?;

        Ok(Self {
            handle: Some(ServerHandle { tx }),
            shutdown,
            metrics,
            thread: Some(thread),
        })
    }

    /// Build a scene from the configured store file and start it.
    ///
    /// A missing file starts an empty scene, which is saved there on
    /// shutdown if `save_on_shutdown` is set.
    pub fn open(
        config: EngineConfig,
        scene_config: SceneConfig,
        sink: Box<dyn UniverseSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = match &config.store_path {
            Some(path) if path.exists() => {
                info!("opening scene {}", path.display());
                SceneStore::open(path)?
            }
            _ => SceneStore::new()?,
        };
        let scene = Scene::new(scene_config, store)?;
        Self::start(config, scene, sink)
    }

    /// Submit `body` and wait for its response.
    pub fn request(&self, body: Json) -> Result<Json, SubmitError> {
        self.handle
            .as_ref()
            .ok_or(SubmitError::Shutdown)?
            .request(body)
    }

    /// A handle for submitting requests from other threads.
    pub fn handle(&self) -> Result<ServerHandle, SubmitError> {
        self.handle.clone().ok_or(SubmitError::Shutdown)
    }

    /// Counters as of the most recent frame.
    pub fn metrics(&self) -> FrameMetrics {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Stop the loop thread and take the scene back.
    ///
    /// Requests already queued are answered first. Returns `None` if the
    /// server was already shut down or the loop thread panicked.
    pub fn shutdown(&mut self) -> Option<Scene> {
        self.shutdown.store(true, Ordering::Release);
        // Dropping our sender wakes the loop if no other handle is alive.
        self.handle.take();
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(scene) => Some(scene),
            Err(_) => {
                error!("frame loop thread panicked");
                None
            }
        }
    }
}

impl Drop for SceneServer {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}
