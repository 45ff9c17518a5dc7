//! Engine configuration, validation, and error types.
//!
//! [`EngineConfig`] controls the frame rate, the request queue, and
//! persistence of the scene store. [`validate()`](EngineConfig::validate)
//! is called by [`SceneServer::start`](crate::SceneServer::start) before
//! any thread is spawned.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use lantern_graph::ReconstructionError;
use lantern_store::StoreError;

// ── EngineConfig ───────────────────────────────────────────────────

/// Configuration for a [`SceneServer`](crate::SceneServer).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Frames rendered per second. Default: 50. Must be finite and positive.
    pub frame_rate_hz: f64,
    /// Requests buffered before submitters see back-pressure. Default: 64.
    pub request_queue_capacity: usize,
    /// File the scene store is read from and saved to, if any.
    pub store_path: Option<PathBuf>,
    /// Write the store to its autosave sibling every this many frames.
    /// Default: 0 (disabled). Requires `store_path`.
    pub autosave_every_frames: u64,
    /// Save the store to `store_path` when the server shuts down.
    /// Default: true.
    pub save_on_shutdown: bool,
}

impl EngineConfig {
    /// Default frame rate, in hertz.
    pub const DEFAULT_FRAME_RATE_HZ: f64 = 50.0;
    /// Default request queue capacity.
    pub const DEFAULT_REQUEST_QUEUE_CAPACITY: usize = 64;

    /// A config that persists to `path`.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidFrameRate {
                value: self.frame_rate_hz,
            });
        }
        if self.request_queue_capacity == 0 {
            return Err(ConfigError::RequestQueueZero);
        }
        if self.autosave_every_frames > 0 && self.store_path.is_none() {
            return Err(ConfigError::AutosaveWithoutPath);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: Self::DEFAULT_FRAME_RATE_HZ,
            request_queue_capacity: Self::DEFAULT_REQUEST_QUEUE_CAPACITY,
            store_path: None,
            autosave_every_frames: 0,
            save_on_shutdown: true,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating the config or starting the server.
#[derive(Debug)]
pub enum ConfigError {
    /// `frame_rate_hz` is NaN, infinite, zero, or negative.
    InvalidFrameRate {
        /// The invalid value.
        value: f64,
    },
    /// `request_queue_capacity` is zero.
    RequestQueueZero,
    /// Autosave is enabled but there is no store path to save beside.
    AutosaveWithoutPath,
    /// The store file could not be read.
    Store(StoreError),
    /// The scene could not be built from the store.
    Reconstruction(ReconstructionError),
    /// The frame loop thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFrameRate { value } => {
                write!(f, "frame_rate_hz must be finite and positive, got {value}")
            }
            Self::RequestQueueZero => write!(f, "request_queue_capacity must be at least 1"),
            Self::AutosaveWithoutPath => {
                write!(f, "autosave_every_frames is set but store_path is not")
            }
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Reconstruction(e) => write!(f, "scene: {e}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Reconstruction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ConfigError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ReconstructionError> for ConfigError {
    fn from(e: ReconstructionError) -> Self {
        Self::Reconstruction(e)
    }
}
