//! Graph-level error types.

use std::error::Error;
use std::fmt;

use lantern_arena::ArenaError;
use lantern_core::{PluginError, ValidationError};
use lantern_store::StoreError;

/// The scene could not be rebuilt from the store.
///
/// Fatal: startup or reload aborts and the scene is left torn down.
#[derive(Debug)]
pub enum ReconstructionError {
    /// The configuration is unusable.
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
    /// The core plugin failed to initialize.
    CorePlugin(PluginError),
    /// A persisted record is missing.
    Store(StoreError),
    /// Persisted records contradict each other.
    Inconsistent {
        /// Description of the contradiction.
        reason: String,
    },
    /// An arena could not hold the rebuilt graph.
    Arena(ArenaError),
}

impl fmt::Display for ReconstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid scene config: {reason}"),
            Self::CorePlugin(e) => write!(f, "core plugin failed: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Inconsistent { reason } => write!(f, "inconsistent store: {reason}"),
            Self::Arena(e) => write!(f, "arena: {e}"),
        }
    }
}

impl Error for ReconstructionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CorePlugin(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Arena(e) => Some(e),
            Self::InvalidConfig { .. } | Self::Inconsistent { .. } => None,
        }
    }
}

impl From<StoreError> for ReconstructionError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ArenaError> for ReconstructionError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

/// Any failure of a scene operation.
///
/// Validation and plugin errors leave the scene unchanged and are reported
/// to the requester. The others indicate resource exhaustion or a damaged
/// store.
#[derive(Debug)]
pub enum SceneError {
    /// The request would leave the graph malformed.
    Validation(ValidationError),
    /// A plugin misused its API or a node callback failed.
    Plugin(PluginError),
    /// An arena refused the operation.
    Arena(ArenaError),
    /// The store is missing a record the graph relies on.
    Store(StoreError),
    /// A rebuild triggered by the operation failed.
    Reconstruction(ReconstructionError),
    /// The last reconstruction failed; only a new reconstruction is
    /// accepted.
    Halted,
}

impl SceneError {
    /// Whether the error was a rejected request rather than a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Plugin(_) | Self::Halted)
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::Plugin(e) => write!(f, "plugin error: {e}"),
            Self::Arena(e) => write!(f, "arena error: {e}"),
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Reconstruction(e) => write!(f, "reconstruction failed: {e}"),
            Self::Halted => write!(f, "scene is halted after a failed reload; reload to recover"),
        }
    }
}

impl Error for SceneError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Plugin(e) => Some(e),
            Self::Arena(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Reconstruction(e) => Some(e),
            Self::Halted => None,
        }
    }
}

impl From<ValidationError> for SceneError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<PluginError> for SceneError {
    fn from(e: PluginError) -> Self {
        Self::Plugin(e)
    }
}

impl From<ArenaError> for SceneError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<StoreError> for SceneError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ReconstructionError> for SceneError {
    fn from(e: ReconstructionError) -> Self {
        Self::Reconstruction(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_a_rejection() {
        let e: SceneError = ValidationError::RootSpace.into();
        assert!(e.is_rejection());
        let e: SceneError = ArenaError::DeleteForbidden.into();
        assert!(!e.is_rejection());
    }

    #[test]
    fn reconstruction_chains_source() {
        let e = ReconstructionError::CorePlugin(PluginError::Custom {
            reason: "boom".into(),
        });
        assert!(e.source().is_some());
        assert_eq!(e.to_string(), "core plugin failed: boom");
    }
}
