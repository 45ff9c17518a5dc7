//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
///
/// These are resource errors: they fail the current operation and are
/// logged by the caller, but never corrupt the arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The index is beyond the highest slot ever handed out.
    OutOfBounds {
        /// The requested index.
        index: usize,
        /// The highest assigned index, or `None` for an empty arena.
        max_idx: Option<usize>,
    },
    /// `delete` was called on an arena configured with
    /// [`DeletionPolicy::NoDelete`](crate::DeletionPolicy::NoDelete).
    DeleteForbidden,
    /// The slot is within bounds but holds no live element.
    NotLive {
        /// The vacant index.
        index: usize,
    },
    /// Growing would exceed the configured unit cap.
    CapacityExceeded {
        /// The configured maximum number of units.
        max_units: usize,
    },
    /// The configured growth unit is zero.
    InvalidGrowthUnit,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, max_idx } => match max_idx {
                Some(max) => write!(f, "index {index} out of bounds (max index {max})"),
                None => write!(f, "index {index} out of bounds (arena is empty)"),
            },
            Self::DeleteForbidden => write!(f, "delete is not allowed on this arena"),
            Self::NotLive { index } => write!(f, "slot {index} is not live"),
            Self::CapacityExceeded { max_units } => {
                write!(f, "arena capacity exceeded: limited to {max_units} units")
            }
            Self::InvalidGrowthUnit => write!(f, "growth unit must be at least 1"),
        }
    }
}

impl Error for ArenaError {}
