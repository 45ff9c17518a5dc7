//! Arena configuration parameters.

use crate::error::ArenaError;

/// Whether slots may be deleted and reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Slots are permanent; `delete` is a checked error.
    NoDelete,
    /// Slots may be deleted; freed indices are reused by later inserts.
    DeleteAllowed,
}

/// Configuration for an [`Arena`](crate::Arena).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Number of elements per unit.
    ///
    /// Default: 16. Must be at least 1.
    pub growth_unit: usize,

    /// Deletion policy.
    ///
    /// Default: [`DeletionPolicy::DeleteAllowed`].
    pub policy: DeletionPolicy,

    /// Upper bound on the number of units, or `None` for unbounded growth.
    pub max_units: Option<usize>,
}

impl ArenaConfig {
    /// Default elements per unit.
    pub const DEFAULT_GROWTH_UNIT: usize = 16;

    /// Create a config with the given growth unit and policy, unbounded.
    pub fn new(growth_unit: usize, policy: DeletionPolicy) -> Self {
        Self {
            growth_unit,
            policy,
            max_units: None,
        }
    }

    /// Cap the number of units.
    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = Some(max_units);
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.growth_unit == 0 {
            return Err(ArenaError::InvalidGrowthUnit);
        }
        if self.max_units == Some(0) {
            return Err(ArenaError::CapacityExceeded { max_units: 0 });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GROWTH_UNIT, DeletionPolicy::DeleteAllowed)
    }
}
