//! Scene construction parameters.

use lantern_arena::ArenaConfig;

use crate::error::ReconstructionError;
use crate::plugin::Plugin;

/// Builder input for a [`Scene`](crate::Scene).
///
/// Plugins are linked statically and handed over here; the core plugin is
/// loaded first on every construction and must succeed.
pub struct SceneConfig {
    /// The plugin providing the built-in types and classes.
    pub core: Box<dyn Plugin>,
    /// Additional plugins, loaded in order after the core.
    pub plugins: Vec<Box<dyn Plugin>>,
    /// Elements per arena growth unit. Default: 16.
    pub arena_growth_unit: usize,
    /// Core data type accepted by channels. Default: `"RGB Type"`.
    pub channel_type_name: String,
    /// Highest addressable light slot in a universe. Default: 511.
    pub max_light_address: u16,
}

impl SceneConfig {
    /// Default highest light slot.
    pub const DEFAULT_MAX_LIGHT_ADDRESS: u16 = 511;

    /// Default channel type name.
    pub const DEFAULT_CHANNEL_TYPE: &'static str = "RGB Type";

    /// A config with default limits and no extra plugins.
    pub fn new(core: Box<dyn Plugin>) -> Self {
        Self {
            core,
            plugins: Vec::new(),
            arena_growth_unit: ArenaConfig::DEFAULT_GROWTH_UNIT,
            channel_type_name: Self::DEFAULT_CHANNEL_TYPE.to_owned(),
            max_light_address: Self::DEFAULT_MAX_LIGHT_ADDRESS,
        }
    }

    /// Append a plugin.
    pub fn with_plugin(mut self, plugin: Box<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ReconstructionError> {
        if self.arena_growth_unit == 0 {
            return Err(ReconstructionError::InvalidConfig {
                reason: "arena_growth_unit must be at least 1".into(),
            });
        }
        if self.channel_type_name.is_empty() {
            return Err(ReconstructionError::InvalidConfig {
                reason: "channel_type_name must not be empty".into(),
            });
        }
        if self.max_light_address == 0 {
            return Err(ReconstructionError::InvalidConfig {
                reason: "max_light_address must be at least 1".into(),
            });
        }
        Ok(())
    }
}
