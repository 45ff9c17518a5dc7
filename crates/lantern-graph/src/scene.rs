//! The [`Scene`] context: every arena, the store, and the plugin set.

use lantern_arena::{Arena, ArenaConfig, DeletionPolicy};
use lantern_core::{DataTypeId, FrameId, PluginId};
use lantern_store::SceneStore;

use crate::channel::{ChannelSlot, PartitionSlot, UniverseSlot};
use crate::class::ClassSlot;
use crate::config::SceneConfig;
use crate::error::{ReconstructionError, SceneError};
use crate::instance::NodeSlot;
use crate::plug::{InputSlot, OutputSlot};
use crate::plugin::{Plugin, PluginSlot};

/// What the scene is doing, for gating plugin calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenePhase {
    /// A plugin's `init` is running; registration is allowed.
    Init,
    /// Normal operation.
    Run,
    /// Teardown is in progress, or the scene has not been built yet.
    Clean,
    /// The last reconstruction failed. The scene is torn down and refuses
    /// edits until a reconstruction succeeds.
    Failed,
}

/// The live scene graph.
///
/// Owns the durable [`SceneStore`] and one [`Arena`] per entity kind.
/// Every mutation writes the store first and then mirrors it into the
/// arenas, keeping each record's `arr_idx` equal to its slot.
pub struct Scene {
    pub(crate) store: SceneStore,
    pub(crate) phase: ScenePhase,
    pub(crate) providers: Vec<Option<Box<dyn Plugin>>>,
    pub(crate) plugins: Arena<PluginSlot>,
    pub(crate) classes: Arena<ClassSlot>,
    pub(crate) nodes: Arena<NodeSlot>,
    pub(crate) inputs: Arena<InputSlot>,
    pub(crate) outputs: Arena<OutputSlot>,
    pub(crate) partitions: Arena<PartitionSlot>,
    pub(crate) channels: Arena<ChannelSlot>,
    pub(crate) universes: Arena<UniverseSlot>,
    pub(crate) core: Option<PluginId>,
    pub(crate) channel_type_name: String,
    pub(crate) channel_type: Option<DataTypeId>,
    pub(crate) max_light_address: u16,
    pub(crate) frame: FrameId,
}

impl Scene {
    /// Build a scene over `store` and reconstruct it.
    ///
    /// The core plugin is loaded first; its failure is fatal. Other plugin
    /// failures are logged and only exclude that plugin.
    pub fn new(config: SceneConfig, store: SceneStore) -> Result<Self, ReconstructionError> {
        config.validate()?;
        let growth = config.arena_growth_unit;
        let fixed = ArenaConfig::new(growth, DeletionPolicy::NoDelete);
        let churn = ArenaConfig::new(growth, DeletionPolicy::DeleteAllowed);

        let mut providers = Vec::with_capacity(config.plugins.len() + 1);
        providers.push(Some(config.core));
        providers.extend(config.plugins.into_iter().map(Some));

        let mut scene = Self {
            store,
            phase: ScenePhase::Clean,
            providers,
            plugins: Arena::new(fixed.clone())?,
            classes: Arena::new(fixed)?,
            nodes: Arena::new(churn.clone())?.with_destructor(|slot: &mut NodeSlot| {
                if let Some(behavior) = slot.behavior.as_mut() {
                    behavior.clean();
                }
            }),
            inputs: Arena::new(churn.clone())?,
            outputs: Arena::new(churn.clone())?,
            partitions: Arena::new(churn.clone())?,
            channels: Arena::new(churn.clone())?,
            universes: Arena::new(churn)?,
            core: None,
            channel_type_name: config.channel_type_name,
            channel_type: None,
            max_light_address: config.max_light_address,
            frame: FrameId::default(),
        };
        scene.reconstruct()?;
        Ok(scene)
    }

    /// The durable store.
    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// The current phase.
    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// Refuse edits while the scene is [`ScenePhase::Failed`].
    pub fn ensure_running(&self) -> Result<(), SceneError> {
        if self.phase == ScenePhase::Failed {
            return Err(SceneError::Halted);
        }
        Ok(())
    }

    /// The current frame; zero after every (re)construction.
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// The core plugin's id, once loaded.
    pub fn core_plugin(&self) -> Option<PluginId> {
        self.core
    }

    /// The data type channels accept.
    pub fn channel_type(&self) -> Option<DataTypeId> {
        self.channel_type
    }

    /// Highest valid light slot in a universe.
    pub fn max_light_address(&self) -> u16 {
        self.max_light_address
    }

    /// Number of live node instances.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if matches!(self.phase, ScenePhase::Init | ScenePhase::Run) {
            self.teardown();
        }
    }
}
