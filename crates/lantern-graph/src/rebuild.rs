//! Rebuilding the live graph from the store.
//!
//! Order matters: classes must exist before instances, instances (and so
//! their concrete plugs) before channels can trace into them, and every
//! output before concrete edges can be reattached.

use lantern_core::{FrameId, NodeId, PluginError, SpaceId, ValidationError};
use lantern_store::{EdgeSink, EdgeSource};
use log::{debug, error, info, warn};

use crate::error::{ReconstructionError, SceneError};
use crate::scene::{Scene, ScenePhase};

impl Scene {
    /// Tear down and rebuild every arena from the store.
    ///
    /// The core plugin must load; any other plugin that fails is logged and
    /// left out. Instances of disabled or missing classes stay in the store
    /// but get no slot. The frame counter restarts at zero.
    ///
    /// On failure the scene is torn down again and left
    /// [`Failed`](ScenePhase::Failed): it renders nothing and refuses
    /// edits until a later reconstruction succeeds.
    pub fn reconstruct(&mut self) -> Result<(), ReconstructionError> {
        let result = self.rebuild();
        if let Err(e) = &result {
            error!("reconstruction failed, scene halted: {e}");
            self.teardown();
            self.phase = ScenePhase::Failed;
        }
        result
    }

    fn rebuild(&mut self) -> Result<(), ReconstructionError> {
        self.teardown();
        self.store.reset_runtime();
        info!("reconstructing scene");

        match self.load_plugin(0, true) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(ReconstructionError::CorePlugin(PluginError::Custom {
                    reason: "core plugin was not loaded".into(),
                }))
            }
            Err(SceneError::Plugin(e)) => return Err(ReconstructionError::CorePlugin(e)),
            Err(e) => return Err(fatal(e)),
        }
        self.channel_type = self.core_type(&self.channel_type_name);
        if self.channel_type.is_none() {
            warn!(
                "core plugin registers no '{}'; channels will output zero",
                self.channel_type_name
            );
        }
        for provider in 1..self.providers.len() {
            match self.load_plugin(provider, false) {
                Ok(_) => {}
                Err(SceneError::Plugin(e)) => error!("skipping plugin: {e}"),
                Err(e) => return Err(fatal(e)),
            }
        }
        self.phase = ScenePhase::Run;

        self.build_space(SpaceId::ROOT, false).map_err(fatal)?;
        let partition_spaces: Vec<SpaceId> = self.store.partitions.iter().map(|p| p.space).collect();
        for space in partition_spaces {
            self.build_space(space, true).map_err(fatal)?;
        }
        info!("built {} node instances", self.nodes.len());

        self.build_universes()?;
        self.build_channels()?;
        self.build_partitions()?;
        self.rewire();
        self.frame = FrameId::default();
        info!(
            "scene ready: {} nodes, {} channels, {} universes",
            self.nodes.len(),
            self.channels.len(),
            self.universes.len()
        );
        Ok(())
    }

    /// Run plugin cleanup and release every arena. `clean` runs for each
    /// live node.
    pub(crate) fn teardown(&mut self) {
        self.phase = ScenePhase::Clean;
        self.cleanup_plugins();
        self.nodes.clear();
        self.inputs.clear();
        self.outputs.clear();
        self.channels.clear();
        self.universes.clear();
        self.partitions.clear();
        self.classes.clear();
        self.core = None;
        self.channel_type = None;
    }

    fn build_space(&mut self, space: SpaceId, recurse: bool) -> Result<(), SceneError> {
        for node in self.store.nodes_in(space) {
            self.build_node(node)?;
        }
        if recurse {
            for child in self.store.child_spaces(space) {
                self.build_space(child, true)?;
            }
        }
        Ok(())
    }

    fn build_node(&mut self, node: NodeId) -> Result<(), SceneError> {
        let Some(idx) = self.spawn_node(node)? else {
            debug!("node {node} excluded: class not enabled");
            return Ok(());
        };
        let class = self.store.nodes.require(node)?.class;
        let plugin = self.store.classes.require(class)?.plugin;
        let restored = self.with_behavior(idx, node, plugin, |b, ctx| b.restore(ctx));
        if let Some(Err(e)) = restored {
            error!("node {node} failed to restore, excluding it: {e}");
            self.nodes.delete(idx)?;
            self.store.nodes.require_mut(node)?.arr_idx = None;
            return Ok(());
        }
        self.spawn_node_plugs(node, idx)
    }

    /// Reattach `connection` for every concrete edge.
    fn rewire(&mut self) {
        let edges: Vec<_> = self
            .store
            .edges
            .iter()
            .filter_map(|e| match (e.source, e.sink) {
                (EdgeSource::Output(src), EdgeSink::Input(dest)) => Some((e.id, src, dest)),
                _ => None,
            })
            .collect();
        for (edge, src, dest) in edges {
            let traced = self
                .trace_output(src)
                .and_then(|s| self.trace_input(dest).map(|d| (s, d)));
            match traced {
                Ok((src_idx, dest_idx)) => {
                    if let Some(slot) = self.inputs.get_mut(dest_idx) {
                        slot.connection = Some(src_idx);
                    }
                }
                Err(ValidationError::PlugNotLive { .. }) => {
                    debug!("edge {edge} not reattached: an end is not loaded");
                }
                Err(e) => error!("edge {edge} could not be reattached: {e}"),
            }
        }
    }
}

fn fatal(e: SceneError) -> ReconstructionError {
    match e {
        SceneError::Reconstruction(e) => e,
        SceneError::Store(e) => ReconstructionError::Store(e),
        SceneError::Arena(e) => ReconstructionError::Arena(e),
        SceneError::Plugin(e) => ReconstructionError::Inconsistent {
            reason: e.to_string(),
        },
        SceneError::Validation(e) => ReconstructionError::Inconsistent {
            reason: e.to_string(),
        },
        SceneError::Halted => ReconstructionError::Inconsistent {
            reason: SceneError::Halted.to_string(),
        },
    }
}
