//! Node instances: creation, removal, and per-node editing.

use lantern_core::{
    ClassId, DataTypeId, InputId, NodeId, OutputId, PluginError, PluginId, SpaceId,
    ValidationError,
};
use lantern_store::{EdgeSink, EdgeSource, InputRecord, NodeRecord, OutputRecord, PlugOwner};
use log::{debug, error};
use smallvec::SmallVec;

use crate::class::{NodeBehavior, NodeCtx};
use crate::error::SceneError;
use crate::plug::{InputSlot, OutputSlot};
use crate::scene::Scene;

/// A live node instance.
#[derive(Default)]
pub(crate) struct NodeSlot {
    pub(crate) id: NodeId,
    pub(crate) class: usize,
    /// Taken out while one of its callbacks runs.
    pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
    pub(crate) inputs: SmallVec<[usize; 4]>,
    pub(crate) outputs: SmallVec<[usize; 4]>,
}

impl Scene {
    /// Create an instance of `class` in `space`.
    ///
    /// The record is written first, then a slot and payload are allocated
    /// and the class's `make` and `restore` callbacks run. A failing
    /// callback rolls the instance back.
    pub fn add_instance(&mut self, space: SpaceId, class: ClassId) -> Result<NodeId, SceneError> {
        self.ensure_running()?;
        if !self.store.spaces.contains(space) {
            return Err(ValidationError::UnknownSpace { space }.into());
        }
        let class_rec = self
            .store
            .classes
            .get(class)
            .ok_or(ValidationError::UnknownClass { class })?;
        let (class_name, plugin) = (class_rec.name.clone(), class_rec.plugin);
        if !self.class_enabled(class) {
            return Err(ValidationError::ClassDisabled { class }.into());
        }

        let node = self.store.nodes.insert(NodeRecord {
            id: NodeId::default(),
            class,
            space,
            name: format!("New {class_name}"),
            pos: [0.0, 0.0],
            colour: None,
            arr_idx: None,
        });
        let idx = match self.spawn_node(node) {
            Ok(Some(idx)) => idx,
            Ok(None) => {
                self.store.nodes.remove(node);
                return Err(ValidationError::ClassDisabled { class }.into());
            }
            Err(e) => {
                self.store.nodes.remove(node);
                return Err(e);
            }
        };

        let made = self.with_behavior(idx, node, plugin, |b, ctx| {
            b.make(ctx)?;
            b.restore(ctx)
        });
        if let Some(Err(e)) = made {
            self.discard_instance(node)?;
            return Err(PluginError::Callback {
                node,
                reason: e.to_string(),
            }
            .into());
        }
        debug!("added node {node} ({class_name}) to space {space}");
        Ok(node)
    }

    /// Remove `node`.
    ///
    /// Runs the `delete` callback, unwires every edge attached to the
    /// node's plugs, removes the plugs, and frees the slot, which runs
    /// `clean`.
    pub fn remove_instance(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.ensure_running()?;
        let rec = self
            .store
            .nodes
            .get(node)
            .ok_or(ValidationError::UnknownNode { node })?;
        let arr_idx = rec.arr_idx;
        let plugin = self.store.classes.get(rec.class).map(|c| c.plugin);
        if let (Some(idx), Some(plugin)) = (arr_idx, plugin) {
            self.with_behavior(idx, node, plugin, |b, ctx| b.delete(ctx));
        }
        self.discard_instance(node)?;
        debug!("removed node {node}");
        Ok(())
    }

    /// Unwire and remove `node`'s plugs, slot, and record without running
    /// `delete`.
    pub(crate) fn discard_instance(&mut self, node: NodeId) -> Result<(), SceneError> {
        for input in self.store.inputs_of(PlugOwner::Node(node)) {
            for edge in self.store.edges_into(EdgeSink::Input(input)) {
                self.unwire(edge)?;
            }
            if let Some(rec) = self.store.inputs.remove(input) {
                if let Some(idx) = rec.arr_idx {
                    self.inputs.delete(idx)?;
                }
            }
        }
        for output in self.store.outputs_of(PlugOwner::Node(node)) {
            for edge in self.store.edges_from(EdgeSource::Output(output)) {
                self.unwire(edge)?;
            }
            if let Some(rec) = self.store.outputs.remove(output) {
                if let Some(idx) = rec.arr_idx {
                    self.outputs.delete(idx)?;
                }
            }
        }
        if let Some(rec) = self.store.nodes.remove(node) {
            if let Some(idx) = rec.arr_idx {
                self.nodes.delete(idx)?;
            }
        }
        Ok(())
    }

    /// Rename `node`.
    pub fn rename_instance(&mut self, node: NodeId, name: &str) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.node_record_mut(node)?.name = name.to_owned();
        Ok(())
    }

    /// Move `node` within its space.
    pub fn position_instance(&mut self, node: NodeId, pos: [f64; 2]) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.node_record_mut(node)?.pos = pos;
        Ok(())
    }

    /// Set or clear `node`'s display colour.
    pub fn set_instance_colour(
        &mut self,
        node: NodeId,
        colour: Option<String>,
    ) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.node_record_mut(node)?.colour = colour;
        Ok(())
    }

    fn node_record_mut(&mut self, node: NodeId) -> Result<&mut NodeRecord, ValidationError> {
        self.store
            .nodes
            .get_mut(node)
            .ok_or(ValidationError::UnknownNode { node })
    }

    // ── Slots ────────────────────────────────────────────────────

    /// Allocate a slot and payload for durable node `node`.
    ///
    /// Returns `None` when its class is disabled or not loaded; the record
    /// is left untouched.
    pub(crate) fn spawn_node(&mut self, node: NodeId) -> Result<Option<usize>, SceneError> {
        let class = self.store.nodes.require(node)?.class;
        let Some(class_idx) = self.store.classes.get(class).and_then(|c| c.arr_idx) else {
            return Ok(None);
        };
        let factory = match self.classes.get(class_idx) {
            Some(slot) if slot.enabled => slot.factory.clone(),
            _ => None,
        };
        let Some(factory) = factory else {
            return Ok(None);
        };

        let (idx, slot) = self.nodes.insert()?;
        slot.id = node;
        slot.class = class_idx;
        slot.behavior = Some(factory.instantiate());
        self.store.nodes.require_mut(node)?.arr_idx = Some(idx);
        Ok(Some(idx))
    }

    /// Run `f` on node `idx`'s behavior with a callback context.
    ///
    /// The behavior is taken out of its slot for the duration, so the
    /// callback may freely mutate the scene. Returns `None` if the slot has
    /// no behavior.
    pub(crate) fn with_behavior<R>(
        &mut self,
        idx: usize,
        node: NodeId,
        plugin: PluginId,
        f: impl FnOnce(&mut dyn NodeBehavior, &mut NodeCtx<'_>) -> R,
    ) -> Option<R> {
        let mut behavior = self.nodes.get_mut(idx)?.behavior.take()?;
        let result = f(
            behavior.as_mut(),
            &mut NodeCtx {
                scene: self,
                node,
                plugin,
            },
        );
        match self.nodes.get_mut(idx) {
            Some(slot) => slot.behavior = Some(behavior),
            None => behavior.clean(),
        }
        Some(result)
    }

    /// Build slots for `node`'s persisted concrete plugs.
    pub(crate) fn spawn_node_plugs(&mut self, node: NodeId, idx: usize) -> Result<(), SceneError> {
        for input in self.store.inputs_of(PlugOwner::Node(node)) {
            let type_id = self.store.inputs.require(input)?.type_id;
            self.spawn_input(input, idx, type_id)?;
        }
        for output in self.store.outputs_of(PlugOwner::Node(node)) {
            let rec = self.store.outputs.require(output)?;
            let (type_id, func) = (rec.type_id, rec.func);
            self.spawn_output(output, idx, type_id, func)?;
        }
        Ok(())
    }

    fn spawn_input(
        &mut self,
        input: InputId,
        node_idx: usize,
        type_id: Option<DataTypeId>,
    ) -> Result<usize, SceneError> {
        let idx = self.inputs.insert_with(InputSlot {
            id: input,
            node: node_idx,
            type_id,
            connection: None,
        })?;
        self.store.inputs.require_mut(input)?.arr_idx = Some(idx);
        if let Some(node) = self.nodes.get_mut(node_idx) {
            node.inputs.push(idx);
        }
        Ok(idx)
    }

    fn spawn_output(
        &mut self,
        output: OutputId,
        node_idx: usize,
        type_id: Option<DataTypeId>,
        func: u32,
    ) -> Result<usize, SceneError> {
        let idx = self.outputs.insert_with(OutputSlot {
            id: output,
            node: node_idx,
            type_id,
            func,
            ..OutputSlot::default()
        })?;
        self.store.outputs.require_mut(output)?.arr_idx = Some(idx);
        if let Some(node) = self.nodes.get_mut(node_idx) {
            node.outputs.push(idx);
        }
        Ok(idx)
    }

    // ── Plugin plug API ──────────────────────────────────────────

    /// Add a concrete input to live node `node`.
    pub fn add_instance_input(
        &mut self,
        node: NodeId,
        name: &str,
        type_id: DataTypeId,
    ) -> Result<InputId, SceneError> {
        let node_idx = self.live_node_idx(node)?;
        self.check_data_type(type_id)?;
        let input = self.store.inputs.insert(InputRecord {
            id: InputId::default(),
            owner: PlugOwner::Node(node),
            type_id: Some(type_id),
            name: name.to_owned(),
            aliased: None,
            arr_idx: None,
        });
        if let Err(e) = self.spawn_input(input, node_idx, Some(type_id)) {
            error!("could not allocate input {input} of node {node}: {e}");
            self.store.inputs.remove(input);
            return Err(e);
        }
        Ok(input)
    }

    /// Add a concrete output, computed by `func`, to live node `node`.
    pub fn add_instance_output(
        &mut self,
        node: NodeId,
        name: &str,
        type_id: DataTypeId,
        func: u32,
    ) -> Result<OutputId, SceneError> {
        let node_idx = self.live_node_idx(node)?;
        self.check_data_type(type_id)?;
        let output = self.store.outputs.insert(OutputRecord {
            id: OutputId::default(),
            owner: PlugOwner::Node(node),
            type_id: Some(type_id),
            name: name.to_owned(),
            func,
            aliased: None,
            arr_idx: None,
        });
        if let Err(e) = self.spawn_output(output, node_idx, Some(type_id), func) {
            error!("could not allocate output {output} of node {node}: {e}");
            self.store.outputs.remove(output);
            return Err(e);
        }
        Ok(output)
    }

    fn live_node_idx(&self, node: NodeId) -> Result<usize, ValidationError> {
        self.store
            .nodes
            .get(node)
            .and_then(|n| n.arr_idx)
            .ok_or(ValidationError::UnknownNode { node })
    }

    fn check_data_type(&self, data_type: DataTypeId) -> Result<(), ValidationError> {
        if self.store.data_types.contains(data_type) {
            Ok(())
        } else {
            Err(ValidationError::UnknownDataType { data_type })
        }
    }
}
