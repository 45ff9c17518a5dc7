//! Read-only views of the scene for clients.

use lantern_core::{
    AddressId, ChannelId, ClassId, DataTypeId, EdgeId, InputId, NodeId, OutputId, PartitionId,
    PluginId, SpaceId, UniverseId, ValidationError,
};
use lantern_store::{ChannelMode, EdgeSink, EdgeSource, PlugOwner};
use serde::Serialize;

use crate::scene::Scene;

/// A plugin and whether it is in use.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PluginView {
    /// Plugin id.
    pub id: PluginId,
    /// Plugin name.
    pub name: String,
    /// Whether the user enabled it.
    pub enabled: bool,
    /// Whether it loaded in the current construction.
    pub loaded: bool,
}

/// A class offered by a plugin.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassView {
    /// Class id.
    pub id: ClassId,
    /// Class name.
    pub name: String,
    /// Description.
    pub desc: String,
    /// Whether instances can be created now.
    pub enabled: bool,
}

/// A data type offered by a plugin.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataTypeView {
    /// Type id.
    pub id: DataTypeId,
    /// Type name.
    pub name: String,
    /// Description.
    pub desc: String,
}

/// One plugin's section of the class library.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LibrarySection {
    /// The plugin.
    pub plugin: PluginView,
    /// Its classes.
    pub classes: Vec<ClassView>,
    /// Its data types.
    pub data_types: Vec<DataTypeView>,
}

/// One physical address of a channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AddressView {
    /// Address id.
    pub id: AddressId,
    /// Universe.
    pub universe: UniverseId,
    /// Slot.
    pub address: u16,
    /// Whether the slot is 16-bit.
    pub sixteen_bit: bool,
}

/// A channel and its addresses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelView {
    /// Channel id.
    pub id: ChannelId,
    /// Channel name.
    pub name: String,
    /// Address mode.
    pub mode: ChannelMode,
    /// The facade output feeding it.
    pub output: OutputId,
    /// Addresses, red first.
    pub addresses: Vec<AddressView>,
}

/// A partition and its channels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartitionView {
    /// Partition id.
    pub id: PartitionId,
    /// Partition name.
    pub name: String,
    /// Its space.
    pub space: SpaceId,
    /// Background image reference.
    pub image: Option<String>,
    /// Its channels.
    pub channels: Vec<ChannelView>,
}

/// A plug as drawn in a space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlugView<I> {
    /// Plug id.
    pub id: I,
    /// Plug name.
    pub name: String,
    /// Carried type, if known.
    pub type_id: Option<DataTypeId>,
}

/// A node instance with its plugs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeView {
    /// Node id.
    pub id: NodeId,
    /// Class id.
    pub class: ClassId,
    /// Display name.
    pub name: String,
    /// Position.
    pub pos: [f64; 2],
    /// Display colour.
    pub colour: Option<String>,
    /// Whether the node has a live slot.
    pub live: bool,
    /// Inputs.
    pub inputs: Vec<PlugView<InputId>>,
    /// Outputs.
    pub outputs: Vec<PlugView<OutputId>>,
}

/// A child space drawn as a facade node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FacadeView {
    /// The child space.
    pub space: SpaceId,
    /// Its name.
    pub name: String,
    /// Its position in this space.
    pub pos: [f64; 2],
    /// Its facade inputs, seen from outside.
    pub inputs: Vec<PlugView<InputId>>,
    /// Its facade outputs, seen from outside.
    pub outputs: Vec<PlugView<OutputId>>,
}

/// An edge as drawn in a space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeView {
    /// Edge id.
    pub id: EdgeId,
    /// Source end.
    pub source: EdgeSource,
    /// Destination end.
    pub sink: EdgeSink,
}

/// Everything drawn inside one space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatchSpaceView {
    /// The space.
    pub id: SpaceId,
    /// Its name.
    pub name: String,
    /// Its parent.
    pub parent: Option<SpaceId>,
    /// View pan.
    pub pan: [f64; 2],
    /// View scale.
    pub scale: f64,
    /// Node instances.
    pub nodes: Vec<NodeView>,
    /// Child spaces.
    pub facades: Vec<FacadeView>,
    /// This space's own facade inputs, seen from inside.
    pub facade_inputs: Vec<PlugView<InputId>>,
    /// This space's own facade outputs, seen from inside.
    pub facade_outputs: Vec<PlugView<OutputId>>,
    /// Edges drawn in the space.
    pub edges: Vec<EdgeView>,
}

impl Scene {
    /// Every known plugin.
    pub fn plugins_view(&self) -> Vec<PluginView> {
        self.store
            .plugins
            .iter()
            .map(|p| PluginView {
                id: p.id,
                name: p.name.clone(),
                enabled: p.enabled,
                loaded: p.loaded,
            })
            .collect()
    }

    /// Classes and data types grouped by plugin.
    pub fn library(&self) -> Vec<LibrarySection> {
        self.plugins_view()
            .into_iter()
            .map(|plugin| LibrarySection {
                classes: self
                    .store
                    .classes
                    .filter(|c| c.plugin == plugin.id)
                    .map(|c| ClassView {
                        id: c.id,
                        name: c.name.clone(),
                        desc: c.desc.clone(),
                        enabled: self.class_enabled(c.id),
                    })
                    .collect(),
                data_types: self
                    .store
                    .data_types
                    .filter(|t| t.plugin == plugin.id)
                    .map(|t| DataTypeView {
                        id: t.id,
                        name: t.name.clone(),
                        desc: t.desc.clone(),
                    })
                    .collect(),
                plugin,
            })
            .collect()
    }

    /// Every partition with its channels.
    pub fn partitions_view(&self) -> Vec<PartitionView> {
        self.store
            .partitions
            .iter()
            .map(|p| PartitionView {
                id: p.id,
                name: p.name.clone(),
                space: p.space,
                image: p.image.clone(),
                channels: self
                    .store
                    .channels
                    .filter(|c| c.partition == p.id)
                    .map(|c| ChannelView {
                        id: c.id,
                        name: c.name.clone(),
                        mode: c.mode,
                        output: c.output,
                        addresses: c
                            .addresses
                            .iter()
                            .filter_map(|a| self.store.addresses.get(*a))
                            .map(|a| AddressView {
                                id: a.id,
                                universe: a.universe,
                                address: a.address,
                                sixteen_bit: a.sixteen_bit,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Everything drawn inside `space`.
    pub fn patch_space(&self, space: SpaceId) -> Result<PatchSpaceView, ValidationError> {
        let rec = self
            .store
            .spaces
            .get(space)
            .ok_or(ValidationError::UnknownSpace { space })?;
        let nodes = self
            .store
            .nodes
            .filter(|n| n.space == space)
            .map(|n| NodeView {
                id: n.id,
                class: n.class,
                name: n.name.clone(),
                pos: n.pos,
                colour: n.colour.clone(),
                live: n.arr_idx.is_some(),
                inputs: self.input_views(PlugOwner::Node(n.id)),
                outputs: self.output_views(PlugOwner::Node(n.id)),
            })
            .collect();
        let facades = self
            .store
            .spaces
            .filter(|s| s.parent == Some(space))
            .map(|s| FacadeView {
                space: s.id,
                name: s.name.clone(),
                pos: s.pos,
                inputs: self.input_views(PlugOwner::Facade(s.id)),
                outputs: self.output_views(PlugOwner::Facade(s.id)),
            })
            .collect();
        let edges = self
            .store
            .edges
            .filter(|e| e.space == space)
            .map(|e| EdgeView {
                id: e.id,
                source: e.source,
                sink: e.sink,
            })
            .collect();
        Ok(PatchSpaceView {
            id: space,
            name: rec.name.clone(),
            parent: rec.parent,
            pan: rec.pan,
            scale: rec.scale,
            nodes,
            facades,
            facade_inputs: self.input_views(PlugOwner::Facade(space)),
            facade_outputs: self.output_views(PlugOwner::Facade(space)),
            edges,
        })
    }

    fn input_views(&self, owner: PlugOwner) -> Vec<PlugView<InputId>> {
        self.store
            .inputs
            .filter(|i| i.owner == owner)
            .map(|i| PlugView {
                id: i.id,
                name: i.name.clone(),
                type_id: i.type_id,
            })
            .collect()
    }

    fn output_views(&self, owner: PlugOwner) -> Vec<PlugView<OutputId>> {
        self.store
            .outputs
            .filter(|o| o.owner == owner)
            .map(|o| PlugView {
                id: o.id,
                name: o.name.clone(),
                type_id: o.type_id,
            })
            .collect()
    }
}
