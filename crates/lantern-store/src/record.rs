//! Persisted row types.
//!
//! `arr_idx` columns hold the arena slot of the live object built from the
//! row. They are runtime-only: cleared before reconstruction and written
//! back as each object is rebuilt.

use lantern_core::{
    AddressId, ChannelId, ClassId, DataTypeId, EdgeId, InputId, NodeId, OutputId, PartitionId,
    PluginId, SpaceId, UniverseId,
};
use serde::{Deserialize, Serialize};

use crate::table::Record;

macro_rules! record {
    ($ty:ident, $id:ident, $table:literal) => {
        impl Record for $ty {
            type Id = $id;
            const TABLE: &'static str = $table;

            fn id(&self) -> $id {
                self.id
            }

            fn set_id(&mut self, id: $id) {
                self.id = id;
            }
        }
    };
}

/// A plugin known to the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Row id.
    pub id: PluginId,
    /// Unique plugin name; plugins are matched by name across restarts.
    pub name: String,
    /// Build digest recorded the last time the plugin was seen.
    pub digest: String,
    /// Whether the user enabled the plugin.
    pub enabled: bool,
    /// Whether the plugin loaded during the current construction.
    #[serde(skip)]
    pub loaded: bool,
}
record!(PluginRecord, PluginId, "plugins");

/// A data type registered by a plugin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataTypeRecord {
    /// Row id.
    pub id: DataTypeId,
    /// Owning plugin.
    pub plugin: PluginId,
    /// Name, unique per plugin.
    pub name: String,
    /// Human-readable description.
    pub desc: String,
}
record!(DataTypeRecord, DataTypeId, "data_types");

/// A node class registered by a plugin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Row id.
    pub id: ClassId,
    /// Owning plugin.
    pub plugin: PluginId,
    /// Name, unique per plugin.
    pub name: String,
    /// Human-readable description.
    pub desc: String,
    /// The plugin's own index for the class.
    pub class_index: u32,
    /// Slot in the class arena.
    #[serde(skip)]
    pub arr_idx: Option<usize>,
}
record!(ClassRecord, ClassId, "classes");

/// A patch space: the root, a partition's space, or a nested facade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpaceRecord {
    /// Row id. Row 0 is the reserved root.
    pub id: SpaceId,
    /// Containing space; `None` only for the root.
    pub parent: Option<SpaceId>,
    /// Display name.
    pub name: String,
    /// Position of the facade node in its parent.
    pub pos: [f64; 2],
    /// View pan inside the space.
    pub pan: [f64; 2],
    /// View scale inside the space.
    pub scale: f64,
    /// Display colour of the facade node.
    pub colour: Option<String>,
}
record!(SpaceRecord, SpaceId, "spaces");

impl SpaceRecord {
    /// A space with default view parameters.
    pub fn new(parent: Option<SpaceId>, name: impl Into<String>) -> Self {
        Self {
            id: SpaceId::default(),
            parent,
            name: name.into(),
            pos: [0.0, 0.0],
            pan: [0.0, 0.0],
            scale: 1.0,
            colour: None,
        }
    }
}

/// A node instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Row id.
    pub id: NodeId,
    /// Instantiated class.
    pub class: ClassId,
    /// Containing space.
    pub space: SpaceId,
    /// Display name.
    pub name: String,
    /// Position in the space.
    pub pos: [f64; 2],
    /// Display colour.
    pub colour: Option<String>,
    /// Slot in the instance arena.
    #[serde(skip)]
    pub arr_idx: Option<usize>,
}
record!(NodeRecord, NodeId, "nodes");

/// What a plug belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlugOwner {
    /// A concrete plug of a node instance.
    Node(NodeId),
    /// A facade plug of a patch space. Its exterior face sits in the
    /// space's parent; its interior face sits in the space itself.
    Facade(SpaceId),
}

impl PlugOwner {
    /// Whether this is a facade plug.
    pub fn is_facade(self) -> bool {
        matches!(self, Self::Facade(_))
    }
}

/// An input plug.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Row id.
    pub id: InputId,
    /// Owning node or facade space.
    pub owner: PlugOwner,
    /// Carried type; facades take the type of their alias.
    pub type_id: Option<DataTypeId>,
    /// Display name.
    pub name: String,
    /// For facades: the interior input this facade feeds, one layer in.
    pub aliased: Option<InputId>,
    /// Slot in the input arena.
    #[serde(skip)]
    pub arr_idx: Option<usize>,
}
record!(InputRecord, InputId, "inputs");

/// An output plug.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Row id.
    pub id: OutputId,
    /// Owning node or facade space.
    pub owner: PlugOwner,
    /// Carried type; facades take the type of their alias.
    pub type_id: Option<DataTypeId>,
    /// Display name.
    pub name: String,
    /// Compute function index passed to the node's behavior.
    pub func: u32,
    /// For facades: the interior output this facade exposes, one layer in.
    pub aliased: Option<OutputId>,
    /// Slot in the output arena.
    #[serde(skip)]
    pub arr_idx: Option<usize>,
}
record!(OutputRecord, OutputId, "outputs");

/// Source end of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeSource {
    /// A node output, or the exterior face of a child facade output.
    Output(OutputId),
    /// The interior face of a facade input of the edge's space.
    FacadeIn(InputId),
}

/// Destination end of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeSink {
    /// A node input, or the exterior face of a child facade input.
    Input(InputId),
    /// The interior face of a facade output of the edge's space.
    FacadeOut(OutputId),
}

/// A wire between two plugs in one space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Row id.
    pub id: EdgeId,
    /// Space the edge is drawn in.
    pub space: SpaceId,
    /// Source end.
    pub source: EdgeSource,
    /// Destination end.
    pub sink: EdgeSink,
}
record!(EdgeRecord, EdgeId, "edges");

/// A partition of the output fixtures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionRecord {
    /// Row id.
    pub id: PartitionId,
    /// Display name, mirrored onto its space.
    pub name: String,
    /// The partition's space; its parent is the root.
    pub space: SpaceId,
    /// Optional background image reference.
    pub image: Option<String>,
}
record!(PartitionRecord, PartitionId, "partitions");

/// Whether a channel drives one address or an RGB triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMode {
    /// One address driven by the red component.
    Single,
    /// Three addresses driven by red, green and blue.
    Rgb,
}

impl ChannelMode {
    /// Number of addresses the mode requires.
    pub fn address_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Rgb => 3,
        }
    }
}

/// A physical output channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Row id.
    pub id: ChannelId,
    /// Owning partition.
    pub partition: PartitionId,
    /// Display name, mirrored onto its facade output.
    pub name: String,
    /// Address mode.
    pub mode: ChannelMode,
    /// Addresses in red, green, blue order.
    pub addresses: Vec<AddressId>,
    /// The facade output in the partition's space that feeds the channel.
    pub output: OutputId,
    /// Slot in the channel arena.
    #[serde(skip)]
    pub arr_idx: Option<usize>,
}
record!(ChannelRecord, ChannelId, "channels");

/// One physical slot in a universe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Row id.
    pub id: AddressId,
    /// Universe addressed.
    pub universe: UniverseId,
    /// Slot within the universe.
    pub address: u16,
    /// Whether the value is written as two bytes, high then low.
    pub sixteen_bit: bool,
}
record!(AddressRecord, AddressId, "addresses");
