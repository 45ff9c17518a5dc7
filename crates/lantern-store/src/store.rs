//! The scene store: every durable table plus JSON persistence.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use lantern_core::{ChannelId, EdgeId, InputId, NodeId, OutputId, PartitionId, SpaceId};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::plugin_db::{PluginDb, PluginTable};
use crate::record::{
    AddressRecord, ChannelRecord, ClassRecord, DataTypeRecord, EdgeRecord, EdgeSink, EdgeSource,
    InputRecord, NodeRecord, OutputRecord, PartitionRecord, PlugOwner, PluginRecord, SpaceRecord,
};
use crate::table::Table;

/// Durable tables for the whole scene.
///
/// Fields are public: the graph layer writes through to them directly
/// and keeps the `arr_idx` columns in step with its arenas.
#[derive(Debug)]
pub struct SceneStore {
    /// Known plugins.
    pub plugins: Table<PluginRecord>,
    /// Registered data types.
    pub data_types: Table<DataTypeRecord>,
    /// Registered node classes.
    pub classes: Table<ClassRecord>,
    /// Patch spaces, including the root.
    pub spaces: Table<SpaceRecord>,
    /// Node instances.
    pub nodes: Table<NodeRecord>,
    /// Input plugs, concrete and facade.
    pub inputs: Table<InputRecord>,
    /// Output plugs, concrete and facade.
    pub outputs: Table<OutputRecord>,
    /// Edges.
    pub edges: Table<EdgeRecord>,
    /// Partitions.
    pub partitions: Table<PartitionRecord>,
    /// Channels.
    pub channels: Table<ChannelRecord>,
    /// Physical addresses.
    pub addresses: Table<AddressRecord>,
    /// Plugin-owned tables and statements.
    pub plugin_db: PluginDb,
}

#[derive(Serialize)]
struct StoreDocRef<'a> {
    plugins: &'a Table<PluginRecord>,
    data_types: &'a Table<DataTypeRecord>,
    classes: &'a Table<ClassRecord>,
    spaces: &'a Table<SpaceRecord>,
    nodes: &'a Table<NodeRecord>,
    inputs: &'a Table<InputRecord>,
    outputs: &'a Table<OutputRecord>,
    edges: &'a Table<EdgeRecord>,
    partitions: &'a Table<PartitionRecord>,
    channels: &'a Table<ChannelRecord>,
    addresses: &'a Table<AddressRecord>,
    plugin_tables: &'a [PluginTable],
}

#[derive(Deserialize)]
struct StoreDoc {
    plugins: Table<PluginRecord>,
    data_types: Table<DataTypeRecord>,
    classes: Table<ClassRecord>,
    spaces: Table<SpaceRecord>,
    nodes: Table<NodeRecord>,
    inputs: Table<InputRecord>,
    outputs: Table<OutputRecord>,
    edges: Table<EdgeRecord>,
    partitions: Table<PartitionRecord>,
    channels: Table<ChannelRecord>,
    addresses: Table<AddressRecord>,
    #[serde(default)]
    plugin_tables: Vec<PluginTable>,
}

impl SceneStore {
    /// An empty store holding only the root space.
    pub fn new() -> Result<Self, StoreError> {
        let mut spaces = Table::new();
        spaces.insert_with_id(root_space());
        Ok(Self {
            plugins: Table::new(),
            data_types: Table::new(),
            classes: Table::new(),
            spaces,
            nodes: Table::new(),
            inputs: Table::new(),
            outputs: Table::new(),
            edges: Table::new(),
            partitions: Table::new(),
            channels: Table::new(),
            addresses: Table::new(),
            plugin_db: PluginDb::new()?,
        })
    }

    /// Read a store document from `reader`.
    pub fn load_from<R: Read>(reader: R) -> Result<Self, StoreError> {
        let doc: StoreDoc = serde_json::from_reader(reader)?;
        let mut spaces = doc.spaces;
        if !spaces.contains(SpaceId::ROOT) {
            spaces.insert_with_id(root_space());
        }
        Ok(Self {
            plugins: doc.plugins,
            data_types: doc.data_types,
            classes: doc.classes,
            spaces,
            nodes: doc.nodes,
            inputs: doc.inputs,
            outputs: doc.outputs,
            edges: doc.edges,
            partitions: doc.partitions,
            channels: doc.channels,
            addresses: doc.addresses,
            plugin_db: PluginDb::with_tables(doc.plugin_tables)?,
        })
    }

    /// Write the store document to `writer`.
    pub fn save_to<W: Write>(&self, writer: W) -> Result<(), StoreError> {
        let doc = StoreDocRef {
            plugins: &self.plugins,
            data_types: &self.data_types,
            classes: &self.classes,
            spaces: &self.spaces,
            nodes: &self.nodes,
            inputs: &self.inputs,
            outputs: &self.outputs,
            edges: &self.edges,
            partitions: &self.partitions,
            channels: &self.channels,
            addresses: &self.addresses,
            plugin_tables: self.plugin_db.tables(),
        };
        serde_json::to_writer_pretty(writer, &doc)?;
        Ok(())
    }

    /// Open the store file at `path`, or start empty if it does not exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            info!("no store at {}, starting empty", path.display());
            return Self::new();
        }
        let file = fs::File::open(path).map_err(|source| StoreError::Io {
            path: path.to_owned(),
            source,
        })?;
        let store = Self::load_from(std::io::BufReader::new(file))?;
        info!(
            "opened store {} ({} nodes, {} edges, {} channels)",
            path.display(),
            store.nodes.len(),
            store.edges.len(),
            store.channels.len()
        );
        Ok(store)
    }

    /// Write the store to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let tmp = sibling(path, "tmp");
        let io_err = |source| StoreError::Io {
            path: tmp.clone(),
            source,
        };
        let file = fs::File::create(&tmp).map_err(io_err)?;
        let mut writer = std::io::BufWriter::new(file);
        self.save_to(&mut writer)?;
        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.to_owned(),
            source,
        })
    }

    /// Clear every runtime column before reconstruction.
    pub fn reset_runtime(&mut self) {
        for p in self.plugins.iter_mut() {
            p.loaded = false;
        }
        for c in self.classes.iter_mut() {
            c.arr_idx = None;
        }
        for n in self.nodes.iter_mut() {
            n.arr_idx = None;
        }
        for i in self.inputs.iter_mut() {
            i.arr_idx = None;
        }
        for o in self.outputs.iter_mut() {
            o.arr_idx = None;
        }
        for c in self.channels.iter_mut() {
            c.arr_idx = None;
        }
        self.plugin_db.clear_statements();
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Nodes directly inside `space`.
    pub fn nodes_in(&self, space: SpaceId) -> Vec<NodeId> {
        self.nodes.ids_where(|n| n.space == space)
    }

    /// Spaces whose parent is `space`.
    pub fn child_spaces(&self, space: SpaceId) -> Vec<SpaceId> {
        self.spaces.ids_where(|s| s.parent == Some(space))
    }

    /// Inputs owned by `owner`.
    pub fn inputs_of(&self, owner: PlugOwner) -> Vec<InputId> {
        self.inputs.ids_where(|i| i.owner == owner)
    }

    /// Outputs owned by `owner`.
    pub fn outputs_of(&self, owner: PlugOwner) -> Vec<OutputId> {
        self.outputs.ids_where(|o| o.owner == owner)
    }

    /// Edges drawn from `source`.
    pub fn edges_from(&self, source: EdgeSource) -> Vec<EdgeId> {
        self.edges.ids_where(|e| e.source == source)
    }

    /// Edges drawn into `sink`.
    pub fn edges_into(&self, sink: EdgeSink) -> Vec<EdgeId> {
        self.edges.ids_where(|e| e.sink == sink)
    }

    /// The partition whose space is `space`.
    pub fn partition_of_space(&self, space: SpaceId) -> Option<PartitionId> {
        self.partitions.find(|p| p.space == space).map(|p| p.id)
    }

    /// The channel fed by facade output `output`.
    pub fn channel_of_output(&self, output: OutputId) -> Option<ChannelId> {
        self.channels.find(|c| c.output == output).map(|c| c.id)
    }

    /// The space an input's exterior face is drawn in.
    pub fn input_space(&self, input: InputId) -> Result<SpaceId, StoreError> {
        let owner = self.inputs.require(input)?.owner;
        self.exterior_space(owner)
    }

    /// The space an output's exterior face is drawn in.
    pub fn output_space(&self, output: OutputId) -> Result<SpaceId, StoreError> {
        let owner = self.outputs.require(output)?.owner;
        self.exterior_space(owner)
    }

    /// The space a plug owner's exterior faces are drawn in: the node's
    /// space, or the facade space's parent.
    pub fn exterior_space(&self, owner: PlugOwner) -> Result<SpaceId, StoreError> {
        match owner {
            PlugOwner::Node(node) => Ok(self.nodes.require(node)?.space),
            PlugOwner::Facade(space) => Ok(self.spaces.require(space)?.parent.unwrap_or(space)),
        }
    }

    /// Path used for periodic autosaves of the store at `path`.
    pub fn autosave_path(path: &Path) -> PathBuf {
        sibling(path, "auto")
    }
}

fn root_space() -> SpaceRecord {
    let mut root = SpaceRecord::new(None, "Root");
    root.id = SpaceId::ROOT;
    root
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
