//! Durable record store for the Lantern scene graph.
//!
//! The live graph is a cache: every entity is created here first and the
//! in-memory arenas are rebuilt from these tables at startup and reload.
//!
//! # Architecture
//!
//! ```text
//! SceneStore
//! ├── Table<PluginRecord>, Table<ClassRecord>, Table<DataTypeRecord>
//! ├── Table<SpaceRecord>   (row 0 is the reserved root space)
//! ├── Table<NodeRecord>, Table<InputRecord>, Table<OutputRecord>
//! ├── Table<EdgeRecord>
//! ├── Table<PartitionRecord>, Table<ChannelRecord>, Table<AddressRecord>
//! └── PluginDb  (per-plugin tables + prepared statements)
//! ```
//!
//! Tables persist as one JSON document via [`SceneStore::save`] and
//! [`SceneStore::open`]. Runtime columns (`arr_idx`, `loaded`) are cleared
//! by [`SceneStore::reset_runtime`] before every reconstruction.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod plugin_db;
pub mod record;
pub mod store;
pub mod table;

pub use error::StoreError;
pub use plugin_db::{PluginDb, PluginScope, PluginTable, Query, Step, Value};
pub use record::{
    AddressRecord, ChannelMode, ChannelRecord, ClassRecord, DataTypeRecord, EdgeRecord,
    EdgeSink, EdgeSource, InputRecord, NodeRecord, OutputRecord, PartitionRecord, PlugOwner,
    PluginRecord, SpaceRecord,
};
pub use store::SceneStore;
pub use table::{Record, Table};
