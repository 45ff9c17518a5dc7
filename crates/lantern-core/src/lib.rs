//! Core identifiers, signal values, and error types for the Lantern scene graph.
//!
//! This is the leaf crate of the workspace. It defines the record
//! identifiers shared by the store and the live graph, the [`Signal`]
//! values that flow along edges, channel quantization, and the error
//! taxonomy surfaced at the request boundary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod signal;

pub use error::{PluginError, SinkError, ValidationError};
pub use id::{
    AddressId, ChannelId, ClassId, DataTypeId, EdgeId, FrameId, InputId, NodeId, OutputId,
    PartitionId, PlugRef, PluginId, RecordId, SpaceId, StatementId, UniverseId,
};
pub use signal::{quantize16, Rgb, Signal};
