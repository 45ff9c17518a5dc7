//! Scene graph for the Lantern lighting engine.
//!
//! A [`Scene`] owns the durable [`SceneStore`](lantern_store::SceneStore)
//! and mirrors it into slot-stable arenas: plugins, node classes, node
//! instances, plugs, partitions, channels, and universes. Plugins register
//! data types and classes during [`Plugin::init`]; instances are wired
//! output-to-input inside nested patch spaces, and each frame the channels
//! pull their values through the graph and quantize them into universe
//! buffers.
//!
//! # Architecture
//!
//! ```text
//! SceneStore (durable) ──reconstruct──▶ Scene (live)
//!                                       ├── Arena<PluginSlot>   NoDelete
//!                                       ├── Arena<ClassSlot>    NoDelete
//!                                       ├── Arena<NodeSlot>     Box<dyn NodeBehavior>
//!                                       ├── Arena<InputSlot> ──connection──▶ Arena<OutputSlot>
//!                                       ├── Arena<ChannelSlot> ──binding──▶ OutputSlot
//!                                       └── Arena<UniverseSlot> (byte buffers)
//! ```
//!
//! Facade plugs on a child space exist only as records. Wiring through a
//! facade is resolved by tracing aliases down to the concrete plug, so the
//! live graph only ever connects concrete outputs to concrete inputs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod class;
pub mod config;
pub mod error;
pub mod eval;
pub mod instance;
pub mod plug;
pub mod plugin;
pub mod query;
pub mod rebuild;
pub mod scene;
pub mod space;
pub mod wire;

pub use channel::ChannelAddress;
pub use class::{NodeBehavior, NodeCtx, NodeFactory};
pub use config::SceneConfig;
pub use error::{ReconstructionError, SceneError};
pub use eval::Pull;
pub use plug::{InputSlot, OutputSlot};
pub use plugin::{Plugin, PluginCtx, PluginInit};
pub use query::{
    AddressView, ChannelView, ClassView, DataTypeView, EdgeView, FacadeView, LibrarySection,
    NodeView, PartitionView, PatchSpaceView, PlugView, PluginView,
};
pub use scene::{Scene, ScenePhase};
