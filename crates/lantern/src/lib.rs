//! Lantern: realtime lighting control built on a dataflow scene graph.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Lantern sub-crates. For most users, adding `lantern` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use lantern::prelude::*;
//! use serde_json::json;
//!
//! let config = SceneConfig::new(Box::new(CorePlugin::new()));
//! let mut scene = Scene::new(config, SceneStore::new().unwrap()).unwrap();
//!
//! // A partition owns a patch space and the channels drawn in it.
//! let stage = scene.create_partition("Stage").unwrap();
//! let space = scene.store().partitions.get(stage).unwrap().space;
//! let dimmer = scene
//!     .create_channel(
//!         stage,
//!         "Dimmer",
//!         ChannelMode::Single,
//!         &[ChannelAddress { universe: UniverseId(1), address: 0, sixteen_bit: false }],
//!     )
//!     .unwrap();
//!
//! // Drive the channel from an RGB generator; single channels take red.
//! let class = scene.store().classes.find(|c| c.name == "RGB Generator").unwrap().id;
//! let generator = scene.add_instance(space, class).unwrap();
//! let out = scene.store().outputs_of(PlugOwner::Node(generator))[0];
//! let facade = scene.store().channels.get(dimmer).unwrap().output;
//! scene.wire(EdgeSource::Output(out), EdgeSink::FacadeOut(facade)).unwrap();
//!
//! let core = scene.core_plugin().unwrap();
//! let set = json!({"method": "set_rgb_gen", "node": generator, "value": {"r": 1.0, "g": 0.0, "b": 0.0}});
//! scene.plugin_request(core, &set).unwrap();
//!
//! scene.render_frame();
//! assert_eq!(scene.universe_buffer(UniverseId(1)), Some(&[0xff][..]));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `lantern-core` | Ids, signal values, quantization, error types |
//! | [`arena`] | `lantern-arena` | Slot-stable arena with free-list reuse |
//! | [`store`] | `lantern-store` | Durable records, plugin tables, JSON persistence |
//! | [`graph`] | `lantern-graph` | The `Scene`: plugins, wiring, evaluation, rebuild |
//! | [`plugins`] | `lantern-plugins` | The core plugin and its node classes |
//! | [`engine`] | `lantern-engine` | Frame loop, request dispatch, output sinks |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids, signal values, and error types (`lantern-core`).
pub use lantern_core as types;

/// Slot-stable arena storage (`lantern-arena`).
pub use lantern_arena as arena;

/// The durable scene store (`lantern-store`).
///
/// Every live structure can be rebuilt from a [`store::SceneStore`] alone.
pub use lantern_store as store;

/// The live scene graph (`lantern-graph`).
///
/// [`graph::Scene`] owns the store and the arenas; [`graph::Plugin`] and
/// [`graph::NodeBehavior`] are the extension points.
pub use lantern_graph as graph;

/// Built-in data types and node classes (`lantern-plugins`).
pub use lantern_plugins as plugins;

/// Frame loop thread, request dispatch, and sinks (`lantern-engine`).
pub use lantern_engine as engine;

/// Common imports for typical Lantern usage.
///
/// ```rust
/// use lantern::prelude::*;
/// ```
pub mod prelude {
    // Ids and values
    pub use lantern_core::{
        ChannelId, ClassId, EdgeId, InputId, NodeId, OutputId, PartitionId, PluginId, Rgb,
        Signal, SpaceId, UniverseId,
    };

    // Errors
    pub use lantern_core::{PluginError, SinkError, ValidationError};
    pub use lantern_graph::{ReconstructionError, SceneError};

    // Store
    pub use lantern_store::{ChannelMode, EdgeSink, EdgeSource, PlugOwner, SceneStore};

    // Graph and plugin contract
    pub use lantern_graph::{
        ChannelAddress, NodeBehavior, NodeCtx, Plugin, PluginCtx, PluginInit, Pull, Scene,
        SceneConfig,
    };

    // Core plugin
    pub use lantern_plugins::CorePlugin;

    // Engine
    pub use lantern_engine::{
        EngineConfig, FrameMetrics, MemorySink, NullSink, SceneServer, UniverseSink,
    };
}
