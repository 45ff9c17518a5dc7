//! The core plugin for the Lantern scene graph.
//!
//! [`CorePlugin`] is loaded first on every construction. It registers the
//! built-in data types (RGB, float, integer, trigger) and the node classes
//! every show starts from:
//!
//! | Class | Plugs | State |
//! |---|---|---|
//! | Integer / Float / RGB Generator | one output | value, persisted |
//! | Integer / Float / RGB Viewer | one input | none |
//! | Trigger Generator | one trigger output | count, reset on load |
//! | RGB Trigger | trigger in, RGB out | phase, reset on load |
//!
//! Generator values live in the plugin's own tables and are changed through
//! [`CorePlugin`]'s request handler; see [`request::CoreRequest`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod generator;
pub mod plugin;
pub mod request;
pub mod trigger;
pub mod viewer;

pub use generator::{
    FloatGenerator, Generator, GeneratorValue, IntGenerator, RgbGenerator, TriggerGenerator,
};
pub use plugin::{CorePlugin, FLOAT_TYPE, INTEGER_TYPE, RGB_TYPE, TRIGGER_TYPE};
pub use request::CoreRequest;
pub use trigger::RgbTrigger;
pub use viewer::Viewer;
