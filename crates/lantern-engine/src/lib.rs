//! Frame loop, request dispatch, and output sinks for the Lantern scene
//! graph.
//!
//! [`SceneServer`] moves a [`Scene`](lantern_graph::Scene) onto its own
//! thread, renders it at a fixed rate, hands every universe buffer to a
//! [`UniverseSink`], and answers JSON requests ([`rpc`]) between frames.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod frame;
pub mod metrics;
pub mod rpc;
pub mod server;
pub mod sink;

pub use config::{ConfigError, EngineConfig};
pub use frame::{FrameClock, FrameStart};
pub use metrics::FrameMetrics;
pub use rpc::{dispatch, AddressParams, Request, RpcError};
pub use server::{SceneServer, ServerHandle, SubmitError};
pub use sink::{MemorySink, NullSink, UniverseSink};
