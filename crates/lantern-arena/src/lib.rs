//! Slot-stable growable arena with free-list reuse.
//!
//! Every entity collection in the scene graph (node classes, instances,
//! plugs, channels, universes, statements) lives in an [`Arena`]. The arena
//! hands out `usize` slot indices that are persisted next to the durable
//! record, so the live graph and the store can be kept in lockstep.
//!
//! # Architecture
//!
//! ```text
//! Arena<T>
//! ├── Unit[0]  Box<[T]> × growth_unit   (never moved once allocated)
//! ├── Unit[1]  Box<[T]> × growth_unit
//! ├── ...
//! └── free list: BinaryHeap<Reverse<usize>>  (smallest freed slot first)
//! ```
//!
//! Growth appends a new default-initialized unit; existing units are never
//! reallocated, so a reference obtained from a slot stays valid for as long
//! as the borrow checker allows and the element address does not change
//! across later inserts.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;

pub use arena::{Arena, DeletionEpoch, Destructor};
pub use config::{ArenaConfig, DeletionPolicy};
pub use error::ArenaError;
