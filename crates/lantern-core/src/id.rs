//! Strongly-typed record identifiers and the [`FrameId`] counter.
//!
//! Every persisted entity is addressed by a `u32` row id assigned by the
//! store. The newtypes keep a node id from being passed where an output id
//! is expected; they serialize transparently as bare integers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Common behaviour of every record identifier.
///
/// Implemented by all id newtypes so that generic store tables can
/// allocate and index rows without knowing the concrete entity kind.
pub trait RecordId: Copy + Eq + Hash + Ord + fmt::Debug + fmt::Display + From<u32> {
    /// The raw row id.
    fn raw(self) -> u32;
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl RecordId for $name {
            fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

record_id! {
    /// Identifies a plugin record.
    ///
    /// The core plugin is always loaded first and is never disabled.
    PluginId
}

record_id! {
    /// Identifies a data type registered by a plugin (e.g. "RGB Type").
    DataTypeId
}

record_id! {
    /// Identifies a node class registered by a plugin.
    ClassId
}

record_id! {
    /// Identifies a patch space.
    ///
    /// [`SpaceId::ROOT`] is reserved: it is the parent of every partition's
    /// space and is never stored as a child of anything.
    SpaceId
}

impl SpaceId {
    /// The reserved root space.
    pub const ROOT: SpaceId = SpaceId(0);

    /// Whether this is the reserved root space.
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

record_id! {
    /// Identifies a node instance.
    NodeId
}

record_id! {
    /// Identifies an input plug, concrete or facade.
    InputId
}

record_id! {
    /// Identifies an output plug, concrete or facade.
    OutputId
}

record_id! {
    /// Identifies an edge record.
    EdgeId
}

record_id! {
    /// Identifies a partition.
    PartitionId
}

record_id! {
    /// Identifies a channel.
    ChannelId
}

record_id! {
    /// Identifies a physical address record.
    AddressId
}

record_id! {
    /// Identifies a physical universe (the id handed to the output sink).
    UniverseId
}

/// Handle to a prepared plugin statement.
///
/// Runtime-only and never persisted. The generation tells a finalized
/// handle apart from a later statement that reuses its slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatementId {
    /// Arena slot holding the statement.
    pub slot: u32,
    /// Generation the handle was issued in.
    pub generation: u32,
}

impl StatementId {
    /// A handle for `slot` issued in `generation`.
    pub fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (gen {})", self.slot, self.generation)
    }
}

/// Monotonically increasing frame counter.
///
/// Reset to zero whenever the scene is (re)constructed and incremented
/// once per output frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The frame after this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FrameId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A reference to either kind of plug, used in error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlugRef {
    /// An input plug.
    Input(InputId),
    /// An output plug.
    Output(OutputId),
}

impl fmt::Display for PlugRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(id) => write!(f, "input {id}"),
            Self::Output(id) => write!(f, "output {id}"),
        }
    }
}
