//! Error types shared across the scene graph.
//!
//! Organized by how a caller recovers: validation errors leave the graph
//! unchanged and are reported to the requester, plugin errors abort one
//! plugin's call or load, and sink errors are transient and retried on the
//! next frame. Arena, store, and reconstruction errors live in the crates
//! that raise them.

use std::error::Error;
use std::fmt;

use crate::id::{
    ChannelId, ClassId, DataTypeId, EdgeId, NodeId, OutputId, PartitionId, PlugRef, PluginId,
    SpaceId, StatementId, UniverseId,
};

/// A request that would leave the graph malformed.
///
/// Returned synchronously; the graph and the store are unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Both ends of a wire are facade interiors.
    BothFacadeInterior,
    /// Source and destination carry different data types.
    TypeMismatch {
        /// Type of the source output.
        src_type: Option<DataTypeId>,
        /// Type of the destination input.
        dest_type: Option<DataTypeId>,
    },
    /// The class owning one end belongs to a disabled or unloaded plugin.
    ClassDisabled {
        /// The disabled class.
        class: ClassId,
    },
    /// The destination already has an incoming edge.
    AlreadyConnected {
        /// The occupied destination.
        plug: PlugRef,
    },
    /// The two ends live in different patch spaces.
    CrossScope {
        /// Scope of the source end.
        src_space: SpaceId,
        /// Scope of the destination end.
        dest_space: SpaceId,
    },
    /// A facade plug has no interior connection and cannot be used from
    /// outside its space.
    UnaliasedFacade {
        /// The unaliased facade.
        plug: PlugRef,
    },
    /// A plug was expected to be a facade but is concrete, or vice versa.
    WrongPlugKind {
        /// The offending plug.
        plug: PlugRef,
        /// Whether a facade was expected.
        expected_facade: bool,
    },
    /// The concrete plug behind a trace has no live arena slot.
    PlugNotLive {
        /// The plug without a slot.
        plug: PlugRef,
    },
    /// No such plug record.
    UnknownPlug {
        /// The missing plug.
        plug: PlugRef,
    },
    /// No such node instance.
    UnknownNode {
        /// The missing node.
        node: NodeId,
    },
    /// No such class, or the class is not loaded.
    UnknownClass {
        /// The missing class.
        class: ClassId,
    },
    /// No such data type.
    UnknownDataType {
        /// The missing type.
        data_type: DataTypeId,
    },
    /// No such patch space.
    UnknownSpace {
        /// The missing space.
        space: SpaceId,
    },
    /// No such edge.
    UnknownEdge {
        /// The missing edge.
        edge: EdgeId,
    },
    /// No such partition.
    UnknownPartition {
        /// The missing partition.
        partition: PartitionId,
    },
    /// No such channel.
    UnknownChannel {
        /// The missing channel.
        channel: ChannelId,
    },
    /// No such plugin.
    UnknownPlugin {
        /// The missing plugin.
        plugin: PluginId,
    },
    /// The reserved root space cannot be edited this way.
    RootSpace,
    /// A partition's space can only be removed with its partition.
    PartitionSpace {
        /// The partition-owned space.
        space: SpaceId,
    },
    /// A facade output belongs to a channel and is removed with it.
    ChannelOutput {
        /// The channel's facade output.
        output: OutputId,
    },
    /// The core plugin cannot be disabled.
    CorePluginLocked,
    /// A channel address lies outside its universe.
    AddressOutOfRange {
        /// The universe addressed.
        universe: UniverseId,
        /// The offending slot.
        address: u16,
        /// The highest valid slot.
        max: u16,
    },
    /// A channel was given the wrong number of addresses for its mode.
    AddressCount {
        /// Addresses required by the mode.
        expected: usize,
        /// Addresses supplied.
        got: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothFacadeInterior => {
                write!(f, "cannot wire a facade interior to a facade interior")
            }
            Self::TypeMismatch {
                src_type,
                dest_type,
            } => {
                write!(
                    f,
                    "type mismatch: source {} vs destination {}",
                    fmt_type(*src_type),
                    fmt_type(*dest_type)
                )
            }
            Self::ClassDisabled { class } => write!(f, "class {class} is not enabled"),
            Self::AlreadyConnected { plug } => write!(f, "{plug} is already connected"),
            Self::CrossScope {
                src_space,
                dest_space,
            } => {
                write!(
                    f,
                    "cross-scope wire: source in space {src_space}, destination in space {dest_space}"
                )
            }
            Self::UnaliasedFacade { plug } => {
                write!(f, "facade {plug} is not wired on its interior")
            }
            Self::WrongPlugKind {
                plug,
                expected_facade,
            } => {
                if *expected_facade {
                    write!(f, "{plug} is not a facade plug")
                } else {
                    write!(f, "{plug} is a facade plug")
                }
            }
            Self::PlugNotLive { plug } => write!(f, "{plug} has no live slot"),
            Self::UnknownPlug { plug } => write!(f, "unknown {plug}"),
            Self::UnknownNode { node } => write!(f, "unknown node {node}"),
            Self::UnknownClass { class } => write!(f, "unknown class {class}"),
            Self::UnknownDataType { data_type } => write!(f, "unknown data type {data_type}"),
            Self::UnknownSpace { space } => write!(f, "unknown patch space {space}"),
            Self::UnknownEdge { edge } => write!(f, "unknown edge {edge}"),
            Self::UnknownPartition { partition } => write!(f, "unknown partition {partition}"),
            Self::UnknownChannel { channel } => write!(f, "unknown channel {channel}"),
            Self::UnknownPlugin { plugin } => write!(f, "unknown plugin {plugin}"),
            Self::RootSpace => write!(f, "the root patch space cannot be modified"),
            Self::PartitionSpace { space } => {
                write!(f, "patch space {space} belongs to a partition")
            }
            Self::ChannelOutput { output } => {
                write!(f, "output {output} belongs to a channel; delete the channel instead")
            }
            Self::CorePluginLocked => write!(f, "the core plugin cannot be disabled"),
            Self::AddressOutOfRange {
                universe,
                address,
                max,
            } => {
                write!(
                    f,
                    "address {address} out of range in universe {universe} (max {max})"
                )
            }
            Self::AddressCount { expected, got } => {
                write!(f, "expected {expected} addresses, got {got}")
            }
        }
    }
}

fn fmt_type(t: Option<DataTypeId>) -> String {
    match t {
        Some(t) => t.to_string(),
        None => "untyped".into(),
    }
}

impl Error for ValidationError {}

/// A misuse of the plugin API.
///
/// Rejected at the call site. During plugin load this aborts that plugin
/// only; the rest of the scene continues to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PluginError {
    /// A registration call was made outside the plugin init phase.
    RegistrationOutsideInit {
        /// The plugin that attempted to register.
        plugin: PluginId,
    },
    /// A class, type, table, or column name was empty.
    EmptyName {
        /// What was being named.
        what: &'static str,
    },
    /// A statement handle was used by a plugin that did not prepare it.
    ForeignStatement {
        /// The plugin making the call.
        plugin: PluginId,
        /// The statement it does not own.
        statement: StatementId,
    },
    /// A statement handle does not refer to a prepared statement.
    UnknownStatement {
        /// The stale or invalid handle.
        statement: StatementId,
    },
    /// A plugin table does not exist in the caller's namespace.
    UnknownTable {
        /// The table name.
        table: String,
    },
    /// A table was created twice with different columns.
    TableConflict {
        /// The table name.
        table: String,
    },
    /// A column is not part of the table.
    UnknownColumn {
        /// The table name.
        table: String,
        /// The column name.
        column: String,
    },
    /// A parameter or column index is out of range for a statement.
    BadIndex {
        /// The statement.
        statement: StatementId,
        /// The out-of-range index.
        index: usize,
    },
    /// A column was read while the statement had no current row.
    NoRow {
        /// The statement.
        statement: StatementId,
    },
    /// A plugin asked for an instance of a class it does not own.
    ForeignInstance {
        /// The plugin making the call.
        plugin: PluginId,
        /// The node it does not own.
        node: NodeId,
    },
    /// The instance payload is not of the requested type.
    PayloadType {
        /// The node whose payload was downcast.
        node: NodeId,
    },
    /// A node callback (`make`, `restore`) reported failure.
    Callback {
        /// The node whose callback failed.
        node: NodeId,
        /// Description of the failure.
        reason: String,
    },
    /// A plugin's own `init` reported failure.
    InitFailed {
        /// The plugin name.
        plugin: String,
        /// Description of the failure.
        reason: String,
    },
    /// A plugin-defined failure outside the categories above.
    Custom {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistrationOutsideInit { plugin } => {
                write!(f, "plugin {plugin} attempted registration outside init")
            }
            Self::EmptyName { what } => write!(f, "{what} name must not be empty"),
            Self::ForeignStatement { plugin, statement } => {
                write!(f, "plugin {plugin} does not own statement {statement}")
            }
            Self::UnknownStatement { statement } => write!(f, "unknown statement {statement}"),
            Self::UnknownTable { table } => write!(f, "unknown table '{table}'"),
            Self::TableConflict { table } => {
                write!(f, "table '{table}' already exists with different columns")
            }
            Self::UnknownColumn { table, column } => {
                write!(f, "table '{table}' has no column '{column}'")
            }
            Self::BadIndex { statement, index } => {
                write!(f, "index {index} out of range for statement {statement}")
            }
            Self::NoRow { statement } => write!(f, "statement {statement} has no current row"),
            Self::ForeignInstance { plugin, node } => {
                write!(f, "plugin {plugin} does not own node {node}")
            }
            Self::PayloadType { node } => write!(f, "node {node} payload has a different type"),
            Self::Callback { node, reason } => write!(f, "node {node} callback failed: {reason}"),
            Self::InitFailed { plugin, reason } => {
                write!(f, "plugin '{plugin}' init failed: {reason}")
            }
            Self::Custom { reason } => write!(f, "{reason}"),
        }
    }
}

impl Error for PluginError {}

/// The output sink could not accept a universe buffer.
///
/// Transient: logged, and the buffer is offered again next frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkError {
    /// The sink is not connected.
    Unavailable {
        /// Description of the condition.
        reason: String,
    },
    /// The sink rejected a specific universe.
    Rejected {
        /// The universe that was rejected.
        universe: UniverseId,
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "output sink unavailable: {reason}"),
            Self::Rejected { universe, reason } => {
                write!(f, "universe {universe} rejected by sink: {reason}")
            }
        }
    }
}

impl Error for SinkError {}
