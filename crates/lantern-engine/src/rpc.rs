//! JSON request dispatch.
//!
//! A request is a JSON object whose `"method"` names the operation; the
//! other fields are its arguments. Every response is an object carrying
//! either `"success": true` plus any operation-specific fields, or an
//! `"error"` string.
//!
//! ```json
//! {"method": "wire", "source": {"Output": 4}, "sink": {"Input": 9}}
//! {"success": true, "edge": 3}
//! ```

use std::error::Error;
use std::fmt;

use lantern_core::{
    ChannelId, ClassId, EdgeId, InputId, NodeId, OutputId, PartitionId, PluginId, SpaceId,
    UniverseId, ValidationError,
};
use lantern_graph::{ChannelAddress, ReconstructionError, Scene, SceneError};
use lantern_store::{ChannelMode, EdgeSink, EdgeSource};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};

// ── Requests ─────────────────────────────────────────────────────

/// One physical slot, as sent by clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParams {
    /// Universe addressed.
    pub universe: UniverseId,
    /// Slot within the universe.
    pub address: u16,
    /// Whether the value spans two slots.
    #[serde(default)]
    pub sixteen_bit: bool,
}

impl From<AddressParams> for ChannelAddress {
    fn from(p: AddressParams) -> Self {
        ChannelAddress {
            universe: p.universe,
            address: p.address,
            sixteen_bit: p.sixteen_bit,
        }
    }
}

/// A decoded request. Field names match the JSON arguments.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Request {
    Library,
    Partitions,
    PatchSpace {
        space: SpaceId,
    },
    Plugins,

    AddNode {
        space: SpaceId,
        class: ClassId,
    },
    DeleteNode {
        node: NodeId,
    },
    RenameNode {
        node: NodeId,
        name: String,
    },
    PositionNode {
        node: NodeId,
        pos: [f64; 2],
    },
    SetNodeColour {
        node: NodeId,
        colour: Option<String>,
    },

    AddFacade {
        parent: SpaceId,
        name: String,
    },
    DeleteFacade {
        space: SpaceId,
    },
    RenameFacade {
        space: SpaceId,
        name: String,
    },
    PositionFacade {
        space: SpaceId,
        pos: [f64; 2],
    },
    PanPatchSpace {
        space: SpaceId,
        pan: [f64; 2],
        scale: f64,
    },

    CreateFacadeIn {
        space: SpaceId,
        name: String,
    },
    DeleteFacadeIn {
        input: InputId,
    },
    RenameFacadeIn {
        input: InputId,
        name: String,
    },
    CreateFacadeOut {
        space: SpaceId,
        name: String,
    },
    DeleteFacadeOut {
        output: OutputId,
    },
    RenameFacadeOut {
        output: OutputId,
        name: String,
    },

    Wire {
        source: EdgeSource,
        sink: EdgeSink,
    },
    Unwire {
        edge: EdgeId,
    },

    CreatePartition {
        name: String,
    },
    UpdatePartition {
        partition: PartitionId,
        name: String,
        #[serde(default)]
        image: Option<String>,
    },
    DeletePartition {
        partition: PartitionId,
    },

    CreateChannel {
        partition: PartitionId,
        name: String,
        mode: ChannelMode,
        addresses: Vec<AddressParams>,
    },
    UpdateChannel {
        channel: ChannelId,
        name: String,
        mode: ChannelMode,
        addresses: Vec<AddressParams>,
    },
    DeleteChannel {
        channel: ChannelId,
    },

    EnablePlugin {
        plugin: PluginId,
    },
    DisablePlugin {
        plugin: PluginId,
    },
    PluginRequest {
        plugin: PluginId,
        payload: Json,
    },

    Reload,
}

// ── RpcError ─────────────────────────────────────────────────────

/// Why a request produced an error response.
#[derive(Debug)]
pub enum RpcError {
    /// The request did not decode.
    Malformed(serde_json::Error),
    /// The scene rejected or failed the operation.
    Scene(SceneError),
    /// A reload could not rebuild the scene.
    Reload(ReconstructionError),
    /// A reply could not be encoded.
    Encode(serde_json::Error),
}

impl RpcError {
    /// Whether the request was refused rather than failed.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Malformed(_) => true,
            Self::Scene(e) => e.is_rejection(),
            Self::Reload(_) | Self::Encode(_) => false,
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed request: {e}"),
            Self::Scene(e) => write!(f, "{e}"),
            Self::Reload(e) => write!(f, "reload failed: {e}"),
            Self::Encode(e) => write!(f, "could not encode reply: {e}"),
        }
    }
}

impl Error for RpcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(e) | Self::Encode(e) => Some(e),
            Self::Scene(e) => Some(e),
            Self::Reload(e) => Some(e),
        }
    }
}

impl From<SceneError> for RpcError {
    fn from(e: SceneError) -> Self {
        Self::Scene(e)
    }
}

impl From<ValidationError> for RpcError {
    fn from(e: ValidationError) -> Self {
        Self::Scene(e.into())
    }
}

// ── Dispatch ─────────────────────────────────────────────────────

type Reply = Map<String, Json>;

fn done() -> Reply {
    Map::new()
}

fn with(key: &str, value: impl Serialize) -> Result<Reply, RpcError> {
    let value = serde_json::to_value(value).map_err(RpcError::Encode)?;
    let mut reply = Map::new();
    reply.insert(key.to_owned(), value);
    Ok(reply)
}

fn addresses(params: &[AddressParams]) -> Vec<ChannelAddress> {
    params.iter().copied().map(ChannelAddress::from).collect()
}

impl Request {
    /// Run the request against `scene`.
    pub fn apply(self, scene: &mut Scene) -> Result<Reply, RpcError> {
        match self {
            Self::Library => with("library", scene.library()),
            Self::Partitions => with("partitions", scene.partitions_view()),
            Self::PatchSpace { space } => with("patch_space", scene.patch_space(space)?),
            Self::Plugins => with("plugins", scene.plugins_view()),

            Self::AddNode { space, class } => with("node", scene.add_instance(space, class)?),
            Self::DeleteNode { node } => {
                scene.remove_instance(node)?;
                Ok(done())
            }
            Self::RenameNode { node, name } => {
                scene.rename_instance(node, &name)?;
                Ok(done())
            }
            Self::PositionNode { node, pos } => {
                scene.position_instance(node, pos)?;
                Ok(done())
            }
            Self::SetNodeColour { node, colour } => {
                scene.set_instance_colour(node, colour)?;
                Ok(done())
            }

            Self::AddFacade { parent, name } => with("space", scene.add_space(parent, &name)?),
            Self::DeleteFacade { space } => {
                scene.remove_space(space)?;
                Ok(done())
            }
            Self::RenameFacade { space, name } => {
                scene.rename_space(space, &name)?;
                Ok(done())
            }
            Self::PositionFacade { space, pos } => {
                scene.position_space(space, pos)?;
                Ok(done())
            }
            Self::PanPatchSpace { space, pan, scale } => {
                scene.pan_space(space, pan, scale)?;
                Ok(done())
            }

            Self::CreateFacadeIn { space, name } => {
                with("input", scene.add_facade_input(space, &name)?)
            }
            Self::DeleteFacadeIn { input } => {
                scene.remove_facade_input(input)?;
                Ok(done())
            }
            Self::RenameFacadeIn { input, name } => {
                scene.rename_facade_input(input, &name)?;
                Ok(done())
            }
            Self::CreateFacadeOut { space, name } => {
                with("output", scene.add_facade_output(space, &name)?)
            }
            Self::DeleteFacadeOut { output } => {
                scene.remove_facade_output(output)?;
                Ok(done())
            }
            Self::RenameFacadeOut { output, name } => {
                scene.rename_facade_output(output, &name)?;
                Ok(done())
            }

            Self::Wire { source, sink } => with("edge", scene.wire(source, sink)?),
            Self::Unwire { edge } => {
                scene.unwire(edge)?;
                Ok(done())
            }

            Self::CreatePartition { name } => with("partition", scene.create_partition(&name)?),
            Self::UpdatePartition {
                partition,
                name,
                image,
            } => {
                scene.update_partition(partition, &name, image)?;
                Ok(done())
            }
            Self::DeletePartition { partition } => {
                scene.delete_partition(partition)?;
                Ok(done())
            }

            Self::CreateChannel {
                partition,
                name,
                mode,
                addresses: params,
            } => with(
                "channel",
                scene.create_channel(partition, &name, mode, &addresses(&params))?,
            ),
            Self::UpdateChannel {
                channel,
                name,
                mode,
                addresses: params,
            } => {
                scene.update_channel(channel, &name, mode, &addresses(&params))?;
                Ok(done())
            }
            Self::DeleteChannel { channel } => {
                scene.delete_channel(channel)?;
                Ok(done())
            }

            Self::EnablePlugin { plugin } => with("live", scene.enable_plugin(plugin)?),
            Self::DisablePlugin { plugin } => {
                scene.disable_plugin(plugin)?;
                Ok(done())
            }
            Self::PluginRequest { plugin, payload } => {
                with("response", scene.plugin_request(plugin, &payload)?)
            }

            Self::Reload => {
                info!("reload requested");
                scene.reconstruct().map_err(RpcError::Reload)?;
                Ok(done())
            }
        }
    }
}

/// Decode and run `request`, producing the response object.
pub fn dispatch(scene: &mut Scene, request: &Json) -> Json {
    let result = Request::deserialize(request)
        .map_err(RpcError::Malformed)
        .and_then(|request| request.apply(scene));
    match result {
        Ok(mut reply) => {
            reply.insert("success".to_owned(), Json::Bool(true));
            Json::Object(reply)
        }
        Err(e) => {
            if e.is_rejection() {
                debug!("request rejected: {e}");
            } else {
                error!("request failed: {e}");
            }
            json!({ "error": e.to_string() })
        }
    }
}

/// Whether `response` reports an error.
pub fn is_error(response: &Json) -> bool {
    response.get("error").is_some()
}
