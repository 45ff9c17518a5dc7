//! Requests understood by [`CorePlugin`](crate::CorePlugin).

use lantern_core::{NodeId, PluginError, Rgb, Signal};
use lantern_graph::PluginCtx;
use serde::Deserialize;
use serde_json::{json, Value as Json};

use crate::generator::{Generator, GeneratorValue, TriggerGenerator};
use crate::viewer::Viewer;

/// A core plugin request, tagged by `"method"`.
///
/// ```json
/// {"method": "set_rgb_gen", "node": 4, "value": {"r": 1.0, "g": 0.5, "b": 0.0}}
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CoreRequest {
    /// Set an integer generator.
    SetIntGen {
        /// Target node.
        node: NodeId,
        /// New value.
        value: i64,
    },
    /// Read an integer generator's stored value.
    GetIntGen {
        /// Target node.
        node: NodeId,
    },
    /// Set a float generator.
    SetFloatGen {
        /// Target node.
        node: NodeId,
        /// New value.
        value: f64,
    },
    /// Read a float generator's stored value.
    GetFloatGen {
        /// Target node.
        node: NodeId,
    },
    /// Set an RGB generator.
    SetRgbGen {
        /// Target node.
        node: NodeId,
        /// New colour.
        value: Rgb,
    },
    /// Read an RGB generator's stored value.
    GetRgbGen {
        /// Target node.
        node: NodeId,
    },
    /// Read the value arriving at a viewer.
    GetView {
        /// Target viewer.
        node: NodeId,
    },
    /// Fire a trigger generator.
    FireTrigger {
        /// Target node.
        node: NodeId,
    },
}

impl CoreRequest {
    pub(crate) fn apply(self, ctx: &mut PluginCtx<'_>) -> Result<Json, PluginError> {
        match self {
            Self::SetIntGen { node, value } => set(ctx, node, value),
            Self::GetIntGen { node } => get::<i64>(ctx, node),
            Self::SetFloatGen { node, value } => set(ctx, node, value),
            Self::GetFloatGen { node } => get::<f64>(ctx, node),
            Self::SetRgbGen { node, value } => set(ctx, node, value),
            Self::GetRgbGen { node } => get::<Rgb>(ctx, node),
            Self::GetView { node } => {
                ctx.instance_mut::<Viewer>(node)?;
                match ctx.input_value(node, 0)? {
                    Some(signal) => Ok(json!({ "value": signal_json(&signal) })),
                    None => Err(PluginError::Custom {
                        reason: format!("viewer {node} is not connected"),
                    }),
                }
            }
            Self::FireTrigger { node } => {
                let count = ctx.instance_mut::<TriggerGenerator>(node)?.fire();
                Ok(json!({ "value": count }))
            }
        }
    }
}

fn set<V: GeneratorValue>(
    ctx: &mut PluginCtx<'_>,
    node: NodeId,
    value: V,
) -> Result<Json, PluginError> {
    let table = ctx.instance_mut::<Generator<V>>(node)?.table();
    table.store(&mut ctx.db(), node, value.to_row())?;
    ctx.instance_mut::<Generator<V>>(node)?.set_value(value);
    Ok(json!({ "success": true }))
}

fn get<V: GeneratorValue>(ctx: &mut PluginCtx<'_>, node: NodeId) -> Result<Json, PluginError> {
    let table = ctx.instance_mut::<Generator<V>>(node)?.table();
    let row = table.load(&mut ctx.db(), node, V::COLUMNS.len())?;
    Ok(json!({ "value": signal_json(&V::from_row(&row).signal()) }))
}

/// A signal as a JSON value: numbers for scalars, an object for colours.
pub fn signal_json(signal: &Signal) -> Json {
    match signal {
        Signal::Empty => Json::Null,
        Signal::Rgb(c) => json!({ "r": c.r, "g": c.g, "b": c.b }),
        Signal::Float(v) => json!(v),
        Signal::Int(v) => json!(v),
        Signal::Trigger(v) => json!(v),
    }
}
