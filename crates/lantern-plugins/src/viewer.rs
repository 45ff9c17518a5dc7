//! Viewer classes: a single input whose value clients can inspect.

use lantern_core::{PluginError, Signal};
use lantern_graph::{NodeBehavior, NodeCtx, Pull};

/// A node with one input of a core type and no outputs.
///
/// Its value is read on request through
/// [`PluginCtx::input_value`](lantern_graph::PluginCtx::input_value).
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    type_name: &'static str,
    input: &'static str,
}

impl Viewer {
    /// A viewer of core type `type_name` with an input named `input`.
    pub fn new(type_name: &'static str, input: &'static str) -> Self {
        Self { type_name, input }
    }

    /// The core type viewed.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl NodeBehavior for Viewer {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let type_id = ctx
            .core_type(self.type_name)
            .ok_or_else(|| PluginError::Custom {
                reason: format!("core type '{}' is not registered", self.type_name),
            })?;
        ctx.add_input(self.input, type_id)?;
        Ok(())
    }

    fn compute(&mut self, _func: u32, _pull: &mut Pull<'_>) -> Signal {
        Signal::Empty
    }
}
