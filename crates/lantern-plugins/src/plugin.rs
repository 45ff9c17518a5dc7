//! [`CorePlugin`]: registration of the built-in types and classes.

use lantern_core::{PluginError, Rgb};
use lantern_graph::{NodeBehavior, Plugin, PluginCtx, PluginInit};
use log::debug;
use serde_json::Value as Json;

use crate::generator::{Generator, GeneratorTable, GeneratorValue, TriggerGenerator};
use crate::request::CoreRequest;
use crate::trigger::RgbTrigger;
use crate::viewer::Viewer;

/// Colour triple; the type channels accept.
pub const RGB_TYPE: &str = "RGB Type";
/// Floating point scalar.
pub const FLOAT_TYPE: &str = "Float Type";
/// Integer scalar.
pub const INTEGER_TYPE: &str = "Integer Type";
/// Monotonic trigger counter.
pub const TRIGGER_TYPE: &str = "Trigger Type";

/// The plugin every scene loads first.
#[derive(Debug, Default)]
pub struct CorePlugin;

impl CorePlugin {
    /// Name the plugin is recorded under.
    pub const NAME: &'static str = "core";

    /// A core plugin ready to be handed to a scene.
    pub fn new() -> Self {
        Self
    }
}

fn prepare<V: GeneratorValue>(
    init: &mut PluginInit<'_>,
    table: &str,
) -> Result<GeneratorTable, PluginError> {
    GeneratorTable::prepare(&mut init.db(), table, V::COLUMNS)
}

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn digest(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, init: &mut PluginInit<'_>) -> Result<(), PluginError> {
        init.register_data_type(RGB_TYPE, "Red, green, and blue intensities")?;
        init.register_data_type(FLOAT_TYPE, "Floating point value")?;
        init.register_data_type(INTEGER_TYPE, "Integer value")?;
        init.register_data_type(TRIGGER_TYPE, "Counter that fires on each increment")?;

        let int = prepare::<i64>(init, "int_gen")?;
        let float = prepare::<f64>(init, "float_gen")?;
        let rgb = prepare::<Rgb>(init, "rgb_gen")?;

        init.register_node_class("Integer Generator", "Holds an integer", 1, move || {
            Box::new(Generator::<i64>::new(int)) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class("Integer Viewer", "Shows an integer", 2, || {
            Box::new(Viewer::new(INTEGER_TYPE, "Int In")) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class("Float Generator", "Holds a float", 3, move || {
            Box::new(Generator::<f64>::new(float)) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class("Float Viewer", "Shows a float", 4, || {
            Box::new(Viewer::new(FLOAT_TYPE, "Float In")) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class("RGB Generator", "Holds a colour", 5, move || {
            Box::new(Generator::<Rgb>::new(rgb)) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class("RGB Viewer", "Shows a colour", 6, || {
            Box::new(Viewer::new(RGB_TYPE, "RGB In")) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class("Trigger Generator", "Fires on request", 7, || {
            Box::new(TriggerGenerator::default()) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class("RGB Trigger", "Cycles red, green, blue per trigger", 8, || {
            Box::new(RgbTrigger::default()) as Box<dyn NodeBehavior>
        })?;

        debug!("core plugin registered as {}", init.plugin());
        Ok(())
    }

    fn handle_request(
        &mut self,
        ctx: &mut PluginCtx<'_>,
        request: &Json,
    ) -> Result<Json, PluginError> {
        let request: CoreRequest =
            serde_json::from_value(request.clone()).map_err(|e| PluginError::Custom {
                reason: format!("bad core request: {e}"),
            })?;
        request.apply(ctx)
    }
}
