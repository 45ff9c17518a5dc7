//! Reusable fixture plugins.
//!
//! - [`FixtureCore`]: stands in for the core plugin. Registers the RGB and
//!   float types and the classes below.
//! - [`ExtraPlugin`]: a non-core plugin with one RGB pass-through class,
//!   for enable/disable scenarios.
//! - [`FailingPlugin`]: fails in `init`.
//! - [`SwitchedCore`]: a [`FixtureCore`] whose `init` fails on demand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use lantern_core::{DataTypeId, NodeId, PluginError, Rgb, Signal};
use lantern_graph::{NodeBehavior, NodeCtx, Plugin, PluginCtx, PluginInit, Pull};
use serde_json::{json, Value as Json};

pub const RGB_TYPE: &str = "RGB Type";
pub const FLOAT_TYPE: &str = "Float Type";

pub const CLASS_CONSTANT: &str = "Constant";
pub const CLASS_PASS: &str = "Pass";
pub const CLASS_MIXER: &str = "Mixer";
pub const CLASS_COUNTER: &str = "Counter";
pub const CLASS_FLOAT_SUM: &str = "Float Sum";
pub const CLASS_EXTRA_PASS: &str = "Extra Pass";

fn core_type(ctx: &NodeCtx<'_>, name: &str) -> Result<DataTypeId, PluginError> {
    ctx.core_type(name).ok_or_else(|| PluginError::Custom {
        reason: format!("core type '{name}' missing"),
    })
}

fn rgb_in(pull: &mut Pull<'_>, n: usize) -> Rgb {
    pull.input(n).as_rgb().unwrap_or(Rgb::BLACK)
}

// ── Behaviors ───────────────────────────────────────────────────

/// One RGB output holding a settable colour.
#[derive(Default)]
pub struct Constant {
    pub colour: Rgb,
}

impl NodeBehavior for Constant {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let rgb = core_type(ctx, RGB_TYPE)?;
        ctx.add_output("Out", rgb, 0)?;
        Ok(())
    }

    fn compute(&mut self, _func: u32, _pull: &mut Pull<'_>) -> Signal {
        Signal::Rgb(self.colour)
    }
}

/// RGB in, same RGB out.
#[derive(Default)]
pub struct Pass;

impl NodeBehavior for Pass {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let rgb = core_type(ctx, RGB_TYPE)?;
        ctx.add_input("In", rgb)?;
        ctx.add_output("Out", rgb, 0)?;
        Ok(())
    }

    fn compute(&mut self, _func: u32, pull: &mut Pull<'_>) -> Signal {
        match pull.input(0) {
            Signal::Rgb(c) => Signal::Rgb(c),
            _ => Signal::Empty,
        }
    }
}

/// Averages two RGB inputs.
#[derive(Default)]
pub struct Mixer;

impl NodeBehavior for Mixer {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let rgb = core_type(ctx, RGB_TYPE)?;
        ctx.add_input("A", rgb)?;
        ctx.add_input("B", rgb)?;
        ctx.add_output("Mix", rgb, 0)?;
        Ok(())
    }

    fn compute(&mut self, _func: u32, pull: &mut Pull<'_>) -> Signal {
        let a = rgb_in(pull, 0);
        let b = rgb_in(pull, 1);
        Signal::Rgb(Rgb::new((a.r + b.r) / 2.0, (a.g + b.g) / 2.0, (a.b + b.b) / 2.0))
    }
}

/// A float output that reports how often it has been computed.
pub struct ComputeCounter {
    calls: Arc<AtomicUsize>,
}

impl ComputeCounter {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

impl NodeBehavior for ComputeCounter {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let float = core_type(ctx, FLOAT_TYPE)?;
        ctx.add_output("Count", float, 0)?;
        Ok(())
    }

    fn compute(&mut self, _func: u32, _pull: &mut Pull<'_>) -> Signal {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Signal::Float(n as f64)
    }
}

/// Sums two float inputs.
#[derive(Default)]
pub struct FloatSum;

impl NodeBehavior for FloatSum {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let float = core_type(ctx, FLOAT_TYPE)?;
        ctx.add_input("A", float)?;
        ctx.add_input("B", float)?;
        ctx.add_output("Sum", float, 0)?;
        Ok(())
    }

    fn compute(&mut self, _func: u32, pull: &mut Pull<'_>) -> Signal {
        let a = pull.input(0).as_float().unwrap_or(0.0);
        let b = pull.input(1).as_float().unwrap_or(0.0);
        Signal::Float(a + b)
    }
}

// ── Plugins ─────────────────────────────────────────────────────

/// Stand-in core plugin.
///
/// Accepts `{"node": <id>, "rgb": [r, g, b]}` to set a [`Constant`].
pub struct FixtureCore {
    calls: Arc<AtomicUsize>,
}

impl FixtureCore {
    pub const NAME: &'static str = "fixture-core";

    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

impl Plugin for FixtureCore {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn init(&mut self, init: &mut PluginInit<'_>) -> Result<(), PluginError> {
        init.register_data_type(RGB_TYPE, "Colour triple")?;
        init.register_data_type(FLOAT_TYPE, "Scalar")?;
        init.register_node_class(CLASS_CONSTANT, "Fixed colour", 0, || {
            Box::new(Constant::default()) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class(CLASS_PASS, "RGB pass-through", 1, || {
            Box::new(Pass) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class(CLASS_MIXER, "Average of two colours", 2, || {
            Box::new(Mixer) as Box<dyn NodeBehavior>
        })?;
        let calls = Arc::clone(&self.calls);
        init.register_node_class(CLASS_COUNTER, "Counts its computes", 3, move || {
            Box::new(ComputeCounter::new(Arc::clone(&calls))) as Box<dyn NodeBehavior>
        })?;
        init.register_node_class(CLASS_FLOAT_SUM, "Sum of two floats", 4, || {
            Box::new(FloatSum) as Box<dyn NodeBehavior>
        })?;
        Ok(())
    }

    fn handle_request(
        &mut self,
        ctx: &mut PluginCtx<'_>,
        request: &Json,
    ) -> Result<Json, PluginError> {
        let bad = || PluginError::Custom {
            reason: "expected {\"node\": id, \"rgb\": [r, g, b]}".into(),
        };
        let node = request["node"].as_u64().ok_or_else(bad)?;
        let rgb: Vec<f64> = request["rgb"]
            .as_array()
            .ok_or_else(bad)?
            .iter()
            .filter_map(Json::as_f64)
            .collect();
        let &[r, g, b] = rgb.as_slice() else {
            return Err(bad());
        };
        let constant = ctx.instance_mut::<Constant>(NodeId(node as u32))?;
        constant.colour = Rgb::new(r, g, b);
        Ok(json!({ "success": true }))
    }
}

/// A non-core plugin built on the core RGB type.
pub struct ExtraPlugin;

impl ExtraPlugin {
    pub const NAME: &'static str = "fixture-extra";
}

impl Plugin for ExtraPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn digest(&self) -> &str {
        "extra-1"
    }

    fn init(&mut self, init: &mut PluginInit<'_>) -> Result<(), PluginError> {
        if init.core_type(RGB_TYPE).is_none() {
            return Err(PluginError::Custom {
                reason: "core RGB type missing".into(),
            });
        }
        init.register_node_class(CLASS_EXTRA_PASS, "RGB pass-through", 0, || {
            Box::new(Pass) as Box<dyn NodeBehavior>
        })?;
        Ok(())
    }
}

/// Fails in `init` after registering one type.
pub struct FailingPlugin;

impl FailingPlugin {
    pub const NAME: &'static str = "fixture-failing";
}

impl Plugin for FailingPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn init(&mut self, init: &mut PluginInit<'_>) -> Result<(), PluginError> {
        init.register_data_type("Doomed Type", "never used")?;
        Err(PluginError::Custom {
            reason: "fixture failure".into(),
        })
    }
}

/// [`FixtureCore`] whose `init` fails while its switch is set.
pub struct SwitchedCore {
    inner: FixtureCore,
    fail: Arc<AtomicBool>,
}

impl SwitchedCore {
    pub fn new(fail: Arc<AtomicBool>) -> Self {
        Self {
            inner: FixtureCore::new(Arc::new(AtomicUsize::new(0))),
            fail,
        }
    }
}

impl Plugin for SwitchedCore {
    fn name(&self) -> &str {
        FixtureCore::NAME
    }

    fn init(&mut self, init: &mut PluginInit<'_>) -> Result<(), PluginError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PluginError::Custom {
                reason: "core switched off".into(),
            });
        }
        self.inner.init(init)
    }

    fn handle_request(
        &mut self,
        ctx: &mut PluginCtx<'_>,
        request: &Json,
    ) -> Result<Json, PluginError> {
        self.inner.handle_request(ctx, request)
    }
}
