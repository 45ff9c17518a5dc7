//! The RGB trigger counter.

use lantern_core::{PluginError, Rgb, Signal};
use lantern_graph::{NodeBehavior, NodeCtx, Pull};

use crate::plugin::{RGB_TYPE, TRIGGER_TYPE};

const PHASES: [Rgb; 3] = [
    Rgb::new(1.0, 0.0, 0.0),
    Rgb::new(0.0, 1.0, 0.0),
    Rgb::new(0.0, 0.0, 1.0),
];

/// Steps red, green, blue each time its trigger input fires.
///
/// A fire is an increase of exactly one over the last count seen; any
/// other change resynchronizes without stepping.
#[derive(Clone, Copy, Debug, Default)]
pub struct RgbTrigger {
    phase: usize,
    known: u64,
}

impl RgbTrigger {
    /// Observe a trigger count and return the colour for this frame.
    pub fn observe(&mut self, count: Option<u64>) -> Rgb {
        if let Some(count) = count {
            if count.wrapping_sub(self.known) == 1 {
                self.phase = (self.phase + 1) % PHASES.len();
            }
            self.known = count;
        }
        PHASES[self.phase]
    }
}

impl NodeBehavior for RgbTrigger {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let missing = |name: &str| PluginError::Custom {
            reason: format!("core type '{name}' is not registered"),
        };
        let rgb = ctx.core_type(RGB_TYPE).ok_or_else(|| missing(RGB_TYPE))?;
        let trigger = ctx
            .core_type(TRIGGER_TYPE)
            .ok_or_else(|| missing(TRIGGER_TYPE))?;
        ctx.add_output("RGB Out", rgb, 0)?;
        ctx.add_input("Trigger In", trigger)?;
        Ok(())
    }

    fn restore(&mut self, _ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        *self = Self::default();
        Ok(())
    }

    fn compute(&mut self, _func: u32, pull: &mut Pull<'_>) -> Signal {
        let count = pull.input(0).as_trigger();
        Signal::Rgb(self.observe(count))
    }
}
