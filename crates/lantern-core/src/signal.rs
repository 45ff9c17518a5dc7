//! Values carried along edges and their quantization to channel bytes.

use serde::{Deserialize, Serialize};

/// A colour with unit-interval components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red (or mono) intensity.
    pub r: f64,
    /// Green intensity.
    pub g: f64,
    /// Blue intensity.
    pub b: f64,
}

impl Rgb {
    /// All channels off.
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    /// Create a colour from its three components.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Components in red, green, blue order.
    pub fn components(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

/// The value an output produces for one frame.
///
/// `Empty` is the zero state of a freshly allocated output buffer and the
/// value read from a disconnected input.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Signal {
    /// No value.
    #[default]
    Empty,
    /// A colour.
    Rgb(Rgb),
    /// A floating point scalar.
    Float(f64),
    /// An integer scalar.
    Int(i64),
    /// A trigger counter; consumers react when it increases by one.
    Trigger(u64),
}

impl Signal {
    /// The colour carried, if any.
    pub fn as_rgb(&self) -> Option<Rgb> {
        match self {
            Self::Rgb(c) => Some(*c),
            _ => None,
        }
    }

    /// The float carried, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer carried, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The trigger count carried, if any.
    pub fn as_trigger(&self) -> Option<u64> {
        match self {
            Self::Trigger(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this is [`Signal::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Quantize a unit-interval intensity to a 16-bit level.
///
/// Out-of-range values are clamped and NaN maps to zero. The high byte of
/// the result is the 8-bit level; the low byte is only written for
/// 16-bit addresses.
pub fn quantize16(value: f64) -> u16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * f64::from(u16::MAX)).round() as u16
}
