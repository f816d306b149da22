use crate::{field::FloatWidth, from_fn};
use half::f16;
use std::convert::TryFrom;

/// An IEEE-754 value kept as its raw bits, so every value (NaN payloads and signed zeros
/// included) compares and round-trips exactly.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug)]
pub enum Float {
    Half(u16),
    Single(u32),
    Double(u64),
}

use Float::*;

impl Float {
    /// Encoded width of this value.
    pub fn width(self) -> FloatWidth {
        match self {
            Half(_) => FloatWidth::Half,
            Single(_) => FloatWidth::Single,
            Double(_) => FloatWidth::Double,
        }
    }

    /// Widens to `f64`. Exact for every variant.
    pub fn to_f64(self) -> f64 {
        match self {
            Half(n) => f16::from_bits(n).to_f64(),
            Single(n) => f64::from(f32::from_bits(n)),
            Double(n) => f64::from_bits(n),
        }
    }
}

from_fn!(Float, f16, |f: f16| Half(f.to_bits()));
from_fn!(Float, f32, |f: f32| Single(f.to_bits()));
from_fn!(Float, f64, |f: f64| Double(f.to_bits()));

impl TryFrom<Float> for f16 {
    type Error = Float;

    fn try_from(f: Float) -> Result<Self, Float> {
        match f {
            Half(n) => Ok(f16::from_bits(n)),
            _ => Err(f),
        }
    }
}

impl TryFrom<Float> for f32 {
    type Error = Float;

    fn try_from(f: Float) -> Result<Self, Float> {
        match f {
            Single(n) => Ok(f32::from_bits(n)),
            _ => Err(f),
        }
    }
}

impl TryFrom<Float> for f64 {
    type Error = Float;

    fn try_from(f: Float) -> Result<Self, Float> {
        match f {
            Double(n) => Ok(f64::from_bits(n)),
            _ => Err(f),
        }
    }
}
