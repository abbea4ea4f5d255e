//! Warmth/tint parameterization of per-channel white balance gains.
//!
//! The pipeline pre-multiplies each sensor channel before the color matrix:
//!
//! ```text
//! premul[R] = (1 + warmth) × (2 − tint)
//! premul[B] = (1 − warmth) × (2 − tint)
//! premul[G] = premul[G2] = 1
//! ```
//!
//! Every white balance estimator produces either a neutral color or a
//! multiplier vector; the two normalizations below invert that mapping.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::image::{B, G, G2, R};

/// A white balance setting on the warmth/tint axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhiteBalance {
    pub warmth: f64,
    pub tint: f64,
}

impl WhiteBalance {
    /// Gains that leave a sensor-neutral image unchanged.
    pub const NEUTRAL: Self = Self {
        warmth: 0.0,
        tint: 1.0,
    };

    /// Pre-multipliers `[R, G, B, G2]`.
    pub fn premultipliers(self) -> [f64; 4] {
        let scale = 2.0 - self.tint;
        [
            (1.0 + self.warmth) * scale,
            1.0,
            (1.0 - self.warmth) * scale,
            1.0,
        ]
    }

    /// Settings that render the linear color `(r, g, b)` neutral.
    ///
    /// ```text
    /// warmth = (b − r) / (r + b)
    /// tint   = 2 − g / (r + r × warmth)
    /// ```
    pub fn from_color(r: f64, g: f64, b: f64) -> Result<Self> {
        if !(r + b > 0.0) {
            return Err(PipelineError::DegenerateSample("red and blue are both zero"));
        }
        let warmth = (b - r) / (r + b);
        let denom = r + r * warmth;
        if !(denom > 0.0) {
            return Err(PipelineError::DegenerateSample("red channel is zero"));
        }
        Self::checked(warmth, 2.0 - g / denom)
    }

    /// Settings reproducing the gains `mul[R, G, B, G2]`.
    ///
    /// Gains are normalized by their maximum, then red and blue are taken
    /// relative to green before solving for tint and warmth.
    pub fn from_multipliers(mul: [f64; 4]) -> Result<Self> {
        let max = mul.iter().copied().fold(0.0_f64, f64::max);
        if !(max > 0.0) {
            return Err(PipelineError::DegenerateSample("all multipliers are zero"));
        }
        let mut mul = mul.map(|m| m / max);
        if !(mul[G] > 0.0) {
            return Err(PipelineError::DegenerateSample("green multiplier is zero"));
        }
        mul[R] /= mul[G];
        mul[B] /= mul[G];
        mul[G] = 1.0;
        mul[G2] = 1.0;

        let tint = (mul[B] + mul[R] - 4.0) / -2.0;
        let warmth = mul[R] / (2.0 - tint) - 1.0;
        Self::checked(warmth, tint)
    }

    fn checked(warmth: f64, tint: f64) -> Result<Self> {
        if warmth.is_finite() && tint.is_finite() {
            Ok(Self { warmth, tint })
        } else {
            Err(PipelineError::DegenerateSample("white balance is not finite"))
        }
    }
}
