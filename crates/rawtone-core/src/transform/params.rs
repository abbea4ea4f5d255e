//! Tone and color parameters driving the preview transform.
//!
//! `ToneParameters` is the single record every adjustment writes to. The
//! session owns it; the pipeline only reads it when rebuilding the color
//! transform and tone curve.

use std::ops::{BitOr, RangeInclusive};

use serde::{Deserialize, Serialize};

use crate::color_management::white_balance::WhiteBalance;

pub const EXPOSURE_RANGE: RangeInclusive<f64> = -3.0..=3.0;
pub const SATURATION_RANGE: RangeInclusive<f64> = 0.0..=3.0;
pub const CONTRAST_RANGE: RangeInclusive<f64> = 0.0..=3.0;
pub const WARMTH_RANGE: RangeInclusive<f64> = -2.0..=2.0;
pub const TINT_RANGE: RangeInclusive<f64> = -2.0..=2.0;
pub const MIXER_RANGE: RangeInclusive<f64> = 0.0..=5.0;
/// Hue is wrapped into `[0, 360)` rather than clamped.
pub const HUE_PERIOD: f64 = 360.0;

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

/// Selects which fields of [`ToneParameters`] an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettingsMask(u32);

impl SettingsMask {
    pub const EXPOSURE: Self = Self(1 << 0);
    pub const SATURATION: Self = Self(1 << 1);
    pub const HUE: Self = Self(1 << 2);
    pub const CONTRAST: Self = Self(1 << 3);
    pub const WARMTH: Self = Self(1 << 4);
    pub const TINT: Self = Self(1 << 5);
    pub const MIXER: Self = Self(1 << 6);
    pub const ALL: Self = Self(0x7f);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SettingsMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Scalar tone/color adjustments for one settings slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParameters {
    /// Exposure in stops. Default: 0.
    pub exposure: f64,
    /// Saturation factor. 1.0 = unchanged.
    pub saturation: f64,
    /// Hue rotation in degrees.
    pub hue: f64,
    /// Contrast applied by the tone curve. 1.0 = unchanged.
    pub contrast: f64,
    /// Blue-amber white balance axis.
    pub warmth: f64,
    /// Green-magenta white balance axis.
    pub tint: f64,
    /// Per-channel gain `[R, G, B]`.
    pub mixer: [f64; 3],
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            saturation: 1.0,
            hue: 0.0,
            contrast: 1.0,
            warmth: 0.0,
            tint: 0.0,
            mixer: [1.0, 1.0, 1.0],
        }
    }
}

impl ToneParameters {
    /// Every field forced into its range; hue wraps into `[0, 360)`.
    pub fn clamped(&self) -> Self {
        Self {
            exposure: clamp_to(self.exposure, &EXPOSURE_RANGE),
            saturation: clamp_to(self.saturation, &SATURATION_RANGE),
            hue: self.hue.rem_euclid(HUE_PERIOD),
            contrast: clamp_to(self.contrast, &CONTRAST_RANGE),
            warmth: clamp_to(self.warmth, &WARMTH_RANGE),
            tint: clamp_to(self.tint, &TINT_RANGE),
            mixer: self.mixer.map(|m| clamp_to(m, &MIXER_RANGE)),
        }
    }

    pub fn white_balance(&self) -> WhiteBalance {
        WhiteBalance {
            warmth: self.warmth,
            tint: self.tint,
        }
    }

    /// Per-channel pre-multipliers `[R, G, B, G2]` for the current warmth/tint.
    pub fn premultipliers(&self) -> [f64; 4] {
        self.white_balance().premultipliers()
    }

    /// Restore defaults for the masked fields.
    pub fn reset(&mut self, mask: SettingsMask) {
        let defaults = Self::default();
        self.apply_masked(&defaults, mask);
    }

    /// Copy the masked fields from `src`.
    pub fn apply_masked(&mut self, src: &Self, mask: SettingsMask) {
        if mask.contains(SettingsMask::EXPOSURE) {
            self.exposure = src.exposure;
        }
        if mask.contains(SettingsMask::SATURATION) {
            self.saturation = src.saturation;
        }
        if mask.contains(SettingsMask::HUE) {
            self.hue = src.hue;
        }
        if mask.contains(SettingsMask::CONTRAST) {
            self.contrast = src.contrast;
        }
        if mask.contains(SettingsMask::WARMTH) {
            self.warmth = src.warmth;
        }
        if mask.contains(SettingsMask::TINT) {
            self.tint = src.tint;
        }
        if mask.contains(SettingsMask::MIXER) {
            self.mixer = src.mixer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_respects_ranges() {
        let wild = ToneParameters {
            exposure: 9.0,
            saturation: -1.0,
            hue: -30.0,
            contrast: 4.0,
            warmth: 5.0,
            tint: -5.0,
            mixer: [7.0, -1.0, 2.5],
        };
        let p = wild.clamped();
        assert_eq!(p.exposure, 3.0);
        assert_eq!(p.saturation, 0.0);
        assert_eq!(p.hue, 330.0);
        assert_eq!(p.contrast, 3.0);
        assert_eq!((p.warmth, p.tint), (2.0, -2.0));
        assert_eq!(p.mixer, [5.0, 0.0, 2.5]);
    }

    #[test]
    fn test_reset_only_touches_masked_fields() {
        let mut p = ToneParameters {
            exposure: 1.5,
            hue: 90.0,
            warmth: 0.3,
            ..Default::default()
        };
        p.reset(SettingsMask::EXPOSURE | SettingsMask::WARMTH);
        assert_eq!(p.exposure, 0.0);
        assert_eq!(p.warmth, 0.0);
        assert_eq!(p.hue, 90.0);
    }

    #[test]
    fn test_reset_all_restores_defaults() {
        let mut p = ToneParameters {
            exposure: -2.0,
            saturation: 2.0,
            hue: 10.0,
            contrast: 0.5,
            warmth: 1.0,
            tint: 1.0,
            mixer: [2.0, 3.0, 4.0],
        };
        p.reset(SettingsMask::ALL);
        assert_eq!(p, ToneParameters::default());
    }

    #[test]
    fn test_neutral_tint_gives_unit_premultipliers() {
        let p = ToneParameters {
            tint: 1.0,
            ..Default::default()
        };
        assert_eq!(p.premultipliers(), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_params_deserialize_with_missing_fields() {
        let p: ToneParameters = serde_json::from_str(r#"{"exposure": 1.0}"#).unwrap();
        assert_eq!(p.exposure, 1.0);
        assert_eq!(p.mixer, [1.0, 1.0, 1.0]);
    }
}
