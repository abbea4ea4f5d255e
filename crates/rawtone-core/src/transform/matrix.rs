//! Composition of the slider operators into one color transform.
//!
//! Operators are applied in a fixed order: exposure, channel mixer,
//! saturation, hue. The composed floating-point matrix is then quantized to
//! fixed point for the per-pixel kernels, together with the white balance
//! pre-multipliers.

use glam::DMat3;

use crate::grading::sliders::{exposure_matrix, hue_matrix, mixer_matrix, saturation_matrix};
use crate::transform::params::ToneParameters;

/// Fractional bits of the fixed-point color matrix.
pub const MATRIX_RESOLUTION: u32 = 8;
/// Fractional bits of the fixed-point pre-multipliers.
pub const PREMUL_RESOLUTION: u32 = 7;

/// Largest fixed pre-multiplier; one full-scale product stays within `i32`.
pub const FIXED_PREMUL_LIMIT: i32 = i32::MAX / 65535;

/// Scale by `2^resolution` and truncate toward zero.
fn quantize(value: f64, resolution: u32) -> i32 {
    (value * f64::from(1u32 << resolution)) as i32
}

/// Left-multiplies operators onto an accumulated matrix.
#[derive(Debug, Clone, Copy)]
pub struct ColorMatrixBuilder {
    matrix: DMat3,
}

impl Default for ColorMatrixBuilder {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrixBuilder {
    pub fn identity() -> Self {
        Self {
            matrix: DMat3::IDENTITY,
        }
    }

    fn then(self, op: DMat3) -> Self {
        Self {
            matrix: op * self.matrix,
        }
    }

    pub fn exposure(self, stops: f64) -> Self {
        self.then(exposure_matrix(stops))
    }

    pub fn mixer(self, mixer: [f64; 3]) -> Self {
        self.then(mixer_matrix(mixer))
    }

    pub fn saturation(self, saturation: f64) -> Self {
        self.then(saturation_matrix(saturation))
    }

    pub fn hue(self, degrees: f64) -> Self {
        self.then(hue_matrix(degrees))
    }

    pub fn matrix(&self) -> DMat3 {
        self.matrix
    }

    /// Full transform for `params`, including pre-multipliers.
    pub fn build(params: &ToneParameters) -> ColorTransform {
        let matrix = Self::identity()
            .exposure(params.exposure)
            .mixer(params.mixer)
            .saturation(params.saturation)
            .hue(params.hue)
            .matrix();
        ColorTransform::new(matrix, params.premultipliers())
    }
}

/// Color matrix and pre-multipliers in both float and fixed-point form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    matrix: DMat3,
    fixed: [[i32; 3]; 3],
    premul: [f64; 4],
    fixed_premul: [i32; 4],
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorTransform {
    pub fn new(matrix: DMat3, premul: [f64; 4]) -> Self {
        let fixed = [0, 1, 2].map(|i| {
            matrix
                .row(i)
                .to_array()
                .map(|c| quantize(c, MATRIX_RESOLUTION))
        });
        let fixed_premul = premul
            .map(|p| quantize(p, PREMUL_RESOLUTION).clamp(-FIXED_PREMUL_LIMIT, FIXED_PREMUL_LIMIT));
        Self {
            matrix,
            fixed,
            premul,
            fixed_premul,
        }
    }

    /// Identity matrix with unit gains.
    pub fn identity() -> Self {
        Self::new(DMat3::IDENTITY, [1.0; 4])
    }

    pub fn matrix(&self) -> DMat3 {
        self.matrix
    }

    /// Row-major fixed-point coefficients scaled by `2^MATRIX_RESOLUTION`.
    pub fn fixed_matrix(&self) -> &[[i32; 3]; 3] {
        &self.fixed
    }

    pub fn premultipliers(&self) -> [f64; 4] {
        self.premul
    }

    /// Pre-multipliers `[R, G, B, G2]` scaled by `2^PREMUL_RESOLUTION`.
    pub fn fixed_premultipliers(&self) -> &[i32; 4] {
        &self.fixed_premul
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_quantizes_to_one() {
        let t = ColorTransform::identity();
        assert_eq!(t.fixed_matrix(), &[[256, 0, 0], [0, 256, 0], [0, 0, 256]]);
        assert_eq!(t.fixed_premultipliers(), &[128; 4]);
    }

    #[test]
    fn test_default_parameters_use_default_premultipliers() {
        // Default tint 0 doubles red and blue.
        let t = ColorMatrixBuilder::build(&ToneParameters::default());
        assert_eq!(t.fixed_premultipliers(), &[256, 128, 256, 128]);
        assert_eq!(t.fixed_matrix(), &[[256, 0, 0], [0, 256, 0], [0, 0, 256]]);
    }

    #[test]
    fn test_exposure_then_mixer_order() {
        let params = ToneParameters {
            exposure: 1.0,
            mixer: [0.5, 1.0, 2.0],
            ..Default::default()
        };
        let t = ColorMatrixBuilder::build(&params);
        assert_eq!(t.fixed_matrix(), &[[256, 0, 0], [0, 512, 0], [0, 0, 1024]]);
    }

    #[test]
    fn test_quantization_truncates_toward_zero() {
        assert_eq!(quantize(0.999, MATRIX_RESOLUTION), 255);
        assert_eq!(quantize(-0.999, MATRIX_RESOLUTION), -255);
    }

    #[test]
    fn test_premultipliers_saturate() {
        let t = ColorTransform::new(DMat3::IDENTITY, [1e6; 4]);
        assert_eq!(t.fixed_premultipliers()[0], FIXED_PREMUL_LIMIT);
        assert!(i64::from(FIXED_PREMUL_LIMIT) * 65535 <= i64::from(i32::MAX));
    }

    #[test]
    fn test_large_coefficients_are_kept() {
        let params = ToneParameters {
            exposure: 3.0,
            saturation: 3.0,
            mixer: [5.0; 3],
            tint: 1.0,
            ..Default::default()
        };
        let t = ColorMatrixBuilder::build(&params);
        let float = t.matrix().row(0).to_array();
        assert!(float[0] > 90.0);
        assert_eq!(t.fixed_matrix()[0].map(i64::from), float.map(|c| (c * 256.0) as i64));
    }

    #[test]
    fn test_saturation_zero_rows_match_luma() {
        let params = ToneParameters {
            saturation: 0.0,
            ..Default::default()
        };
        let fixed = *ColorMatrixBuilder::build(&params).fixed_matrix();
        assert_eq!(fixed[0], fixed[1]);
        assert_eq!(fixed[1], fixed[2]);
        assert_eq!(fixed[0], [79, 156, 20]);
    }
}
