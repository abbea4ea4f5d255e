//! Slider adjustments expressed as linear operators on linear RGB.
//!
//! All matrices use the column-vector convention `out = M · rgb`, so an
//! operator applied after `M` is composed as `op * M`.

use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

use glam::{DMat3, DVec3};

/// Luminance weights for linear RGB (Haeberli).
pub const LUMA_WEIGHTS: DVec3 = DVec3::new(0.3086, 0.6094, 0.0820);

/// Build a matrix from rows, reading the same way as the math.
fn from_rows(rows: [[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols_array_2d(&rows).transpose()
}

/// Uniform gain of `2^stops`.
pub fn exposure_matrix(stops: f64) -> DMat3 {
    DMat3::from_diagonal(DVec3::splat(2.0_f64.powf(stops)))
}

/// Independent gain per output channel.
pub fn mixer_matrix(mixer: [f64; 3]) -> DMat3 {
    DMat3::from_diagonal(DVec3::from_array(mixer))
}

/// Blend toward the luminance-preserving gray.
///
/// ```text
/// out = (1 − s) × dot(rgb, luma) + s × rgb
/// ```
///
/// `s = 1` is the identity, `s = 0` produces gray.
pub fn saturation_matrix(saturation: f64) -> DMat3 {
    let gray = (1.0 - saturation) * LUMA_WEIGHTS;
    DMat3::from_cols(
        DVec3::splat(gray.x) + DVec3::X * saturation,
        DVec3::splat(gray.y) + DVec3::Y * saturation,
        DVec3::splat(gray.z) + DVec3::Z * saturation,
    )
}

fn x_rotation(sin: f64, cos: f64) -> DMat3 {
    from_rows([[1.0, 0.0, 0.0], [0.0, cos, -sin], [0.0, sin, cos]])
}

fn y_rotation(sin: f64, cos: f64) -> DMat3 {
    from_rows([[cos, 0.0, sin], [0.0, 1.0, 0.0], [-sin, 0.0, cos]])
}

fn z_rotation(sin: f64, cos: f64) -> DMat3 {
    from_rows([[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]])
}

/// Shear z by x and y: `z' = z + dx·x + dy·y`.
fn z_shear(dx: f64, dy: f64) -> DMat3 {
    from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [dx, dy, 1.0]])
}

/// Rotate hue by `degrees` around the gray axis.
///
/// # Algorithm
/// 1. Rotate the gray axis `(1, 1, 1)` onto +Z
/// 2. Shear so the luminance plane becomes horizontal
/// 3. Rotate around Z
/// 4. Undo the shear and the gray-axis rotation
///
/// Gray stays gray; luminance is approximately preserved.
pub fn hue_matrix(degrees: f64) -> DMat3 {
    if degrees == 0.0 {
        return DMat3::IDENTITY;
    }

    let inv_sqrt3 = 1.0 / 3.0_f64.sqrt();
    let to_gray_z = y_rotation(-inv_sqrt3, SQRT_2 * inv_sqrt3) * x_rotation(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
    let from_gray_z = x_rotation(-FRAC_1_SQRT_2, FRAC_1_SQRT_2) * y_rotation(inv_sqrt3, SQRT_2 * inv_sqrt3);

    let lum = to_gray_z * LUMA_WEIGHTS;
    let (shear_x, shear_y) = (lum.x / lum.z, lum.y / lum.z);

    let (sin, cos) = degrees.to_radians().sin_cos();
    from_gray_z
        * z_shear(-shear_x, -shear_y)
        * z_rotation(sin, cos)
        * z_shear(shear_x, shear_y)
        * to_gray_z
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_exposure_one_stop_doubles() {
        let out = exposure_matrix(1.0) * DVec3::new(0.1, 0.2, 0.3);
        assert!(out.abs_diff_eq(DVec3::new(0.2, 0.4, 0.6), EPSILON));
    }

    #[test]
    fn test_saturation_zero_produces_grayscale() {
        let out = saturation_matrix(0.0) * DVec3::new(0.8, 0.4, 0.2);
        assert!((out.x - out.y).abs() < EPSILON);
        assert!((out.y - out.z).abs() < EPSILON);
        assert!((out.x - LUMA_WEIGHTS.dot(DVec3::new(0.8, 0.4, 0.2))).abs() < EPSILON);
    }

    #[test]
    fn test_saturation_one_is_identity() {
        assert!(saturation_matrix(1.0).abs_diff_eq(DMat3::IDENTITY, EPSILON));
    }

    #[test]
    fn test_gray_axis_lands_on_z() {
        let inv_sqrt3 = 1.0 / 3.0_f64.sqrt();
        let to_gray_z = y_rotation(-inv_sqrt3, SQRT_2 * inv_sqrt3) * x_rotation(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let gray = to_gray_z * DVec3::ONE;
        assert!(gray.abs_diff_eq(DVec3::new(0.0, 0.0, 3.0_f64.sqrt()), EPSILON));
    }

    #[test]
    fn test_hue_rotation_keeps_gray() {
        let gray = DVec3::splat(0.4);
        for degrees in [30.0, 120.0, 275.0] {
            let out = hue_matrix(degrees) * gray;
            assert!(out.abs_diff_eq(gray, EPSILON), "{degrees}°: {out:?}");
        }
    }

    #[test]
    fn test_hue_rotation_360_is_identity() {
        assert!(hue_matrix(360.0).abs_diff_eq(DMat3::IDENTITY, EPSILON));
    }

    #[test]
    fn test_hue_rotations_compose() {
        let a = hue_matrix(50.0) * hue_matrix(70.0);
        assert!(a.abs_diff_eq(hue_matrix(120.0), EPSILON));
    }

    #[test]
    fn test_hue_rotation_changes_color() {
        let red = DVec3::new(0.8, 0.1, 0.1);
        let out = hue_matrix(120.0) * red;
        assert!(!out.abs_diff_eq(red, 1e-3));
    }
}
