//! Reference per-pixel transform.
//!
//! Every kernel variant must produce exactly what these functions produce.
//! Pre-multiplication runs in `i32` with bounded gains; the matrix
//! accumulates in `i64` so any valid coefficient is applied unchanged.

use crate::image::{B, G, R};
use crate::transform::matrix::{ColorTransform, MATRIX_RESOLUTION, PREMUL_RESOLUTION};
use crate::transform::tone_curve::ToneCurve;

#[inline]
fn clamp16(v: i32) -> i32 {
    v.clamp(0, 65535)
}

/// Shift a matrix row sum back to 16 bits and clamp.
#[inline]
pub(crate) fn finish_sum(sum: i64) -> u16 {
    (sum >> MATRIX_RESOLUTION).clamp(0, 65535) as u16
}

/// Pre-multiply and apply the color matrix; returns linear 16-bit RGB.
///
/// `px` holds at least R, G and B. G2 does not feed the matrix.
#[inline]
pub fn linear_rgb(px: &[u16], transform: &ColorTransform) -> [u16; 3] {
    let premul = transform.fixed_premultipliers();
    let m = *transform.fixed_matrix();

    let rr = clamp16((i32::from(px[R]) * premul[R]) >> PREMUL_RESOLUTION);
    let gg = clamp16((i32::from(px[G]) * premul[G]) >> PREMUL_RESOLUTION);
    let bb = clamp16((i32::from(px[B]) * premul[B]) >> PREMUL_RESOLUTION);

    let [rr, gg, bb] = [rr, gg, bb].map(i64::from);
    m.map(|row| {
        let [c0, c1, c2] = row.map(i64::from);
        finish_sum(rr * c0 + gg * c1 + bb * c2)
    })
}

/// Full transform of one sensor pixel to display RGB.
#[inline]
pub fn transform_pixel(px: &[u16], transform: &ColorTransform, curve: &ToneCurve) -> [u8; 3] {
    linear_rgb(px, transform).map(|v| curve.lookup(v))
}
