//! Lane-parallel row kernels built on the `wide` crate.
//!
//! Each kernel gathers R, G and B of 4 or 8 pixels into integer lanes,
//! pre-multiplies in `i32`, accumulates the matrix in `i64x4` quads, and
//! finishes the row tail with the reference transform. Results are
//! bit-identical to [`render_row_scalar`](super::kernel::render_row_scalar).

use wide::{i32x4, i32x8, i64x4};

use crate::image::{B, G, R};
use crate::transform::evaluate::{finish_sum, transform_pixel};
use crate::transform::matrix::{ColorTransform, PREMUL_RESOLUTION};
use crate::transform::tone_curve::ToneCurve;

/// Matrix rows of four pre-multiplied pixels. The shift happens after
/// extraction; `i64x4 >>` is not arithmetic on every target.
#[inline]
fn mix_quad(rgb: [[i32; 4]; 3], rows: &[[i64x4; 3]; 3]) -> [[u16; 4]; 3] {
    let [rr, gg, bb] = rgb.map(|lane| i64x4::new(lane.map(i64::from)));
    rows.map(|[c0, c1, c2]| (rr * c0 + gg * c1 + bb * c2).to_array().map(finish_sum))
}

macro_rules! lane_kernel {
    ($name:ident, $vec:ident, $lanes:literal) => {
        pub fn $name(
            src: &[u16],
            pixel_stride: usize,
            out: &mut [u8],
            transform: &ColorTransform,
            curve: &ToneCurve,
        ) {
            let width = out.len() / 3;
            let premul = transform.fixed_premultipliers();
            let m = *transform.fixed_matrix();

            let zero = $vec::splat(0);
            let top = $vec::splat(65535);
            let [pr, pg, pb] = [R, G, B].map(|c| $vec::splat(premul[c]));
            let rows = m.map(|row| row.map(|c| i64x4::splat(i64::from(c))));

            let full = width / $lanes * $lanes;
            for x0 in (0..full).step_by($lanes) {
                let mut lanes = [[0i32; $lanes]; 3];
                for i in 0..$lanes {
                    let px = &src[(x0 + i) * pixel_stride..];
                    lanes[0][i] = i32::from(px[R]);
                    lanes[1][i] = i32::from(px[G]);
                    lanes[2][i] = i32::from(px[B]);
                }

                let rr = ((($vec::new(lanes[0]) * pr) >> PREMUL_RESOLUTION).max(zero)).min(top);
                let gg = ((($vec::new(lanes[1]) * pg) >> PREMUL_RESOLUTION).max(zero)).min(top);
                let bb = ((($vec::new(lanes[2]) * pb) >> PREMUL_RESOLUTION).max(zero)).min(top);

                let [rr, gg, bb] = [rr, gg, bb].map($vec::to_array);
                let mut mixed = [[0u16; $lanes]; 3];
                for q in (0..$lanes).step_by(4) {
                    let quad = |lane: &[i32; $lanes]| [0, 1, 2, 3].map(|i| lane[q + i]);
                    let sums = mix_quad([quad(&rr), quad(&gg), quad(&bb)], &rows);
                    for (channel, sum) in mixed.iter_mut().zip(sums) {
                        channel[q..q + 4].copy_from_slice(&sum);
                    }
                }

                let dst = &mut out[x0 * 3..(x0 + $lanes) * 3];
                for (i, rgb) in dst.chunks_exact_mut(3).enumerate() {
                    for (c, slot) in rgb.iter_mut().enumerate() {
                        *slot = curve.lookup(mixed[c][i]);
                    }
                }
            }

            for x in full..width {
                let px = &src[x * pixel_stride..];
                out[x * 3..x * 3 + 3].copy_from_slice(&transform_pixel(px, transform, curve));
            }
        }
    };
}

lane_kernel!(render_row_x4, i32x4, 4);
lane_kernel!(render_row_x8, i32x8, 8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::kernel::{RowFn, render_row_scalar};
    use crate::transform::matrix::ColorMatrixBuilder;
    use crate::transform::params::ToneParameters;

    fn row(width: usize) -> Vec<u16> {
        (0..width * 4).map(|i| (i as u32 * 7919 % 65536) as u16).collect()
    }

    #[test]
    fn test_lane_kernels_match_scalar_with_tail() {
        let params = ToneParameters {
            exposure: 0.7,
            saturation: 1.8,
            hue: 40.0,
            warmth: 0.2,
            ..Default::default()
        };
        let t = ColorMatrixBuilder::build(&params);
        let curve = ToneCurve::build(2.2, 1.3).unwrap();
        let width = 19;
        let src = row(width);

        let mut expected = vec![0u8; width * 3];
        render_row_scalar(&src, 4, &mut expected, &t, &curve);

        let mut x4 = vec![0u8; width * 3];
        render_row_x4(&src, 4, &mut x4, &t, &curve);
        assert_eq!(x4, expected);

        let mut x8 = vec![0u8; width * 3];
        render_row_x8(&src, 4, &mut x8, &t, &curve);
        assert_eq!(x8, expected);
    }

    #[test]
    fn test_lane_kernels_handle_short_rows() {
        let t = ColorTransform::identity();
        let curve = ToneCurve::build(2.2, 1.0).unwrap();
        let src = row(3);
        let mut expected = vec![0u8; 9];
        render_row_scalar(&src, 4, &mut expected, &t, &curve);
        let mut x8 = vec![0u8; 9];
        render_row_x8(&src, 4, &mut x8, &t, &curve);
        assert_eq!(x8, expected);
    }

    #[test]
    fn test_lane_kernels_match_scalar_at_extreme_gains() {
        let params = ToneParameters {
            exposure: 3.0,
            saturation: 3.0,
            mixer: [5.0; 3],
            hue: 120.0,
            tint: 1.0,
            ..Default::default()
        };
        let t = ColorMatrixBuilder::build(&params);
        let curve = ToneCurve::build(1.0, 1.0).unwrap();
        let width = 21;
        let mut src: Vec<u16> = (0..width * 4).map(|i| (i as u32 * 613 % 4000) as u16).collect();
        // A gray pixel gains 40x and must clip rather than wrap or dim.
        src[..4].fill(2000);

        let mut expected = vec![0u8; width * 3];
        render_row_scalar(&src, 4, &mut expected, &t, &curve);
        assert_eq!(expected[..3], [255, 255, 255]);

        for render in [render_row_x4 as RowFn, render_row_x8] {
            let mut out = vec![0u8; width * 3];
            render(&src, 4, &mut out, &t, &curve);
            assert_eq!(out, expected);
        }
    }
}
