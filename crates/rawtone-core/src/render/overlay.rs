//! Exposure warnings derived from rendered display output.
//!
//! A one-byte mask per pixel flags clipped highlights and crushed shadows.
//! When the overlay is enabled the flagged preview pixels are repainted.

use bytemuck::{cast_slice, cast_slice_mut};

/// Any channel reached full scale.
pub const MASK_OVER: u8 = 0x01;
/// Every channel is below [`UNDER_THRESHOLD`].
pub const MASK_UNDER: u8 = 0x02;
/// Channel values below this count as crushed.
pub const UNDER_THRESHOLD: u8 = 2;

const OVER_COLOR: [u8; 3] = [255, 0, 0];
const UNDER_COLOR: [u8; 3] = [0, 0, 255];

/// Mask bits for one display pixel. OVER takes precedence over UNDER.
#[inline]
pub fn clip_mask(rgb: [u8; 3]) -> u8 {
    let mut mask = 0;
    if rgb.contains(&255) {
        mask |= MASK_OVER;
    }
    if mask & MASK_OVER == 0 && rgb.iter().all(|&v| v < UNDER_THRESHOLD) {
        mask |= MASK_UNDER;
    }
    mask
}

/// Fill `mask` from a packed RGB row.
pub fn render_mask(rgb: &[u8], mask: &mut [u8]) {
    let pixels: &[[u8; 3]] = cast_slice(rgb);
    for (m, &px) in mask.iter_mut().zip(pixels) {
        *m = clip_mask(px);
    }
}

/// Repaint flagged pixels of a packed RGB row: OVER red, UNDER blue.
pub fn apply_overlay(rgb: &mut [u8], mask: &[u8]) {
    let pixels: &mut [[u8; 3]] = cast_slice_mut(rgb);
    for (px, &m) in pixels.iter_mut().zip(mask) {
        if m & MASK_OVER != 0 {
            *px = OVER_COLOR;
        } else if m & MASK_UNDER != 0 {
            *px = UNDER_COLOR;
        }
    }
}
