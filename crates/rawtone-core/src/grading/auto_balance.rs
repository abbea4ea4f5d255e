//! White balance estimation from image content.
//!
//! Auto white balance uses a block-based gray-world assumption: the mean of
//! every channel over well-exposed regions should be equal. Blocks containing
//! a near-saturated sample are excluded so blown highlights do not bias the
//! estimate. The picker averages a small neighborhood around one point.

use tracing::debug;

use crate::color_management::white_balance::WhiteBalance;
use crate::error::{PipelineError, Result};
use crate::image::{B, G, G2, Image16, R};

/// Samples above this level reject their whole block.
pub const SATURATION_THRESHOLD: u16 = 65100;
/// Edge length of the square blocks visited by auto white balance.
pub const BLOCK_SIZE: usize = 8;

/// Per-channel sums and sample counts over accepted blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockSums {
    /// Sum of non-zero samples, indexed `[R, G, B, G2]`.
    pub sum: [f64; 4],
    /// Number of non-zero samples, indexed `[R, G, B, G2]`.
    pub count: [f64; 4],
    pub blocks_used: usize,
    pub blocks_rejected: usize,
}

/// Sum one block, or `None` if any sample is near saturation.
fn block_sums(image: &Image16, col: usize, row: usize) -> Option<([f64; 4], [f64; 4])> {
    let mut sum = [0.0; 4];
    let mut count = [0.0; 4];
    for y in row..row + BLOCK_SIZE {
        for x in col..col + BLOCK_SIZE {
            for (c, &val) in image.pixel(x, y).iter().enumerate() {
                if val == 0 {
                    continue;
                }
                if val > SATURATION_THRESHOLD {
                    return None;
                }
                sum[c] += f64::from(val);
                count[c] += 1.0;
            }
        }
    }
    Some((sum, count))
}

/// Visit every complete 8×8 block and aggregate the accepted ones.
pub fn accumulate_blocks(image: &Image16) -> BlockSums {
    let mut totals = BlockSums::default();
    let rows = image.height() / BLOCK_SIZE * BLOCK_SIZE;
    let cols = image.width() / BLOCK_SIZE * BLOCK_SIZE;

    for row in (0..rows).step_by(BLOCK_SIZE) {
        for col in (0..cols).step_by(BLOCK_SIZE) {
            match block_sums(image, col, row) {
                Some((sum, count)) => {
                    for c in 0..4 {
                        totals.sum[c] += sum[c];
                        totals.count[c] += count[c];
                    }
                    totals.blocks_used += 1;
                }
                None => totals.blocks_rejected += 1,
            }
        }
    }
    totals
}

/// Gray-world multipliers `[R, G, B, G2]`: sample count over sum per channel.
pub fn auto_multipliers(image: &Image16) -> Result<[f64; 4]> {
    let totals = accumulate_blocks(image);
    debug!(
        blocks_used = totals.blocks_used,
        blocks_rejected = totals.blocks_rejected,
        "Accumulated white balance blocks"
    );

    let mut mul = [0.0; 4];
    for c in [R, G, B] {
        if !(totals.sum[c] > 0.0) {
            return Err(PipelineError::DegenerateSample(
                "no usable samples for auto white balance",
            ));
        }
        mul[c] = totals.count[c] / totals.sum[c];
    }
    mul[G2] = if totals.sum[G2] > 0.0 {
        totals.count[G2] / totals.sum[G2]
    } else {
        mul[G]
    };
    Ok(mul)
}

/// Estimate warmth and tint with the block gray-world method.
pub fn auto_white_balance(image: &Image16) -> Result<WhiteBalance> {
    WhiteBalance::from_multipliers(auto_multipliers(image)?)
}

/// Mean linear `(r, g, b)` in `[0, 1]` over the 3×3 neighborhood of `(x, y)`.
///
/// The neighborhood is clamped at the image edges. With four channels the
/// second green sample is averaged into green.
pub fn sample_neighborhood(image: &Image16, x: usize, y: usize) -> Result<[f64; 3]> {
    let (width, height) = (image.width(), image.height());
    if x >= width || y >= height {
        return Err(PipelineError::OutOfBounds {
            x,
            y,
            width,
            height,
        });
    }

    let four = image.channels() == 4;
    let mut rgb = [0.0; 3];
    for dy in 0..3 {
        for dx in 0..3 {
            // Edge pixels repeat so the average always covers nine samples.
            let row = (y + dy).saturating_sub(1).min(height - 1);
            let col = (x + dx).saturating_sub(1).min(width - 1);
            let px = image.pixel(col, row);
            rgb[0] += f64::from(px[R]) / 65535.0;
            rgb[1] += f64::from(px[G]) / 65535.0;
            rgb[2] += f64::from(px[B]) / 65535.0;
            if four {
                rgb[1] += f64::from(px[G2]) / 65535.0;
            }
        }
    }

    let mut rgb = rgb.map(|v| v / 9.0);
    if four {
        rgb[1] /= 2.0;
    }
    Ok(rgb)
}

/// White balance that renders the neighborhood of `(x, y)` neutral.
pub fn white_balance_from_pixels(image: &Image16, x: usize, y: usize) -> Result<WhiteBalance> {
    let [r, g, b] = sample_neighborhood(image, x, y)?;
    WhiteBalance::from_color(r, g, b)
}
