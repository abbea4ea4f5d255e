//! Per-channel histogram of the rendered preview.
//!
//! Counts are taken over a small dataset downsampled once per image load,
//! independent of the preview scale. Each pixel goes through the same
//! pre-multiply and matrix stage as the preview and is bucketed by its tone
//! curve output, so the histogram describes exactly what is displayed.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::{Image16, B, G, R};
use crate::pipeline::ColorPipeline;

/// Target width of the histogram dataset.
///
/// A target, not a bound: the downsample factor never exceeds the source
/// height, so strips much wider than they are tall keep a wider dataset
/// (1000×2 gives 500×1).
pub const HISTOGRAM_DATASET_WIDTH: usize = 250;
/// Bins per channel.
pub const HISTOGRAM_BINS: usize = 256;

/// Downsample `source` for histogram accumulation.
///
/// The factor is `max(1, width / HISTOGRAM_DATASET_WIDTH)`, limited so at
/// least one row survives.
pub fn dataset(source: &Image16) -> Result<Image16> {
    let scale = (source.width() / HISTOGRAM_DATASET_WIDTH)
        .max(1)
        .min(source.height());
    source.scaled(scale)
}

/// Counts for R, G and B, stored back to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramTable {
    counts: Vec<u32>,
}

impl Default for HistogramTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HistogramTable {
    pub fn new() -> Self {
        Self {
            counts: vec![0; 3 * HISTOGRAM_BINS],
        }
    }

    pub fn clear(&mut self) {
        self.counts.fill(0);
    }

    /// Add every pixel of `dataset` as rendered by `pipeline`.
    pub fn accumulate(&mut self, dataset: &Image16, pipeline: &ColorPipeline) {
        let curve = pipeline.curve();
        let stride = dataset.pixel_stride();
        for y in 0..dataset.height() {
            for px in dataset.row(y).chunks_exact(stride) {
                let rgb = pipeline.linear_rgb(px);
                self.counts[usize::from(curve.lookup(rgb[R]))] += 1;
                self.counts[HISTOGRAM_BINS + usize::from(curve.lookup(rgb[G]))] += 1;
                self.counts[2 * HISTOGRAM_BINS + usize::from(curve.lookup(rgb[B]))] += 1;
            }
        }
    }

    /// Clear and rebuild from `dataset`.
    pub fn compute(&mut self, dataset: &Image16, pipeline: &ColorPipeline) {
        self.clear();
        self.accumulate(dataset, pipeline);
    }

    /// The 256 bins of channel `c` (`R`, `G` or `B`).
    pub fn channel(&self, c: usize) -> &[u32] {
        &self.counts[c * HISTOGRAM_BINS..(c + 1) * HISTOGRAM_BINS]
    }

    /// Largest bin across all channels.
    pub fn peak(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Pixels counted in one channel.
    pub fn total(&self) -> u64 {
        self.channel(R).iter().map(|&n| u64::from(n)).sum()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_strip_keeps_one_row() {
        let strip = Image16::new(1000, 2, 4, crate::image::WORKING_PIXEL_STRIDE).unwrap();
        let data = dataset(&strip).unwrap();
        assert_eq!((data.width(), data.height()), (500, 1));
    }
    use crate::transform::kernel::CpuFlags;
    use crate::transform::params::ToneParameters;

    fn uniform(width: usize, height: usize, px: [u16; 4]) -> Image16 {
        let samples: Vec<u16> = (0..width * height).flat_map(|_| px).collect();
        Image16::from_packed(width, height, 4, &samples).unwrap()
    }

    #[test]
    fn test_dataset_width_is_bounded() {
        let source = uniform(1000, 10, [0; 4]);
        let data = dataset(&source).unwrap();
        assert_eq!((data.width(), data.height()), (250, 2));

        let small = uniform(100, 10, [0; 4]);
        assert_eq!(dataset(&small).unwrap().width(), 100);
    }

    #[test]
    fn test_uniform_image_fills_one_bin_per_channel() {
        let data = uniform(20, 10, [10000, 20000, 30000, 20000]);
        let params = ToneParameters {
            tint: 1.0,
            ..Default::default()
        };
        let pipeline = ColorPipeline::new(CpuFlags::NONE, &params, 2.2).unwrap();

        let mut table = HistogramTable::new();
        table.compute(&data, &pipeline);

        let rgb = pipeline.linear_rgb(&[10000, 20000, 30000, 20000]);
        for c in [R, G, B] {
            let bins = table.channel(c);
            assert_eq!(bins.iter().filter(|&&n| n != 0).count(), 1);
            assert_eq!(bins[usize::from(pipeline.curve().lookup(rgb[c]))], 200);
        }
        assert_eq!(table.total(), 200);
        assert_eq!(table.peak(), 200);
    }

    #[test]
    fn test_compute_clears_previous_counts() {
        let data = uniform(4, 4, [1000; 4]);
        let pipeline = ColorPipeline::new(CpuFlags::NONE, &ToneParameters::default(), 2.2).unwrap();
        let mut table = HistogramTable::new();
        table.compute(&data, &pipeline);
        table.compute(&data, &pipeline);
        assert_eq!(table.total(), 16);
    }
}
