//! Image buffers for the preview pipeline.
//!
//! `Image16` holds linear sensor data with 3 or 4 channels, the fourth being
//! the second green sample of a Bayer sensor. `Image8` holds display output:
//! packed RGB for the preview or a single channel for the clipping mask.
//! Both keep rows padded so `row_stride >= width * pixel_stride`.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Channel indices into sensor-space pixels and multiplier vectors.
pub const R: usize = 0;
pub const G: usize = 1;
pub const B: usize = 2;
pub const G2: usize = 3;

/// Pixel stride of working images: room for R, G, B and G2.
pub const WORKING_PIXEL_STRIDE: usize = 4;

/// Rows are padded to a multiple of this many samples.
const ROW_ALIGN: usize = 8;

/// Gamma used to linearize 8-bit sources.
const RGB8_SOURCE_GAMMA: f64 = 2.2;

fn aligned_row(len: usize) -> usize {
    len.div_ceil(ROW_ALIGN) * ROW_ALIGN
}

fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Orientation of the working image relative to the sensor data.
///
/// The horizontal mirror is applied first, then the clockwise rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    /// Clockwise quarter turns, 0..=3.
    pub quarter_turns: u8,
    /// Mirrored horizontally before rotating.
    pub flipped: bool,
}

impl Orientation {
    pub const NORMAL: Self = Self {
        quarter_turns: 0,
        flipped: false,
    };

    pub const fn rotate_cw(self) -> Self {
        Self {
            quarter_turns: (self.quarter_turns + 1) % 4,
            flipped: self.flipped,
        }
    }

    pub const fn rotate_ccw(self) -> Self {
        Self {
            quarter_turns: (self.quarter_turns + 3) % 4,
            flipped: self.flipped,
        }
    }

    /// Mirror the displayed result horizontally.
    ///
    /// Mirroring after a rotation equals mirroring first and rotating the
    /// other way, which keeps the "mirror, then rotate" normal form.
    pub const fn flip(self) -> Self {
        Self {
            quarter_turns: (4 - self.quarter_turns % 4) % 4,
            flipped: !self.flipped,
        }
    }

    /// Whether width and height trade places.
    pub const fn swaps_axes(self) -> bool {
        self.quarter_turns % 2 == 1
    }

    /// Map a source coordinate of a `width`×`height` image to its oriented position.
    fn map(self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        let (mut x, mut y, mut w, mut h) = (x, y, width, height);
        if self.flipped {
            x = w - 1 - x;
        }
        for _ in 0..self.quarter_turns % 4 {
            (x, y) = (h - 1 - y, x);
            std::mem::swap(&mut w, &mut h);
        }
        (x, y)
    }
}

/// Half-open pixel rectangle `[x1, x2) × [y1, y2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Rect {
    pub const fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// A full-width single row.
    pub const fn row(y: usize, width: usize) -> Self {
        Self::new(0, y, width, y + 1)
    }

    pub const fn width(&self) -> usize {
        self.x2.saturating_sub(self.x1)
    }

    pub const fn height(&self) -> usize {
        self.y2.saturating_sub(self.y1)
    }

    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Clip to a `width`×`height` image.
    pub fn clamped(self, width: usize, height: usize) -> Self {
        let x2 = self.x2.min(width);
        let y2 = self.y2.min(height);
        Self {
            x1: self.x1.min(x2),
            y1: self.y1.min(y2),
            x2,
            y2,
        }
    }
}

/// Planar sensor data as handed over by the external RAW decoder.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    pub width: usize,
    pub height: usize,
    /// 3, or 4 when the sensor reports a second green sample.
    pub channels: usize,
    /// Packed samples, `width * height * channels` long.
    pub samples: Vec<u16>,
    /// Black level subtracted from every sample.
    pub black: u16,
    /// Left shift normalizing the sensor bit depth to 16 bits.
    pub shift: u32,
    /// Decoder's per-channel white balance estimate `[R, G, B, G2]`.
    pub pre_mul: [f64; 4],
}

impl SensorFrame {
    /// Shift that brings a sensor white level up to the 16-bit range.
    pub fn shift_for_white_level(white: u32) -> u32 {
        if white == 0 {
            return 0;
        }
        (16.0 - f64::from(white).log2() + 0.5).floor().clamp(0.0, 15.0) as u32
    }
}

/// 16-bit linear image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image16 {
    width: usize,
    height: usize,
    channels: usize,
    pixel_stride: usize,
    row_stride: usize,
    orientation: Orientation,
    pixels: Vec<u16>,
}

impl Image16 {
    /// Allocate a zeroed image. `pixel_stride` is raised to `channels` if smaller.
    pub fn new(width: usize, height: usize, channels: usize, pixel_stride: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        if !(3..=4).contains(&channels) {
            return Err(PipelineError::UnsupportedChannels(channels));
        }
        let pixel_stride = pixel_stride.max(channels);
        let row_stride = aligned_row(width * pixel_stride);
        Ok(Self {
            width,
            height,
            channels,
            pixel_stride,
            row_stride,
            orientation: Orientation::NORMAL,
            pixels: vec![0; row_stride * height],
        })
    }

    /// Copy packed `width * height * channels` samples into a working-layout image.
    pub fn from_packed(width: usize, height: usize, channels: usize, samples: &[u16]) -> Result<Self> {
        let mut image = Self::new(width, height, channels, WORKING_PIXEL_STRIDE)?;
        let expected = width * height * channels;
        if samples.len() != expected {
            return Err(PipelineError::BufferSize {
                expected,
                actual: samples.len(),
            });
        }
        let stride = image.pixel_stride;
        for (y, src_row) in samples.chunks_exact(width * channels).enumerate() {
            let dst_row = image.row_mut(y);
            for (dst, src) in dst_row.chunks_exact_mut(stride).zip(src_row.chunks_exact(channels)) {
                dst[..channels].copy_from_slice(src);
            }
        }
        Ok(image)
    }

    /// Normalize decoder output: subtract black, shift to 16 bits, clamp.
    pub fn from_sensor(frame: &SensorFrame) -> Result<Self> {
        let shift = frame.shift.min(15);
        let normalized: Vec<u16> = frame
            .samples
            .iter()
            .map(|&s| (u32::from(s.saturating_sub(frame.black)) << shift).min(65535) as u16)
            .collect();
        Self::from_packed(frame.width, frame.height, frame.channels, &normalized)
    }

    /// Linearize an 8-bit RGB image. G2 duplicates G.
    pub fn from_rgb8(source: &image::RgbImage) -> Result<Self> {
        let mut table = [0u16; 256];
        for (n, slot) in table.iter_mut().enumerate() {
            let level = ((n as f64 / 255.0).powf(RGB8_SOURCE_GAMMA) * 65535.0) as i32;
            *slot = level.clamp(0, 65535) as u16;
        }
        let samples: Vec<u16> = source
            .pixels()
            .flat_map(|p| {
                let [r, g, b] = p.0;
                [table[r as usize], table[g as usize], table[b as usize], table[g as usize]]
            })
            .collect();
        Self::from_packed(source.width() as usize, source.height() as usize, 4, &samples)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Samples of row `y`, excluding row padding.
    pub fn row(&self, y: usize) -> &[u16] {
        let start = y * self.row_stride;
        &self.pixels[start..start + self.width * self.pixel_stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u16] {
        let start = y * self.row_stride;
        let len = self.width * self.pixel_stride;
        &mut self.pixels[start..start + len]
    }

    /// The `channels` samples of one pixel.
    pub fn pixel(&self, x: usize, y: usize) -> &[u16] {
        let start = y * self.row_stride + x * self.pixel_stride;
        &self.pixels[start..start + self.channels]
    }

    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u16] {
        let start = y * self.row_stride + x * self.pixel_stride;
        let channels = self.channels;
        &mut self.pixels[start..start + channels]
    }

    /// Integer downscale picking every `scale`-th pixel.
    pub fn scaled(&self, scale: usize) -> Result<Self> {
        let scale = scale.max(1);
        let mut out = Self::new(
            self.width / scale,
            self.height / scale,
            self.channels,
            WORKING_PIXEL_STRIDE,
        )?;
        out.orientation = self.orientation;
        for y in 0..out.height {
            for x in 0..out.width {
                out.pixel_mut(x, y)
                    .copy_from_slice(self.pixel(x * scale, y * scale));
            }
        }
        Ok(out)
    }

    /// Copy with `orientation` applied on top of the current pixel layout.
    pub fn reoriented(&self, orientation: Orientation) -> Result<Self> {
        let (width, height) = if orientation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        let mut out = Self::new(width, height, self.channels, self.pixel_stride)?;
        out.orientation = orientation;
        for y in 0..self.height {
            for x in 0..self.width {
                let (dx, dy) = orientation.map(x, y, self.width, self.height);
                out.pixel_mut(dx, dy).copy_from_slice(self.pixel(x, y));
            }
        }
        Ok(out)
    }
}

/// 8-bit display buffer: RGB preview (3 channels) or clipping mask (1 channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image8 {
    width: usize,
    height: usize,
    channels: usize,
    row_stride: usize,
    pixels: Vec<u8>,
}

impl Image8 {
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        if channels != 1 && channels != 3 {
            return Err(PipelineError::UnsupportedChannels(channels));
        }
        let row_stride = aligned_row(width * channels);
        Ok(Self {
            width,
            height,
            channels,
            row_stride,
            pixels: vec![0; row_stride * height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Packed pixels, so the pixel stride equals the channel count.
    pub fn pixel_stride(&self) -> usize {
        self.channels
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// The whole buffer including row padding, for blitting with `row_stride`.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.row_stride;
        &self.pixels[start..start + self.width * self.channels]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.row_stride;
        let len = self.width * self.channels;
        &mut self.pixels[start..start + len]
    }

    /// Export an RGB buffer for encoding; `None` for masks.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if self.channels != 3 {
            return None;
        }
        let data: Vec<u8> = (0..self.height).flat_map(|y| self.row(y).iter().copied()).collect();
        image::RgbImage::from_raw(
            u32::try_from(self.width).ok()?,
            u32::try_from(self.height).ok()?,
            data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb8_expands_through_gamma_table() {
        let source = image::RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([0, 128, 255])
            } else {
                image::Rgb([64, 255, 0])
            }
        });
        let img = Image16::from_rgb8(&source).unwrap();
        assert_eq!((img.width(), img.height(), img.channels()), (2, 1, 4));
        assert_eq!(img.pixel_stride(), WORKING_PIXEL_STRIDE);
        // G2 repeats G.
        assert_eq!(img.pixel(0, 0), &[0, 14386, 65535, 14386]);
        assert_eq!(img.pixel(1, 0), &[3130, 65535, 0, 65535]);
    }

    fn numbered(width: usize, height: usize) -> Image16 {
        let samples: Vec<u16> = (0..width * height)
            .flat_map(|i| [i as u16, 0, 0])
            .collect();
        Image16::from_packed(width, height, 3, &samples).unwrap()
    }

    #[test]
    fn test_zero_sized_image_is_rejected() {
        assert!(matches!(
            Image16::new(0, 4, 4, 4),
            Err(PipelineError::InvalidDimensions { .. })
        ));
        assert!(Image8::new(4, 0, 3).is_err());
    }

    #[test]
    fn test_row_stride_covers_pixels() {
        let image = Image16::new(5, 2, 3, 4).unwrap();
        assert!(image.row_stride() >= image.width() * image.pixel_stride());
        assert_eq!(image.row(1).len(), 20);
    }

    #[test]
    fn test_from_sensor_subtracts_black_and_clamps() {
        let frame = SensorFrame {
            width: 1,
            height: 1,
            channels: 4,
            samples: vec![100, 4095, 50, 1000],
            black: 64,
            shift: 5,
            pre_mul: [1.0; 4],
        };
        let image = Image16::from_sensor(&frame).unwrap();
        assert_eq!(image.pixel(0, 0), &[36 << 5, 65535, 0, 936 << 5]);
    }

    #[test]
    fn test_shift_for_twelve_bit_sensor() {
        assert_eq!(SensorFrame::shift_for_white_level(4095), 4);
        assert_eq!(SensorFrame::shift_for_white_level(65535), 0);
    }

    #[test]
    fn test_scaled_picks_every_nth_pixel() {
        let image = numbered(4, 4);
        let half = image.scaled(2).unwrap();
        assert_eq!((half.width(), half.height()), (2, 2));
        assert_eq!(half.pixel(1, 1)[0], 10);
    }

    #[test]
    fn test_rotate_cw_moves_top_left_to_top_right() {
        let image = numbered(3, 2);
        let rotated = image.reoriented(Orientation::NORMAL.rotate_cw()).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        assert_eq!(rotated.pixel(1, 0)[0], 0);
        assert_eq!(rotated.pixel(0, 0)[0], 3);
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let o = Orientation::NORMAL.rotate_cw().flip().flip();
        assert_eq!(o, Orientation::NORMAL.rotate_cw());
    }

    #[test]
    fn test_rect_clamped_to_image() {
        let rect = Rect::new(2, 2, 50, 50).clamped(10, 8);
        assert_eq!(rect, Rect::new(2, 2, 10, 8));
        assert!(Rect::new(12, 0, 20, 4).clamped(10, 8).is_empty());
    }

    #[test]
    fn test_rgb_export_drops_padding() {
        let mut preview = Image8::new(3, 2, 3).unwrap();
        preview.row_mut(1).copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let exported = preview.to_rgb_image().unwrap();
        assert_eq!(exported.get_pixel(2, 1).0, [7, 8, 9]);
        assert!(Image8::new(3, 2, 1).unwrap().to_rgb_image().is_none());
    }
}
