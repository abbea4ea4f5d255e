//! Synthetic 12-bit sensor frame standing in for decoder output.
//!
//! The scene is a neutral gray ramp lit by warm light, with a blown
//! highlight patch in the top right and a crushed shadow patch bottom left,
//! so white balance and the exposure overlay both have something to do.

use rawtone_core::SensorFrame;

const BLACK_LEVEL: u16 = 128;
const WHITE_LEVEL: u16 = 4095;

/// Sensor response to neutral light `[R, G, B, G2]`.
const LIGHT: [f64; 4] = [0.55, 1.0, 0.7, 0.98];

pub fn sensor_frame(width: usize, height: usize) -> SensorFrame {
    let mut samples = Vec::with_capacity(width * height * 4);
    let range = f64::from(WHITE_LEVEL - BLACK_LEVEL);

    for y in 0..height {
        for x in 0..width {
            let highlight = x > width * 4 / 5 && y < height / 5;
            let shadow = x < width / 6 && y > height * 5 / 6;
            let level = if highlight {
                1.4
            } else if shadow {
                0.0
            } else {
                // Horizontal ramp with gentle vertical falloff.
                let ramp = 0.05 + 0.7 * x as f64 / width as f64;
                ramp * (1.0 - 0.3 * y as f64 / height as f64)
            };
            for gain in LIGHT {
                let v = f64::from(BLACK_LEVEL) + level * gain * range;
                samples.push(v.clamp(0.0, f64::from(WHITE_LEVEL)) as u16);
            }
        }
    }

    SensorFrame {
        width,
        height,
        channels: 4,
        samples,
        black: BLACK_LEVEL,
        shift: SensorFrame::shift_for_white_level(u32::from(WHITE_LEVEL)),
        pre_mul: [1.0 / LIGHT[0], 1.0, 1.0 / LIGHT[2], 1.0 / LIGHT[3]],
    }
}
