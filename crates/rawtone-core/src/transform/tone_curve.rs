//! Display tone curve: 16-bit linear in, 8-bit display out.

use crate::error::{PipelineError, Result};

/// One entry per 16-bit input level.
pub const TONE_TABLE_SIZE: usize = 65536;

/// Gamma encode followed by a contrast stretch around mid-gray.
///
/// ```text
/// v   = (n / 65535)^(1 / gamma)
/// out = clamp((v × contrast + 0.5 − contrast / 2) × 255, 0, 255)
/// ```
#[derive(Clone)]
pub struct ToneCurve {
    table: Box<[u8; TONE_TABLE_SIZE]>,
    gamma: f64,
    contrast: f64,
}

impl std::fmt::Debug for ToneCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToneCurve")
            .field("gamma", &self.gamma)
            .field("contrast", &self.contrast)
            .finish_non_exhaustive()
    }
}

impl ToneCurve {
    pub fn build(gamma: f64, contrast: f64) -> Result<Self> {
        if !(gamma > 0.0) || !gamma.is_finite() {
            return Err(PipelineError::InvalidGamma(gamma));
        }
        Ok(Self::tabulate(gamma, contrast))
    }

    /// Same gamma, new contrast. The gamma was validated when `self` was built.
    pub fn with_contrast(&self, contrast: f64) -> Self {
        Self::tabulate(self.gamma, contrast)
    }

    fn tabulate(gamma: f64, contrast: f64) -> Self {
        let exponent = 1.0 / gamma;
        let offset = 0.5 - contrast / 2.0;

        let mut table = Box::new([0u8; TONE_TABLE_SIZE]);
        for (n, slot) in table.iter_mut().enumerate() {
            let v = (n as f64 / 65535.0).powf(exponent);
            let level = ((v * contrast + offset) * 255.0) as i32;
            *slot = level.clamp(0, 255) as u8;
        }

        Self {
            table,
            gamma,
            contrast,
        }
    }

    #[inline]
    pub fn lookup(&self, level: u16) -> u8 {
        self.table[usize::from(level)]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.table[..]
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn contrast(&self) -> f64 {
        self.contrast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_contrast_matches_build() {
        let curve = ToneCurve::build(1.8, 1.0).unwrap();
        let stretched = curve.with_contrast(2.5);
        assert_eq!(stretched.gamma(), 1.8);
        assert_eq!(stretched.contrast(), 2.5);
        assert_eq!(stretched.as_slice(), ToneCurve::build(1.8, 2.5).unwrap().as_slice());
    }

    #[test]
    fn test_endpoints_at_unit_contrast() {
        let curve = ToneCurve::build(2.2, 1.0).unwrap();
        assert_eq!(curve.lookup(0), 0);
        assert_eq!(curve.lookup(65535), 255);
    }

    #[test]
    fn test_curve_is_monotonic() {
        let curve = ToneCurve::build(2.2, 1.5).unwrap();
        assert!(curve.as_slice().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_zero_contrast_is_flat_mid_gray() {
        let curve = ToneCurve::build(2.2, 0.0).unwrap();
        assert!(curve.as_slice().iter().all(|&v| v == 127));
    }

    #[test]
    fn test_high_contrast_clips_both_ends() {
        let curve = ToneCurve::build(1.0, 3.0).unwrap();
        assert_eq!(curve.lookup(1000), 0);
        assert_eq!(curve.lookup(60000), 255);
    }

    #[test]
    fn test_linear_gamma_matches_formula() {
        let curve = ToneCurve::build(1.0, 1.0).unwrap();
        assert_eq!(curve.lookup(32768), (32768.0 / 65535.0 * 255.0) as u8);
    }

    #[test]
    fn test_invalid_gamma_is_rejected() {
        assert!(ToneCurve::build(0.0, 1.0).is_err());
        assert!(ToneCurve::build(-1.0, 1.0).is_err());
        assert!(ToneCurve::build(f64::NAN, 1.0).is_err());
    }
}
