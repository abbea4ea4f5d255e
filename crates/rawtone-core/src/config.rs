//! Preview configuration.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Display gamma used when none (or a nonsensical one) is configured.
pub const DEFAULT_GAMMA: f64 = 2.2;
/// Configured gammas below this are replaced with [`DEFAULT_GAMMA`].
pub const MIN_GAMMA: f64 = 0.1;
pub const DEFAULT_SCALE: usize = 2;
pub const SCALE_RANGE: RangeInclusive<usize> = 1..=5;

/// Session-wide preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Display gamma of the tone curve.
    pub gamma: f64,
    /// Integer downscale from the source to the working image.
    pub scale: usize,
    /// Rebuild the histogram after every transform change.
    pub histogram_visible: bool,
    /// Paint clipping warnings into the preview.
    pub exposure_overlay: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            scale: DEFAULT_SCALE,
            histogram_visible: true,
            exposure_overlay: false,
        }
    }
}

impl PreviewConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overlaid with `RAWTONE_GAMMA` and `RAWTONE_SCALE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(gamma) = std::env::var("RAWTONE_GAMMA")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.gamma = gamma;
        }
        if let Some(scale) = std::env::var("RAWTONE_SCALE")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
        {
            // Fractional scales are floored.
            config.scale = scale.max(0.0) as usize;
        }
        config
    }

    /// Replace an unusable gamma and clamp the scale into range.
    pub fn sanitized(mut self) -> Self {
        if !(self.gamma >= MIN_GAMMA) {
            warn!(gamma = self.gamma, "Display gamma too low, using {DEFAULT_GAMMA}");
            self.gamma = DEFAULT_GAMMA;
        }
        self.scale = clamp_scale(self.scale);
        self
    }
}

pub fn clamp_scale(scale: usize) -> usize {
    scale.clamp(*SCALE_RANGE.start(), *SCALE_RANGE.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PreviewConfig::default();
        assert_eq!(config.gamma, 2.2);
        assert_eq!(config.scale, 2);
        assert!(config.histogram_visible);
        assert!(!config.exposure_overlay);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = PreviewConfig::from_json(r#"{"scale": 4, "exposure_overlay": true}"#).unwrap();
        assert_eq!(config.scale, 4);
        assert!(config.exposure_overlay);
        assert_eq!(config.gamma, 2.2);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(PreviewConfig::from_json("{scale: ").is_err());
    }

    #[test]
    fn test_sanitized_replaces_low_gamma_and_clamps_scale() {
        let config = PreviewConfig {
            gamma: 0.05,
            scale: 9,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.gamma, DEFAULT_GAMMA);
        assert_eq!(config.scale, 5);

        let config = PreviewConfig {
            gamma: f64::NAN,
            scale: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.gamma, DEFAULT_GAMMA);
        assert_eq!(config.scale, 1);
    }
}
