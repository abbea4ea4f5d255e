//! The active color configuration.
//!
//! `ColorPipeline` owns the color transform, the tone curve and the row
//! kernel selected for this host. Only one configuration is active at a
//! time; the session rebuilds it in place whenever parameters change.

use tracing::debug;

use crate::error::Result;
use crate::transform::evaluate::linear_rgb;
use crate::transform::kernel::{CpuFlags, KernelKind, PixelKernel};
use crate::transform::matrix::{ColorMatrixBuilder, ColorTransform};
use crate::transform::params::ToneParameters;
use crate::transform::tone_curve::ToneCurve;

#[derive(Debug, Clone)]
pub struct ColorPipeline {
    transform: ColorTransform,
    curve: ToneCurve,
    kernel: PixelKernel,
}

impl ColorPipeline {
    /// Select the row kernel for `flags` and build the initial configuration.
    pub fn new(flags: CpuFlags, params: &ToneParameters, gamma: f64) -> Result<Self> {
        let kernel = PixelKernel::for_flags(flags);
        debug!(kernel = kernel.kind().label(), "Selected row kernel");
        let curve = ToneCurve::build(gamma, params.contrast)?;
        Ok(Self {
            transform: ColorMatrixBuilder::build(params),
            curve,
            kernel,
        })
    }

    /// Regenerate the transform, and the tone curve if contrast changed.
    pub fn rebuild(&mut self, params: &ToneParameters) {
        self.transform = ColorMatrixBuilder::build(params);
        if params.contrast != self.curve.contrast() {
            self.curve = self.curve.with_contrast(params.contrast);
        }
        debug!(
            exposure = params.exposure,
            saturation = params.saturation,
            hue = params.hue,
            contrast = params.contrast,
            "Rebuilt color transform"
        );
    }

    /// Replace the display gamma. An invalid gamma leaves the curve unchanged.
    pub fn set_gamma(&mut self, gamma: f64) -> Result<()> {
        self.curve = ToneCurve::build(gamma, self.curve.contrast())?;
        debug!(gamma, "Rebuilt tone curve");
        Ok(())
    }

    pub fn transform(&self) -> &ColorTransform {
        &self.transform
    }

    pub fn curve(&self) -> &ToneCurve {
        &self.curve
    }

    pub fn gamma(&self) -> f64 {
        self.curve.gamma()
    }

    pub fn kernel_kind(&self) -> KernelKind {
        self.kernel.kind()
    }

    /// Render one row of pixels `pixel_stride` samples apart into packed RGB.
    #[inline]
    pub fn render_row(&self, src: &[u16], pixel_stride: usize, out: &mut [u8]) {
        self.kernel
            .render_row(src, pixel_stride, out, &self.transform, &self.curve);
    }

    /// Linear RGB after pre-multiply and matrix, before the tone curve.
    #[inline]
    pub fn linear_rgb(&self, px: &[u16]) -> [u16; 3] {
        linear_rgb(px, &self.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_tracks_contrast() {
        let mut pipeline = ColorPipeline::new(CpuFlags::NONE, &ToneParameters::default(), 2.2).unwrap();
        let params = ToneParameters {
            contrast: 2.0,
            ..Default::default()
        };
        pipeline.rebuild(&params);
        assert_eq!(pipeline.curve().contrast(), 2.0);
        assert_eq!(pipeline.gamma(), 2.2);
    }

    #[test]
    fn test_invalid_gamma_keeps_previous_curve() {
        let mut pipeline = ColorPipeline::new(CpuFlags::NONE, &ToneParameters::default(), 2.2).unwrap();
        assert!(pipeline.set_gamma(0.0).is_err());
        assert_eq!(pipeline.gamma(), 2.2);
        assert!(ColorPipeline::new(CpuFlags::NONE, &ToneParameters::default(), -1.0).is_err());
    }

    #[test]
    fn test_kernel_follows_flags() {
        let flags = CpuFlags {
            sse2: true,
            avx2: false,
        };
        let pipeline = ColorPipeline::new(flags, &ToneParameters::default(), 2.2).unwrap();
        assert_eq!(pipeline.kernel_kind(), KernelKind::Wide4);
    }
}
