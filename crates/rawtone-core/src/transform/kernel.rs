//! Row kernel selection.
//!
//! The pipeline renders rows through a function pointer chosen once from
//! the host's CPU capabilities. All variants are bit-identical; wider ones
//! only process more pixels per step.

use serde::{Deserialize, Serialize};

use crate::transform::evaluate::transform_pixel;
use crate::transform::matrix::ColorTransform;
use crate::transform::simd::{render_row_x4, render_row_x8};
use crate::transform::tone_curve::ToneCurve;

/// Renders one row: `src` holds pixels `pixel_stride` samples apart,
/// `out` receives packed RGB; the pixel count is `out.len() / 3`.
pub type RowFn = fn(&[u16], usize, &mut [u8], &ColorTransform, &ToneCurve);

/// Host CPU capabilities relevant to kernel selection, as detected by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuFlags {
    pub sse2: bool,
    pub avx2: bool,
}

impl CpuFlags {
    /// No vector support; always selects the scalar kernel.
    pub const NONE: Self = Self {
        sse2: false,
        avx2: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelKind {
    Scalar,
    Wide4,
    Wide8,
}

impl KernelKind {
    pub fn select(flags: CpuFlags) -> Self {
        if flags.avx2 {
            Self::Wide8
        } else if flags.sse2 {
            Self::Wide4
        } else {
            Self::Scalar
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Wide4 => "wide-x4",
            Self::Wide8 => "wide-x8",
        }
    }

    fn row_fn(self) -> RowFn {
        match self {
            Self::Scalar => render_row_scalar,
            Self::Wide4 => render_row_x4,
            Self::Wide8 => render_row_x8,
        }
    }
}

/// Reference row kernel.
pub fn render_row_scalar(
    src: &[u16],
    pixel_stride: usize,
    out: &mut [u8],
    transform: &ColorTransform,
    curve: &ToneCurve,
) {
    for (x, rgb) in out.chunks_exact_mut(3).enumerate() {
        let px = &src[x * pixel_stride..];
        rgb.copy_from_slice(&transform_pixel(px, transform, curve));
    }
}

/// The selected row kernel.
#[derive(Debug, Clone, Copy)]
pub struct PixelKernel {
    kind: KernelKind,
    row: RowFn,
}

impl PixelKernel {
    pub fn new(kind: KernelKind) -> Self {
        Self {
            kind,
            row: kind.row_fn(),
        }
    }

    pub fn for_flags(flags: CpuFlags) -> Self {
        Self::new(KernelKind::select(flags))
    }

    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    #[inline]
    pub fn render_row(
        &self,
        src: &[u16],
        pixel_stride: usize,
        out: &mut [u8],
        transform: &ColorTransform,
        curve: &ToneCurve,
    ) {
        (self.row)(src, pixel_stride, out, transform, curve);
    }
}
