//! Transform pipeline: parameters, color matrix, tone curve and row kernels.

pub mod evaluate;
pub mod kernel;
pub mod matrix;
pub mod params;
pub mod simd;
pub mod tone_curve;
