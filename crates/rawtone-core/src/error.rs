//! Error type shared by every stage of the preview pipeline.

use crate::render::FrameId;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("unsupported channel count: {0} (expected 3 or 4)")]
    UnsupportedChannels(usize),
    #[error("sample buffer holds {actual} values, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("gamma must be positive, got {0}")]
    InvalidGamma(f64),
    #[error("render target changed mid-pass: expected {expected:?}, found {found:?}")]
    StaleFrame { expected: FrameId, found: FrameId },
    #[error("point ({x}, {y}) lies outside the {width}x{height} working image")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("degenerate white balance sample: {0}")]
    DegenerateSample(&'static str),
    #[error("no image loaded")]
    NoImage,
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
