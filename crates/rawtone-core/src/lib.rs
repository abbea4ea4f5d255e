//! Rawtone Core: interactive preview pipeline for linear sensor images.
//!
//! This crate turns a decoded 16-bit sensor image into an 8-bit display
//! preview under user tone and color parameters, renders it incrementally
//! without blocking the host, and estimates white balance from image
//! content. No windowing, file decoding or threading.

pub mod color_management;
pub mod config;
pub mod error;
pub mod grading;
pub mod image;
pub mod pipeline;
pub mod render;
pub mod scopes;
pub mod session;
pub mod transform;

// Re-exports for convenience.
pub use color_management::white_balance::WhiteBalance;
pub use config::PreviewConfig;
pub use error::{PipelineError, Result};
pub use crate::image::{Image16, Image8, Orientation, Rect, SensorFrame};
pub use pipeline::ColorPipeline;
pub use render::{DisplaySink, RenderStatus, Scheduler};
pub use session::{ParamBatch, PreviewSession};
pub use transform::kernel::{CpuFlags, KernelKind};
pub use transform::params::{SettingsMask, ToneParameters};
