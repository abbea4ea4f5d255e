//! Incremental preview rendering and exposure warnings.

pub mod overlay;
pub mod renderer;
pub mod state;

pub use renderer::{DisplaySink, Frame, FrameId, IncrementalRenderer, NeverYield, Scheduler};
pub use state::{RenderPhase, RenderState, RenderStatus};
