//! Cooperative, resumable preview rendering.
//!
//! The renderer performs one row per unit of work. After each row it asks
//! the host [`Scheduler`] whether other work is waiting and, if so, returns
//! [`RenderStatus::Pending`] so the host can service it and call again.
//! Progress lives in [`RenderState`]; a resumed pass continues at the next
//! unrendered row.

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::image::{Image16, Image8, Rect};
use crate::pipeline::ColorPipeline;
use crate::render::overlay::{apply_overlay, render_mask};
use crate::render::state::{RenderState, RenderStatus};

/// Host event loop poll.
pub trait Scheduler {
    /// Whether the host has work waiting that should run before the next row.
    fn has_pending_work(&mut self) -> bool;
}

impl<F: FnMut() -> bool> Scheduler for F {
    fn has_pending_work(&mut self) -> bool {
        self()
    }
}

/// A scheduler that never interrupts, so a step renders the whole pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverYield;

impl Scheduler for NeverYield {
    fn has_pending_work(&mut self) -> bool {
        false
    }
}

/// Receives the preview after each completed row or region.
pub trait DisplaySink {
    /// `dirty` is the exact rectangle of `preview` that changed.
    fn present(&mut self, preview: &Image8, dirty: Rect);
}

impl DisplaySink for () {
    fn present(&mut self, _preview: &Image8, _dirty: Rect) {}
}

/// Records dirty rectangles in presentation order.
impl DisplaySink for Vec<Rect> {
    fn present(&mut self, _preview: &Image8, dirty: Rect) {
        self.push(dirty);
    }
}

/// Identity of a frame's buffers; changes whenever they are reallocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId {
    pub generation: u64,
    pub width: usize,
    pub height: usize,
}

/// The working image with its preview and clipping mask buffers.
#[derive(Debug, Clone)]
pub struct Frame {
    working: Image16,
    preview: Image8,
    mask: Image8,
    generation: u64,
}

impl Frame {
    pub fn new(working: Image16, generation: u64) -> Result<Self> {
        let preview = Image8::new(working.width(), working.height(), 3)?;
        let mask = Image8::new(working.width(), working.height(), 1)?;
        debug!(
            generation,
            width = working.width(),
            height = working.height(),
            "Allocated preview frame"
        );
        Ok(Self {
            working,
            preview,
            mask,
            generation,
        })
    }

    pub fn id(&self) -> FrameId {
        FrameId {
            generation: self.generation,
            width: self.working.width(),
            height: self.working.height(),
        }
    }

    pub fn working(&self) -> &Image16 {
        &self.working
    }

    pub fn preview(&self) -> &Image8 {
        &self.preview
    }

    pub fn mask(&self) -> &Image8 {
        &self.mask
    }

    /// Transform `rect` of the working image into the preview and mask.
    /// Returns the rectangle actually rendered after clipping.
    pub fn render_rect(&mut self, pipeline: &ColorPipeline, rect: Rect, overlay: bool) -> Rect {
        let Self {
            working,
            preview,
            mask,
            ..
        } = self;
        let rect = rect.clamped(working.width(), working.height());
        let stride = working.pixel_stride();

        for y in rect.y1..rect.y2 {
            let src = &working.row(y)[rect.x1 * stride..rect.x2 * stride];
            let rgb = &mut preview.row_mut(y)[rect.x1 * 3..rect.x2 * 3];
            let clip = &mut mask.row_mut(y)[rect.x1..rect.x2];
            pipeline.render_row(src, stride, rgb);
            render_mask(rgb, clip);
            if overlay {
                apply_overlay(rgb, clip);
            }
        }
        rect
    }
}

#[derive(Debug, Clone, Default)]
pub struct IncrementalRenderer {
    state: RenderState,
    target: Option<FrameId>,
}

impl IncrementalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Toggle the exposure overlay; the next pass repaints everything.
    pub fn set_overlay(&mut self, enabled: bool) {
        if self.state.overlay_enabled != enabled {
            self.state.overlay_enabled = enabled;
            self.state.invalidate();
        }
    }

    /// Start over with a full pass targeting `frame`.
    pub fn invalidate(&mut self, frame: &Frame) {
        self.state.invalidate();
        self.target = Some(frame.id());
    }

    fn check_frame(&mut self, frame: &Frame) -> Result<()> {
        let found = frame.id();
        match self.target {
            Some(expected) if expected != found => {
                // Abort; the next step starts a fresh pass on the current frame.
                self.state.invalidate();
                self.target = None;
                Err(PipelineError::StaleFrame { expected, found })
            }
            _ => Ok(()),
        }
    }

    /// Render rows until the pass completes or the scheduler asks to yield.
    pub fn step(
        &mut self,
        frame: &mut Frame,
        pipeline: &ColorPipeline,
        scheduler: &mut impl Scheduler,
        sink: &mut impl DisplaySink,
    ) -> Result<RenderStatus> {
        if self.state.done {
            return Ok(RenderStatus::Done);
        }
        if self.state.last_row == 0 && self.target.is_none() {
            self.target = Some(frame.id());
        }

        let height = frame.working().height();
        let width = frame.working().width();
        while self.state.last_row < height {
            self.check_frame(frame)?;
            let y = self.state.last_row;
            let dirty = frame.render_rect(pipeline, Rect::row(y, width), self.state.overlay_enabled);
            sink.present(frame.preview(), dirty);
            self.state.last_row += 1;

            if self.state.last_row < height && scheduler.has_pending_work() {
                return Ok(RenderStatus::Pending);
            }
        }

        self.state.done = true;
        self.state.last_row = 0;
        debug!(generation = frame.id().generation, rows = height, "Render pass complete");
        Ok(RenderStatus::Done)
    }

    /// Render only `rect`, leaving pass progress untouched.
    pub fn render_region(
        &mut self,
        frame: &mut Frame,
        pipeline: &ColorPipeline,
        rect: Rect,
        sink: &mut impl DisplaySink,
    ) -> Result<Rect> {
        self.check_frame(frame)?;
        let dirty = frame.render_rect(pipeline, rect, self.state.overlay_enabled);
        if !dirty.is_empty() {
            sink.present(frame.preview(), dirty);
        }
        Ok(dirty)
    }
}
