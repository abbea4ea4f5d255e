//! The interactive editing session.
//!
//! `PreviewSession` owns everything the preview needs: configuration, the
//! active [`ColorPipeline`], three settings slots, the loaded source image,
//! the current [`Frame`] and the renderer. Every parameter write goes
//! through a [`ParamBatch`], which commits once and triggers exactly one
//! render invalidation when it is dropped.

use std::ops::{Deref, DerefMut};

use tracing::{debug, info, warn};

use crate::color_management::white_balance::WhiteBalance;
use crate::config::{PreviewConfig, clamp_scale};
use crate::error::{PipelineError, Result};
use crate::grading::auto_balance::{auto_white_balance, white_balance_from_pixels};
use crate::image::{Image16, Image8, Orientation, Rect, SensorFrame};
use crate::pipeline::ColorPipeline;
use crate::render::{DisplaySink, Frame, IncrementalRenderer, RenderState, RenderStatus, Scheduler};
use crate::scopes::histogram::{HistogramTable, dataset};
use crate::transform::kernel::CpuFlags;
use crate::transform::params::{SettingsMask, ToneParameters};

/// Number of independent settings slots.
pub const SETTINGS_SLOTS: usize = 3;

/// The full-resolution image and what is derived from it once per load.
#[derive(Debug)]
struct Source {
    image: Image16,
    histogram_data: Image16,
    camera_multipliers: [f64; 4],
}

#[derive(Debug)]
pub struct PreviewSession {
    config: PreviewConfig,
    pipeline: ColorPipeline,
    settings: [ToneParameters; SETTINGS_SLOTS],
    current: usize,
    orientation: Orientation,
    source: Option<Source>,
    frame: Option<Frame>,
    generation: u64,
    renderer: IncrementalRenderer,
    histogram: HistogramTable,
    revision: u64,
}

impl PreviewSession {
    pub fn new(config: PreviewConfig, flags: CpuFlags) -> Result<Self> {
        let config = config.sanitized();
        let settings = [ToneParameters::default(); SETTINGS_SLOTS];
        let pipeline = ColorPipeline::new(flags, &settings[0], config.gamma)?;
        let mut renderer = IncrementalRenderer::new();
        renderer.set_overlay(config.exposure_overlay);
        Ok(Self {
            config,
            pipeline,
            settings,
            current: 0,
            orientation: Orientation::NORMAL,
            source: None,
            frame: None,
            generation: 0,
            renderer,
            histogram: HistogramTable::new(),
            revision: 0,
        })
    }

    /// Load decoder output.
    pub fn load(&mut self, frame: &SensorFrame) -> Result<()> {
        let image = Image16::from_sensor(frame)?;
        self.load_image(image, frame.pre_mul)
    }

    /// Load an 8-bit RGB image. It carries no camera estimate, so the camera
    /// multipliers are unity.
    pub fn load_rgb8(&mut self, source: &image::RgbImage) -> Result<()> {
        let image = Image16::from_rgb8(source)?;
        self.load_image(image, [1.0; 4])
    }

    /// Load an already normalized image with the camera's multiplier estimate.
    pub fn load_image(&mut self, image: Image16, camera_multipliers: [f64; 4]) -> Result<()> {
        let histogram_data = dataset(&image)?;
        let frame = self.next_frame(&image, self.config.scale, self.orientation)?;
        info!(
            width = image.width(),
            height = image.height(),
            channels = image.channels(),
            "Loaded image"
        );
        self.source = Some(Source {
            image,
            histogram_data,
            camera_multipliers,
        });
        self.install_frame(frame);
        self.refresh_histogram();
        Ok(())
    }

    /// Open a batch of parameter writes on the current settings slot.
    pub fn batch(&mut self) -> ParamBatch<'_> {
        let params = self.settings[self.current];
        ParamBatch {
            session: self,
            params,
        }
    }

    pub fn params(&self) -> &ToneParameters {
        &self.settings[self.current]
    }

    pub fn settings(&self, slot: usize) -> Option<&ToneParameters> {
        self.settings.get(slot)
    }

    pub fn current_setting(&self) -> usize {
        self.current
    }

    /// Switch the active settings slot. Out-of-range slots select the last one.
    pub fn select_setting(&mut self, slot: usize) {
        let slot = slot.min(SETTINGS_SLOTS - 1);
        if slot != self.current {
            self.current = slot;
            self.apply_changes();
        }
    }

    /// Restore defaults for the masked fields of the current slot.
    pub fn reset_settings(&mut self, mask: SettingsMask) {
        self.batch().reset(mask);
    }

    /// Copy the masked fields of slot `from` into the current slot.
    pub fn copy_settings(&mut self, from: usize, mask: SettingsMask) {
        let Some(&src) = self.settings.get(from) else {
            return;
        };
        self.batch().apply_masked(&src, mask);
    }

    pub fn set_gamma(&mut self, gamma: f64) -> Result<()> {
        self.pipeline.set_gamma(gamma)?;
        self.config.gamma = gamma;
        self.apply_render_changes();
        Ok(())
    }

    /// Change the preview downscale; reallocates the frame.
    pub fn set_scale(&mut self, scale: usize) -> Result<()> {
        let scale = clamp_scale(scale);
        if scale == self.config.scale {
            return Ok(());
        }
        if let Some(source) = &self.source {
            let frame = self.next_frame(&source.image, scale, self.orientation)?;
            self.install_frame(frame);
        }
        self.config.scale = scale;
        Ok(())
    }

    /// Change the orientation; reallocates the frame.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        if orientation == self.orientation {
            return Ok(());
        }
        if let Some(source) = &self.source {
            let frame = self.next_frame(&source.image, self.config.scale, orientation)?;
            self.install_frame(frame);
        }
        self.orientation = orientation;
        Ok(())
    }

    pub fn set_exposure_overlay(&mut self, enabled: bool) {
        self.config.exposure_overlay = enabled;
        self.renderer.set_overlay(enabled);
    }

    pub fn set_histogram_visible(&mut self, visible: bool) {
        let was_visible = self.config.histogram_visible;
        self.config.histogram_visible = visible;
        if visible && !was_visible {
            self.refresh_histogram();
        }
    }

    /// Run one cooperative unit of the current render pass.
    pub fn render_step(
        &mut self,
        scheduler: &mut impl Scheduler,
        sink: &mut impl DisplaySink,
    ) -> Result<RenderStatus> {
        let frame = self.frame.as_mut().ok_or(PipelineError::NoImage)?;
        self.renderer.step(frame, &self.pipeline, scheduler, sink)
    }

    /// Redraw only `rect` of the preview.
    pub fn render_region(&mut self, rect: Rect, sink: &mut impl DisplaySink) -> Result<Rect> {
        let frame = self.frame.as_mut().ok_or(PipelineError::NoImage)?;
        self.renderer.render_region(frame, &self.pipeline, rect, sink)
    }

    /// Write warmth and tint together as one change.
    pub fn set_white_balance(&mut self, wb: WhiteBalance) {
        let mut batch = self.batch();
        batch.warmth = wb.warmth;
        batch.tint = wb.tint;
    }

    /// Gray-world white balance over the working image.
    pub fn wb_auto(&mut self) -> Result<WhiteBalance> {
        let frame = self.frame.as_ref().ok_or(PipelineError::NoImage)?;
        let wb = auto_white_balance(frame.working());
        self.apply_white_balance(wb, "auto")
    }

    /// Neutralize the 3×3 neighborhood of `(x, y)` in the working image.
    pub fn wb_from_pixels(&mut self, x: usize, y: usize) -> Result<WhiteBalance> {
        let frame = self.frame.as_ref().ok_or(PipelineError::NoImage)?;
        let wb = white_balance_from_pixels(frame.working(), x, y);
        self.apply_white_balance(wb, "picker")
    }

    pub fn wb_from_color(&mut self, r: f64, g: f64, b: f64) -> Result<WhiteBalance> {
        self.apply_white_balance(WhiteBalance::from_color(r, g, b), "color")
    }

    pub fn wb_from_multipliers(&mut self, mul: [f64; 4]) -> Result<WhiteBalance> {
        self.apply_white_balance(WhiteBalance::from_multipliers(mul), "multipliers")
    }

    /// White balance estimated by the camera, as reported by the decoder.
    pub fn wb_camera(&mut self) -> Result<WhiteBalance> {
        let source = self.source.as_ref().ok_or(PipelineError::NoImage)?;
        let wb = WhiteBalance::from_multipliers(source.camera_multipliers);
        self.apply_white_balance(wb, "camera")
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &ColorPipeline {
        &self.pipeline
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn preview(&self) -> Option<&Image8> {
        self.frame.as_ref().map(Frame::preview)
    }

    pub fn mask(&self) -> Option<&Image8> {
        self.frame.as_ref().map(Frame::mask)
    }

    pub fn histogram(&self) -> &HistogramTable {
        &self.histogram
    }

    pub fn render_state(&self) -> &RenderState {
        self.renderer.state()
    }

    /// Incremented once per committed parameter change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn apply_white_balance(&mut self, wb: Result<WhiteBalance>, source: &str) -> Result<WhiteBalance> {
        match wb {
            Ok(wb) => {
                debug!(source, warmth = wb.warmth, tint = wb.tint, "Applying white balance");
                self.set_white_balance(wb);
                Ok(wb)
            }
            Err(err) => {
                warn!(source, %err, "White balance request rejected");
                Err(err)
            }
        }
    }

    fn commit(&mut self, params: ToneParameters) {
        if params != self.settings[self.current] {
            self.settings[self.current] = params;
            self.apply_changes();
        }
    }

    fn apply_changes(&mut self) {
        self.pipeline.rebuild(&self.settings[self.current]);
        self.revision += 1;
        self.apply_render_changes();
    }

    fn apply_render_changes(&mut self) {
        self.refresh_histogram();
        if let Some(frame) = &self.frame {
            self.renderer.invalidate(frame);
        }
    }

    fn refresh_histogram(&mut self) {
        if !self.config.histogram_visible {
            return;
        }
        if let Some(source) = &self.source {
            self.histogram.compute(&source.histogram_data, &self.pipeline);
        }
    }

    /// Scale then orient `image` into the next frame generation. Nothing in
    /// the session changes until the frame is installed.
    fn next_frame(&self, image: &Image16, scale: usize, orientation: Orientation) -> Result<Frame> {
        let working = image.scaled(scale)?.reoriented(orientation)?;
        Frame::new(working, self.generation + 1)
    }

    fn install_frame(&mut self, frame: Frame) {
        self.generation = frame.id().generation;
        self.renderer.invalidate(&frame);
        self.frame = Some(frame);
    }
}

/// Scoped write access to the current settings slot.
///
/// Dereferences to [`ToneParameters`]. On drop the values are clamped and
/// committed; if anything changed, the transform is rebuilt and the render
/// pass invalidated exactly once.
pub struct ParamBatch<'a> {
    session: &'a mut PreviewSession,
    params: ToneParameters,
}

impl Deref for ParamBatch<'_> {
    type Target = ToneParameters;

    fn deref(&self) -> &ToneParameters {
        &self.params
    }
}

impl DerefMut for ParamBatch<'_> {
    fn deref_mut(&mut self) -> &mut ToneParameters {
        &mut self.params
    }
}

impl Drop for ParamBatch<'_> {
    fn drop(&mut self) {
        let params = self.params.clamped();
        self.session.commit(params);
    }
}
