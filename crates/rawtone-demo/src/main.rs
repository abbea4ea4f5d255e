//! Rawtone Demo: drives a preview session the way an interactive host would.
//!
//! Synthesizes a sensor frame, balances it, renders the preview through a
//! simulated event loop that keeps interrupting the pass, then writes the
//! result as PNG.

mod config;
mod cpu;
mod logger;
mod synth;

use image::ImageFormat;
use rawtone_core::image::{Image8, Rect};
use rawtone_core::render::overlay::{MASK_OVER, MASK_UNDER};
use rawtone_core::{DisplaySink, PreviewSession, RenderStatus};
use tracing::{debug, info};

use crate::config::AppConfig;

/// Counts what the host would blit.
#[derive(Default)]
struct BlitCounter {
    rects: usize,
    pixels: usize,
}

impl DisplaySink for BlitCounter {
    fn present(&mut self, _preview: &Image8, dirty: Rect) {
        self.rects += 1;
        self.pixels += dirty.width() * dirty.height();
    }
}

/// Run passes until the preview is complete, servicing fake host events.
fn render_interactively(
    session: &mut PreviewSession,
    event_interval: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rows = 0usize;
    let mut scheduler = || {
        rows += 1;
        rows % event_interval == 0
    };
    let mut sink = BlitCounter::default();
    let mut yields = 0;
    while session.render_step(&mut scheduler, &mut sink)? == RenderStatus::Pending {
        yields += 1;
    }
    info!(yields, blits = sink.rects, pixels = sink.pixels, "Preview pass complete");
    Ok(())
}

fn count_mask(mask: &Image8, bit: u8) -> usize {
    (0..mask.height())
        .map(|y| mask.row(y).iter().filter(|&&m| m & bit != 0).count())
        .sum()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init();

    let config = AppConfig::from_env();
    info!(
        width = config.width,
        height = config.height,
        preview = %serde_json::to_string(&config.preview)?,
        "Starting demo"
    );

    let flags = cpu::detect();
    debug!(sse2 = flags.sse2, avx2 = flags.avx2, "Detected CPU features");
    let mut session = PreviewSession::new(config.preview.clone(), flags)?;
    info!(kernel = session.pipeline().kernel_kind().label(), "Pipeline ready");

    let frame = synth::sensor_frame(config.width, config.height);
    session.load(&frame)?;

    let camera = session.wb_camera()?;
    info!(warmth = camera.warmth, tint = camera.tint, "Camera white balance");
    render_interactively(&mut session, config.event_interval)?;

    let auto = session.wb_auto()?;
    info!(warmth = auto.warmth, tint = auto.tint, "Auto white balance");
    {
        let mut batch = session.batch();
        batch.exposure = 0.4;
        batch.saturation = 1.25;
        batch.contrast = 1.1;
    }
    render_interactively(&mut session, config.event_interval)?;

    // A cursor-driven redraw touches only a small region.
    let mut sink = BlitCounter::default();
    let dirty = session.render_region(Rect::new(0, 0, 32, 32), &mut sink)?;
    debug!(?dirty, "Redrew region");

    session.set_exposure_overlay(true);
    render_interactively(&mut session, config.event_interval)?;
    if let Some(mask) = session.mask() {
        info!(
            over = count_mask(mask, MASK_OVER),
            under = count_mask(mask, MASK_UNDER),
            "Exposure warnings"
        );
    }

    let histogram = session.histogram();
    info!(
        peak = histogram.peak(),
        total = histogram.total(),
        "Histogram"
    );

    let preview = session
        .preview()
        .and_then(Image8::to_rgb_image)
        .ok_or("no RGB preview to write")?;
    preview.save_with_format(&config.output, ImageFormat::Png)?;
    info!(path = %config.output.display(), "Wrote preview");
    Ok(())
}
