//! Application configuration for the demo.

use std::path::PathBuf;

use rawtone_core::PreviewConfig;

/// Default synthetic sensor width.
const DEFAULT_WIDTH: usize = 960;
/// Default synthetic sensor height.
const DEFAULT_HEIGHT: usize = 640;
/// Default number of rows between simulated host events.
const DEFAULT_EVENT_INTERVAL: usize = 24;

/// Runtime configuration for the demo.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where the rendered preview is written.
    pub output: PathBuf,
    /// Synthetic sensor width in pixels.
    pub width: usize,
    /// Synthetic sensor height in pixels.
    pub height: usize,
    /// The simulated event loop has work pending every this many rows.
    pub event_interval: usize,
    pub preview: PreviewConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            output: std::env::var_os("RAWTONE_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("preview.png")),
            width: env_parse("RAWTONE_WIDTH").unwrap_or(DEFAULT_WIDTH),
            height: env_parse("RAWTONE_HEIGHT").unwrap_or(DEFAULT_HEIGHT),
            event_interval: env_parse("RAWTONE_EVENT_INTERVAL")
                .unwrap_or(DEFAULT_EVENT_INTERVAL)
                .max(1),
            preview: PreviewConfig::from_env(),
        }
    }
}
