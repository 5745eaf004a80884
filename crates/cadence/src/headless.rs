//! Windowless backend: no input, frames kept in memory and optionally dumped to PNG.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use cadence_core::{
    input::NullInput,
    video::{ColorFormat, Surface},
};
use cadence_runtime::{HeadlessDisplay, LoopStats, Runner};

use crate::{config::Configuration, demo::DemoEngine, snapshot};

/// Frames to run when no limit is given; nothing else would stop the loop.
pub const DEFAULT_FRAMES: u64 = 600;

pub fn run(
    config: &Configuration,
    engine: DemoEngine,
    frames: Option<u64>,
    dump_frame: Option<&Path>,
) -> Result<LoopStats> {
    let frames = frames.unwrap_or(DEFAULT_FRAMES);
    let surface = Surface::new(config.width, config.height, ColorFormat::Xrgb8888)?;
    let display = if dump_frame.is_some() {
        HeadlessDisplay::keeping_last_frame()
    } else {
        HeadlessDisplay::new()
    };

    let mut runner = Runner::new(
        config.runtime_config(Some(frames)),
        engine,
        NullInput,
        display,
        surface,
    )?;
    let stats = runner.run()?;

    if let Some(path) = dump_frame {
        let frame = runner
            .display()
            .last_frame()
            .context("no frame was presented")?;
        snapshot::write_png(path, frame)?;
        info!(path = %path.display(), "wrote last frame");
    }
    Ok(stats)
}
