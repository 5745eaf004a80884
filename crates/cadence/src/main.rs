mod args;
mod config;
mod demo;
mod headless;
mod palette;
#[cfg(feature = "sdl")]
mod sdl;
mod snapshot;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use cadence_runtime::LoopStats;

use crate::{args::Args, config::Configuration, demo::DemoEngine, palette::Palette};

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(err) = run(&args) {
        error!("{err:#}");
        return Err(err);
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let mut config = Configuration::load(args.config.as_deref())?;
    config.apply_args(args);
    config.validate()?;

    let rom = match &config.rom_file {
        Some(path) => load_rom(path)?,
        None => {
            info!("no ROM configured, using the built-in pattern");
            demo::builtin_rom()
        }
    };
    let palette = match &config.palette_file {
        Some(path) => Palette::load(path)?,
        None => Palette::default(),
    };

    let mut engine = DemoEngine::new(rom, palette, config.width, config.height);
    let headless = args.headless || cfg!(not(feature = "sdl"));

    // Keeps the output stream open for the whole run.
    let _audio = if config.audio_enabled && !headless {
        open_audio(&config, &mut engine)?
    } else {
        None
    };

    let stats = if headless {
        headless::run(&config, engine, args.frames, args.dump_frame.as_deref())?
    } else {
        run_windowed(&config, engine, args.frames)?
    };

    info!(
        frames = stats.frames,
        presented = stats.presented,
        resyncs = stats.resyncs,
        overlapped = stats.overlapped_transfers,
        inline = stats.inline_transfers,
        present_failures = stats.present_failures,
        "done"
    );
    Ok(())
}

fn load_rom(path: &Path) -> Result<Vec<u8>> {
    let rom = fs::read(path).with_context(|| format!("failed to open {}", path.display()))?;
    info!(path = %path.display(), bytes = rom.len(), "loaded ROM");
    Ok(rom)
}

#[cfg(feature = "audio")]
fn open_audio(
    config: &Configuration,
    engine: &mut DemoEngine,
) -> Result<Option<cadence_runtime::AudioOutput>> {
    use cadence_runtime::{AudioBridge, AudioOutput, Engine};

    let Some(source) = engine.take_audio_source() else {
        return Ok(None);
    };
    let bridge = AudioBridge::new();
    bridge.attach(source);
    let output = AudioOutput::open(bridge, Some(config.audio_frequency))?;
    Ok(Some(output))
}

#[cfg(not(feature = "audio"))]
fn open_audio(_config: &Configuration, _engine: &mut DemoEngine) -> Result<Option<()>> {
    info!("audio support not compiled in");
    Ok(None)
}

#[cfg(feature = "sdl")]
fn run_windowed(config: &Configuration, engine: DemoEngine, frames: Option<u64>) -> Result<LoopStats> {
    sdl::run(config, engine, frames)
}

#[cfg(not(feature = "sdl"))]
fn run_windowed(_config: &Configuration, _engine: DemoEngine, _frames: Option<u64>) -> Result<LoopStats> {
    anyhow::bail!("built without SDL support; run with --headless")
}
