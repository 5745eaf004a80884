use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::config::Transfer;

/// Frame-paced game loop with overlapped display transfer
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Runs a simulation engine at a fixed frame rate", long_about = None)]
pub struct Args {
    /// Configuration file. `cadence.toml` in the working directory is used when present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// ROM/asset image handed to the engine
    #[arg(long)]
    pub rom: Option<PathBuf>,

    /// Palette file (64 entries, RGB or RGBA)
    #[arg(long)]
    pub palette: Option<PathBuf>,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// How finished frames are copied to the display
    #[arg(long, value_enum)]
    pub transfer: Option<Transfer>,

    /// Disable audio output
    #[arg(long)]
    pub no_audio: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Write the last presented frame to this PNG file (headless only)
    #[arg(long)]
    pub dump_frame: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: Level,

    /// Window scale factor
    #[arg(long)]
    pub scale: Option<u32>,

    /// Run without a window, even when SDL support is compiled in
    #[arg(long)]
    pub headless: bool,
}
