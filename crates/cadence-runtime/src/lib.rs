//! The frame loop and its concurrent pixel transfer.
//!
//! [`Runner`] owns the loop context and drives an [`Engine`] at a fixed cadence;
//! [`RenderDispatcher`] moves each finished frame onto the display surface,
//! overlapped with the next frame when the host has a spare core.

pub mod audio;
pub mod dispatch;
pub mod display;
pub mod engine;
pub mod runner;
mod types;

pub use audio::AudioBridge;
#[cfg(feature = "audio")]
pub use audio::AudioOutput;
pub use dispatch::{DispatchStats, RenderDispatcher, Spawner, Task, ThreadSpawner};
pub use display::{Display, DisplayError, HeadlessDisplay};
pub use engine::{AudioSource, Engine};
pub use runner::{FrameOutcome, Runner, StopHandle};
pub use types::{
    DEFAULT_FRAME_RATE, DEFAULT_WORKER_STACK_SIZE, LoopStats, RuntimeConfig, RuntimeError,
    TransferMode,
};
