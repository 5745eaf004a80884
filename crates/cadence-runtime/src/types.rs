use thiserror::Error;

use cadence_core::input::KeyMap;

pub const DEFAULT_FRAME_RATE: f64 = 60.0;
pub const DEFAULT_WORKER_STACK_SIZE: usize = 64 * 1024;

/// How a finished frame reaches the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Copy on the loop thread right after `render`.
    Synchronous,
    /// Copy on a short-lived worker while the loop samples input and updates the
    /// next frame.
    #[default]
    Overlapped,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub frame_rate: f64,
    pub transfer: TransferMode,
    pub worker_stack_size: usize,
    pub key_map: KeyMap,
    /// Stop after this many frames. `None` runs until a quit request or
    /// [`StopHandle::stop`](crate::StopHandle::stop).
    pub frame_limit: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            transfer: TransferMode::default(),
            worker_stack_size: DEFAULT_WORKER_STACK_SIZE,
            key_map: KeyMap::default(),
            frame_limit: None,
        }
    }
}

/// Counters reported when the loop returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    /// Iterations that reached the pacing step.
    pub frames: u64,
    pub resyncs: u64,
    pub presented: u64,
    pub overlapped_transfers: u64,
    pub inline_transfers: u64,
    /// Worker spawns that failed and were recovered inline.
    pub spawn_failures: u64,
    /// Frames whose buffer could not be copied to the surface; skipped, not shown.
    pub transfer_failures: u64,
    /// Frames the display refused; the loop kept going.
    pub present_failures: u64,
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("invalid loop configuration: {0}")]
    Config(#[source] cadence_core::Error),

    /// A worker died holding the surface; no later frame can be shown.
    #[error("transfer worker for frame {frame} was lost")]
    TransferWorkerLost { frame: u64 },

    #[error("audio error: {0}")]
    Audio(String),
}
