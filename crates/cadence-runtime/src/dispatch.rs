//! Per-frame pixel transfer, optionally overlapped with the next frame.
//!
//! Each frame gets a fresh [`TransferJob`] that owns the engine's pixel buffer and
//! the display surface for as long as the copy runs. In overlapped mode the job
//! travels to a short-lived worker thread through a channel and comes back through
//! another one; the loop meets it again in [`RenderDispatcher::complete`] before
//! the engine may render into the buffer again, and presents it there. Nothing is
//! shared, so nothing is locked.
//!
//! An inline copy (synchronous mode, or a worker that could not be spawned) is
//! presented straight away inside [`RenderDispatcher::submit`]; only its buffer
//! waits for `complete`.
//!
//! A worker that cannot be spawned is not an error. The job is still sitting in
//! the hand-off channel, so the dispatcher takes it back and copies inline. A
//! failed copy or present is logged and counted, and the next frame goes ahead.

use std::{
    io,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use tracing::{debug, error, warn};

use cadence_core::video::{PixelBuffer, Surface};

use crate::{
    display::Display,
    types::{DEFAULT_WORKER_STACK_SIZE, RuntimeError, TransferMode},
};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Starts the worker that runs one frame's transfer.
pub trait Spawner {
    /// Run `task` on a new thread. On error `task` must have been dropped without
    /// running.
    fn spawn(&mut self, frame: u64, task: Task) -> io::Result<JoinHandle<()>>;
}

/// Spawns `render-<frame>` threads with a fixed stack size.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSpawner {
    stack_size: usize,
}

impl ThreadSpawner {
    pub fn new(stack_size: usize) -> Self {
        Self { stack_size }
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_STACK_SIZE)
    }
}

impl Spawner for ThreadSpawner {
    fn spawn(&mut self, frame: u64, task: Task) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("render-{frame}"))
            .stack_size(self.stack_size)
            .spawn(task)
    }
}

/// One frame's buffer → surface copy. Created per frame and consumed by it.
pub(crate) struct TransferJob {
    frame: u64,
    pixels: PixelBuffer,
    surface: Surface,
}

struct Transferred {
    job: TransferJob,
    result: Result<(), cadence_core::Error>,
}

impl TransferJob {
    fn run(mut self) -> Transferred {
        let result = self.surface.bulk_write(&self.pixels);
        Transferred { job: self, result }
    }
}

struct InFlight {
    frame: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub overlapped: u64,
    pub inline: u64,
    pub spawn_failures: u64,
    pub presented: u64,
    pub transfer_failures: u64,
    pub present_failures: u64,
}

pub struct RenderDispatcher<D, S = ThreadSpawner> {
    mode: TransferMode,
    display: D,
    spawner: S,
    /// `None` exactly while a worker holds it.
    surface: Option<Surface>,
    in_flight: Option<InFlight>,
    /// Buffer of an inline transfer that has already been presented.
    returned: Option<PixelBuffer>,
    job_tx: Sender<TransferJob>,
    job_rx: Receiver<TransferJob>,
    done_tx: Sender<Transferred>,
    done_rx: Receiver<Transferred>,
    stats: DispatchStats,
}

impl<D: Display> RenderDispatcher<D> {
    pub fn new(display: D, surface: Surface, mode: TransferMode) -> Self {
        Self::with_spawner(display, surface, mode, ThreadSpawner::default())
    }
}

impl<D: Display, S: Spawner> RenderDispatcher<D, S> {
    pub fn with_spawner(display: D, surface: Surface, mode: TransferMode, spawner: S) -> Self {
        let (job_tx, job_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);
        Self {
            mode: effective_mode(mode),
            display,
            spawner,
            surface: Some(surface),
            in_flight: None,
            returned: None,
            job_tx,
            job_rx,
            done_tx,
            done_rx,
            stats: DispatchStats::default(),
        }
    }

    /// The mode actually in use; overlapped requests degrade on single-core hosts.
    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Whether a worker is still copying a frame that has not been presented.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start transferring `pixels` for `frame`.
    ///
    /// Inline transfers are presented before this returns. A worker still in
    /// flight is completed and presented first, so at most one is ever
    /// outstanding; a buffer nobody collected with [`complete`](Self::complete)
    /// is dropped.
    pub fn submit(&mut self, frame: u64, pixels: PixelBuffer) -> Result<(), RuntimeError> {
        if self.in_flight.is_some() {
            self.complete()?;
        }
        self.returned = None;

        let surface = self
            .surface
            .take()
            .ok_or(RuntimeError::TransferWorkerLost { frame })?;
        let job = TransferJob {
            frame,
            pixels,
            surface,
        };

        match self.mode {
            TransferMode::Synchronous => self.transfer_inline(job),
            TransferMode::Overlapped => self.spawn_worker(job)?,
        }
        Ok(())
    }

    /// Hand back the pixel buffer of the last submitted frame, first waiting for
    /// its worker and presenting the result when it was overlapped.
    ///
    /// Returns `Ok(None)` when nothing was submitted since the last call. Only a
    /// worker that died with the surface is an error.
    pub fn complete(&mut self) -> Result<Option<PixelBuffer>, RuntimeError> {
        if let Some(pixels) = self.returned.take() {
            return Ok(Some(pixels));
        }
        let Some(InFlight { frame, handle }) = self.in_flight.take() else {
            return Ok(None);
        };

        if handle.join().is_err() {
            error!(frame, "transfer worker panicked");
            return Err(RuntimeError::TransferWorkerLost { frame });
        }
        let done = self
            .done_rx
            .try_recv()
            .map_err(|_| RuntimeError::TransferWorkerLost { frame })?;
        Ok(Some(self.present(done)))
    }

    /// Put the surface back and show it. Failures skip the frame, never the loop.
    fn present(&mut self, done: Transferred) -> PixelBuffer {
        let Transferred { job, result } = done;
        let TransferJob {
            frame,
            pixels,
            surface,
        } = job;
        let surface = self.surface.insert(surface);

        if let Err(err) = result {
            self.stats.transfer_failures += 1;
            warn!(frame, %err, "pixel transfer failed, frame skipped");
            return pixels;
        }
        match self.display.present(surface) {
            Ok(()) => self.stats.presented += 1,
            Err(err) => {
                self.stats.present_failures += 1;
                warn!(frame, %err, "present failed, frame dropped");
            }
        }
        pixels
    }

    fn transfer_inline(&mut self, job: TransferJob) {
        self.stats.inline += 1;
        let pixels = self.present(job.run());
        self.returned = Some(pixels);
    }

    fn spawn_worker(&mut self, job: TransferJob) -> Result<(), RuntimeError> {
        let frame = job.frame;
        if let Err(err) = self.job_tx.try_send(job) {
            self.transfer_inline(err.into_inner());
            return Ok(());
        }

        let jobs = self.job_rx.clone();
        let done = self.done_tx.clone();
        let task: Task = Box::new(move || {
            if let Ok(job) = jobs.recv() {
                let _ = done.send(job.run());
            }
        });

        match self.spawner.spawn(frame, task) {
            Ok(handle) => {
                self.stats.overlapped += 1;
                self.in_flight = Some(InFlight { frame, handle });
                Ok(())
            }
            Err(err) => {
                self.stats.spawn_failures += 1;
                debug!(frame, %err, "transfer worker spawn failed, copying inline");
                match self.job_rx.try_recv() {
                    Ok(job) => {
                        self.transfer_inline(job);
                        Ok(())
                    }
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                        error!(frame, "transfer job vanished with the failed worker");
                        Err(RuntimeError::TransferWorkerLost { frame })
                    }
                }
            }
        }
    }
}

impl<D, S> Drop for RenderDispatcher<D, S> {
    fn drop(&mut self) {
        if let Some(InFlight { handle, .. }) = self.in_flight.take() {
            let _ = handle.join();
        }
    }
}

fn effective_mode(requested: TransferMode) -> TransferMode {
    if requested != TransferMode::Overlapped {
        return requested;
    }
    match thread::available_parallelism() {
        Ok(cores) if cores.get() == 1 => {
            warn!("single core host, transferring frames synchronously");
            TransferMode::Synchronous
        }
        Ok(_) => requested,
        Err(err) => {
            debug!(%err, "core count unavailable, keeping overlapped transfers");
            requested
        }
    }
}
