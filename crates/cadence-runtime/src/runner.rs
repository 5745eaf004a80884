//! The frame loop.
//!
//! One iteration, in order:
//! 1. poll input once and fold the edges into the controller state
//! 2. `Engine::update`
//! 3. take the buffer back from the previous transfer, presenting it first if a
//!    worker was still copying it
//! 4. `Engine::render` into that buffer
//! 5. hand the buffer to the dispatcher; an inline copy is presented right here
//! 6. pace against the frame clock

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::info;

use cadence_core::{
    clock::{FrameClock, MonotonicTime, Tick, TimeSource},
    controller::ControllerState,
    input::{InputSampler, InputSource, SystemActions},
    video::{PixelBuffer, Surface},
};

use crate::{
    dispatch::{RenderDispatcher, Spawner, ThreadSpawner},
    display::Display,
    engine::Engine,
    types::{LoopStats, RuntimeConfig, RuntimeError},
};

/// Cloneable request to stop the loop after the current iteration.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Ran(Tick),
    /// Quit was requested by input; nothing was updated or rendered.
    Quit,
}

/// Loop context: owns every piece of per-run state.
pub struct Runner<E, I, D, T = MonotonicTime, S = ThreadSpawner> {
    engine: E,
    input: InputSampler<I>,
    controller: ControllerState,
    clock: FrameClock,
    time: T,
    dispatcher: RenderDispatcher<D, S>,
    /// The buffer the engine renders into when no transfer is holding it.
    pixels: Option<PixelBuffer>,
    stop: StopHandle,
    frame_limit: Option<u64>,
    frames: u64,
    started: bool,
}

impl<E: Engine, I: InputSource, D: Display> Runner<E, I, D> {
    pub fn new(
        config: RuntimeConfig,
        engine: E,
        input: I,
        display: D,
        surface: Surface,
    ) -> Result<Self, RuntimeError> {
        let spawner = ThreadSpawner::new(config.worker_stack_size);
        Runner::with_parts(
            config,
            engine,
            input,
            display,
            surface,
            MonotonicTime::new(),
            spawner,
        )
    }
}

impl<E, I, D, T, S> Runner<E, I, D, T, S>
where
    E: Engine,
    I: InputSource,
    D: Display,
    T: TimeSource,
    S: Spawner,
{
    /// Build a runner with an explicit time source and worker spawner.
    pub fn with_parts(
        config: RuntimeConfig,
        engine: E,
        input: I,
        display: D,
        surface: Surface,
        time: T,
        spawner: S,
    ) -> Result<Self, RuntimeError> {
        let clock = FrameClock::from_fps(config.frame_rate).map_err(RuntimeError::Config)?;
        let pixels = PixelBuffer::new(surface.width(), surface.height());
        let dispatcher = RenderDispatcher::with_spawner(display, surface, config.transfer, spawner);

        Ok(Self {
            engine,
            input: InputSampler::new(input, config.key_map),
            controller: ControllerState::new(),
            clock,
            time,
            dispatcher,
            pixels: Some(pixels),
            stop: StopHandle::new(),
            frame_limit: config.frame_limit,
            frames: 0,
            started: false,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn display(&self) -> &D {
        self.dispatcher.display()
    }

    pub fn controller(&self) -> &ControllerState {
        &self.controller
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn stats(&self) -> LoopStats {
        let dispatch = self.dispatcher.stats();
        LoopStats {
            frames: self.clock.frames_total(),
            resyncs: self.clock.resyncs(),
            presented: dispatch.presented,
            overlapped_transfers: dispatch.overlapped,
            inline_transfers: dispatch.inline,
            spawn_failures: dispatch.spawn_failures,
            transfer_failures: dispatch.transfer_failures,
            present_failures: dispatch.present_failures,
        }
    }

    /// Run one iteration of the loop.
    pub fn run_frame(&mut self) -> Result<FrameOutcome, RuntimeError> {
        if !self.started {
            self.clock.start(self.time.now());
            self.started = true;
        }

        let actions = self.input.sample(&mut self.controller);
        if actions.contains(SystemActions::QUIT) {
            return Ok(FrameOutcome::Quit);
        }
        if actions.contains(SystemActions::RESET) {
            info!(frame = self.frames, "engine reset requested");
            self.engine.reset();
        }

        self.engine.update(&self.controller);

        let mut pixels = match self.dispatcher.complete()? {
            Some(pixels) => pixels,
            None => self
                .pixels
                .take()
                .ok_or(RuntimeError::TransferWorkerLost { frame: self.frames })?,
        };
        self.engine.render(&mut pixels);
        self.dispatcher.submit(self.frames, pixels)?;
        self.frames += 1;

        Ok(FrameOutcome::Ran(self.clock.pace(&self.time)))
    }

    /// Run until quit is requested, the stop handle fires or the frame limit is
    /// reached, then finish the in-flight transfer.
    pub fn run(&mut self) -> Result<LoopStats, RuntimeError> {
        info!(
            fps = self.clock.fps(),
            transfer = ?self.dispatcher.mode(),
            limit = ?self.frame_limit,
            "frame loop starting"
        );

        while !self.should_stop() {
            if self.run_frame()? == FrameOutcome::Quit {
                info!(frame = self.frames, "quit requested");
                break;
            }
        }

        let stats = self.finish()?;
        info!(
            frames = stats.frames,
            presented = stats.presented,
            resyncs = stats.resyncs,
            spawn_failures = stats.spawn_failures,
            present_failures = stats.present_failures,
            "frame loop stopped"
        );
        Ok(stats)
    }

    /// Wait for a transfer still in flight and present it. Idempotent.
    pub fn finish(&mut self) -> Result<LoopStats, RuntimeError> {
        if let Some(pixels) = self.dispatcher.complete()? {
            self.pixels = Some(pixels);
        }
        Ok(self.stats())
    }

    fn should_stop(&self) -> bool {
        self.stop.is_stopped() || self.frame_limit.is_some_and(|limit| self.frames >= limit)
    }
}
