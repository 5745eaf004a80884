//! The simulation engine as seen by the loop.

use cadence_core::{controller::ControllerState, video::PixelBuffer};

/// Pull-style producer of signed 8-bit mono samples.
///
/// Called from the audio backend's thread, never from the loop.
pub trait AudioSource: Send {
    /// Told once the output device is open.
    fn prepare(&mut self, _sample_rate: u32) {}

    /// Fill `out` completely. Silence is `0`.
    fn fill(&mut self, out: &mut [i8]);
}

/// Game-simulation engine driven once per frame.
///
/// The loop calls `update` then `render`, each exactly once per iteration, and
/// never both at the same time. There is no per-frame error path: an engine that
/// cannot continue should render whatever it has.
pub trait Engine {
    /// Return to the initial state. Triggered by the reset system action.
    fn reset(&mut self);

    /// Advance one frame with the controller as sampled this frame.
    fn update(&mut self, controller: &ControllerState);

    /// Write every pixel of the frame.
    fn render(&mut self, pixels: &mut PixelBuffer);

    /// Hand the engine's sample producer to the audio backend. Called at most once,
    /// before the loop starts.
    fn take_audio_source(&mut self) -> Option<Box<dyn AudioSource>> {
        None
    }
}

impl<T: Engine + ?Sized> Engine for Box<T> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn update(&mut self, controller: &ControllerState) {
        (**self).update(controller)
    }

    fn render(&mut self, pixels: &mut PixelBuffer) {
        (**self).render(pixels)
    }

    fn take_audio_source(&mut self) -> Option<Box<dyn AudioSource>> {
        (**self).take_audio_source()
    }
}
