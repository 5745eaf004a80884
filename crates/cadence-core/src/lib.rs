//! Building blocks of the frame loop: bulk copy, controller input, frame pacing and
//! pixel surfaces. Nothing in this crate spawns threads or talks to a platform.

pub mod clock;
pub mod controller;
pub mod copy;
pub mod error;
pub mod input;
pub mod video;

pub use clock::{FrameClock, ManualTime, MonotonicTime, Pace, Tick, TimeSource};
pub use controller::{Button, Buttons, ControllerState};
pub use error::Error;
pub use input::{InputSampler, InputSnapshot, InputSource, KeyMap, SystemActions};
pub use video::{ColorFormat, PixelBuffer, Surface};
