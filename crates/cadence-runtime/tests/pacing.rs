use std::time::Duration;

use cadence_core::{
    clock::{ManualTime, Pace, TimeSource},
    controller::ControllerState,
    input::NullInput,
    video::{ColorFormat, PixelBuffer, Surface},
};
use cadence_runtime::{
    Engine, FrameOutcome, HeadlessDisplay, RuntimeConfig, Runner, ThreadSpawner, TransferMode,
};

const RUN_FOR: Duration = Duration::from_secs(10);
const STALL_AT: Duration = Duration::from_secs(5);
const STALL: Duration = Duration::from_millis(100);

/// Engine that optionally blocks the loop once, by advancing simulated time from
/// inside `update`.
struct Stalling {
    time: ManualTime,
    stall_pending: bool,
    frames: u32,
}

impl Engine for Stalling {
    fn reset(&mut self) {
        self.frames = 0;
    }

    fn update(&mut self, _controller: &ControllerState) {
        if self.stall_pending && self.time.now() >= STALL_AT {
            self.stall_pending = false;
            self.time.advance(STALL);
        }
        self.frames += 1;
    }

    fn render(&mut self, pixels: &mut PixelBuffer) {
        pixels.fill(self.frames);
    }
}

fn run_for_ten_seconds(stall: bool, transfer: TransferMode) -> anyhow::Result<(u64, u64, u64)> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let time = ManualTime::new();
    let engine = Stalling {
        time: time.clone(),
        stall_pending: stall,
        frames: 0,
    };
    let config = RuntimeConfig {
        frame_rate: 60.0,
        transfer,
        ..RuntimeConfig::default()
    };
    let surface = Surface::new(64, 60, ColorFormat::Rgb565)?;
    let mut runner = Runner::with_parts(
        config,
        engine,
        NullInput,
        HeadlessDisplay::new(),
        surface,
        time.clone(),
        ThreadSpawner::default(),
    )?;

    let mut resync_frames = Vec::new();
    while time.now() < RUN_FOR {
        if let FrameOutcome::Ran(tick) = runner.run_frame()? {
            if let Pace::Resync { .. } = tick.pace {
                resync_frames.push(tick.frame);
            }
        }
    }
    let stats = runner.finish()?;

    assert!(resync_frames.iter().all(|&frame| frame == 0));
    assert_eq!(stats.presented, stats.frames);
    Ok((stats.frames, stats.resyncs, resync_frames.len() as u64))
}

#[test]
fn ten_seconds_at_sixty_fps() -> anyhow::Result<()> {
    let (frames, resyncs, _) = run_for_ten_seconds(false, TransferMode::Overlapped)?;
    assert!((599..=601).contains(&frames), "frames = {frames}");
    assert_eq!(resyncs, 0);
    Ok(())
}

#[test]
fn one_stall_causes_one_resync_and_no_catch_up() -> anyhow::Result<()> {
    let (frames, resyncs, observed) = run_for_ten_seconds(true, TransferMode::Synchronous)?;
    assert_eq!(resyncs, 1);
    assert_eq!(observed, 1);

    // A 100 ms stall is six frames at 60 fps; no more than that may be lost.
    let lost = 601 - frames.min(601);
    assert!(lost <= 7, "frames = {frames}");
    assert!(frames < 601, "a stalled run cannot produce the full frame count");
    Ok(())
}
