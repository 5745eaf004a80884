//! Wall-clock frame pacing.
//!
//! Frame `n` is due at `epoch + n * D`. Each iteration the clock either sleeps
//! until the current frame is due, lets it run immediately when it is less than
//! one frame late, or, when it has fallen more than one frame behind, moves the
//! epoch to "now" and restarts the frame index. The last case keeps a stall from
//! being followed by a burst of fast-forwarded frames.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::error::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Monotonic time plus the ability to block, abstracted so pacing can run against a
/// simulated clock.
pub trait TimeSource {
    /// Time elapsed since the source's origin.
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// [`Instant`]-backed time with real `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Simulated time. Sleeping advances the clock instantly; clones share the same
/// timeline, so a test can inject stalls from inside the loop.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    nanos: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::AcqRel);
    }

    pub fn set(&self, now: Duration) {
        self.nanos.store(now.as_nanos() as u64, Ordering::Release);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// What the clock decided for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Ahead of schedule; the caller must block this long.
    Sleep(Duration),
    /// Due or late by at most one frame; run immediately.
    OnTime,
    /// Late by more than one frame; the epoch was moved to now.
    Resync { late_by: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Frame index this iteration was scheduled against (0 right after a resync).
    pub frame: u64,
    pub pace: Pace,
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    epoch: Duration,
    frame_index: u64,
    frame_duration: Duration,
    fps: f64,
    frames_total: u64,
    resyncs: u64,
}

impl FrameClock {
    /// Build a clock targeting `fps` frames per second.
    ///
    /// Zero, negative and non-finite rates are rejected here so the loop never
    /// starts with an unusable cadence.
    pub fn from_fps(fps: f64) -> Result<Self, Error> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(Error::InvalidFrameRate { fps });
        }
        // Whole nanoseconds, rounded, so the schedule and the resync threshold use
        // the very same `D`.
        let frame_duration = Duration::from_nanos((1e9 / fps).round() as u64);
        if frame_duration.is_zero() {
            return Err(Error::InvalidFrameRate { fps });
        }
        Ok(Self::new(frame_duration, fps))
    }

    pub fn from_frame_duration(frame_duration: Duration) -> Result<Self, Error> {
        if frame_duration.is_zero() {
            return Err(Error::ZeroFrameDuration);
        }
        Ok(Self::new(frame_duration, 1.0 / frame_duration.as_secs_f64()))
    }

    fn new(frame_duration: Duration, fps: f64) -> Self {
        Self {
            epoch: Duration::ZERO,
            frame_index: 0,
            frame_duration,
            fps,
            frames_total: 0,
            resyncs: 0,
        }
    }

    /// Anchor the schedule at `now`. Call once before the first iteration.
    pub fn start(&mut self, now: Duration) {
        self.epoch = now;
        self.frame_index = 0;
    }

    #[inline]
    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn epoch(&self) -> Duration {
        self.epoch
    }

    /// Index of the next frame to be scheduled.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Frames paced since construction, across resyncs.
    #[inline]
    pub fn frames_total(&self) -> u64 {
        self.frames_total
    }

    #[inline]
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// When the current frame is due: `epoch + frame_index * D`, in integer
    /// nanoseconds.
    pub fn expected(&self) -> Duration {
        let offset = self.frame_duration.as_nanos() * u128::from(self.frame_index);
        let secs = u64::try_from(offset / NANOS_PER_SEC).unwrap_or(u64::MAX);
        // Always below 1e9.
        let nanos = (offset % NANOS_PER_SEC) as u32;
        self.epoch.saturating_add(Duration::new(secs, nanos))
    }

    /// Advance the schedule given the current time. Never blocks; the caller acts on
    /// [`Pace::Sleep`].
    pub fn tick(&mut self, now: Duration) -> Tick {
        let expected = self.expected();
        let pace = if expected > now {
            Pace::Sleep(expected - now)
        } else {
            let late_by = now - expected;
            if late_by > self.frame_duration {
                self.epoch = now;
                self.frame_index = 0;
                self.resyncs += 1;
                debug!(?late_by, resyncs = self.resyncs, "frame clock resynchronised");
                Pace::Resync { late_by }
            } else {
                Pace::OnTime
            }
        };

        let frame = self.frame_index;
        self.frame_index += 1;
        self.frames_total += 1;
        Tick { frame, pace }
    }

    /// Read `time`, advance the schedule and block when ahead of it.
    ///
    /// This is the loop's only intentional suspension point.
    pub fn pace<T: TimeSource>(&mut self, time: &T) -> Tick {
        let tick = self.tick(time.now());
        if let Pace::Sleep(delay) = tick.pace {
            time.sleep(delay);
        }
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Duration = Duration::from_millis(10);

    fn clock() -> FrameClock {
        let mut clock = FrameClock::from_frame_duration(D).expect("non-zero duration");
        clock.start(Duration::ZERO);
        clock
    }

    #[test]
    fn rejects_unusable_rates() {
        for fps in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            assert!(FrameClock::from_fps(fps).is_err(), "fps={fps}");
        }
        assert_eq!(
            FrameClock::from_frame_duration(Duration::ZERO).unwrap_err(),
            Error::ZeroFrameDuration
        );
        assert!(FrameClock::from_fps(60.0).is_ok());
    }

    #[test]
    fn sleeps_when_ahead() {
        let mut clock = clock();
        assert_eq!(clock.tick(Duration::ZERO).pace, Pace::OnTime);
        let tick = clock.tick(Duration::from_millis(4));
        assert_eq!(tick.frame, 1);
        assert_eq!(tick.pace, Pace::Sleep(Duration::from_millis(6)));
    }

    #[test]
    fn index_advances_by_one_while_within_a_frame_of_schedule() {
        let mut clock = clock();
        for i in 0..100u64 {
            // Anywhere from on time to just under one frame late.
            let lateness = Duration::from_micros((i * 997) % 10_000);
            let now = D * i as u32 + lateness;
            let tick = clock.tick(now);
            assert_eq!(tick.frame, i);
            assert!(!matches!(tick.pace, Pace::Resync { .. }), "frame {i}");
            assert_eq!(clock.frame_index(), i + 1);
        }
        assert_eq!(clock.resyncs(), 0);
    }

    #[test]
    fn one_jump_causes_exactly_one_resync() {
        let mut clock = clock();
        for i in 0..5u32 {
            clock.tick(D * i);
        }

        let jump = D * 5 + D + Duration::from_millis(1);
        let tick = clock.tick(jump);
        assert_eq!(tick.frame, 0);
        assert!(matches!(tick.pace, Pace::Resync { .. }));
        assert_eq!(clock.epoch(), jump);
        assert_eq!(clock.resyncs(), 1);

        for i in 1..20u32 {
            let tick = clock.tick(jump + D * i);
            assert_eq!(tick.frame, u64::from(i));
            assert_eq!(tick.pace, Pace::OnTime);
        }
        assert_eq!(clock.resyncs(), 1);
        assert_eq!(clock.frames_total(), 25);
    }

    #[test]
    fn sixty_fps_frames_exactly_one_frame_late_never_resync() {
        let mut clock = FrameClock::from_fps(60.0).expect("valid rate");
        clock.start(Duration::ZERO);
        let d = clock.frame_duration();
        assert_eq!(d, Duration::from_nanos(16_666_667));

        for i in 0..600u32 {
            let tick = clock.tick(d * i + d);
            assert_eq!(tick.pace, Pace::OnTime, "frame {i}");
        }
        assert_eq!(clock.resyncs(), 0);
        assert_eq!(clock.expected(), d * 600);
    }

    #[test]
    fn pace_blocks_on_the_time_source() {
        let time = ManualTime::new();
        let mut clock = clock();
        clock.pace(&time);
        clock.pace(&time);
        assert_eq!(time.now(), D);
        time.advance(Duration::from_millis(3));
        clock.pace(&time);
        assert_eq!(time.now(), D * 2);
    }
}
