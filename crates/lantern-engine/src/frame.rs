//! Fixed-period frame scheduling.
//!
//! Each deadline is computed from the previous frame's scheduled start,
//! not from when the loop happened to wake, so wakeup jitter never
//! accumulates into drift. A frame whose work runs past the next
//! deadline is behind schedule: the next frame starts immediately. One
//! that starts a full period or more late resynchronizes to the current
//! time instead of bursting to catch up.

use std::time::{Duration, Instant};

/// When the next frame is due.
#[derive(Clone, Debug)]
pub struct FrameClock {
    period: Duration,
    next: Instant,
}

/// The start of one frame, as reported by [`FrameClock::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStart {
    /// How far past its deadline the frame started.
    pub lateness: Duration,
    /// Whether the frame was late enough to be rescheduled from now.
    pub resynced: bool,
}

impl FrameClock {
    /// A clock ticking at `rate_hz` whose first frame is due at `start`.
    ///
    /// `rate_hz` must be finite and positive; see
    /// [`EngineConfig::validate`](crate::EngineConfig::validate).
    pub fn new(rate_hz: f64, start: Instant) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / rate_hz),
            next: start,
        }
    }

    /// Time between frames.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the next frame is due.
    pub fn deadline(&self) -> Instant {
        self.next
    }

    /// Time left before the next frame, or `None` if it is already due.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next.checked_duration_since(now).filter(|d| !d.is_zero())
    }

    /// How far `now` is past the next deadline, if it has already passed.
    ///
    /// Checked once a frame's work is done: `Some` means the frame is
    /// behind schedule and the next one runs without waiting.
    pub fn overdue(&self, now: Instant) -> Option<Duration> {
        now.checked_duration_since(self.next)
    }

    /// Start a frame at `now` and schedule the next one.
    pub fn begin(&mut self, now: Instant) -> FrameStart {
        let lateness = now.saturating_duration_since(self.next);
        let resynced = lateness >= self.period;
        let start = if resynced { now } else { self.next };
        self.next = start + self.period;
        FrameStart { lateness, resynced }
    }
}
