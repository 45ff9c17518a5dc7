//! Per-frame performance counters for the frame loop.
//!
//! [`FrameMetrics`] is published by the loop thread after every frame and
//! read through [`SceneServer::metrics`](crate::SceneServer::metrics).

use std::time::Duration;

/// Timing and request counters, cumulative since the server started.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Frames rendered.
    pub frames: u64,
    /// Frames whose work ran past the next frame's deadline.
    pub behind_schedule: u64,
    /// Render and sink time of the most recent frame.
    pub last_frame_us: u64,
    /// Longest render and sink time seen.
    pub max_frame_us: u64,
    /// Requests dispatched.
    pub requests: u64,
    /// Requests answered with an error.
    pub rejected_requests: u64,
    /// Universe buffers the sink refused.
    pub sink_errors: u64,
    /// Successful autosaves.
    pub autosaves: u64,
}

impl FrameMetrics {
    /// Record the time one frame took.
    pub fn record_frame(&mut self, elapsed: Duration, behind: bool) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.frames += 1;
        self.last_frame_us = us;
        self.max_frame_us = self.max_frame_us.max(us);
        if behind {
            self.behind_schedule += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        assert_eq!(FrameMetrics::default().frames, 0);
        assert_eq!(FrameMetrics::default().max_frame_us, 0);
    }

    #[test]
    fn record_frame_tracks_max_and_lateness() {
        let mut m = FrameMetrics::default();
        m.record_frame(Duration::from_micros(300), false);
        m.record_frame(Duration::from_micros(100), true);
        assert_eq!(m.frames, 2);
        assert_eq!(m.last_frame_us, 100);
        assert_eq!(m.max_frame_us, 300);
        assert_eq!(m.behind_schedule, 1);
    }
}
