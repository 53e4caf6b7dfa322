use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub slowest_frame_ms: f32,
    /// Frames whose delta exceeded the step clamp during the interval.
    pub clamped_frames: u32,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    clamped_frames: u32,
    frame_time_sum: Duration,
    slowest_frame: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval_start: start,
            interval,
            frames: 0,
            clamped_frames: 0,
            frame_time_sum: Duration::ZERO,
            slowest_frame: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, was_clamped: bool) {
        self.frames = self.frames.saturating_add(1);
        if was_clamped {
            self.clamped_frames = self.clamped_frames.saturating_add(1);
        }
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.slowest_frame = self.slowest_frame.max(frame_dt);
    }

    /// Emits a snapshot once per interval and starts the next one.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            frame_time_ms,
            slowest_frame_ms: self.slowest_frame.as_secs_f32() * 1000.0,
            clamped_frames: self.clamped_frames,
        };

        self.interval_start = now;
        self.frames = 0;
        self.clamped_frames = 0;
        self.frame_time_sum = Duration::ZERO;
        self.slowest_frame = Duration::ZERO;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_computes_expected_values() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), base);
        accumulator.record_frame(Duration::from_millis(16), false);
        accumulator.record_frame(Duration::from_millis(24), false);
        accumulator.record_frame(Duration::from_millis(80), true);

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("snapshot should be emitted");

        assert!((snapshot.fps - 3.0).abs() < 0.05);
        assert!((snapshot.frame_time_ms - 40.0).abs() < 0.001);
        assert!((snapshot.slowest_frame_ms - 80.0).abs() < 0.001);
        assert_eq!(snapshot.clamped_frames, 1);
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), base);
        accumulator.record_frame(Duration::from_millis(16), false);
        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500))
            .is_none());
    }

    #[test]
    fn counters_reset_after_snapshot() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), base);
        accumulator.record_frame(Duration::from_millis(16), true);
        accumulator.maybe_snapshot(base + Duration::from_secs(1));
        let next = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("second interval");
        assert_eq!(next.fps, 0.0);
        assert_eq!(next.clamped_frames, 0);
    }
}
