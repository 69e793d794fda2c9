//! Frame timing.

use std::time::{Duration, Instant};

/// Measures wall time between frames.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    last: Instant,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self { last: now }
    }

    /// Returns time since the previous call (or construction) and restarts.
    pub fn restart(&mut self) -> Duration {
        self.restart_at(Instant::now())
    }

    pub fn restart_at(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed
    }

    /// Time since the last restart, without restarting.
    pub fn peek(&self) -> Duration {
        self.last.elapsed()
    }
}

/// Frames-per-second over one-second windows.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn starting_at(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0,
        }
    }

    /// Counts one frame. When a full window has passed, the previous window's
    /// count becomes the published rate.
    pub fn record_frame_at(&mut self, now: Instant) {
        if now.saturating_duration_since(self.window_start) >= Self::WINDOW {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start = now;
        }
        self.frames += 1;
    }

    pub fn record_frame(&mut self) {
        self.record_frame_at(Instant::now());
    }

    /// Last published rate.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_reports_gap() {
        let t0 = Instant::now();
        let mut clock = SimulationClock::starting_at(t0);
        assert_eq!(
            clock.restart_at(t0 + Duration::from_millis(16)),
            Duration::from_millis(16)
        );
        assert_eq!(
            clock.restart_at(t0 + Duration::from_millis(20)),
            Duration::from_millis(4)
        );
        // Time going backwards never yields a negative gap.
        assert_eq!(clock.restart_at(t0), Duration::ZERO);
    }

    #[test]
    fn fps_publishes_after_full_window() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::starting_at(t0);
        for i in 0..30 {
            fps.record_frame_at(t0 + Duration::from_millis(i * 33));
        }
        assert_eq!(fps.fps(), 0);
        fps.record_frame_at(t0 + Duration::from_millis(1000));
        assert_eq!(fps.fps(), 30);
    }
}
