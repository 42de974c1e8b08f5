//! Fixed-step frame clock.
//!
//! Animation time advances by a constant nominal step per rendered frame
//! instead of the measured wall-clock delta, so playback speed does not
//! follow frame-rate jitter. Wall-clock time is still tracked for
//! diagnostics.

use std::time::{Duration, Instant};

/// Nominal animation step per frame, in seconds.
pub const DEFAULT_FIXED_STEP: f32 = 1.0 / 90.0;

/// Counts frames and hands out the fixed animation step.
#[derive(Debug)]
pub struct FrameClock {
    step: f32,
    frames: u64,
    start: Instant,
}

impl FrameClock {
    /// Create a clock that advances by `step` seconds per frame.
    pub fn new(step: f32) -> Self {
        Self {
            step,
            frames: 0,
            start: Instant::now(),
        }
    }

    /// The nominal step in seconds.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Record one frame and return the animation delta for it.
    pub fn tick(&mut self) -> f32 {
        self.frames += 1;
        self.step
    }

    /// Number of frames ticked since creation or the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total animation time handed out so far.
    pub fn animation_time(&self) -> f32 {
        self.frames as f32 * self.step
    }

    /// Wall-clock time since creation or the last reset.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Average frames per second over the wall-clock lifetime.
    pub fn average_fps(&self) -> f32 {
        let secs = self.elapsed().as_secs_f32();
        if secs > 0.0 {
            self.frames as f32 / secs
        } else {
            0.0
        }
    }

    /// Reset frame count and wall-clock origin.
    pub fn reset(&mut self) {
        self.frames = 0;
        self.start = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_returns_fixed_step() {
        let mut clock = FrameClock::new(0.5);
        assert_eq!(clock.tick(), 0.5);
        assert_eq!(clock.tick(), 0.5);
        assert_eq!(clock.frames(), 2);
        assert!((clock.animation_time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_step() {
        let clock = FrameClock::default();
        assert!((clock.step() - 1.0 / 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut clock = FrameClock::default();
        clock.tick();
        clock.reset();
        assert_eq!(clock.frames(), 0);
        assert_eq!(clock.animation_time(), 0.0);
    }
}
