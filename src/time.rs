//! Frame clock for the render loop.
//!
//! Elapsed time is the sum of frame deltas rather than wall-clock time since
//! start, so pausing (while the window is hidden) simply stops the sum and
//! the fly-through resumes without a jump. A fixed delta makes the clock fully
//! deterministic, which the tests and the static single-frame path rely on.
//!
//! The sum is kept in `f64`. An `f32` second counter loses millisecond
//! resolution within a day; callers that need full precision read
//! [`Time::elapsed_precise`].
//!
//! ```ignore
//! let mut time = Time::new();
//!
//! // Once per frame:
//! let (elapsed, delta) = time.update();
//! ```

use std::time::Instant;

/// Longest delta a single frame may contribute, in seconds.
///
/// Keeps a stalled frame (debugger, suspended laptop) from fast-forwarding
/// the fly-through.
const MAX_DELTA: f32 = 0.25;

/// Time tracking for the render loop.
#[derive(Debug)]
pub struct Time {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Accumulated frame time in seconds.
    elapsed_secs: f64,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Whether time is paused.
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
}

impl Time {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            fixed_delta: None,
        }
    }

    /// A clock that advances by exactly `delta` seconds per update.
    pub fn fixed(delta: f32) -> Self {
        let mut time = Self::new();
        time.set_fixed_delta(Some(delta));
        time
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed(), self.delta_secs);
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta).min(MAX_DELTA);
        self.last_frame = now;

        self.elapsed_secs += self.delta_secs as f64;
        self.frame_count += 1;

        (self.elapsed(), self.delta_secs)
    }

    /// Total accumulated time in seconds, narrowed to `f32`.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs as f32
    }

    /// Total accumulated time in seconds at full precision.
    #[inline]
    pub fn elapsed_precise(&self) -> f64 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds (delta time).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause time progression.
    ///
    /// While paused, `delta()` returns 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    /// Set a fixed delta time for deterministic updates.
    ///
    /// Pass `None` to use real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.elapsed(), 0.0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_time_update() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_time_pause() {
        let mut time = Time::fixed(0.5);
        time.update();

        time.pause();
        assert!(time.is_paused());

        let elapsed_before = time.elapsed();
        time.update();

        // Elapsed should not increase while paused
        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(time.delta(), 0.0);
        assert_eq!(time.frame(), 1);

        time.resume();
        time.update();
        assert_eq!(time.elapsed(), 0.5 + 0.5);
    }

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::fixed(1.0 / 60.0);

        thread::sleep(Duration::from_millis(50));
        time.update();

        // Should use fixed delta regardless of actual time
        let expected = 1.0 / 60.0;
        assert!((time.delta() - expected).abs() < 0.0001);
    }

    #[test]
    fn test_long_runs_keep_sub_millisecond_steps() {
        // A day and a bit of 0.25 s frames, all exactly representable.
        let mut time = Time::fixed(0.25);
        for _ in 0..350_000 {
            time.update();
        }
        assert_eq!(time.elapsed_precise(), 87_500.0);

        time.set_fixed_delta(Some(0.001));
        time.update();
        let step = time.elapsed_precise() - 87_500.0;
        assert!((step - 0.001).abs() < 1e-6, "step = {step}");
    }

    #[test]
    fn test_delta_is_capped() {
        let mut time = Time::fixed(3.0);
        time.update();
        assert_eq!(time.delta(), MAX_DELTA);
    }
}
