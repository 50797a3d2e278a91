//! Frame-rate driven level-of-detail governor.
//!
//! The governor counts frames over fixed windows (one second by default).
//! At each window boundary it computes the FPS and may switch detail level:
//!
//! ```text
//!            fps < low_threshold
//!   High  ─────────────────────────▶  Low
//!         ◀─────────────────────────
//!            fps > high_threshold
//! ```
//!
//! The thresholds form a hysteresis band, so one noisy window near a
//! boundary cannot make the level flap. Nothing changes between boundaries.

use crate::config::GovernorConfig;

/// Active level of detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LodLevel {
    /// Full particle counts, higher resolution cap.
    #[default]
    High,
    /// Thinned particle fields, lower resolution cap.
    Low,
}

/// A level change, carrying the resolution cap that goes with the new level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodTransition {
    pub from: LodLevel,
    pub to: LodLevel,
    /// Device pixel ratio ceiling for the new level.
    pub dpr_cap: f64,
}

/// Frame counter for one sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfWindow {
    /// Frames rendered since `window_start`.
    pub frame_count: u32,
    /// Start of the window, in seconds on the frame clock.
    pub window_start: f64,
}

impl PerfWindow {
    pub fn new(window_start: f64) -> Self {
        Self {
            frame_count: 0,
            window_start,
        }
    }

    /// FPS over the window if it ended at `now`.
    pub fn fps(&self, now: f64) -> f32 {
        let elapsed = now - self.window_start;
        if elapsed <= 0.0 {
            return 0.0;
        }
        (self.frame_count as f64 / elapsed) as f32
    }
}

/// Hysteresis state machine switching between [`LodLevel`]s.
#[derive(Debug, Clone)]
pub struct PerformanceGovernor {
    config: GovernorConfig,
    level: LodLevel,
    window: PerfWindow,
    last_fps: Option<f32>,
    frozen: bool,
}

impl PerformanceGovernor {
    /// Start in [`LodLevel::High`] with an empty window at time zero.
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            level: LodLevel::High,
            window: PerfWindow::new(0.0),
            last_fps: None,
            frozen: false,
        }
    }

    /// A governor pinned to [`LodLevel::High`] that never evaluates.
    ///
    /// Used for reduced motion, where only one frame is drawn.
    pub fn frozen(config: GovernorConfig) -> Self {
        Self {
            frozen: true,
            ..Self::new(config)
        }
    }

    /// Current level.
    #[inline]
    pub fn level(&self) -> LodLevel {
        self.level
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// FPS measured in the most recent completed window.
    #[inline]
    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    /// Resolution cap for the current level.
    pub fn dpr_cap(&self) -> f64 {
        self.dpr_cap_for(self.level)
    }

    pub fn dpr_cap_for(&self, level: LodLevel) -> f64 {
        match level {
            LodLevel::High => self.config.dpr_cap_high,
            LodLevel::Low => self.config.dpr_cap_low,
        }
    }

    /// Restart the sampling window at `now` (e.g. after a pause).
    pub fn restart_window(&mut self, now: f64) {
        self.window = PerfWindow::new(now);
    }

    /// Count one rendered frame at time `now` (seconds).
    ///
    /// Returns a transition only when this frame closes a window and the
    /// window's FPS crosses a threshold.
    pub fn record_frame(&mut self, now: f64) -> Option<LodTransition> {
        if self.frozen {
            return None;
        }

        self.window.frame_count += 1;
        if now - self.window.window_start < self.config.window_secs as f64 {
            return None;
        }

        let fps = self.window.fps(now);
        self.window = PerfWindow::new(now);
        self.observe_fps(fps)
    }

    /// Evaluate one completed window's FPS.
    pub fn observe_fps(&mut self, fps: f32) -> Option<LodTransition> {
        if self.frozen {
            return None;
        }
        self.last_fps = Some(fps);

        let next = match self.level {
            LodLevel::High if fps < self.config.low_fps_threshold => LodLevel::Low,
            LodLevel::Low if fps > self.config.high_fps_threshold => LodLevel::High,
            _ => return None,
        };

        let transition = LodTransition {
            from: self.level,
            to: next,
            dpr_cap: self.dpr_cap_for(next),
        };
        self.level = next;

        log::info!(
            "lod {:?} -> {:?} at {:.1} fps (dpr cap {:.2})",
            transition.from,
            transition.to,
            fps,
            transition.dpr_cap
        );
        Some(transition)
    }
}
