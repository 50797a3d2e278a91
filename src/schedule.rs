//! Cancellable frame scheduling.
//!
//! The render loop never reschedules itself implicitly. It owns a
//! [`FrameSchedule`] and asks it, at the end of every frame, whether another
//! frame should be requested from the host.

/// Why scheduling stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The host reported the output as hidden or occluded.
    Hidden,
    /// Reduced motion: the single static frame has been drawn.
    Completed,
    /// The rendering surface was lost; an explicit rebuild is required.
    SurfaceLost,
}

/// Scheduling state of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// Created but never started.
    Idle,
    /// Frames are being requested.
    Running,
    Stopped(StopReason),
}

/// Start/stop handle for frame requests.
#[derive(Debug, Clone)]
pub struct FrameSchedule {
    state: ScheduleState,
}

impl FrameSchedule {
    pub fn new() -> Self {
        Self {
            state: ScheduleState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> ScheduleState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == ScheduleState::Running
    }

    /// Begin (or resume) requesting frames.
    ///
    /// Returns `false` when the schedule is terminal (static frame done or
    /// surface lost) and cannot be restarted.
    pub fn start(&mut self) -> bool {
        match self.state {
            ScheduleState::Idle | ScheduleState::Running | ScheduleState::Stopped(StopReason::Hidden) => {
                self.state = ScheduleState::Running;
                true
            }
            ScheduleState::Stopped(_) => false,
        }
    }

    /// Stop requesting frames.
    ///
    /// A terminal stop (`Completed`, `SurfaceLost`) is never downgraded to
    /// `Hidden`.
    pub fn stop(&mut self, reason: StopReason) {
        if let ScheduleState::Stopped(StopReason::Completed | StopReason::SurfaceLost) = self.state {
            if reason == StopReason::Hidden {
                return;
            }
        }
        self.state = ScheduleState::Stopped(reason);
    }
}

impl Default for FrameSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_resume() {
        let mut s = FrameSchedule::new();
        assert_eq!(s.state(), ScheduleState::Idle);
        assert!(!s.is_running());

        assert!(s.start());
        assert!(s.is_running());

        s.stop(StopReason::Hidden);
        assert_eq!(s.state(), ScheduleState::Stopped(StopReason::Hidden));

        assert!(s.start());
        assert!(s.is_running());
    }

    #[test]
    fn test_terminal_stops_cannot_restart() {
        for reason in [StopReason::Completed, StopReason::SurfaceLost] {
            let mut s = FrameSchedule::new();
            s.start();
            s.stop(reason);
            assert!(!s.start());
            assert_eq!(s.state(), ScheduleState::Stopped(reason));

            s.stop(StopReason::Hidden);
            assert_eq!(s.state(), ScheduleState::Stopped(reason));
        }
    }
}
