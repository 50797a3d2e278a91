//! Integration tests for the frame pipeline.
//!
//! A recording sink stands in for the GPU so ordering, scheduling, LOD
//! switching and surface loss can be observed frame by frame.

use warpfield::render_loop::FrameSubmission;
use warpfield::schedule::{ScheduleState, StopReason};
use warpfield::{
    FrameOutcome, FrameSink, LodLevel, MotionMode, ParticleClass, RenderContext, RenderLoop,
    SinkError, SurfaceSize, Time, Vec2, Viewport, WarpConfig,
};

/// What the sink saw for one submitted frame.
#[derive(Debug, Clone)]
struct Recorded {
    elapsed: f32,
    target: SurfaceSize,
    layers: Vec<(ParticleClass, LodLevel, usize)>,
}

#[derive(Default)]
struct RecordingSink {
    configured: Vec<SurfaceSize>,
    frames: Vec<Recorded>,
    /// Errors to return from upcoming submits, front first.
    failures: Vec<SinkError>,
}

impl FrameSink for RecordingSink {
    fn configure(&mut self, size: SurfaceSize) {
        self.configured.push(size);
    }

    fn submit(&mut self, frame: &FrameSubmission<'_>) -> Result<(), SinkError> {
        if !self.failures.is_empty() {
            return Err(self.failures.remove(0));
        }
        self.frames.push(Recorded {
            elapsed: frame.elapsed,
            target: frame.target,
            layers: frame
                .layers
                .iter()
                .map(|l| (l.class, l.lod, l.field.len()))
                .collect(),
        });
        Ok(())
    }
}

fn config() -> WarpConfig {
    let mut config = WarpConfig::for_viewport(true);
    config.stars.particle_count_high = 120;
    config.stars.particle_count_low = 60;
    config.dust.particle_count_high = 160;
    config.dust.particle_count_low = 40;
    config
}

fn viewport() -> Viewport {
    Viewport::new(800.0, 450.0, 3.0)
}

fn render_loop(motion: MotionMode, delta: f32) -> RenderLoop {
    RenderLoop::new(RenderContext::new(config(), 1234, viewport(), motion)).with_time(Time::fixed(delta))
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_dust_is_drawn_before_stars() {
    let mut sink = RecordingSink::default();
    let mut rl = render_loop(MotionMode::Continuous, 1.0 / 60.0);
    rl.start(&mut sink);

    for _ in 0..5 {
        assert_eq!(rl.frame(&mut sink), FrameOutcome::Rendered { next: true });
    }
    for frame in &sink.frames {
        let classes: Vec<_> = frame.layers.iter().map(|l| l.0).collect();
        assert_eq!(classes, vec![ParticleClass::Dust, ParticleClass::Stars]);
    }

    // Elapsed time advances by the fixed delta.
    assert!((sink.frames[4].elapsed - 5.0 / 60.0).abs() < 1e-5);
}

// ============================================================================
// Reduced motion
// ============================================================================

#[test]
fn test_reduced_motion_draws_one_static_frame() {
    let mut sink = RecordingSink::default();
    let mut rl = render_loop(MotionMode::Reduced, 1.0 / 60.0);
    assert!(rl.start(&mut sink));

    assert_eq!(rl.frame(&mut sink), FrameOutcome::Rendered { next: false });
    assert_eq!(rl.frame(&mut sink), FrameOutcome::Idle);
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].elapsed, 0.0);
    assert_eq!(rl.schedule().state(), ScheduleState::Stopped(StopReason::Completed));

    // Becoming visible again does not restart animation.
    assert!(!rl.set_visible(true));

    // A resize re-arms exactly one more static frame.
    assert!(rl.resize(Viewport::new(640.0, 480.0, 1.0), &mut sink));
    assert_eq!(rl.frame(&mut sink), FrameOutcome::Rendered { next: false });
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.frames[1].elapsed, 0.0);
    assert_eq!(sink.frames[1].target, SurfaceSize::new(640, 480));
}

// ============================================================================
// Level of detail
// ============================================================================

#[test]
fn test_slow_frames_switch_lod_and_resolution() {
    let mut sink = RecordingSink::default();
    // 30 fps is below the 48 fps threshold.
    let mut rl = render_loop(MotionMode::Continuous, 1.0 / 30.0);
    rl.start(&mut sink);
    assert_eq!(sink.configured, vec![SurfaceSize::new(1600, 900)]);

    let mut switched_at = None;
    for i in 0..40 {
        rl.frame(&mut sink);
        if switched_at.is_none() && rl.lod() == LodLevel::Low {
            switched_at = Some(i);
        }
    }
    let switched_at = switched_at.expect("governor never dropped to low detail");
    assert!((28..=31).contains(&switched_at), "switched at frame {switched_at}");

    // One reconfiguration, to the low DPR cap.
    assert_eq!(
        sink.configured,
        vec![SurfaceSize::new(1600, 900), SurfaceSize::new(800, 450)]
    );

    // The switching frame already draws low-detail fields at the new size.
    let frame = &sink.frames[switched_at];
    assert_eq!(frame.target, SurfaceSize::new(800, 450));
    let ctx = rl.context();
    for &(class, lod, len) in &frame.layers {
        assert_eq!(lod, LodLevel::Low);
        assert_eq!(len, ctx.fields.layer(class).low.len());
    }
    let before = &sink.frames[switched_at - 1];
    assert!(before.layers.iter().all(|l| l.1 == LodLevel::High));
}

// ============================================================================
// Surface loss
// ============================================================================

#[test]
fn test_surface_loss_stops_until_rebuilt() {
    let mut sink = RecordingSink::default();
    let mut rl = render_loop(MotionMode::Continuous, 1.0 / 60.0);
    rl.start(&mut sink);
    rl.frame(&mut sink);

    sink.failures.push(SinkError::Lost);
    assert_eq!(rl.frame(&mut sink), FrameOutcome::SurfaceLost);
    assert!(rl.is_lost());

    // Nothing restarts a lost loop.
    assert_eq!(rl.frame(&mut sink), FrameOutcome::Idle);
    assert!(!rl.set_visible(true));
    assert!(!rl.start(&mut sink));
    assert_eq!(sink.frames.len(), 1);

    // A rebuilt loop renders again.
    let mut rebuilt = render_loop(MotionMode::Continuous, 1.0 / 60.0);
    assert!(rebuilt.start(&mut sink));
    assert_eq!(rebuilt.frame(&mut sink), FrameOutcome::Rendered { next: true });
}

#[test]
fn test_skipped_frame_keeps_running() {
    let mut sink = RecordingSink::default();
    let mut rl = render_loop(MotionMode::Continuous, 1.0 / 60.0);
    rl.start(&mut sink);

    sink.failures.push(SinkError::Skipped);
    assert_eq!(rl.frame(&mut sink), FrameOutcome::Dropped);
    assert_eq!(rl.frame(&mut sink), FrameOutcome::Rendered { next: true });
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn test_hidden_pauses_clock_and_schedule() {
    let mut sink = RecordingSink::default();
    let mut rl = render_loop(MotionMode::Continuous, 0.1);
    rl.start(&mut sink);
    rl.frame(&mut sink);
    rl.frame(&mut sink);

    assert!(!rl.set_visible(false));
    assert_eq!(rl.frame(&mut sink), FrameOutcome::Idle);
    assert_eq!(sink.frames.len(), 2);

    assert!(rl.set_visible(true));
    rl.frame(&mut sink);

    // No time passed while hidden.
    assert!((sink.frames[2].elapsed - 0.3).abs() < 1e-5);
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn test_pointer_moves_camera_over_frames() {
    let mut sink = RecordingSink::default();
    let mut rl = render_loop(MotionMode::Continuous, 1.0 / 60.0);
    rl.start(&mut sink);

    rl.set_pointer(Vec2::new(1.0, 0.5));
    assert_eq!(rl.camera().ry, 0.0);

    rl.frame(&mut sink);
    let first = rl.camera().ry;
    rl.frame(&mut sink);
    assert!(first > 0.0);
    assert!(rl.camera().ry > first);
    assert!(rl.camera().ry < rl.camera().target_ry);
}
