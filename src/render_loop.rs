//! The per-frame pipeline.
//!
//! [`RenderLoop::frame`] runs one frame: advance the clock and camera, build
//! the per-layer projection parameters, sample the governor (switching LOD
//! and output resolution together when it transitions), then hand the dust
//! layer and the star layer, in that order, to a [`FrameSink`].
//!
//! The loop never schedules itself. The host asks it for a frame whenever
//! the previous one returned [`FrameOutcome::Rendered`] with `next: true`.
//!
//! ```ignore
//! let context = RenderContext::new(config, seed, viewport, MotionMode::Continuous);
//! let mut render_loop = RenderLoop::new(context);
//! render_loop.start(&mut sink);
//!
//! // On every redraw:
//! match render_loop.frame(&mut sink) {
//!     FrameOutcome::Rendered { next: true } | FrameOutcome::Dropped => window.request_redraw(),
//!     FrameOutcome::SurfaceLost => rebuild(),
//!     _ => {}
//! }
//! ```

use crate::camera::CameraState;
use crate::config::{LayerConfig, WarpConfig};
use crate::error::SinkError;
use crate::field::{Field, FieldSet, ParticleClass};
use crate::governor::{LodLevel, PerformanceGovernor};
use crate::projector::DepthFlythroughProjector;
use crate::schedule::{FrameSchedule, ScheduleState, StopReason};
use crate::shader::LayerUniforms;
use crate::time::Time;
use crate::viewport::{SurfaceSize, Viewport};
use glam::{Mat4, Vec2};

/// Near clip plane as a fraction of `z_min`.
const NEAR_PLANE_FACTOR: f32 = 0.5;
/// Far clip plane as a multiple of `z_max`.
const FAR_PLANE_FACTOR: f32 = 1.5;

/// Whether the backdrop animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    #[default]
    Continuous,
    /// Draw one static frame at `elapsed = 0` and stop.
    Reduced,
}

/// Everything a frame reads but never mutates: configuration, generated
/// fields and the host's viewport.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub config: WarpConfig,
    pub fields: FieldSet,
    pub projector: DepthFlythroughProjector,
    pub viewport: Viewport,
    pub motion: MotionMode,
}

impl RenderContext {
    /// Generate the fields for `config` and `seed`.
    pub fn new(config: WarpConfig, seed: u64, viewport: Viewport, motion: MotionMode) -> Self {
        let fields = FieldSet::generate(&config, seed);
        let projector = DepthFlythroughProjector::from(&config.flythrough);
        Self {
            config,
            fields,
            projector,
            viewport,
            motion,
        }
    }

    pub fn layer_config(&self, class: ParticleClass) -> &LayerConfig {
        match class {
            ParticleClass::Stars => &self.config.stars,
            ParticleClass::Dust => &self.config.dust,
        }
    }
}

/// One layer's draw: which particles, and the uniforms to project them with.
#[derive(Debug, Clone, Copy)]
pub struct LayerDraw<'a> {
    pub class: ParticleClass,
    pub lod: LodLevel,
    pub field: &'a Field,
    pub uniforms: LayerUniforms,
}

/// Everything a sink needs to produce one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameSubmission<'a> {
    /// Frame number on the loop's clock.
    pub frame: u64,
    pub elapsed: f32,
    /// Render target size (already DPR-capped).
    pub target: SurfaceSize,
    /// Back to front.
    pub layers: [LayerDraw<'a>; 2],
}

/// An output surface the render loop can draw into.
pub trait FrameSink {
    /// (Re)allocate the render target at `size`.
    fn configure(&mut self, size: SurfaceSize);

    /// Draw one frame.
    fn submit(&mut self, frame: &FrameSubmission<'_>) -> Result<(), SinkError>;
}

/// What a call to [`RenderLoop::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was submitted. `next` says whether to request another.
    Rendered { next: bool },
    /// The sink skipped this frame; the loop keeps running.
    Dropped,
    /// Not scheduled (hidden, finished or lost). Nothing was drawn.
    Idle,
    /// The sink lost its surface. The loop stays stopped until rebuilt.
    SurfaceLost,
}

/// Per-layer parameters computed before the governor runs.
#[derive(Debug, Clone, Copy)]
struct LayerParams {
    class: ParticleClass,
    view: Mat4,
    speed: f32,
}

/// Owns the mutable per-frame state: camera, governor, clock and schedule.
pub struct RenderLoop {
    context: RenderContext,
    camera: CameraState,
    governor: PerformanceGovernor,
    time: Time,
    schedule: FrameSchedule,
    lost: bool,
}

impl RenderLoop {
    pub fn new(context: RenderContext) -> Self {
        let governor = match context.motion {
            MotionMode::Continuous => PerformanceGovernor::new(context.config.governor.clone()),
            MotionMode::Reduced => PerformanceGovernor::frozen(context.config.governor.clone()),
        };
        let camera = CameraState::new(context.config.camera.clone());
        Self {
            context,
            camera,
            governor,
            time: Time::new(),
            schedule: FrameSchedule::new(),
            lost: false,
        }
    }

    /// Replace the frame clock (e.g. with [`Time::fixed`]).
    pub fn with_time(mut self, time: Time) -> Self {
        self.time = time;
        self
    }

    /// Configure the sink at the current resolution and begin scheduling.
    ///
    /// Returns `true` if the host should request a frame.
    pub fn start(&mut self, sink: &mut impl FrameSink) -> bool {
        if self.lost {
            return false;
        }
        sink.configure(self.surface_size());
        self.schedule.start()
    }

    /// Run one frame.
    pub fn frame(&mut self, sink: &mut impl FrameSink) -> FrameOutcome {
        if self.lost || !self.schedule.is_running() {
            return FrameOutcome::Idle;
        }

        let clock = match self.context.motion {
            MotionMode::Continuous => {
                self.time.update();
                self.time.elapsed_precise()
            }
            MotionMode::Reduced => 0.0,
        };
        let elapsed = clock as f32;

        self.camera.advance();
        let params = self.layer_params();

        if let Some(transition) = self.governor.record_frame(clock) {
            log::debug!("reconfiguring output for {:?}", transition.to);
            sink.configure(self.surface_size());
        }

        let lod = self.governor.level();
        let target = self.surface_size();
        let pixel_ratio = self.context.viewport.effective_ratio(self.governor.dpr_cap()) as f32;
        let projection = self.projection(target);

        let fields = &self.context.fields;
        let projector = &self.context.projector;
        let layers = params.map(|p| LayerDraw {
            class: p.class,
            lod,
            field: fields.layer(p.class).get(lod),
            uniforms: LayerUniforms::new(
                projection * p.view,
                projector,
                p.speed,
                projector.layer_time(clock, p.speed),
                target,
                pixel_ratio,
            ),
        });

        let submission = FrameSubmission {
            frame: self.time.frame(),
            elapsed,
            target,
            layers,
        };

        match sink.submit(&submission) {
            Ok(()) => {
                if self.context.motion == MotionMode::Reduced {
                    self.schedule.stop(StopReason::Completed);
                }
                FrameOutcome::Rendered {
                    next: self.schedule.is_running(),
                }
            }
            Err(SinkError::Skipped) => FrameOutcome::Dropped,
            Err(SinkError::Lost) => {
                log::warn!("output surface lost; render loop stopped");
                self.lost = true;
                self.schedule.stop(StopReason::SurfaceLost);
                FrameOutcome::SurfaceLost
            }
        }
    }

    /// Aim the camera at a pointer position normalized to the viewport.
    pub fn set_pointer(&mut self, normalized: Vec2) {
        self.camera.set_pointer(normalized);
    }

    /// Adopt a new viewport and reconfigure the sink.
    ///
    /// Returns `true` if the host should request a frame. In reduced motion
    /// this re-arms one static frame so the resized surface is not left blank.
    pub fn resize(&mut self, viewport: Viewport, sink: &mut impl FrameSink) -> bool {
        self.context.viewport = viewport;
        if viewport.is_empty() || self.lost {
            return false;
        }
        sink.configure(self.surface_size());

        if self.context.motion == MotionMode::Reduced
            && self.schedule.state() == ScheduleState::Stopped(StopReason::Completed)
        {
            self.schedule = FrameSchedule::new();
            return self.schedule.start();
        }
        self.schedule.is_running()
    }

    /// Start or stop scheduling as the output becomes visible or hidden.
    ///
    /// The clock is paused while hidden. Returns `true` if the host should
    /// request a frame.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if visible {
            if self.time.is_paused() {
                self.time.resume();
                self.governor.restart_window(self.time.elapsed_precise());
            }
            !self.lost && self.schedule.start()
        } else {
            self.time.pause();
            self.schedule.stop(StopReason::Hidden);
            false
        }
    }

    #[inline]
    pub fn lod(&self) -> LodLevel {
        self.governor.level()
    }

    #[inline]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    #[inline]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    #[inline]
    pub fn governor(&self) -> &PerformanceGovernor {
        &self.governor
    }

    #[inline]
    pub fn time(&self) -> &Time {
        &self.time
    }

    #[inline]
    pub fn schedule(&self) -> &FrameSchedule {
        &self.schedule
    }

    #[inline]
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Render target size under the current DPR cap.
    pub fn surface_size(&self) -> SurfaceSize {
        self.context.viewport.surface_size(self.governor.dpr_cap())
    }

    fn layer_params(&self) -> [LayerParams; 2] {
        ParticleClass::DRAW_ORDER.map(|class| {
            let layer = self.context.layer_config(class);
            LayerParams {
                class,
                view: self.camera.view_matrix(layer.parallax),
                speed: layer.speed,
            }
        })
    }

    fn projection(&self, target: SurfaceSize) -> Mat4 {
        let f = &self.context.config.flythrough;
        Mat4::perspective_rh(
            f.fov_degrees.to_radians(),
            target.aspect(),
            f.z_min * NEAR_PLANE_FACTOR,
            f.z_max * FAR_PLANE_FACTOR,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        configured: Vec<SurfaceSize>,
        frames: usize,
    }

    impl FrameSink for Counting {
        fn configure(&mut self, size: SurfaceSize) {
            self.configured.push(size);
        }

        fn submit(&mut self, _frame: &FrameSubmission<'_>) -> Result<(), SinkError> {
            self.frames += 1;
            Ok(())
        }
    }

    fn small_context(motion: MotionMode) -> RenderContext {
        let mut config = WarpConfig::for_viewport(true);
        config.stars.particle_count_high = 60;
        config.stars.particle_count_low = 30;
        config.dust.particle_count_high = 80;
        config.dust.particle_count_low = 40;
        RenderContext::new(config, 7, Viewport::new(640.0, 360.0, 1.0), motion)
    }

    #[test]
    fn test_idle_until_started() {
        let mut sink = Counting::default();
        let mut rl = RenderLoop::new(small_context(MotionMode::Continuous));
        assert_eq!(rl.frame(&mut sink), FrameOutcome::Idle);
        assert_eq!(sink.frames, 0);

        assert!(rl.start(&mut sink));
        assert_eq!(sink.configured, vec![SurfaceSize::new(640, 360)]);
        assert_eq!(rl.frame(&mut sink), FrameOutcome::Rendered { next: true });
    }

    #[test]
    fn test_zero_viewport_resize_is_ignored() {
        let mut sink = Counting::default();
        let mut rl = RenderLoop::new(small_context(MotionMode::Continuous));
        rl.start(&mut sink);
        assert!(!rl.resize(Viewport::new(0.0, 0.0, 1.0), &mut sink));
        assert_eq!(sink.configured.len(), 1);
    }

    #[derive(Default)]
    struct LayerTimes(Vec<[f32; 2]>);

    impl FrameSink for LayerTimes {
        fn configure(&mut self, _size: SurfaceSize) {}

        fn submit(&mut self, frame: &FrameSubmission<'_>) -> Result<(), SinkError> {
            self.0.push(frame.layers.map(|l| l.uniforms.time));
            Ok(())
        }
    }

    #[test]
    fn test_layer_time_is_folded_per_layer() {
        let mut sink = LayerTimes::default();
        let mut rl = RenderLoop::new(small_context(MotionMode::Continuous)).with_time(Time::fixed(0.25));
        rl.start(&mut sink);
        for _ in 0..100 {
            rl.frame(&mut sink);
        }

        let projector = rl.context().projector;
        let [dust, stars] = sink.0[99];
        let dust_speed = rl.context().layer_config(ParticleClass::Dust).speed;
        let star_speed = rl.context().layer_config(ParticleClass::Stars).speed;

        // 25 s is past one star period but inside one dust period.
        let star_period = projector.z_range / star_speed;
        assert!(25.0 > star_period && 25.0 < projector.z_range / dust_speed);
        assert!((stars - (25.0 - star_period)).abs() < 1e-3, "stars at {stars}");
        assert!((dust - 25.0).abs() < 1e-3, "dust at {dust}");
    }

    #[test]
    fn test_projection_keeps_near_plane_in_front() {
        let rl = RenderLoop::new(small_context(MotionMode::Continuous));
        let proj = rl.projection(SurfaceSize::new(640, 360));
        let z_min = rl.context().config.flythrough.z_min;
        let clip = proj * glam::Vec4::new(0.0, 0.0, -z_min, 1.0);
        assert!(clip.w > 0.0);
        assert!(clip.z / clip.w > -1.0 && clip.z / clip.w < 1.0);
    }
}
