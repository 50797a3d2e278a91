//! # warpfield
//!
//! A decorative, GPU-rendered fly-through of a galaxy: a star layer and a
//! swirling dust layer that stream toward the viewer, drift with the
//! pointer, and shed detail when the frame rate drops.
//!
//! ## Quick Start
//!
//! ```ignore
//! use warpfield::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     env_logger::init();
//!     Backdrop::new()
//!         .with_seed(42)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Fields
//!
//! A [`Field`] is an immutable set of particles (position, colour, size)
//! generated once from a seed:
//!
//! - stars are placed radially with a power-law radius;
//! - dust is blue-noise sampled ([`BlueNoiseSampler`]) and wrapped into
//!   log-spiral arms ([`SwirlPlacer`]).
//!
//! Each layer keeps a high- and a low-detail field; the low one is a stride
//! subset of the high one.
//!
//! ### Fly-through
//!
//! Particles never move in memory. Every frame,
//! [`DepthFlythroughProjector`] maps a particle's birth depth and the elapsed
//! time to a periodic approaching depth, then derives size, fade and colour
//! drift from it. The GPU evaluates the same formulas per vertex.
//!
//! ### Level of detail
//!
//! [`PerformanceGovernor`] counts frames over one-second windows and moves
//! between [`LodLevel::High`] and [`LodLevel::Low`] with hysteresis. A switch
//! changes both the field variant and the resolution cap.
//!
//! ### Frames
//!
//! [`RenderLoop`] runs one frame at a time into any [`FrameSink`]: the wgpu
//! renderer in the window host, or [`Raster`] for headless snapshots.
//!
//! ## Configuration
//!
//! Every tunable lives in [`WarpConfig`], which reads and writes JSON.
//! Missing fields take defaults; small viewports halve particle counts.

pub mod backdrop;
pub mod camera;
pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod gpu;
pub mod governor;
pub mod input;
pub mod projector;
pub mod random;
pub mod raster;
pub mod render_loop;
pub mod sampler;
pub mod schedule;
pub mod shader;
mod spatial;
pub mod swirl;
pub mod time;
pub mod viewport;

pub use backdrop::{Backdrop, RebuildBudget, MAX_REBUILDS};
pub use camera::CameraState;
pub use config::{
    CameraConfig, FlythroughConfig, GovernorConfig, LayerConfig, Placement, WarpConfig,
};
pub use error::{ConfigError, GpuError, RunError, SinkError};
pub use field::{Field, FieldBuilder, FieldSet, LodFields, Particle, ParticleClass};
pub use glam::{Vec2, Vec3};
pub use governor::{LodLevel, LodTransition, PerformanceGovernor};
pub use projector::DepthFlythroughProjector;
pub use random::FieldRng;
pub use raster::Raster;
pub use render_loop::{
    FrameOutcome, FrameSink, FrameSubmission, LayerDraw, MotionMode, RenderContext, RenderLoop,
};
pub use sampler::{BlueNoiseSampler, SampleSet};
pub use schedule::FrameSchedule;
pub use swirl::SwirlPlacer;
pub use time::Time;
pub use viewport::{SurfaceSize, Viewport};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use warpfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backdrop::Backdrop;
    pub use crate::config::WarpConfig;
    pub use crate::error::RunError;
    pub use crate::field::{FieldSet, ParticleClass};
    pub use crate::governor::LodLevel;
    pub use crate::raster::Raster;
    pub use crate::render_loop::{FrameOutcome, FrameSink, MotionMode, RenderContext, RenderLoop};
    pub use crate::time::Time;
    pub use crate::viewport::{SurfaceSize, Viewport};
    pub use crate::{Vec2, Vec3};
}
