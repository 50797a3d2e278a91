//! Depth fly-through projection.
//!
//! Particles never move in memory. Instead every frame maps a particle's birth
//! depth `z0` and the elapsed time onto a periodic "approaching" depth:
//!
//! ```text
//! depth = ((z0 - elapsed * speed) mod z_range) + z_min
//! ```
//!
//! From that depth follow the apparent size (bounded perspective growth), a
//! fade (smooth fade-in near the camera, dimming toward the far end), and a
//! slight colour drift toward a cool highlight with distance.
//!
//! The functions here are the CPU reference. The vertex shader in
//! [`crate::shader`] evaluates the same formulas per vertex on the GPU.

use crate::config::FlythroughConfig;
use crate::field::Particle;
use glam::Vec3;

/// Hermite smoothstep, `0` at `edge0`, `1` at `edge1`.
///
/// A degenerate band (`edge0 >= edge1`) becomes a hard step at `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge1 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Periodic fly-through depth in `[z_min, z_min + z_range)`.
///
/// Period in time is `z_range / speed`.
#[inline]
pub fn wrap_depth(z0: f32, elapsed: f32, speed: f32, z_min: f32, z_range: f32) -> f32 {
    if z_range <= 0.0 {
        return z_min;
    }
    let mut wrapped = (z0 - elapsed * speed).rem_euclid(z_range);
    // rem_euclid can round up to exactly z_range for tiny negative inputs
    if wrapped >= z_range {
        wrapped = 0.0;
    }
    wrapped + z_min
}

/// Per-particle result of a projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub depth: f32,
    /// Rendered point size in logical pixels.
    pub size: f32,
    /// Brightness multiplier in `[0, 1]`.
    pub fade: f32,
    pub color: Vec3,
}

/// Stateless fly-through transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthFlythroughProjector {
    pub z_min: f32,
    pub z_range: f32,
    pub size_floor: f32,
    pub size_ceiling: f32,
    pub attenuation_k: f32,
    pub attenuation_blend: f32,
    pub near_band: f32,
    pub far_band: f32,
    pub far_fade_floor: f32,
    pub drift_amount: f32,
    pub cool_highlight: Vec3,
}

impl DepthFlythroughProjector {
    #[inline]
    pub fn z_max(&self) -> f32 {
        self.z_min + self.z_range
    }

    /// Fold a long-running clock into one depth period, `z_range / |speed|`.
    ///
    /// Depth is periodic with that period, so the folded time projects to
    /// the same depths while staying small enough for `f32`.
    pub fn layer_time(&self, elapsed: f64, speed: f32) -> f32 {
        if !(self.z_range > 0.0) || speed == 0.0 || !speed.is_finite() {
            return elapsed as f32;
        }
        let period = self.z_range as f64 / (speed as f64).abs();
        elapsed.rem_euclid(period) as f32
    }

    /// Current depth of a particle born at `z0`.
    #[inline]
    pub fn depth(&self, z0: f32, elapsed: f32, speed: f32) -> f32 {
        wrap_depth(z0, elapsed, speed, self.z_min, self.z_range)
    }

    /// `lerp(1, k / depth, blend)`.
    #[inline]
    pub fn attenuation(&self, depth: f32) -> f32 {
        let perspective = self.attenuation_k / depth.max(f32::EPSILON);
        lerp(1.0, perspective, self.attenuation_blend)
    }

    /// Base size scaled by attenuation and clamped to the size bounds.
    #[inline]
    pub fn apparent_size(&self, size: f32, depth: f32) -> f32 {
        (size * self.attenuation(depth)).clamp(self.size_floor, self.size_ceiling)
    }

    /// Near fade-in times far dimming.
    #[inline]
    pub fn fade(&self, depth: f32) -> f32 {
        let near = smoothstep(self.z_min, self.z_min + self.near_band, depth);
        let far = smoothstep(self.z_max() - self.far_band, self.z_max(), depth);
        near * lerp(1.0, self.far_fade_floor, far)
    }

    /// Shift `color` toward the cool highlight with distance.
    #[inline]
    pub fn drift(&self, color: Vec3, depth: f32) -> Vec3 {
        let t = ((depth - self.z_min) / self.z_range).clamp(0.0, 1.0);
        color.lerp(self.cool_highlight, t * self.drift_amount)
    }

    /// Full projection of one particle.
    pub fn project(&self, particle: &Particle, elapsed: f32, speed: f32) -> Projected {
        let depth = self.depth(particle.position.z, elapsed, speed);
        Projected {
            depth,
            size: self.apparent_size(particle.size, depth),
            fade: self.fade(depth),
            color: self.drift(particle.color, depth),
        }
    }
}

impl From<&FlythroughConfig> for DepthFlythroughProjector {
    fn from(cfg: &FlythroughConfig) -> Self {
        Self {
            z_min: cfg.z_min,
            z_range: cfg.z_range(),
            size_floor: cfg.size_floor,
            size_ceiling: cfg.size_ceiling,
            attenuation_k: cfg.attenuation_k,
            attenuation_blend: cfg.attenuation_blend,
            near_band: cfg.near_band,
            far_band: cfg.far_band,
            far_fade_floor: cfg.far_fade_floor,
            drift_amount: cfg.drift_amount,
            cool_highlight: Vec3::from_array(cfg.cool_highlight),
        }
    }
}

impl Default for DepthFlythroughProjector {
    fn default() -> Self {
        Self::from(&FlythroughConfig::default())
    }
}
