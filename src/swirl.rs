//! Log-spiral "galaxy arm" placement.
//!
//! Each point keeps its distance from the center and only has its polar
//! angle shifted by `strength · ln(1 + r · radial_scale)` plus a small random
//! jitter. Because radii are preserved, spacing between points in the same
//! radius band is preserved too.

use crate::random::FieldRng;
use glam::Vec2;

/// Swirl transform parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwirlPlacer {
    /// Angular shift per unit of `ln(1 + r·c)`, in radians.
    pub strength: f32,
    /// Radial scale `c` inside the logarithm.
    pub radial_scale: f32,
    /// Maximum absolute per-point angular jitter, in radians.
    pub jitter: f32,
}

impl SwirlPlacer {
    pub fn new(strength: f32, radial_scale: f32, jitter: f32) -> Self {
        Self {
            strength,
            radial_scale,
            jitter: jitter.abs(),
        }
    }

    /// Angle shift for a point at radius `r`, without jitter.
    #[inline]
    pub fn arm_offset(&self, r: f32) -> f32 {
        let x = 1.0 + r * self.radial_scale;
        if x > 0.0 {
            self.strength * x.ln()
        } else {
            0.0
        }
    }

    /// Rotate all points by `global_rotation`, then apply the spiral shift.
    pub fn place(&self, points: &[Vec2], global_rotation: f32, rng: &mut FieldRng) -> Vec<Vec2> {
        let spin = Vec2::from_angle(global_rotation);
        points
            .iter()
            .map(|&p| {
                let p = spin.rotate(p);
                let r = p.length();
                let jitter = rng.range(-self.jitter, self.jitter);
                let theta = p.y.atan2(p.x) + self.arm_offset(r) + jitter;
                Vec2::from_angle(theta) * r
            })
            .collect()
    }
}

impl Default for SwirlPlacer {
    fn default() -> Self {
        Self::new(1.8, 0.02, 0.08)
    }
}

/// Free-function form of [`SwirlPlacer::place`] with default radial scale
/// and jitter.
pub fn place(points: &[Vec2], swirl_strength: f32, global_rotation: f32, rng: &mut FieldRng) -> Vec<Vec2> {
    let placer = SwirlPlacer {
        strength: swirl_strength,
        ..SwirlPlacer::default()
    };
    placer.place(points, global_rotation, rng)
}
