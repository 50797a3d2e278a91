//! Seeded random helpers for field generation.
//!
//! Every procedural step takes a [`FieldRng`] explicitly, so a field is a pure
//! function of its configuration and seed.
//!
//! ```ignore
//! let mut rng = FieldRng::new(7);
//! let p = rng.in_disk(180.0);          // uniform over the disk
//! let size = 1.2 + rng.gaussian() * 0.1;
//! ```

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Deterministic RNG wrapper with the distributions field generation needs.
#[derive(Debug, Clone)]
pub struct FieldRng {
    rng: SmallRng,
}

impl FieldRng {
    /// Create a generator from a seed. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Derive an independent child stream, e.g. one per particle class.
    pub fn fork(&mut self, salt: u64) -> Self {
        let base: u64 = self.rng.gen();
        Self::new(base ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Random index in `[0, len)`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Random angle in `[0, TAU)`.
    #[inline]
    pub fn angle(&mut self) -> f32 {
        self.rng.gen_range(0.0..TAU)
    }

    /// Standard normal sample via the Box–Muller transform.
    pub fn gaussian(&mut self) -> f32 {
        // 1 - u keeps the log argument in (0, 1]
        let u1 = 1.0 - self.random();
        let u2 = self.random();
        (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
    }

    // ========== Position helpers ==========

    /// Uniform point inside a disk of the given radius, centered at origin.
    pub fn in_disk(&mut self, radius: f32) -> Vec2 {
        let r = radius * self.random().sqrt();
        Vec2::from_angle(self.angle()) * r
    }
}
