//! Procedural particle fields.
//!
//! A [`Field`] is three parallel attribute arrays (position, colour, size)
//! generated once from a seed and never mutated. Each particle class keeps a
//! high-detail field and a low-detail field obtained by stride thinning, so
//! the low field is always an index-consistent subset of the high one.
//!
//! ```ignore
//! let config = WarpConfig::default();
//! let fields = FieldSet::generate(&config, 42);
//!
//! let stars = fields.layer(ParticleClass::Stars).get(LodLevel::High);
//! println!("{} stars", stars.len());
//! ```

use crate::color::hsl_to_linear;
use crate::config::{FlythroughConfig, LayerConfig, Placement, WarpConfig};
use crate::governor::LodLevel;
use crate::random::FieldRng;
use crate::sampler::BlueNoiseSampler;
use crate::swirl::SwirlPlacer;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::ops::Range;

const STARS_SALT: u64 = 0x5354_4152;
const DUST_SALT: u64 = 0x4455_5354;

/// The two particle layers. Dust is drawn first, stars on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleClass {
    Dust,
    Stars,
}

impl ParticleClass {
    /// Draw order: back to front.
    pub const DRAW_ORDER: [ParticleClass; 2] = [ParticleClass::Dust, ParticleClass::Stars];

    pub fn name(&self) -> &'static str {
        match self {
            ParticleClass::Dust => "dust",
            ParticleClass::Stars => "stars",
        }
    }
}

/// One particle, assembled from a [`Field`]'s parallel arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Planar placement in `x, y`; birth depth in `z`.
    pub position: Vec3,
    /// Linear RGB, each channel in `[0, 1]`.
    pub color: Vec3,
    /// Base point size in logical pixels.
    pub size: f32,
}

/// GPU vertex layout of a particle (one instance per particle).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleGpu {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

impl From<Particle> for ParticleGpu {
    fn from(p: Particle) -> Self {
        Self {
            position: p.position.to_array(),
            size: p.size,
            color: p.color.to_array(),
            _pad: 0.0,
        }
    }
}

/// An immutable particle set plus its placement metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    sizes: Vec<f32>,
    radius: f32,
    z_min: f32,
    z_max: f32,
}

impl Field {
    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    #[inline]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Outer placement radius.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn z_min(&self) -> f32 {
        self.z_min
    }

    #[inline]
    pub fn z_max(&self) -> f32 {
        self.z_max
    }

    /// Particle at `index`, if in range.
    pub fn particle(&self, index: usize) -> Option<Particle> {
        Some(Particle {
            position: *self.positions.get(index)?,
            color: self.colors[index],
            size: self.sizes[index],
        })
    }

    /// Iterate over all particles in order.
    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        self.positions
            .iter()
            .zip(&self.colors)
            .zip(&self.sizes)
            .map(|((&position, &color), &size)| Particle { position, color, size })
    }

    /// Keep every `stride`-th particle, starting at index 0.
    ///
    /// `thin(n)[i] == self[i * n]` for all three attribute arrays.
    pub fn thin(&self, stride: usize) -> Field {
        let stride = stride.max(1);
        Field {
            positions: self.positions.iter().step_by(stride).copied().collect(),
            colors: self.colors.iter().step_by(stride).copied().collect(),
            sizes: self.sizes.iter().step_by(stride).copied().collect(),
            radius: self.radius,
            z_min: self.z_min,
            z_max: self.z_max,
        }
    }

    /// Interleave the attribute arrays into the GPU vertex layout.
    pub fn to_gpu(&self) -> Vec<ParticleGpu> {
        self.iter().map(ParticleGpu::from).collect()
    }
}

/// High- and low-detail variants of one particle class.
#[derive(Debug, Clone, PartialEq)]
pub struct LodFields {
    pub high: Field,
    pub low: Field,
    /// Thinning stride that produced `low` from `high`.
    pub stride: usize,
}

impl LodFields {
    /// Derive the low variant from `high` by stride thinning.
    pub fn from_high(high: Field, stride: usize) -> Self {
        let stride = stride.max(1);
        let low = high.thin(stride);
        Self { high, low, stride }
    }

    /// The field variant for a detail level.
    pub fn get(&self, lod: LodLevel) -> &Field {
        match lod {
            LodLevel::High => &self.high,
            LodLevel::Low => &self.low,
        }
    }
}

/// Builder for a single [`Field`].
///
/// Construct with a [`Placement`], adjust ranges, then call
/// [`build`](Self::build). The result depends only on the settings, the count
/// and the seed.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    placement: Placement,
    radius_range: Range<f32>,
    size_range: Range<f32>,
    size_jitter: f32,
    hue_range: Range<f32>,
    saturation: f32,
    lightness_range: Range<f32>,
    z_range: Range<f32>,
    rotation: Option<f32>,
}

impl FieldBuilder {
    /// Create a builder with the given placement and neutral ranges.
    pub fn new(placement: Placement) -> Self {
        Self {
            placement,
            radius_range: 0.0..100.0,
            size_range: 1.0..2.0,
            size_jitter: 0.0,
            hue_range: 0.58..0.70,
            saturation: 0.65,
            lightness_range: 0.60..0.80,
            z_range: 10.0..1000.0,
            rotation: None,
        }
    }

    /// Builder preset from a layer config and the shared depth range.
    pub fn from_layer(layer: &LayerConfig, flythrough: &FlythroughConfig) -> Self {
        Self::new(layer.placement.clone())
            .with_radius_range(layer.radius_range[0]..layer.radius_range[1])
            .with_size_range(layer.size_bounds[0]..layer.size_bounds[1])
            .with_size_jitter(layer.size_jitter)
            .with_hue_range(layer.hue_range[0]..layer.hue_range[1])
            .with_saturation(layer.saturation)
            .with_lightness_range(layer.lightness_range[0]..layer.lightness_range[1])
            .with_z_range(flythrough.z_min..flythrough.z_max)
    }

    pub fn with_radius_range(mut self, range: Range<f32>) -> Self {
        self.radius_range = range;
        self
    }

    pub fn with_size_range(mut self, range: Range<f32>) -> Self {
        self.size_range = range;
        self
    }

    /// Standard deviation of the additive gaussian size jitter.
    pub fn with_size_jitter(mut self, sigma: f32) -> Self {
        self.size_jitter = sigma.max(0.0);
        self
    }

    pub fn with_hue_range(mut self, range: Range<f32>) -> Self {
        self.hue_range = range;
        self
    }

    pub fn with_saturation(mut self, saturation: f32) -> Self {
        self.saturation = saturation;
        self
    }

    pub fn with_lightness_range(mut self, range: Range<f32>) -> Self {
        self.lightness_range = range;
        self
    }

    pub fn with_z_range(mut self, range: Range<f32>) -> Self {
        self.z_range = range;
        self
    }

    /// Fix the global swirl rotation instead of drawing it from the seed.
    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = Some(radians);
        self
    }

    /// Build `count` particles from `seed`.
    pub fn build(&self, count: usize, seed: u64) -> Field {
        self.build_with(count, &mut FieldRng::new(seed))
    }

    /// Build `count` particles drawing from an existing generator.
    pub fn build_with(&self, count: usize, rng: &mut FieldRng) -> Field {
        let planar = self.place(count, rng);

        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);

        for xy in planar {
            let z0 = rng.range(self.z_range.start, self.z_range.end);
            positions.push(xy.extend(z0));

            let hue = rng.range(self.hue_range.start, self.hue_range.end);
            let lightness = rng.range(self.lightness_range.start, self.lightness_range.end);
            colors.push(hsl_to_linear(hue, self.saturation, lightness));

            let (lo, hi) = (self.size_range.start, self.size_range.end);
            let size = rng.range(lo, hi) + rng.gaussian() * self.size_jitter;
            // max/min rather than clamp: reversed or NaN bounds must not panic
            let (floor, ceiling) = (lo.min(hi).max(0.0), lo.max(hi).max(0.0));
            sizes.push(size.max(floor).min(ceiling));
        }

        Field {
            positions,
            colors,
            sizes,
            radius: self.radius_range.end,
            z_min: self.z_range.start,
            z_max: self.z_range.end,
        }
    }

    /// Build the high field and thin it into the low field.
    pub fn build_lod(&self, count: usize, stride: usize, seed: u64) -> LodFields {
        self.build_lod_with(count, stride, &mut FieldRng::new(seed))
    }

    /// [`build_lod`](Self::build_lod) drawing from an existing generator.
    pub fn build_lod_with(&self, count: usize, stride: usize, rng: &mut FieldRng) -> LodFields {
        LodFields::from_high(self.build_with(count, rng), stride)
    }

    /// Planar `(x, y)` placement for `count` particles.
    fn place(&self, count: usize, rng: &mut FieldRng) -> Vec<Vec2> {
        let (inner, outer) = (self.radius_range.start, self.radius_range.end);

        match self.placement {
            Placement::Radial { exponent } => (0..count)
                .map(|_| {
                    let r = inner + rng.random().powf(exponent) * (outer - inner);
                    Vec2::from_angle(rng.angle()) * r
                })
                .collect(),
            Placement::Swirl {
                min_distance,
                strength,
                radial_scale,
                jitter,
                max_attempts,
            } => {
                let set = BlueNoiseSampler::new(min_distance, outer)
                    .with_max_attempts(max_attempts)
                    .sample(count, rng);
                let rotation = self.rotation.unwrap_or_else(|| rng.angle());
                SwirlPlacer::new(strength, radial_scale, jitter).place(&set.points, rotation, rng)
            }
        }
    }
}

/// Every field the backdrop renders, generated once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    pub stars: LodFields,
    pub dust: LodFields,
    /// Seed the set was generated from.
    pub seed: u64,
    /// Session-wide swirl rotation.
    pub rotation: f32,
}

impl FieldSet {
    /// Generate star and dust fields. A pure function of `config` and `seed`.
    pub fn generate(config: &WarpConfig, seed: u64) -> Self {
        let mut root = FieldRng::new(seed);
        let rotation = root.angle();

        let stars = FieldBuilder::from_layer(&config.stars, &config.flythrough).build_lod_with(
            config.stars.particle_count_high as usize,
            config.stars.lod_stride(),
            &mut root.fork(STARS_SALT),
        );
        let dust = FieldBuilder::from_layer(&config.dust, &config.flythrough)
            .with_rotation(rotation)
            .build_lod_with(
                config.dust.particle_count_high as usize,
                config.dust.lod_stride(),
                &mut root.fork(DUST_SALT),
            );

        log::info!(
            "generated fields (seed {seed}): stars {}/{}, dust {}/{}",
            stars.high.len(),
            stars.low.len(),
            dust.high.len(),
            dust.low.len()
        );

        Self {
            stars,
            dust,
            seed,
            rotation,
        }
    }

    /// Fields of one particle class.
    pub fn layer(&self, class: ParticleClass) -> &LodFields {
        match class {
            ParticleClass::Stars => &self.stars,
            ParticleClass::Dust => &self.dust,
        }
    }
}
