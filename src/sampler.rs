//! Blue-noise point sets via Poisson-disk sampling.
//!
//! Uses Bridson-style dart throwing: a sparse hash grid with cell size
//! `min_distance / √2` answers "is anything too close?" in constant time,
//! and new points are grown outward from an active list.
//!
//! # Shortfall handling
//!
//! A disk can only hold so many points at a given spacing. When the target
//! count is out of reach the whole procedure is retried with the spacing
//! relaxed by 10% (up to three times). Anything still missing is filled
//! with uniform points, appended after the blue-noise ones. Only the first
//! [`SampleSet::accepted`] points carry the minimum-distance guarantee.

use crate::random::FieldRng;
use crate::spatial::SpatialGrid;
use glam::Vec2;
use std::f32::consts::SQRT_2;

/// Default candidate budget per active point.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Number of relaxed retries before falling back to uniform fill.
const MAX_RETRIES: u32 = 3;

/// Spacing multiplier applied on every retry.
const RELAX_FACTOR: f32 = 0.9;

/// Result of a sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    /// Sampled points. Blue-noise points first, then any uniform fill.
    pub points: Vec<Vec2>,
    /// How many leading points honour `min_distance`.
    pub accepted: usize,
    /// Effective minimum distance after relaxation.
    pub min_distance: f32,
    /// Number of relaxed retries that were needed.
    pub retries: u32,
}

impl SampleSet {
    /// Points placed by dart throwing (excludes uniform fill).
    pub fn accepted_points(&self) -> &[Vec2] {
        &self.points[..self.accepted]
    }

    /// Number of points added by the uniform fallback.
    pub fn filled(&self) -> usize {
        self.points.len() - self.accepted
    }
}

/// Poisson-disk sampler over a disk centered at the origin.
///
/// ```ignore
/// let mut rng = FieldRng::new(1);
/// let set = BlueNoiseSampler::new(3.0, 180.0).sample(500, &mut rng);
/// assert_eq!(set.points.len(), 500);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BlueNoiseSampler {
    min_distance: f32,
    disk_radius: f32,
    max_attempts: u32,
}

impl BlueNoiseSampler {
    /// Create a sampler with the default attempt budget.
    pub fn new(min_distance: f32, disk_radius: f32) -> Self {
        Self {
            min_distance,
            disk_radius,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the number of candidates proposed per active point.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sample up to `target_count` points. The result always holds exactly
    /// `target_count` points; see the module docs for the fallback policy.
    pub fn sample(&self, target_count: usize, rng: &mut FieldRng) -> SampleSet {
        if target_count == 0 {
            return SampleSet {
                points: Vec::new(),
                accepted: 0,
                min_distance: self.min_distance,
                retries: 0,
            };
        }

        if !(self.min_distance > 0.0 && self.disk_radius > 0.0) {
            let radius = self.disk_radius.max(0.0);
            let points = (0..target_count).map(|_| rng.in_disk(radius)).collect();
            return SampleSet {
                points,
                accepted: 0,
                min_distance: self.min_distance,
                retries: 0,
            };
        }

        let mut distance = self.min_distance;
        let mut points = self.dart_throw(target_count, distance, rng);
        let mut retries = 0;

        while points.len() < target_count && retries < MAX_RETRIES {
            retries += 1;
            distance *= RELAX_FACTOR;
            log::debug!(
                "blue-noise shortfall: {}/{} points, retry {} at spacing {:.3}",
                points.len(),
                target_count,
                retries,
                distance
            );
            points = self.dart_throw(target_count, distance, rng);
        }

        let accepted = points.len();
        if accepted < target_count {
            log::debug!(
                "blue-noise fill: {} uniform points after {} retries",
                target_count - accepted,
                retries
            );
            points.extend((accepted..target_count).map(|_| rng.in_disk(self.disk_radius)));
        }

        SampleSet {
            points,
            accepted,
            min_distance: distance,
            retries,
        }
    }

    /// One Bridson pass at the given spacing.
    fn dart_throw(&self, target_count: usize, distance: f32, rng: &mut FieldRng) -> Vec<Vec2> {
        let radius = self.disk_radius;
        let radius_sq = radius * radius;
        let mut grid = SpatialGrid::new(distance / SQRT_2, target_count);
        let mut points: Vec<Vec2> = Vec::with_capacity(target_count);
        let mut active: Vec<u32> = Vec::new();

        let seed = rng.in_disk((distance * 0.5).min(radius));
        grid.insert(seed, 0);
        points.push(seed);
        active.push(0);

        while !active.is_empty() && points.len() < target_count {
            let slot = rng.index(active.len());
            let origin = points[active[slot] as usize];
            let mut placed = false;

            for _ in 0..self.max_attempts {
                let r = distance * (1.0 + rng.random());
                let candidate = origin + Vec2::from_angle(rng.angle()) * r;

                if candidate.length_squared() > radius_sq {
                    continue;
                }
                if !grid.is_clear(candidate, &points, distance) {
                    continue;
                }

                let index = points.len() as u32;
                grid.insert(candidate, index);
                points.push(candidate);
                active.push(index);
                placed = true;
                break;
            }

            if !placed {
                active.swap_remove(slot);
            }
        }

        points
    }
}

/// Free-function form of [`BlueNoiseSampler::sample`].
pub fn sample(
    target_count: usize,
    min_distance: f32,
    disk_radius: f32,
    max_attempts: u32,
    rng: &mut FieldRng,
) -> SampleSet {
    BlueNoiseSampler::new(min_distance, disk_radius)
        .with_max_attempts(max_attempts)
        .sample(target_count, rng)
}
