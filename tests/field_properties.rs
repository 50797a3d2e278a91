//! Integration tests for field generation.
//!
//! These tests exercise the sampler, the LOD thinning and the full
//! configuration-to-field path through the public API.

use warpfield::sampler::sample;
use warpfield::{
    FieldBuilder, FieldRng, FieldSet, LayerConfig, LodLevel, ParticleClass, Placement, Vec2,
    WarpConfig,
};

fn min_pair_distance(points: &[Vec2]) -> f32 {
    let mut min = f32::INFINITY;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            min = min.min(a.distance(*b));
        }
    }
    min
}

// ============================================================================
// Blue-noise sampling
// ============================================================================

#[test]
fn test_sampler_fills_every_target() {
    for (i, &radius) in [50.0_f32, 180.0, 400.0].iter().enumerate() {
        for (j, &count) in [100_usize, 500, 2000].iter().enumerate() {
            let mut rng = FieldRng::new((i * 10 + j) as u64);
            let set = sample(count, 3.0, radius, 20, &mut rng);

            assert!(set.points.len() >= count, "n={count} R={radius}: {}", set.points.len());
            assert!(set.points.iter().all(|p| p.length() <= radius + 1e-3));

            // Blue-noise points honour the (possibly relaxed) spacing.
            let accepted = set.accepted_points();
            if accepted.len() > 1 {
                let min = min_pair_distance(accepted);
                assert!(
                    min >= set.min_distance - 1e-4,
                    "n={count} R={radius}: {min} < {}",
                    set.min_distance
                );
            }
            assert!(set.min_distance <= 3.0);
        }
    }
}

#[test]
fn test_sampler_is_deterministic_per_seed() {
    let a = sample(300, 4.0, 120.0, 20, &mut FieldRng::new(99));
    let b = sample(300, 4.0, 120.0, 20, &mut FieldRng::new(99));
    let c = sample(300, 4.0, 120.0, 20, &mut FieldRng::new(100));
    assert_eq!(a, b);
    assert_ne!(a.points, c.points);
}

// ============================================================================
// Level of detail
// ============================================================================

#[test]
fn test_low_detail_is_strided_subset() {
    let fields = FieldSet::generate(&WarpConfig::for_viewport(true), 2024);

    for class in ParticleClass::DRAW_ORDER {
        let lod = fields.layer(class);
        let n = lod.stride;
        assert!(n >= 1);
        assert_eq!(lod.low.len(), lod.high.len().div_ceil(n));

        for i in 0..lod.low.len() {
            assert_eq!(lod.low.positions()[i], lod.high.positions()[i * n]);
            assert_eq!(lod.low.colors()[i], lod.high.colors()[i * n]);
            assert_eq!(lod.low.sizes()[i], lod.high.sizes()[i * n]);
        }

        assert_eq!(lod.get(LodLevel::High), &lod.high);
        assert_eq!(lod.get(LodLevel::Low), &lod.low);
    }
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_small_viewport_star_field() {
    let config = WarpConfig::for_viewport(true);
    let stars = FieldBuilder::from_layer(&config.stars, &config.flythrough).build(900, 5);

    assert_eq!(stars.len(), 900);

    let [lo, hi] = config.stars.size_bounds;
    for &size in stars.sizes() {
        assert!((lo..=hi).contains(&size), "size {size} outside [{lo}, {hi}]");
    }
    for color in stars.colors() {
        assert!(color.min_element() >= 0.0 && color.max_element() <= 1.0, "{color:?}");
    }
    for p in stars.positions() {
        assert!(p.z >= config.flythrough.z_min && p.z <= config.flythrough.z_max);
    }
}

#[test]
fn test_dust_from_custom_layer() {
    let mut layer = LayerConfig::dust();
    layer.placement = Placement::Swirl {
        min_distance: 2.0,
        strength: 1.2,
        radial_scale: 0.05,
        jitter: 0.0,
        max_attempts: 30,
    };
    layer.radius_range = [0.0, 90.0];

    let config = WarpConfig::default();
    let dust = FieldBuilder::from_layer(&layer, &config.flythrough).build(400, 77);

    assert_eq!(dust.len(), 400);
    for p in dust.positions() {
        assert!(p.truncate().length() <= 90.0 + 1e-3);
    }
}

#[test]
fn test_generation_is_a_pure_function_of_seed() {
    let config = WarpConfig::for_viewport(true);
    let a = FieldSet::generate(&config, 31);
    let b = FieldSet::generate(&config, 31);
    assert_eq!(a, b);

    let c = FieldSet::generate(&config, 32);
    assert_ne!(a.stars.high, c.stars.high);
}

#[test]
fn test_dust_with_tiny_spacing_still_builds() {
    let mut layer = LayerConfig::dust();
    layer.placement = Placement::Swirl {
        min_distance: 1.0e-7,
        strength: 1.8,
        radial_scale: 0.02,
        jitter: 0.08,
        max_attempts: 20,
    };

    let config = WarpConfig::default();
    let dust = FieldBuilder::from_layer(&layer, &config.flythrough).build(3200, 1);
    assert_eq!(dust.len(), 3200);
}
