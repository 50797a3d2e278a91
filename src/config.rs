//! Configuration types for the backdrop.
//!
//! Everything tunable lives here and is serializable to JSON. Missing fields
//! fall back to the defaults, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "stars": { "speed": 90.0 },
//!   "governor": { "low_fps_threshold": 40.0 }
//! }
//! ```

use crate::error::ConfigError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Logical width at or below which a viewport counts as small.
pub const SMALL_VIEWPORT_WIDTH: f64 = 768.0;

/// Largest accepted ratio of a swirl layer's outer radius to its
/// `min_distance`.
pub const MAX_SPACING_RATIO: f32 = 10_000.0;

/// How the planar `(x, y)` positions of a layer are placed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Placement {
    /// `r = inner + u^exponent · (outer − inner)` with uniform `u` and angle.
    /// Exponents above 0.5 crowd points toward the center.
    Radial { exponent: f32 },
    /// Poisson-disk sampling over the outer disk followed by a log-spiral swirl.
    Swirl {
        min_distance: f32,
        strength: f32,
        radial_scale: f32,
        jitter: f32,
        max_attempts: u32,
    },
}

/// One particle class (stars or dust).
///
/// Inside a [`WarpConfig`] a layer may be given partially; missing keys are
/// taken from that layer's own defaults ([`LayerConfig::stars`] or
/// [`LayerConfig::dust`]). `placement` is replaced as a whole.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LayerConfig {
    /// Particles in the high-detail field.
    pub particle_count_high: u32,
    /// Target particle count of the low-detail field.
    pub particle_count_low: u32,
    /// Inner and outer placement radius. Swirl placement samples the disk of
    /// the outer radius.
    pub radius_range: [f32; 2],
    /// Minimum and maximum base point size, in logical pixels.
    pub size_bounds: [f32; 2],
    /// Standard deviation of the gaussian size jitter.
    pub size_jitter: f32,
    /// Hue range in `[0, 1]` turns.
    pub hue_range: [f32; 2],
    pub saturation: f32,
    pub lightness_range: [f32; 2],
    /// Fly-through speed in world units per second.
    pub speed: f32,
    /// Multiplier on the camera's idle spin for this layer.
    pub parallax: f32,
    pub placement: Placement,
}

impl LayerConfig {
    /// Default star layer: centre-weighted radial placement.
    pub fn stars() -> Self {
        Self {
            particle_count_high: 2400,
            particle_count_low: 1200,
            radius_range: [20.0, 600.0],
            size_bounds: [0.8, 2.6],
            size_jitter: 0.15,
            hue_range: [0.58, 0.70],
            saturation: 0.65,
            lightness_range: [0.60, 0.80],
            speed: 60.0,
            parallax: 2.0,
            placement: Placement::Radial { exponent: 0.7 },
        }
    }

    /// Default dust layer: blue-noise spiral.
    pub fn dust() -> Self {
        Self {
            particle_count_high: 3200,
            particle_count_low: 1600,
            radius_range: [0.0, 360.0],
            size_bounds: [0.6, 1.6],
            size_jitter: 0.1,
            hue_range: [0.66, 0.82],
            saturation: 0.55,
            lightness_range: [0.45, 0.70],
            speed: 35.0,
            parallax: 1.0,
            placement: Placement::Swirl {
                min_distance: 6.0,
                strength: 1.8,
                radial_scale: 0.02,
                jitter: 0.08,
                max_attempts: 20,
            },
        }
    }

    /// Stride used to thin the high-detail field into the low-detail one.
    pub fn lod_stride(&self) -> usize {
        let low = self.particle_count_low.max(1) as f32;
        ((self.particle_count_high as f32 / low).round() as usize).max(1)
    }

    fn halved(mut self) -> Self {
        self.particle_count_high /= 2;
        self.particle_count_low /= 2;
        self
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Invalid(format!("{name}: {msg}")));

        if self.particle_count_low > self.particle_count_high {
            return fail("particle_count_low exceeds particle_count_high");
        }
        if !(0.0..=self.radius_range[1]).contains(&self.radius_range[0]) {
            return fail("radius_range must satisfy 0 <= inner <= outer");
        }
        if !(0.0..=self.size_bounds[1]).contains(&self.size_bounds[0]) {
            return fail("size_bounds must satisfy 0 <= min <= max");
        }
        if self.size_jitter < 0.0 {
            return fail("size_jitter must be non-negative");
        }
        if self.hue_range[0] > self.hue_range[1] {
            return fail("hue_range is reversed");
        }
        if self.lightness_range[0] > self.lightness_range[1] {
            return fail("lightness_range is reversed");
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return fail("speed must be positive");
        }
        match self.placement {
            Placement::Radial { exponent } if exponent <= 0.0 => fail("radial exponent must be positive"),
            Placement::Swirl { min_distance, .. } if !(min_distance > 0.0) => {
                fail("swirl min_distance must be positive")
            }
            Placement::Swirl { min_distance, .. }
                if self.radius_range[1] / min_distance > MAX_SPACING_RATIO =>
            {
                fail("swirl min_distance is too small for the outer radius")
            }
            _ => Ok(()),
        }
    }
}

/// Overlay the keys present in a JSON layer object onto `base`.
fn merge_layer<'de, D>(deserializer: D, base: LayerConfig) -> Result<LayerConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let patch = Value::deserialize(deserializer)?;
    let Value::Object(patch) = patch else {
        return Err(D::Error::custom("layer config must be an object"));
    };

    let mut merged = serde_json::to_value(base).map_err(D::Error::custom)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(patch);
    }
    serde_json::from_value(merged).map_err(D::Error::custom)
}

fn stars_layer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LayerConfig, D::Error> {
    merge_layer(deserializer, LayerConfig::stars())
}

fn dust_layer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LayerConfig, D::Error> {
    merge_layer(deserializer, LayerConfig::dust())
}

/// Constants of the fly-through projection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlythroughConfig {
    /// Nearest depth a particle reaches.
    pub z_min: f32,
    /// Farthest depth; particles wrap from `z_min` back to here.
    pub z_max: f32,
    /// Smallest rendered point size, in logical pixels.
    pub size_floor: f32,
    /// Largest rendered point size, in logical pixels.
    pub size_ceiling: f32,
    /// Depth at which perspective attenuation is neutral.
    pub attenuation_k: f32,
    /// Blend between flat size (0) and full `k / depth` perspective (1).
    pub attenuation_blend: f32,
    /// Depth band past `z_min` over which particles fade in.
    pub near_band: f32,
    /// Depth band before `z_max` over which particles dim.
    pub far_band: f32,
    /// Brightness reached at `z_max`.
    pub far_fade_floor: f32,
    /// Maximum blend toward `cool_highlight` at the far end.
    pub drift_amount: f32,
    pub cool_highlight: [f32; 3],
    /// Vertical field of view.
    pub fov_degrees: f32,
}

impl FlythroughConfig {
    /// Length of the depth range.
    #[inline]
    pub fn z_range(&self) -> f32 {
        self.z_max - self.z_min
    }
}

impl Default for FlythroughConfig {
    fn default() -> Self {
        Self {
            z_min: 10.0,
            z_max: 1200.0,
            size_floor: 1.0,
            size_ceiling: 8.0,
            attenuation_k: 300.0,
            attenuation_blend: 0.6,
            near_band: 60.0,
            far_band: 300.0,
            far_fade_floor: 0.1,
            drift_amount: 0.35,
            cool_highlight: [0.55, 0.75, 1.0],
            fov_degrees: 60.0,
        }
    }
}

/// Frame-rate governor thresholds and resolution caps.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GovernorConfig {
    /// Drop to low detail below this FPS.
    pub low_fps_threshold: f32,
    /// Return to high detail above this FPS.
    pub high_fps_threshold: f32,
    /// Length of one sampling window, in seconds.
    pub window_secs: f32,
    /// Device pixel ratio ceiling while in high detail.
    pub dpr_cap_high: f64,
    /// Device pixel ratio ceiling while in low detail.
    pub dpr_cap_low: f64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            low_fps_threshold: 48.0,
            high_fps_threshold: 56.0,
            window_secs: 1.0,
            dpr_cap_high: 2.0,
            dpr_cap_low: 1.0,
        }
    }
}

/// Pointer parallax and idle spin.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Exponential smoothing factor per frame, in `(0, 1]`.
    pub smoothing: f32,
    /// Idle spin added per frame, in radians.
    pub auto_rotation_step: f32,
    /// Yaw swing across the full viewport width, in radians.
    pub pointer_yaw_range: f32,
    /// Pitch swing across the full viewport height, in radians.
    pub pointer_pitch_range: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.05,
            auto_rotation_step: 0.000_12,
            pointer_yaw_range: 0.15,
            pointer_pitch_range: 0.12,
        }
    }
}

/// Complete backdrop configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarpConfig {
    /// Generation seed. `None` picks one from the clock at startup.
    pub seed: Option<u64>,
    #[serde(deserialize_with = "stars_layer")]
    pub stars: LayerConfig,
    #[serde(deserialize_with = "dust_layer")]
    pub dust: LayerConfig,
    pub flythrough: FlythroughConfig,
    pub governor: GovernorConfig,
    pub camera: CameraConfig,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self::for_viewport(false)
    }
}

impl WarpConfig {
    /// Defaults for a viewport; small viewports get half the particles.
    pub fn for_viewport(small: bool) -> Self {
        let (stars, dust) = if small {
            (LayerConfig::stars().halved(), LayerConfig::dust().halved())
        } else {
            (LayerConfig::stars(), LayerConfig::dust())
        };
        Self {
            seed: None,
            stars,
            dust,
            flythrough: FlythroughConfig::default(),
            governor: GovernorConfig::default(),
            camera: CameraConfig::default(),
        }
    }

    /// Halve particle counts if the config was built for a large viewport.
    pub fn scaled_for_small_viewport(mut self) -> Self {
        self.stars = self.stars.halved();
        self.dust = self.dust.halved();
        self
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stars.validate("stars")?;
        self.dust.validate("dust")?;

        let f = &self.flythrough;
        if !(f.z_min > 0.0 && f.z_max > f.z_min) {
            return Err(ConfigError::Invalid("flythrough: need 0 < z_min < z_max".into()));
        }
        if !(0.0..=f.size_ceiling).contains(&f.size_floor) {
            return Err(ConfigError::Invalid(
                "flythrough: need 0 <= size_floor <= size_ceiling".into(),
            ));
        }
        if f.near_band < 0.0 || f.far_band < 0.0 {
            return Err(ConfigError::Invalid("flythrough: fade bands must be non-negative".into()));
        }
        if !(1.0..179.0).contains(&f.fov_degrees) {
            return Err(ConfigError::Invalid("flythrough: fov_degrees out of range".into()));
        }

        let g = &self.governor;
        if g.low_fps_threshold >= g.high_fps_threshold {
            return Err(ConfigError::Invalid(
                "governor: low_fps_threshold must be below high_fps_threshold".into(),
            ));
        }
        if g.window_secs <= 0.0 {
            return Err(ConfigError::Invalid("governor: window_secs must be positive".into()));
        }
        if !(g.dpr_cap_low > 0.0 && g.dpr_cap_low <= g.dpr_cap_high) {
            return Err(ConfigError::Invalid(
                "governor: need 0 < dpr_cap_low <= dpr_cap_high".into(),
            ));
        }

        let c = &self.camera;
        if !(c.smoothing > 0.0 && c.smoothing <= 1.0) {
            return Err(ConfigError::Invalid("camera: smoothing must be in (0, 1]".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        WarpConfig::default().validate().unwrap();
        WarpConfig::for_viewport(true).validate().unwrap();
    }

    #[test]
    fn test_small_viewport_halves_counts() {
        let big = WarpConfig::for_viewport(false);
        let small = WarpConfig::for_viewport(true);
        assert_eq!(small.stars.particle_count_high * 2, big.stars.particle_count_high);
        assert_eq!(small.dust.particle_count_low * 2, big.dust.particle_count_low);
        assert_eq!(small, big.scaled_for_small_viewport());
    }

    #[test]
    fn test_lod_stride() {
        assert_eq!(LayerConfig::stars().lod_stride(), 2);

        let mut layer = LayerConfig::stars();
        layer.particle_count_low = 800;
        assert_eq!(layer.lod_stride(), 3);

        layer.particle_count_low = 0;
        layer.particle_count_high = 0;
        assert_eq!(layer.lod_stride(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = WarpConfig::default();
        config.seed = Some(17);
        config.dust.speed = 12.5;

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(WarpConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = WarpConfig::from_json(r#"{ "stars": { "speed": 90.0 } }"#).unwrap();
        assert_eq!(config.stars.speed, 90.0);
        assert_eq!(config.stars.particle_count_high, LayerConfig::stars().particle_count_high);
        assert_eq!(config.governor, GovernorConfig::default());
    }

    #[test]
    fn test_partial_dust_keeps_dust_defaults() {
        let config = WarpConfig::from_json(r#"{ "dust": { "speed": 20.0 } }"#).unwrap();
        assert_eq!(config.dust.speed, 20.0);
        assert_eq!(config.dust.placement, LayerConfig::dust().placement);
        assert_eq!(config.dust.hue_range, LayerConfig::dust().hue_range);
    }

    #[test]
    fn test_placement_replaced_whole() {
        let json = r#"{ "dust": { "placement": { "Radial": { "exponent": 0.5 } } } }"#;
        let config = WarpConfig::from_json(json).unwrap();
        assert_eq!(config.dust.placement, Placement::Radial { exponent: 0.5 });
    }

    #[test]
    fn test_rejects_inverted_hysteresis() {
        let json = r#"{ "governor": { "low_fps_threshold": 60.0, "high_fps_threshold": 50.0 } }"#;
        assert!(matches!(WarpConfig::from_json(json), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_depth_range() {
        let mut config = WarpConfig::default();
        config.flythrough.z_min = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_spacing_far_below_radius() {
        let json = r#"{ "dust": { "placement": { "Swirl": {
            "min_distance": 1e-7, "strength": 1.8, "radial_scale": 0.02,
            "jitter": 0.08, "max_attempts": 20 } } } }"#;
        assert!(matches!(WarpConfig::from_json(json), Err(ConfigError::Invalid(_))));

        let mut config = WarpConfig::default();
        config.dust.radius_range = [0.0, 360.0];
        config.dust.placement = Placement::Swirl {
            min_distance: 0.2,
            strength: 1.8,
            radial_scale: 0.02,
            jitter: 0.08,
            max_attempts: 20,
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(WarpConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    }
}
