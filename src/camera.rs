//! Fly-through camera state.
//!
//! The camera sits at the origin looking down `-Z`. Pointer position sets a
//! small target pitch/yaw that the actual rotation eases toward each frame;
//! an idle spin around the flight axis accumulates independently.

use crate::config::CameraConfig;
use glam::{Mat4, Vec2};

/// Smoothed pointer parallax plus idle spin.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// Current pitch, in radians.
    pub rx: f32,
    /// Current yaw, in radians.
    pub ry: f32,
    /// Pitch the camera is easing toward.
    pub target_rx: f32,
    /// Yaw the camera is easing toward.
    pub target_ry: f32,
    /// Accumulated idle spin, in radians. Only ever grows.
    pub auto_rotation: f32,
    config: CameraConfig,
}

impl CameraState {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            rx: 0.0,
            ry: 0.0,
            target_rx: 0.0,
            target_ry: 0.0,
            auto_rotation: 0.0,
            config,
        }
    }

    /// Aim at a pointer position normalized to the viewport (`[0, 1]²`,
    /// origin top-left). The viewport center is neutral.
    pub fn set_pointer(&mut self, normalized: Vec2) {
        let p = normalized.clamp(Vec2::ZERO, Vec2::ONE) - Vec2::splat(0.5);
        self.target_ry = p.x * self.config.pointer_yaw_range;
        self.target_rx = -p.y * self.config.pointer_pitch_range;
    }

    /// Advance one frame: ease toward the targets and add idle spin.
    pub fn advance(&mut self) {
        let alpha = self.config.smoothing;
        self.rx += (self.target_rx - self.rx) * alpha;
        self.ry += (self.target_ry - self.ry) * alpha;
        self.auto_rotation += self.config.auto_rotation_step;
    }

    /// View rotation for a layer; `parallax` scales the idle spin.
    pub fn view_matrix(&self, parallax: f32) -> Mat4 {
        Mat4::from_rotation_x(self.rx)
            * Mat4::from_rotation_y(self.ry)
            * Mat4::from_rotation_z(self.auto_rotation * parallax)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn test_center_is_neutral() {
        let mut cam = CameraState::default();
        cam.set_pointer(Vec2::splat(0.5));
        assert_eq!(cam.target_rx, 0.0);
        assert_eq!(cam.target_ry, 0.0);
    }

    #[test]
    fn test_pointer_ranges() {
        let cfg = CameraConfig::default();
        let mut cam = CameraState::new(cfg.clone());
        cam.set_pointer(Vec2::new(1.0, 0.0));
        assert_relative_eq!(cam.target_ry, 0.5 * cfg.pointer_yaw_range);
        assert_relative_eq!(cam.target_rx, 0.5 * cfg.pointer_pitch_range);

        // Out-of-viewport positions are clamped.
        cam.set_pointer(Vec2::new(7.0, -3.0));
        assert_relative_eq!(cam.target_ry, 0.5 * cfg.pointer_yaw_range);
    }

    #[test]
    fn test_smoothing_converges() {
        let mut cam = CameraState::default();
        cam.set_pointer(Vec2::new(1.0, 1.0));

        cam.advance();
        let first = cam.ry;
        assert_relative_eq!(first, cam.target_ry * 0.05, epsilon = 1e-7);

        for _ in 0..400 {
            cam.advance();
        }
        assert_relative_eq!(cam.ry, cam.target_ry, epsilon = 1e-5);
        assert_relative_eq!(cam.rx, cam.target_rx, epsilon = 1e-5);
    }

    #[test]
    fn test_auto_rotation_is_monotonic() {
        let mut cam = CameraState::default();
        let mut last = cam.auto_rotation;
        for _ in 0..10 {
            cam.advance();
            assert!(cam.auto_rotation > last);
            last = cam.auto_rotation;
        }
    }

    #[test]
    fn test_identity_view_at_rest() {
        let cam = CameraState::default();
        let v = cam.view_matrix(2.0).transform_point3(Vec3::new(1.0, 2.0, -3.0));
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 2.0);
        assert_relative_eq!(v.z, -3.0);
    }
}
