//! Viewport geometry and output resolution.

use crate::config::SMALL_VIEWPORT_WIDTH;

/// Size of the output surface, in physical pixels. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// The host's layout rectangle plus its device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in logical (device-independent) pixels.
    pub width: f64,
    /// Height in logical pixels.
    pub height: f64,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            device_pixel_ratio: if device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 },
        }
    }

    /// Build from a physical size and scale factor, as winit reports them.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self::new(width as f64 / scale, height as f64 / scale, scale)
    }

    /// True when the viewport has no area (minimised window).
    pub fn is_empty(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }

    /// Whether small-viewport defaults apply.
    pub fn is_small(&self) -> bool {
        self.width <= SMALL_VIEWPORT_WIDTH
    }

    /// Pixel ratio actually rendered at, given a cap.
    pub fn effective_ratio(&self, dpr_cap: f64) -> f64 {
        self.device_pixel_ratio.min(dpr_cap).max(f64::EPSILON)
    }

    /// Output resolution under a device pixel ratio cap:
    /// `max(1, floor(logical · min(dpr, cap)))` per axis.
    pub fn surface_size(&self, dpr_cap: f64) -> SurfaceSize {
        let ratio = self.effective_ratio(dpr_cap);
        SurfaceSize::new(
            (self.width * ratio).floor() as u32,
            (self.height * ratio).floor() as u32,
        )
    }
}
