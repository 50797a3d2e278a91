//! WGSL sources and the uniform block they share with the CPU.
//!
//! [`LayerUniforms`] is written once per layer per frame. The same values
//! drive the GPU vertex shader and the CPU rasterizer, so both outputs agree
//! on where a particle is, how large it is and how bright it is.

use crate::projector::DepthFlythroughProjector;
use crate::viewport::SurfaceSize;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Particle layer shader: instanced quads, fly-through projection, additive discs.
pub const FIELD_SHADER: &str = include_str!("shaders/field.wgsl");

/// Fullscreen blit from the capped-resolution target to the surface.
pub const UPSCALE_SHADER: &str = include_str!("shaders/upscale.wgsl");

/// Vertices per particle quad (two triangles).
pub const QUAD_VERTICES: u32 = 6;

/// Per-layer uniform block. Layout matches `LayerUniforms` in `field.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LayerUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// `xyz` cool highlight colour, `w` drift amount.
    pub cool_highlight: [f32; 4],
    /// Render target size in physical pixels.
    pub viewport: [f32; 2],
    /// Clock time folded into this layer's depth period.
    pub time: f32,
    pub speed: f32,
    pub z_min: f32,
    pub z_range: f32,
    pub size_floor: f32,
    pub size_ceiling: f32,
    pub atten_k: f32,
    pub atten_blend: f32,
    pub near_band: f32,
    pub far_band: f32,
    pub far_fade_floor: f32,
    /// Physical pixels per logical pixel actually rendered at.
    pub pixel_ratio: f32,
    pub _padding: [f32; 2],
}

impl LayerUniforms {
    pub fn new(
        view_proj: Mat4,
        projector: &DepthFlythroughProjector,
        speed: f32,
        layer_time: f32,
        target: SurfaceSize,
        pixel_ratio: f32,
    ) -> Self {
        let c = projector.cool_highlight;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            cool_highlight: [c.x, c.y, c.z, projector.drift_amount],
            viewport: [target.width as f32, target.height as f32],
            time: layer_time,
            speed,
            z_min: projector.z_min,
            z_range: projector.z_range,
            size_floor: projector.size_floor,
            size_ceiling: projector.size_ceiling,
            atten_k: projector.attenuation_k,
            atten_blend: projector.attenuation_blend,
            near_band: projector.near_band,
            far_band: projector.far_band,
            far_fade_floor: projector.far_fade_floor,
            pixel_ratio,
            _padding: [0.0; 2],
        }
    }

    #[inline]
    pub fn view_proj(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }

    /// The projector these uniforms encode.
    pub fn projector(&self) -> DepthFlythroughProjector {
        let [r, g, b, drift] = self.cool_highlight;
        DepthFlythroughProjector {
            z_min: self.z_min,
            z_range: self.z_range,
            size_floor: self.size_floor,
            size_ceiling: self.size_ceiling,
            attenuation_k: self.atten_k,
            attenuation_blend: self.atten_blend,
            near_band: self.near_band,
            far_band: self.far_band,
            far_fade_floor: self.far_fade_floor,
            drift_amount: drift,
            cool_highlight: Vec3::new(r, g, b),
        }
    }
}

/// Coverage of the soft particle disc at normalized radius `r` (0 center, 1 rim).
///
/// CPU twin of `fs_main` in `field.wgsl`.
#[inline]
pub fn disc_alpha(r: f32) -> f32 {
    if r > 1.0 {
        return 0.0;
    }
    let falloff = 1.0 - crate::projector::smoothstep(0.0, 1.0, r);
    let core = 1.0 - crate::projector::smoothstep(0.0, 0.3, r);
    falloff * (0.85 + 0.15 * core)
}
