//! Headless CPU rasterizer.
//!
//! [`Raster`] implements [`FrameSink`] by splatting every particle as a soft
//! disc into a linear-RGB float buffer, using the same projection and disc
//! profile as the GPU shader. It backs snapshot mode and lets the render loop
//! be exercised without a device.
//!
//! ```ignore
//! let mut raster = Raster::new(SurfaceSize::new(1280, 720));
//! render_loop.start(&mut raster);
//! render_loop.frame(&mut raster);
//! raster.save_png("frame.png")?;
//! ```

use crate::color::linear_to_srgb;
use crate::error::SinkError;
use crate::render_loop::{FrameSink, FrameSubmission, LayerDraw};
use crate::shader::disc_alpha;
use crate::viewport::SurfaceSize;
use glam::{Vec3, Vec4};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Linear-RGB frame buffer with additive blending.
#[derive(Debug, Clone)]
pub struct Raster {
    size: SurfaceSize,
    pixels: Vec<Vec3>,
    frames: u64,
}

impl Raster {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            pixels: vec![Vec3::ZERO; size.width as usize * size.height as usize],
            frames: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Frames drawn so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Linear colour at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels.get((y * self.size.width + x) as usize).copied()
    }

    /// Number of pixels with any light in them.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.max_element() > 0.0).count()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Vec3::ZERO);
    }

    /// Encode as 8-bit sRGB over an opaque black background.
    pub fn to_image(&self) -> RgbaImage {
        let encode = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
        RgbaImage::from_fn(self.size.width, self.size.height, |x, y| {
            let p = self.pixels[(y * self.size.width + x) as usize];
            Rgba([encode(p.x), encode(p.y), encode(p.z), 255])
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.to_image().save_with_format(path, image::ImageFormat::Png)
    }

    fn draw_layer(&mut self, layer: &LayerDraw<'_>) {
        let projector = layer.uniforms.projector();
        let elapsed = layer.uniforms.time;
        let view_proj = layer.uniforms.view_proj();
        let speed = layer.uniforms.speed;
        let pixel_ratio = layer.uniforms.pixel_ratio;
        let (w, h) = (self.size.width as f32, self.size.height as f32);

        for particle in layer.field.iter() {
            let projected = projector.project(&particle, elapsed, speed);
            let clip = view_proj
                * Vec4::new(particle.position.x, particle.position.y, -projected.depth, 1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            if !(0.0..=1.0).contains(&ndc.z) {
                continue;
            }

            let radius = (projected.size * pixel_ratio * 0.5).max(0.5);
            let cx = (ndc.x * 0.5 + 0.5) * w;
            let cy = (0.5 - ndc.y * 0.5) * h;
            if cx + radius < 0.0 || cy + radius < 0.0 || cx - radius > w || cy - radius > h {
                continue;
            }

            let light = projected.color * projected.fade;
            self.splat(cx, cy, radius, light);
        }
    }

    fn splat(&mut self, cx: f32, cy: f32, radius: f32, light: Vec3) {
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil() as u32).min(self.size.width);
        let y1 = ((cy + radius).ceil() as u32).min(self.size.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let alpha = disc_alpha((dx * dx + dy * dy).sqrt() / radius);
                if alpha > 0.0 {
                    self.pixels[(y * self.size.width + x) as usize] += light * alpha;
                }
            }
        }
    }
}

impl FrameSink for Raster {
    fn configure(&mut self, size: SurfaceSize) {
        if size != self.size {
            *self = Self {
                frames: self.frames,
                ..Self::new(size)
            };
        }
    }

    fn submit(&mut self, frame: &FrameSubmission<'_>) -> Result<(), SinkError> {
        if frame.target != self.size {
            self.configure(frame.target);
        }
        self.clear();
        for layer in &frame.layers {
            self.draw_layer(layer);
        }
        self.frames += 1;
        Ok(())
    }
}
