//! wgpu output surface.
//!
//! [`probe`] acquires a device for a window once at startup and reports the
//! result as a [`Capability`]. A ready [`GpuState`] holds one static instance
//! buffer per (layer, LOD) pair and draws each frame as instanced quads into
//! a DPR-capped scene target, which [`UpscaleState`] then stretches over the
//! window surface.

mod upscale;

use std::sync::Arc;

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use upscale::{UpscaleState, SCENE_FORMAT};

use crate::error::{GpuError, SinkError};
use crate::field::{FieldSet, ParticleClass, ParticleGpu};
use crate::governor::LodLevel;
use crate::render_loop::{FrameSink, FrameSubmission};
use crate::shader::{LayerUniforms, FIELD_SHADER, QUAD_VERTICES};
use crate::viewport::SurfaceSize;

/// Result of probing for GPU support.
pub enum Capability {
    Ready(GpuState),
    Unavailable(GpuError),
}

/// Acquire a GPU context for `window`, blocking until the adapter and
/// device requests resolve.
pub fn probe(window: Arc<Window>) -> Capability {
    match pollster::block_on(GpuState::new(window)) {
        Ok(state) => Capability::Ready(state),
        Err(err) => {
            log::warn!("GPU unavailable: {err}");
            Capability::Unavailable(err)
        }
    }
}

/// Static instance data for one (layer, LOD) pair.
struct LayerBuffer {
    class: ParticleClass,
    lod: LodLevel,
    buffer: wgpu::Buffer,
    count: u32,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    /// One uniform buffer and bind group per draw slot (back to front).
    uniform_buffers: [wgpu::Buffer; 2],
    uniform_bind_groups: [wgpu::BindGroup; 2],
    layers: Vec<LayerBuffer>,
    upscale: UpscaleState,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "GPU ready: {} ({:?}), surface {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface_format
        );

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Layer Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let blank = LayerUniforms::zeroed();
        let uniform_buffers = [0usize, 1].map(|slot| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(if slot == 0 { "Back Layer Uniforms" } else { "Front Layer Uniforms" }),
                contents: bytemuck::bytes_of(&blank),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });

        let uniform_bind_groups = [0usize, 1].map(|slot| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Layer Uniform Bind Group"),
                layout: &uniform_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffers[slot].as_entire_binding(),
                }],
            })
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Field Shader"),
            source: wgpu::ShaderSource::Wgsl(FIELD_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Field Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Field Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ParticleGpu>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3, // position
                        },
                        wgpu::VertexAttribute {
                            offset: 12,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32, // size
                        },
                        wgpu::VertexAttribute {
                            offset: 16,
                            shader_location: 2,
                            format: wgpu::VertexFormat::Float32x3, // color
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SCENE_FORMAT,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let upscale = UpscaleState::new(
            &device,
            SurfaceSize::new(config.width, config.height),
            surface_format,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffers,
            uniform_bind_groups,
            layers: Vec::new(),
            upscale,
        })
    }

    /// Upload every (layer, LOD) field as a static instance buffer.
    ///
    /// Empty fields get no buffer and are skipped at draw time.
    pub fn load_fields(&mut self, fields: &FieldSet) {
        self.layers.clear();
        for class in ParticleClass::DRAW_ORDER {
            for lod in [LodLevel::High, LodLevel::Low] {
                let field = fields.layer(class).get(lod);
                if field.is_empty() {
                    continue;
                }
                let instances = field.to_gpu();
                let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Particle Instance Buffer"),
                    contents: bytemuck::cast_slice(&instances),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                self.layers.push(LayerBuffer {
                    class,
                    lod,
                    buffer,
                    count: instances.len() as u32,
                });
            }
        }
        log::debug!("uploaded {} particle buffers", self.layers.len());
    }

    /// Reconfigure the window surface after the window changed size.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Current window surface size in physical pixels.
    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.config.width, self.config.height)
    }

    fn layer_buffer(&self, class: ParticleClass, lod: LodLevel) -> Option<&LayerBuffer> {
        self.layers.iter().find(|l| l.class == class && l.lod == lod)
    }
}

impl FrameSink for GpuState {
    fn configure(&mut self, size: SurfaceSize) {
        self.upscale.resize(&self.device, size);
    }

    fn submit(&mut self, frame: &FrameSubmission<'_>) -> Result<(), SinkError> {
        if frame.target != self.upscale.size() {
            self.upscale.resize(&self.device, frame.target);
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(SinkError::Lost);
            }
            Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Err(SinkError::Skipped);
            }
            Err(err) => {
                log::debug!("frame skipped: {err}");
                return Err(SinkError::Skipped);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for (slot, layer) in frame.layers.iter().enumerate() {
            self.queue.write_buffer(
                &self.uniform_buffers[slot],
                0,
                bytemuck::bytes_of(&layer.uniforms),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Field Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.upscale.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            for (slot, layer) in frame.layers.iter().enumerate() {
                let Some(buffers) = self.layer_buffer(layer.class, layer.lod) else {
                    continue;
                };
                render_pass.set_bind_group(0, &self.uniform_bind_groups[slot], &[]);
                render_pass.set_vertex_buffer(0, buffers.buffer.slice(..));
                render_pass.draw(0..QUAD_VERTICES, 0..buffers.count);
            }
        }

        self.upscale.draw(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
