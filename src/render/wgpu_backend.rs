//! The wgpu implementation of [`RenderBackend`].
//!
//! [`GpuRenderer`] owns everything that lives across frames: pipelines, bind
//! groups, the instance uniform buffer, the window depth buffer, the loaded
//! models, the light with its shadow map and the optional skybox.
//! [`GpuRenderer::begin_frame`] acquires the next surface texture and returns a
//! [`WgpuFrame`] that records one frame's commands.
//!
//! # Bind groups
//!
//! | Group | Shadow pipeline   | Lit pipeline                    |
//! |-------|-------------------|---------------------------------|
//! | 0     | light-space matrix| [`FrameUniforms`]               |
//! | 1     | instance (dynamic)| instance (dynamic)              |
//! | 2     |                   | material texture + sampler      |
//! | 3     |                   | shadow map + comparison sampler |

use std::path::PathBuf;

use glam::Mat4;
use log::info;

use crate::error::StartupError;
use crate::gpu::{DEPTH_FORMAT, GpuContext};
use crate::light::Light;
use crate::mesh::Vertex3d;
use crate::model::{Model, material_layout};
use crate::render::backend::RenderBackend;
use crate::render::frame::CameraView;
use crate::render::uniforms::{FrameUniforms, ModelUniforms, ShadowUniforms, uniform_stride};
use crate::scene::ResolvedInstance;
use crate::shader::{ShaderKind, ShaderSources, shader_error};
use crate::skybox::{Skybox, SkyboxFaces};

const MATERIAL_GROUP: u32 = 2;

/// Persistent GPU state for the two-pass renderer.
pub struct GpuRenderer {
    shadow_pipeline: wgpu::RenderPipeline,
    lit_pipeline: wgpu::RenderPipeline,

    shadow_uniform_buffer: wgpu::Buffer,
    shadow_uniform_bind_group: wgpu::BindGroup,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    shadow_map_bind_group: wgpu::BindGroup,

    instance_layout: wgpu::BindGroupLayout,
    instance_buffer: wgpu::Buffer,
    instance_bind_group: wgpu::BindGroup,
    instance_stride: u64,
    instance_capacity: usize,

    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),

    models: Vec<Model>,
    light: Light,
    skybox: Option<Skybox>,
    clear_color: wgpu::Color,
}

impl GpuRenderer {
    /// Build pipelines, load every model in `model_paths` (indexed by
    /// [`ModelId`](crate::ModelId)) and load the skybox if one is given.
    pub fn new(
        gpu: &GpuContext,
        shaders: &ShaderSources,
        light: Light,
        model_paths: &[PathBuf],
        skybox: Option<&SkyboxFaces>,
        clear_color: wgpu::Color,
    ) -> Result<Self, StartupError> {
        let device = &gpu.device;

        let shadow_shader = shaders.compile(gpu, ShaderKind::Shadow)?;
        let lit_shader = shaders.compile(gpu, ShaderKind::Lit)?;

        let shadow_uniform_layout = uniform_layout(
            device,
            "Shadow Uniform Layout",
            wgpu::ShaderStages::VERTEX,
            false,
        );
        let frame_layout = uniform_layout(
            device,
            "Frame Uniform Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            false,
        );
        let instance_layout = uniform_layout(
            device,
            "Instance Uniform Layout",
            wgpu::ShaderStages::VERTEX,
            true,
        );
        let material_layout = material_layout(device);

        let shadow_map_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Map Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow_uniform_buffer = uniform_buffer(
            device,
            "Shadow Uniforms",
            std::mem::size_of::<ShadowUniforms>() as u64,
        );
        let shadow_uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Uniform Bind Group"),
            layout: &shadow_uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_uniform_buffer.as_entire_binding(),
            }],
        });

        let frame_buffer = uniform_buffer(
            device,
            "Frame Uniforms",
            std::mem::size_of::<FrameUniforms>() as u64,
        );
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let shadow_map = light.shadow_map();
        let shadow_map_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Map Bind Group"),
            layout: &shadow_map_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
                },
            ],
        });

        let instance_stride = uniform_stride(
            std::mem::size_of::<ModelUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let instance_capacity = model_paths.len().max(1);
        let (instance_buffer, instance_bind_group) =
            instance_storage(device, &instance_layout, instance_stride, instance_capacity);

        let shadow_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&shadow_uniform_layout, &instance_layout],
            push_constant_ranges: &[],
        });
        let lit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lit Pipeline Layout"),
            bind_group_layouts: &[
                &frame_layout,
                &instance_layout,
                &material_layout,
                &shadow_map_layout,
            ],
            push_constant_ranges: &[],
        });

        let shadow_pipeline = gpu
            .with_validation(|device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Shadow Pipeline"),
                    layout: Some(&shadow_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shadow_shader,
                        entry_point: Some("vs"),
                        buffers: &[Vertex3d::LAYOUT],
                        compilation_options: Default::default(),
                    },
                    fragment: None,
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::LessEqual,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState {
                            constant: 2,
                            slope_scale: 2.0,
                            clamp: 0.0,
                        },
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|err| shader_error("Shadow Pipeline", err))?;

        let lit_pipeline = gpu
            .with_validation(|device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Lit Pipeline"),
                    layout: Some(&lit_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &lit_shader,
                        entry_point: Some("vs"),
                        buffers: &[Vertex3d::LAYOUT],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &lit_shader,
                        entry_point: Some("fs"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: gpu.config.format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|err| shader_error("Lit Pipeline", err))?;

        let models = model_paths
            .iter()
            .map(|path| Model::load(gpu, &material_layout, path))
            .collect::<Result<Vec<_>, _>>()?;

        let skybox = skybox
            .map(|faces| Skybox::new(gpu, shaders, faces))
            .transpose()?;

        let depth_view = create_depth_view(gpu);
        info!(
            "renderer ready: {} models, skybox {}",
            models.len(),
            if skybox.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            shadow_pipeline,
            lit_pipeline,
            shadow_uniform_buffer,
            shadow_uniform_bind_group,
            frame_buffer,
            frame_bind_group,
            shadow_map_bind_group,
            instance_layout,
            instance_buffer,
            instance_bind_group,
            instance_stride,
            instance_capacity,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            models,
            light,
            skybox,
            clear_color,
        })
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Recreate the window depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        let size = (gpu.width(), gpu.height());
        if size != self.depth_size {
            self.depth_view = create_depth_view(gpu);
            self.depth_size = size;
        }
    }

    /// Acquire the next surface texture and start recording a frame.
    pub fn begin_frame<'a>(
        &'a mut self,
        gpu: &'a GpuContext,
    ) -> Result<WgpuFrame<'a>, wgpu::SurfaceError> {
        self.ensure_depth_size(gpu);
        let output = gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        Ok(WgpuFrame {
            renderer: self,
            gpu,
            output: Some(output),
            view,
            encoder: Some(encoder),
            pass: None,
            lit_bound: false,
        })
    }

    fn instance_offset(&self, instance: &ResolvedInstance) -> u32 {
        (instance.slot as u64 * self.instance_stride) as u32
    }
}

/// One frame being recorded.
pub struct WgpuFrame<'a> {
    renderer: &'a mut GpuRenderer,
    gpu: &'a GpuContext,
    output: Option<wgpu::SurfaceTexture>,
    view: wgpu::TextureView,
    encoder: Option<wgpu::CommandEncoder>,
    pass: Option<wgpu::RenderPass<'static>>,
    /// Whether the lit pipeline and its frame bind group are set on `pass`.
    lit_bound: bool,
}

impl WgpuFrame<'_> {
    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder
            .as_mut()
            .expect("frame encoder used after present")
    }

    fn pass(&mut self) -> &mut wgpu::RenderPass<'static> {
        self.pass.as_mut().expect("no render pass is open")
    }
}

impl RenderBackend for WgpuFrame<'_> {
    fn upload_instances(&mut self, instances: &[ResolvedInstance]) {
        let renderer = &mut *self.renderer;
        let needed = instances.iter().map(|i| i.slot + 1).max().unwrap_or(0);
        if needed == 0 {
            return;
        }
        if needed > renderer.instance_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) = instance_storage(
                &self.gpu.device,
                &renderer.instance_layout,
                renderer.instance_stride,
                capacity,
            );
            renderer.instance_buffer = buffer;
            renderer.instance_bind_group = bind_group;
            renderer.instance_capacity = capacity;
        }

        let stride = renderer.instance_stride as usize;
        let mut bytes = vec![0u8; needed * stride];
        for instance in instances {
            let uniforms = ModelUniforms::new(instance.world);
            let start = instance.slot * stride;
            bytes[start..start + std::mem::size_of::<ModelUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        self.gpu
            .queue
            .write_buffer(&renderer.instance_buffer, 0, &bytes);
    }

    fn begin_shadow_pass(&mut self, light_space: Mat4) {
        let uniforms = ShadowUniforms {
            light_space: light_space.to_cols_array_2d(),
        };
        self.gpu.queue.write_buffer(
            &self.renderer.shadow_uniform_buffer,
            0,
            bytemuck::cast_slice(&[uniforms]),
        );

        let shadow_map = self.renderer.light.shadow_map();
        let size = shadow_map.size();
        let encoder = self
            .encoder
            .as_mut()
            .expect("frame encoder used after present");
        let mut pass = shadow_map.begin_write(encoder);
        pass.set_viewport(
            0.0,
            0.0,
            size.width() as f32,
            size.height() as f32,
            0.0,
            1.0,
        );
        pass.set_pipeline(&self.renderer.shadow_pipeline);
        pass.set_bind_group(0, &self.renderer.shadow_uniform_bind_group, &[]);
        self.pass = Some(pass);
    }

    fn draw_depth(&mut self, instance: &ResolvedInstance) {
        let offset = self.renderer.instance_offset(instance);
        let pass = self.pass.as_mut().expect("no render pass is open");
        pass.set_bind_group(1, &self.renderer.instance_bind_group, &[offset]);
        self.renderer.models[instance.model.0].draw_geometry(pass);
    }

    fn end_shadow_pass(&mut self) {
        if let Some(pass) = self.pass.take() {
            self.renderer.light.shadow_map().end_write(pass);
        }
    }

    fn begin_color_pass(&mut self, uniforms: &FrameUniforms) {
        self.gpu.queue.write_buffer(
            &self.renderer.frame_buffer,
            0,
            bytemuck::cast_slice(std::slice::from_ref(uniforms)),
        );

        let clear = self.renderer.clear_color;
        let depth_view = self.renderer.depth_view.clone();
        let view = self.view.clone();
        let pass = self
            .encoder()
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Color Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();
        self.pass = Some(pass);
        self.lit_bound = false;
    }

    fn bind_shadow_map(&mut self) {
        let bind_group = self.renderer.shadow_map_bind_group.clone();
        self.pass().set_bind_group(3, &bind_group, &[]);
    }

    fn draw_skybox(&mut self, camera: &CameraView) {
        let Some(skybox) = &self.renderer.skybox else {
            return;
        };
        skybox.update(self.gpu, camera.view, camera.proj);
        let pass = self.pass.as_mut().expect("no render pass is open");
        skybox.draw(pass);
        // The skybox replaced the pipeline and group 0.
        self.lit_bound = false;
    }

    fn draw_lit(&mut self, instance: &ResolvedInstance) {
        let offset = self.renderer.instance_offset(instance);
        let renderer = &*self.renderer;
        let pass = self.pass.as_mut().expect("no render pass is open");
        if !self.lit_bound {
            pass.set_pipeline(&renderer.lit_pipeline);
            pass.set_bind_group(0, &renderer.frame_bind_group, &[]);
            pass.set_bind_group(3, &renderer.shadow_map_bind_group, &[]);
            self.lit_bound = true;
        }
        pass.set_bind_group(1, &renderer.instance_bind_group, &[offset]);
        renderer.models[instance.model.0].draw_textured(pass, MATERIAL_GROUP);
    }

    fn end_color_pass(&mut self) {
        self.pass = None;
    }

    fn present(&mut self) {
        self.pass = None;
        if let Some(encoder) = self.encoder.take() {
            self.gpu.queue.submit(std::iter::once(encoder.finish()));
        }
        if let Some(output) = self.output.take() {
            output.present();
        }
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Instance uniform buffer with room for `capacity` slots, and its bind group.
fn instance_storage(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = uniform_buffer(device, "Instance Uniforms", stride * capacity as u64);
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Instance Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
