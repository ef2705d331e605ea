//! Cube-map background.
//!
//! The sky is drawn first in the color pass as one fullscreen triangle pinned
//! to the far plane. Depth writes are off and the depth test is `LessEqual`,
//! so anything drawn afterwards lands in front of it.

use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::error::StartupError;
use crate::gpu::{DEPTH_FORMAT, GpuContext};
use crate::shader::{ShaderKind, ShaderSources, shader_error};
use crate::texture::CubeTexture;

/// Suffixes of the six face images, in cube-layer order +X, -X, +Y, -Y, +Z, -Z.
pub const FACE_SUFFIXES: [&str; 6] = ["rt", "lf", "up", "dn", "bk", "ft"];

/// Paths of the six skybox face images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkyboxFaces(pub [PathBuf; 6]);

impl SkyboxFaces {
    /// Faces named `{stem}_{suffix}.{ext}` inside `dir`.
    ///
    /// ```
    /// use freekick::SkyboxFaces;
    ///
    /// let faces = SkyboxFaces::from_stem("Textures/Skybox", "bloody-heresy", "tga");
    /// assert!(faces.0[2].ends_with("bloody-heresy_up.tga"));
    /// ```
    pub fn from_stem(dir: impl AsRef<Path>, stem: &str, ext: &str) -> Self {
        let dir = dir.as_ref();
        Self(FACE_SUFFIXES.map(|suffix| dir.join(format!("{stem}_{suffix}.{ext}"))))
    }

    /// Resolve every face against `root`. Absolute paths are left alone.
    pub fn under(&self, root: &Path) -> Self {
        Self(self.0.clone().map(|face| root.join(face)))
    }
}

/// Inverse of `proj * view` with the camera's translation removed, so the sky
/// stays at infinity as the camera moves.
pub fn sky_inverse_view_proj(view: Mat4, proj: Mat4) -> Mat4 {
    let mut rotation_only = view;
    rotation_only.w_axis = glam::Vec4::W;
    (proj * rotation_only).inverse()
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniforms {
    inv_view_proj: [[f32; 4]; 4],
}

/// Skybox pipeline, cube texture and its uniforms.
pub struct Skybox {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    cube: CubeTexture,
}

impl Skybox {
    /// Load the six faces and build the pipeline.
    pub fn new(
        gpu: &GpuContext,
        shaders: &ShaderSources,
        faces: &SkyboxFaces,
    ) -> Result<Self, StartupError> {
        let cube = CubeTexture::from_faces(gpu, &faces.0)?;
        log::info!("skybox loaded, {}px faces", cube.size);

        let shader = shaders.compile(gpu, ShaderKind::Skybox)?;
        let device = &gpu.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Skybox Uniforms"),
            size: std::mem::size_of::<SkyUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cube.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&cube.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = gpu
            .with_validation(|device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Skybox Pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs"),
                        buffers: &[],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
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
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: false,
                        depth_compare: wgpu::CompareFunction::LessEqual,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|err| shader_error("Skybox Pipeline", err))?;

        Ok(Self {
            pipeline,
            uniform_buffer,
            bind_group,
            cube,
        })
    }

    /// Upload this frame's camera orientation.
    pub fn update(&self, gpu: &GpuContext, view: Mat4, proj: Mat4) {
        let uniforms = SkyUniforms {
            inv_view_proj: sky_inverse_view_proj(view, proj).to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4, Vec4Swizzles};

    #[test]
    fn faces_follow_cube_layer_order() {
        let faces = SkyboxFaces::from_stem("sky", "night", "png");
        let names: Vec<_> = faces
            .0
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "night_rt.png",
                "night_lf.png",
                "night_up.png",
                "night_dn.png",
                "night_bk.png",
                "night_ft.png"
            ]
        );
    }

    #[test]
    fn faces_resolve_under_asset_root() {
        let faces = SkyboxFaces::from_stem("Textures/Skybox", "sky", "tga").under(Path::new("assets"));
        assert!(faces.0[0].starts_with("assets/Textures/Skybox"));
    }

    #[test]
    fn sky_ignores_camera_translation() {
        let proj = Mat4::perspective_rh(45f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        let here = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let there = Mat4::look_at_rh(Vec3::new(50.0, 3.0, -20.0), Vec3::new(50.0, 3.0, -21.0), Vec3::Y);
        assert!(
            sky_inverse_view_proj(here, proj).abs_diff_eq(sky_inverse_view_proj(there, proj), 1e-3)
        );
    }

    #[test]
    fn screen_center_looks_forward() {
        let proj = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::X, Vec3::Y);
        let far = sky_inverse_view_proj(view, proj) * Vec4::new(0.0, 0.0, 1.0, 1.0);
        let dir = (far.xyz() / far.w).normalize();
        assert!(dir.abs_diff_eq(Vec3::X, 1e-3));
    }
}
