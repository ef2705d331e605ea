//! GPU-side uniform blocks. Field order and padding match the WGSL structs.

use glam::Mat4;

use crate::light::LightConfig;

/// Per-frame data for the lit pass (group 0 of `lit.wgsl`).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    /// Camera projection × view.
    pub view_proj: [[f32; 4]; 4],
    /// World to shadow-map clip space, for the shadow comparison.
    pub light_space: [[f32; 4]; 4],
    /// rgb = light color, w = ambient intensity.
    pub ambient: [f32; 4],
    /// xyz = direction the light travels, w = diffuse intensity.
    pub light_dir: [f32; 4],
}

impl FrameUniforms {
    pub fn new(view_proj: Mat4, light_space: Mat4, light: &LightConfig) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_space: light_space.to_cols_array_2d(),
            ambient: light.ambient_color.extend(light.ambient_intensity).to_array(),
            light_dir: light
                .unit_direction()
                .extend(light.diffuse_intensity)
                .to_array(),
        }
    }
}

/// The shadow pass's only uniform (group 0 of `shadow.wgsl`).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniforms {
    pub light_space: [[f32; 4]; 4],
}

/// Per-instance transform, read by both passes through a dynamic offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals under non-uniform scale.
    pub normal_matrix: [[f32; 4]; 4],
}

impl ModelUniforms {
    pub fn new(world: Mat4) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: world.inverse().transpose().to_cols_array_2d(),
        }
    }
}

/// Distance between consecutive instance slots in the model buffer: the block
/// size rounded up to the device's dynamic offset alignment.
pub fn uniform_stride(block_size: u64, alignment: u64) -> u64 {
    block_size.div_ceil(alignment) * alignment
}
