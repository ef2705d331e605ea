//! Directional light and its shadow map.
//!
//! The light is a sun: an ambient term, a diffuse term along a fixed direction,
//! and an orthographic light-space transform that maps the scene into the
//! shadow map's depth texture.

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::gpu::{DEPTH_FORMAT, GpuContext};

/// Shadow map sizes that can't be allocated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShadowMapError {
    #[error("shadow map size {width}x{height} has a zero dimension")]
    ZeroSize { width: u32, height: u32 },

    #[error("shadow map size {width}x{height} exceeds the device limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },
}

/// Validated shadow map dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowMapSize {
    width: u32,
    height: u32,
}

impl ShadowMapSize {
    /// Check `(width, height)` against the largest 2D texture the device takes.
    pub fn new(width: u32, height: u32, max_dimension: u32) -> Result<Self, ShadowMapError> {
        if width == 0 || height == 0 {
            return Err(ShadowMapError::ZeroSize { width, height });
        }
        if width > max_dimension || height > max_dimension {
            return Err(ShadowMapError::TooLarge {
                width,
                height,
                limit: max_dimension,
            });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// The box the light "sees", in light view space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoFrustum {
    pub half_width: f32,
    pub half_height: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthoFrustum {
    fn default() -> Self {
        Self {
            half_width: 250.0,
            half_height: 250.0,
            near: 0.1,
            far: 500.0,
        }
    }
}

/// Everything needed to build a [`Light`].
#[derive(Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub shadow_width: u32,
    pub shadow_height: u32,
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    /// Direction the light travels. Need not be normalized.
    pub direction: Vec3,
    pub diffuse_intensity: f32,
    /// Point the shadow frustum is centered on.
    pub target: Vec3,
    /// How far back along the direction the light's eye sits from `target`.
    pub distance: f32,
    pub frustum: OrthoFrustum,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            shadow_width: 2048,
            shadow_height: 2048,
            ambient_color: Vec3::new(0.9, 0.9, 1.0),
            ambient_intensity: 0.4,
            direction: Vec3::new(34.0, -150.0, -66.0),
            diffuse_intensity: 0.5,
            target: Vec3::ZERO,
            distance: 250.0,
            frustum: OrthoFrustum::default(),
        }
    }
}

impl LightConfig {
    pub fn shadow_size(mut self, width: u32, height: u32) -> Self {
        self.shadow_width = width;
        self.shadow_height = height;
        self
    }

    pub fn ambient(mut self, color: Vec3, intensity: f32) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
        self
    }

    pub fn diffuse(mut self, direction: Vec3, intensity: f32) -> Self {
        self.direction = direction;
        self.diffuse_intensity = intensity;
        self
    }

    pub fn target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn frustum(mut self, frustum: OrthoFrustum, distance: f32) -> Self {
        self.frustum = frustum;
        self.distance = distance;
        self
    }

    /// Unit light direction. A zero vector falls back to straight down.
    pub fn unit_direction(&self) -> Vec3 {
        self.direction.try_normalize().unwrap_or(Vec3::NEG_Y)
    }

    /// Projection × view matrix from world space into the light's clip space.
    pub fn light_space_transform(&self) -> Mat4 {
        let dir = self.unit_direction();
        let eye = self.target - dir * self.distance;
        // look_at is degenerate when up is parallel to the view direction.
        let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, self.target, up);
        let f = &self.frustum;
        let proj = Mat4::orthographic_rh(
            -f.half_width,
            f.half_width,
            -f.half_height,
            f.half_height,
            f.near,
            f.far,
        );
        proj * view
    }
}

/// Depth texture the shadow pass renders into, plus the comparison sampler
/// the lit pass reads it with.
pub struct ShadowMap {
    size: ShadowMapSize,
    #[allow(dead_code)]
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
}

impl ShadowMap {
    pub fn new(gpu: &GpuContext, size: ShadowMapSize) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Map Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            size,
            texture,
            view,
            sampler,
        }
    }

    pub fn size(&self) -> ShadowMapSize {
        self.size
    }

    /// Start a depth-only pass that clears the map to the far plane.
    ///
    /// The returned pass is detached from the encoder's borrow so it can be
    /// held across draw calls; finish it with [`end_write`](Self::end_write)
    /// before the map is sampled.
    pub fn begin_write(&self, encoder: &mut wgpu::CommandEncoder) -> wgpu::RenderPass<'static> {
        encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime()
    }

    /// Finish the shadow pass so the map can be sampled.
    pub fn end_write(&self, pass: wgpu::RenderPass<'static>) {
        drop(pass);
    }
}

/// A directional light with its shadow map.
pub struct Light {
    config: LightConfig,
    shadow_map: ShadowMap,
}

impl Light {
    /// Allocate the shadow map. Fails if its size is zero or beyond what the
    /// device supports.
    pub fn new(gpu: &GpuContext, config: LightConfig) -> Result<Self, ShadowMapError> {
        let size = ShadowMapSize::new(
            config.shadow_width,
            config.shadow_height,
            gpu.device.limits().max_texture_dimension_2d,
        )?;
        log::info!(
            "shadow map {}x{}, light direction {:?}",
            size.width(),
            size.height(),
            config.unit_direction()
        );
        Ok(Self {
            shadow_map: ShadowMap::new(gpu, size),
            config,
        })
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    pub fn shadow_map(&self) -> &ShadowMap {
        &self.shadow_map
    }

    pub fn light_space_transform(&self) -> Mat4 {
        self.config.light_space_transform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    fn to_ndc(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * p.extend(1.0);
        clip.xyz() / clip.w
    }

    #[test]
    fn target_lands_in_the_middle_of_the_map() {
        let config = LightConfig::default().target(Vec3::new(10.0, 0.0, -5.0));
        let ndc = to_ndc(config.light_space_transform(), config.target);
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        // Depth in wgpu's 0..1 range.
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn points_nearer_the_light_have_smaller_depth() {
        let config = LightConfig::default();
        let m = config.light_space_transform();
        let above = to_ndc(m, Vec3::new(0.0, 20.0, 0.0));
        let ground = to_ndc(m, Vec3::ZERO);
        assert!(above.z < ground.z);
    }

    #[test]
    fn vertical_light_uses_fallback_up() {
        let config = LightConfig::default().diffuse(Vec3::NEG_Y, 0.5);
        let m = config.light_space_transform();
        assert!(!m.is_nan());
        let ndc = to_ndc(m, Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }

    #[test]
    fn zero_direction_falls_back_to_down() {
        let config = LightConfig::default().diffuse(Vec3::ZERO, 0.5);
        assert_eq!(config.unit_direction(), Vec3::NEG_Y);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            ShadowMapSize::new(0, 2048, 8192),
            Err(ShadowMapError::ZeroSize {
                width: 0,
                height: 2048
            })
        );
    }

    #[test]
    fn oversized_map_is_rejected() {
        let err = ShadowMapSize::new(2048, 16384, 8192).unwrap_err();
        assert!(matches!(err, ShadowMapError::TooLarge { limit: 8192, .. }));
        assert!(err.to_string().contains("2048x16384"));
    }

    #[test]
    fn default_size_fits_the_baseline_limit() {
        let config = LightConfig::default();
        let size = ShadowMapSize::new(config.shadow_width, config.shadow_height, 8192).unwrap();
        assert_eq!((size.width(), size.height()), (2048, 2048));
    }
}
