//! Model loading.
//!
//! Parsing is delegated to `tobj` (Wavefront OBJ + MTL) and `stl_io` (STL),
//! picked by file extension. Files are first read into a CPU-side
//! [`RawModel`] so that parsing and clean-up can run without a GPU, then
//! uploaded as a [`Model`]: a list of drawable parts, each bound to a material.
//!
//! A model that can't be read or parsed is a [`ModelError`]. A material texture
//! that can't be read is only a warning; the part renders untextured.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use glam::Vec3;
use log::{info, warn};
use thiserror::Error;

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use crate::texture::Texture;

/// Errors that can occur when loading a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown model format '{0}'")]
    UnknownFormat(String),

    #[error("failed to parse OBJ '{}': {source}", path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to parse STL '{}': {source}", path.display())]
    Stl {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model '{}' contains no triangles", path.display())]
    Empty { path: PathBuf },
}

/// Triangle geometry before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Recalculates smooth vertex normals from face geometry.
    ///
    /// Face normals are area-weighted (the raw cross product) and summed per
    /// vertex before normalizing.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0, 0.0, 0.0];
        }

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];

            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face_normal = (p1 - p0).cross(p2 - p0);

            for i in [i0, i1, i2] {
                let n = Vec3::from(self.vertices[i].normal) + face_normal;
                self.vertices[i].normal = n.into();
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }
}

/// One piece of a model drawn with a single material.
#[derive(Clone, Debug)]
pub struct RawPart {
    pub name: String,
    pub geometry: RawGeometry,
    /// Index into [`RawModel::materials`].
    pub material: Option<usize>,
}

/// A material reference: only the diffuse map matters to the lit shader.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMaterial {
    pub name: String,
    pub diffuse_texture: Option<PathBuf>,
}

/// A parsed model: parts plus the materials they refer to.
#[derive(Clone, Debug, Default)]
pub struct RawModel {
    pub parts: Vec<RawPart>,
    pub materials: Vec<RawMaterial>,
}

impl RawModel {
    /// Load a model, detecting the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        let model = match ext.as_str() {
            "obj" => Self::load_obj_file(path)?,
            "stl" => Self::load_stl_file(path)?,
            _ => return Err(ModelError::UnknownFormat(ext)),
        };

        if model.triangle_count() == 0 {
            return Err(ModelError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(model)
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.geometry.triangle_count()).sum()
    }

    fn load_obj_file(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::parse_obj(&mut std::io::BufReader::new(file), base_dir).map_err(|source| {
            ModelError::Obj {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Parse OBJ text. Material libraries and texture paths resolve against `base_dir`.
    pub fn parse_obj<R: BufRead>(reader: &mut R, base_dir: &Path) -> Result<Self, tobj::LoadError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, materials) =
            tobj::load_obj_buf(reader, &options, |mtl| tobj::load_mtl(base_dir.join(mtl)))?;

        let materials = match materials {
            Ok(materials) => materials
                .into_iter()
                .map(|m| RawMaterial {
                    diffuse_texture: m
                        .diffuse_texture
                        .filter(|t| !t.is_empty())
                        .map(|t| base_dir.join(t.replace('\\', "/"))),
                    name: m.name,
                })
                .collect(),
            Err(err) => {
                warn!("material library unavailable, drawing untextured: {err}");
                Vec::new()
            }
        };

        let parts = models
            .into_iter()
            .map(|model| {
                let mesh = model.mesh;
                let vertex_count = mesh.positions.len() / 3;
                let has_normals = mesh.normals.len() == mesh.positions.len();
                let has_uvs = mesh.texcoords.len() / 2 == vertex_count;

                let vertices = (0..vertex_count)
                    .map(|i| {
                        let position = [
                            mesh.positions[3 * i],
                            mesh.positions[3 * i + 1],
                            mesh.positions[3 * i + 2],
                        ];
                        let normal = if has_normals {
                            [
                                mesh.normals[3 * i],
                                mesh.normals[3 * i + 1],
                                mesh.normals[3 * i + 2],
                            ]
                        } else {
                            [0.0, 0.0, 0.0]
                        };
                        // OBJ puts v = 0 at the bottom of the image.
                        let uv = if has_uvs {
                            [mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1]]
                        } else {
                            [0.0, 0.0]
                        };
                        Vertex3d::new(position, normal, uv)
                    })
                    .collect();

                let mut geometry = RawGeometry::new(vertices, mesh.indices);
                if !has_normals {
                    geometry.recalculate_normals();
                }

                RawPart {
                    name: model.name,
                    geometry,
                    material: mesh.material_id.filter(|&id| id < materials.len()),
                }
            })
            .collect();

        Ok(Self { parts, materials })
    }

    fn load_stl_file(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = std::io::BufReader::new(file);
        let stl = stl_io::read_stl(&mut reader).map_err(|source| ModelError::Stl {
            path: path.to_path_buf(),
            source,
        })?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        let mut indices = Vec::with_capacity(stl.faces.len() * 3);

        for (i, face) in stl.faces.iter().enumerate() {
            let normal: [f32; 3] = face.normal.into();
            for &vertex_idx in &face.vertices {
                let position: [f32; 3] = stl.vertices[vertex_idx].into();
                vertices.push(Vertex3d::new(position, normal, [0.0, 0.0]));
            }
            let base = (i * 3) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        Ok(Self {
            parts: vec![RawPart {
                name: path.display().to_string(),
                geometry: RawGeometry::new(vertices, indices),
                material: None,
            }],
            materials: Vec::new(),
        })
    }
}

/// Bind group layout for a material: diffuse texture and its sampler.
pub(crate) fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// A texture bound for the lit pass.
pub struct Material {
    #[allow(dead_code)]
    texture: Texture,
    pub(crate) bind_group: wgpu::BindGroup,
}

impl Material {
    fn new(gpu: &GpuContext, layout: &wgpu::BindGroupLayout, texture: Texture) -> Self {
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });
        Self {
            texture,
            bind_group,
        }
    }
}

/// A drawable part of an uploaded model.
pub struct ModelPart {
    pub(crate) mesh: Mesh,
    pub(crate) material: usize,
}

/// A model on the GPU.
///
/// Material 0 is always plain white and is used by parts without a material
/// or whose texture failed to load.
pub struct Model {
    pub name: String,
    pub(crate) parts: Vec<ModelPart>,
    pub(crate) materials: Vec<Material>,
}

impl Model {
    /// Load a model file and upload it.
    pub fn load(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        path: impl AsRef<Path>,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = RawModel::from_file(path)?;
        info!(
            "loaded '{}': {} parts, {} triangles, {} materials",
            path.display(),
            raw.parts.len(),
            raw.triangle_count(),
            raw.materials.len()
        );
        Ok(Self::upload(gpu, layout, &path.display().to_string(), &raw))
    }

    pub fn upload(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        name: &str,
        raw: &RawModel,
    ) -> Self {
        let mut materials = vec![Material::new(gpu, layout, Texture::white(gpu))];
        // Maps RawModel material index to our index (0 = white fallback).
        let mut slots = Vec::with_capacity(raw.materials.len());

        for material in &raw.materials {
            let texture = material.diffuse_texture.as_ref().and_then(|path| {
                Texture::from_file(gpu, path)
                    .inspect_err(|err| warn!("material '{}': {err}", material.name))
                    .ok()
            });
            match texture {
                Some(texture) => {
                    slots.push(materials.len());
                    materials.push(Material::new(gpu, layout, texture));
                }
                None => slots.push(0),
            }
        }

        let parts = raw
            .parts
            .iter()
            .filter(|part| part.geometry.triangle_count() > 0)
            .map(|part| ModelPart {
                mesh: Mesh::new(
                    gpu,
                    &part.name,
                    &part.geometry.vertices,
                    &part.geometry.indices,
                ),
                material: part.material.map_or(0, |m| slots[m]),
            })
            .collect();

        Self {
            name: name.to_string(),
            parts,
            materials,
        }
    }

    /// Draw every part without touching material bindings (depth-only passes).
    pub(crate) fn draw_geometry(&self, pass: &mut wgpu::RenderPass<'_>) {
        for part in &self.parts {
            part.mesh.draw(pass);
        }
    }

    /// Draw every part with its material bound at `material_group`.
    pub(crate) fn draw_textured(&self, pass: &mut wgpu::RenderPass<'_>, material_group: u32) {
        for part in &self.parts {
            pass.set_bind_group(material_group, &self.materials[part.material].bind_group, &[]);
            part.mesh.draw(pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
o quad
v -1.0 0.0 -1.0
v 1.0 0.0 -1.0
v 1.0 0.0 1.0
v -1.0 0.0 1.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn obj_quad_is_triangulated() {
        let model = RawModel::parse_obj(&mut Cursor::new(QUAD), Path::new(".")).unwrap();
        assert_eq!(model.parts.len(), 1);
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(model.parts[0].material, None);
        assert!(model.materials.is_empty());
    }

    #[test]
    fn missing_normals_are_generated() {
        let model = RawModel::parse_obj(&mut Cursor::new(QUAD), Path::new(".")).unwrap();
        for v in &model.parts[0].geometry.vertices {
            let n = Vec3::from(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.y.abs() > 0.999);
        }
    }

    #[test]
    fn texture_v_is_flipped() {
        let model = RawModel::parse_obj(&mut Cursor::new(QUAD), Path::new(".")).unwrap();
        let uvs: Vec<[f32; 2]> = model.parts[0].geometry.vertices.iter().map(|v| v.uv).collect();
        assert!(uvs.contains(&[0.0, 1.0]));
        assert!(uvs.contains(&[1.0, 0.0]));
    }

    #[test]
    fn missing_material_library_is_not_fatal() {
        let obj = format!("mtllib nowhere.mtl\nusemtl grass\n{QUAD}");
        let model = RawModel::parse_obj(&mut Cursor::new(obj), Path::new("no/such/dir")).unwrap();
        assert_eq!(model.triangle_count(), 2);
        assert!(model.materials.is_empty());
        assert_eq!(model.parts[0].material, None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            RawModel::from_file("stadium.fbx"),
            Err(ModelError::UnknownFormat(ext)) if ext == "fbx"
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RawModel::from_file("Models/not-a-ball.obj").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
        assert!(err.to_string().contains("not-a-ball.obj"));
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let geometry = RawGeometry::new(
            vec![
                Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
                Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
                Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            ],
            vec![0, 1, 2],
        );
        let (min, max) = geometry.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }
}
