//! WGSL programs used by the renderer.
//!
//! The sources are compiled into the binary. A shader directory can be
//! configured to override any of them by file name, which is handy when
//! tweaking lighting without rebuilding.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::StartupError;
use crate::gpu::GpuContext;

/// The three programs the renderer builds pipelines from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderKind {
    /// Depth-only: transforms geometry into light space.
    Shadow,
    /// Ambient + directional diffuse, attenuated by the shadow map.
    Lit,
    /// Fullscreen cube-map background.
    Skybox,
}

impl ShaderKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Shadow => "shadow.wgsl",
            Self::Lit => "lit.wgsl",
            Self::Skybox => "skybox.wgsl",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Shadow => "Shadow Shader",
            Self::Lit => "Lit Shader",
            Self::Skybox => "Skybox Shader",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            Self::Shadow => include_str!("shaders/shadow.wgsl"),
            Self::Lit => include_str!("shaders/lit.wgsl"),
            Self::Skybox => include_str!("shaders/skybox.wgsl"),
        }
    }
}

/// Where shader sources come from.
#[derive(Clone, Debug, Default)]
pub struct ShaderSources {
    dir: Option<PathBuf>,
}

impl ShaderSources {
    /// Only the sources compiled into the binary.
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Files in `dir` take precedence; missing ones fall back to the embedded source.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Source text for `kind`.
    pub fn source(&self, kind: ShaderKind) -> Result<Cow<'static, str>, StartupError> {
        let Some(dir) = &self.dir else {
            return Ok(Cow::Borrowed(kind.embedded()));
        };

        let path = dir.join(kind.file_name());
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                info!("using shader override '{}'", path.display());
                Ok(Cow::Owned(source))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Cow::Borrowed(kind.embedded()))
            }
            Err(err) => Err(StartupError::Shader {
                label: kind.label().to_string(),
                message: format!("failed to read '{}': {err}", path.display()),
            }),
        }
    }

    /// Compile `kind`, turning WGSL errors into [`StartupError::Shader`].
    pub fn compile(
        &self,
        gpu: &GpuContext,
        kind: ShaderKind,
    ) -> Result<wgpu::ShaderModule, StartupError> {
        let source = self.source(kind)?;
        gpu.with_validation(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kind.label()),
                source: wgpu::ShaderSource::Wgsl(source),
            })
        })
        .map_err(|err| shader_error(kind.label(), err))
    }
}

/// Wrap a validation failure raised while building `label`.
pub(crate) fn shader_error(label: &str, err: wgpu::Error) -> StartupError {
    StartupError::Shader {
        label: label.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sources_declare_their_entry_points() {
        let sources = ShaderSources::embedded();
        for kind in [ShaderKind::Shadow, ShaderKind::Lit, ShaderKind::Skybox] {
            let source = sources.source(kind).unwrap();
            assert!(source.contains("fn vs("), "{kind:?} has no vertex entry");
        }
        for kind in [ShaderKind::Lit, ShaderKind::Skybox] {
            assert!(sources.source(kind).unwrap().contains("fn fs("));
        }
    }

    #[test]
    fn missing_override_falls_back_to_embedded() {
        let sources = ShaderSources::with_dir("no/such/shader/dir");
        let source = sources.source(ShaderKind::Lit).unwrap();
        assert!(matches!(source, Cow::Borrowed(_)));
        assert_eq!(source, ShaderKind::Lit.embedded());
    }

    #[test]
    fn override_file_wins() {
        let dir = std::env::temp_dir().join(format!("freekick-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("skybox.wgsl"), "// custom sky").unwrap();

        let sources = ShaderSources::with_dir(&dir);
        assert_eq!(sources.source(ShaderKind::Skybox).unwrap(), "// custom sky");
        assert_eq!(
            sources.source(ShaderKind::Shadow).unwrap(),
            ShaderKind::Shadow.embedded()
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
