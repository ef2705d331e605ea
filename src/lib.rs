//! # Freekick
//!
//! **A kicked, spinning football in a stadium, lit by a shadow-casting sun.**
//!
//! Each frame the ball's flight is evaluated in closed form, the scene is
//! resolved once into world matrices, and then drawn twice: into a shadow map
//! from the light, and into the window from a first-person camera.
//!
//! ## Quick Start
//!
//! ```no_run
//! use freekick::{AppConfig, SceneConfig};
//!
//! fn main() -> Result<(), freekick::Error> {
//!     freekick::run(
//!         AppConfig::new().title("Free kick"),
//!         SceneConfig::stadium().asset_root("assets"),
//!     )
//! }
//! ```
//!
//! ## Controls
//!
//! - **WASD / Space / Left Shift** fly the camera, the mouse looks around
//! - **F** kicks the ball, **R** puts it back on its spot
//! - **Esc** quits
//!
//! The motion model ([`Ball`]), camera ([`FirstPersonCamera`]), light transform
//! ([`LightConfig`]) and scene resolution ([`Scene`]) need no GPU and can be
//! used on their own. [`render_frame`] drives the pass order against any
//! [`RenderBackend`].

mod app;
mod ball;
mod camera;
mod clock;
mod config;
mod controls;
mod error;
mod gpu;
mod input;
mod light;
mod mesh;
mod model;
mod render;
mod scene;
mod shader;
mod skybox;
mod texture;

pub use app::run;
pub use ball::{Ball, BallPose, GRAVITY, LaunchParams, SPIN_RATE_DIVISOR};
pub use camera::{FirstPersonCamera, MoveKeys, PITCH_LIMIT};
pub use clock::{FrameClock, StepPolicy};
pub use config::{AppConfig, Prop, SceneConfig};
pub use controls::{BallControls, TriggerMode};
pub use error::{Error, StartupError};
pub use gpu::GpuContext;
pub use input::Input;
pub use light::{Light, LightConfig, OrthoFrustum, ShadowMap, ShadowMapError, ShadowMapSize};
pub use mesh::{Mesh, Transform, Vertex3d};
pub use model::{Model, ModelError, RawGeometry, RawMaterial, RawModel, RawPart};
pub use render::{
    CameraView, FrameUniforms, GpuRenderer, ModelUniforms, PassOrder, PassState, RenderBackend,
    ShadowUniforms, WgpuFrame, render_frame, uniform_stride,
};
pub use scene::{ModelId, ResolvedInstance, Scene, SceneInstance, TransformRule};
pub use shader::{ShaderKind, ShaderSources};
pub use skybox::{FACE_SUFFIXES, Skybox, SkyboxFaces, sky_inverse_view_proj};
pub use texture::{CubeTexture, Texture, TextureError};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
