//! Window and scene configuration.
//!
//! Everything is fixed at construction. [`SceneConfig::stadium`] and
//! [`SceneConfig::floodlit`] are the two ready-made setups; both can be
//! adjusted with the builder methods before being handed to [`run`](crate::run).

use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::ball::LaunchParams;
use crate::camera::FirstPersonCamera;
use crate::clock::StepPolicy;
use crate::controls::TriggerMode;
use crate::light::{LightConfig, OrthoFrustum};
use crate::mesh::Transform;
use crate::scene::{ModelId, Scene, SceneInstance};
use crate::skybox::SkyboxFaces;

/// Configuration for the app window.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Wait for vertical sync when presenting.
    pub vsync: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Freekick".to_string(),
            width: 1366,
            height: 768,
            vsync: true,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}

/// A statically placed model.
#[derive(Clone, Debug, PartialEq)]
pub struct Prop {
    pub name: String,
    pub model: PathBuf,
    pub transform: Transform,
}

impl Prop {
    pub fn new(name: impl Into<String>, model: impl Into<PathBuf>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            transform,
        }
    }
}

/// Everything that describes one scene setup.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// Directory model, texture and skybox paths are relative to.
    pub asset_root: PathBuf,
    pub ball_model: PathBuf,
    /// Where the ball rests before a kick.
    pub ball_start: Vec3,
    pub ball_scale: f32,
    pub launch: LaunchParams,
    /// Static models, drawn after the ball in this order.
    pub props: Vec<Prop>,
    pub light: LightConfig,
    pub camera: FirstPersonCamera,
    pub skybox: Option<SkyboxFaces>,
    /// Background when there is no skybox.
    pub clear_color: wgpu::Color,
    pub trigger: TriggerMode,
    pub step_policy: StepPolicy,
    /// Directory whose `.wgsl` files replace the built-in shaders.
    pub shader_dir: Option<PathBuf>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::stadium()
    }
}

impl SceneConfig {
    /// The ball beside a character in a stadium under a cloudy skybox.
    pub fn stadium() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            ball_model: PathBuf::from("Models/soccerball.obj"),
            ball_start: Vec3::new(20.0, 0.0, 10.0),
            ball_scale: 0.06,
            launch: LaunchParams::default(),
            props: vec![
                Prop::new(
                    "character",
                    "Models/nanosuit.obj",
                    Transform::from_position(Vec3::new(20.0, 0.0, -20.0)),
                ),
                Prop::new(
                    "stadium",
                    "Models/Stadium.obj",
                    Transform::from_position(Vec3::new(-125.0, 0.0, 204.0)).uniform_scale(1.8),
                ),
            ],
            light: LightConfig::default(),
            camera: FirstPersonCamera::new(Vec3::new(0.0, 0.5, 0.0)),
            skybox: Some(SkyboxFaces::from_stem("Textures/Skybox", "bloody-heresy", "tga")),
            clear_color: wgpu::Color::BLACK,
            trigger: TriggerMode::Level,
            step_policy: StepPolicy::Unbounded,
            shader_dir: None,
        }
    }

    /// A night match: no sky, a steep bright light, the ball on the penalty spot.
    pub fn floodlit() -> Self {
        let penalty_spot = Vec3::new(20.0, 0.0, 2.0);
        Self {
            ball_start: penalty_spot,
            light: LightConfig::default()
                .ambient(Vec3::new(1.0, 1.0, 0.95), 0.25)
                .diffuse(Vec3::new(10.0, -150.0, -20.0), 0.9)
                .target(penalty_spot)
                .frustum(
                    OrthoFrustum {
                        half_width: 150.0,
                        half_height: 150.0,
                        ..OrthoFrustum::default()
                    },
                    200.0,
                ),
            skybox: None,
            clear_color: wgpu::Color {
                r: 0.01,
                g: 0.01,
                b: 0.03,
                a: 1.0,
            },
            ..Self::stadium()
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "stadium" => Some(Self::stadium()),
            "floodlit" => Some(Self::floodlit()),
            _ => None,
        }
    }

    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn ball(mut self, model: impl Into<PathBuf>, start: Vec3, scale: f32) -> Self {
        self.ball_model = model.into();
        self.ball_start = start;
        self.ball_scale = scale;
        self
    }

    pub fn launch(mut self, launch: LaunchParams) -> Self {
        self.launch = launch;
        self
    }

    pub fn prop(mut self, prop: Prop) -> Self {
        self.props.push(prop);
        self
    }

    pub fn light(mut self, light: LightConfig) -> Self {
        self.light = light;
        self
    }

    pub fn camera(mut self, camera: FirstPersonCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn skybox(mut self, faces: Option<SkyboxFaces>) -> Self {
        self.skybox = faces;
        self
    }

    pub fn trigger(mut self, trigger: TriggerMode) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn step_policy(mut self, policy: StepPolicy) -> Self {
        self.step_policy = policy;
        self
    }

    pub fn shader_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.shader_dir = dir;
        self
    }

    /// Resolve a configured asset path against [`asset_root`](Self::asset_root).
    pub fn asset_path(&self, path: &Path) -> PathBuf {
        self.asset_root.join(path)
    }

    /// Skybox face paths under the asset root.
    pub fn skybox_paths(&self) -> Option<SkyboxFaces> {
        self.skybox.as_ref().map(|faces| faces.under(&self.asset_root))
    }

    /// Build the instance list and the model files it needs.
    ///
    /// Model files are loaded once however many instances share them;
    /// `ModelId(i)` refers to the `i`th returned path. The ball always comes
    /// first, followed by the props in order.
    pub fn build_scene(&self) -> (Scene, Vec<PathBuf>) {
        let mut models: Vec<PathBuf> = Vec::new();
        let mut model_id = |path: &Path| -> ModelId {
            let full = self.asset_path(path);
            match models.iter().position(|p| *p == full) {
                Some(i) => ModelId(i),
                None => {
                    models.push(full);
                    ModelId(models.len() - 1)
                }
            }
        };

        let mut scene = Scene::new().with(SceneInstance::projectile(
            "ball",
            model_id(&self.ball_model),
            self.ball_start,
            self.ball_scale,
        ));
        for prop in &self.props {
            scene = scene.with(SceneInstance::fixed(
                prop.name.clone(),
                model_id(&prop.model),
                prop.transform,
            ));
        }

        (scene, models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TransformRule;

    #[test]
    fn stadium_scene_draws_ball_character_stadium() {
        let (scene, models) = SceneConfig::stadium().build_scene();
        let names: Vec<_> = scene.instances().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["ball", "character", "stadium"]);
        assert_eq!(
            models,
            [
                PathBuf::from("./Models/soccerball.obj"),
                PathBuf::from("./Models/nanosuit.obj"),
                PathBuf::from("./Models/Stadium.obj"),
            ]
        );
        assert!(matches!(
            scene.instances()[0].rule,
            TransformRule::Projectile { scale, .. } if scale == 0.06
        ));
    }

    #[test]
    fn shared_models_load_once() {
        let config = SceneConfig::stadium()
            .asset_root("assets")
            .prop(Prop::new(
                "keeper",
                "Models/nanosuit.obj",
                Transform::from_position(Vec3::new(0.0, 0.0, 40.0)),
            ));
        let (scene, models) = config.build_scene();
        assert_eq!(models.len(), 3);
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.instances()[1].model, scene.instances()[3].model);
        assert!(models.iter().all(|m| m.starts_with("assets")));
    }

    #[test]
    fn floodlit_has_no_skybox_and_a_brighter_light() {
        let stadium = SceneConfig::stadium();
        let floodlit = SceneConfig::floodlit();
        assert!(stadium.skybox.is_some());
        assert!(floodlit.skybox_paths().is_none());
        assert!(floodlit.light.diffuse_intensity > stadium.light.diffuse_intensity);
        assert_ne!(floodlit.ball_start, stadium.ball_start);
        assert_eq!(floodlit.props, stadium.props);
    }

    #[test]
    fn presets_by_name() {
        assert!(SceneConfig::preset("stadium").is_some());
        assert!(SceneConfig::preset("floodlit").is_some());
        assert!(SceneConfig::preset("rain").is_none());
    }

    #[test]
    fn default_window_matches_stadium_demo() {
        let config = AppConfig::new().title("Kick");
        assert_eq!((config.width, config.height), (1366, 768));
        assert_eq!(config.title, "Kick");
    }
}
