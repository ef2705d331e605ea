use glam::{Mat4, Vec3};

use crate::camera::FirstPersonCamera;
use crate::light::LightConfig;
use crate::render::backend::{PassOrder, PassState, RenderBackend};
use crate::render::uniforms::FrameUniforms;
use crate::scene::ResolvedInstance;

/// The camera matrices for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub view: Mat4,
    pub proj: Mat4,
    pub position: Vec3,
}

impl CameraView {
    pub fn from_camera(camera: &FirstPersonCamera, aspect: f32) -> Self {
        Self {
            view: camera.view_matrix(),
            proj: camera.projection_matrix(aspect),
            position: camera.position,
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

/// Render one frame: shadow pass, then color pass, then present.
///
/// Both passes draw `instances` in the order given. The light-space transform
/// is rebuilt from `light` every call.
pub fn render_frame<B: RenderBackend>(
    backend: &mut B,
    order: &mut PassOrder,
    light: &LightConfig,
    camera: &CameraView,
    instances: &[ResolvedInstance],
) {
    let light_space = light.light_space_transform();
    backend.upload_instances(instances);

    order.advance(PassState::ShadowPass);
    backend.begin_shadow_pass(light_space);
    for instance in instances {
        backend.draw_depth(instance);
    }
    backend.end_shadow_pass();

    order.advance(PassState::ColorPass);
    backend.begin_color_pass(&FrameUniforms::new(
        camera.view_proj(),
        light_space,
        light,
    ));
    backend.bind_shadow_map();
    backend.draw_skybox(camera);
    for instance in instances {
        backend.draw_lit(instance);
    }
    backend.end_color_pass();

    order.advance(PassState::Present);
    backend.present();
    order.advance(PassState::Idle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::{Ball, LaunchParams};
    use crate::config::SceneConfig;
    use crate::scene::ModelId;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Upload(usize),
        BeginShadow(Mat4),
        Depth(ModelId),
        EndShadow,
        BeginColor(FrameUniforms),
        BindShadowMap,
        Skybox,
        Lit(ModelId),
        EndColor,
        Present,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Recorder {
        fn position(&self, wanted: &Call) -> usize {
            self.calls
                .iter()
                .position(|c| c == wanted)
                .unwrap_or_else(|| panic!("{wanted:?} never happened"))
        }
    }

    impl RenderBackend for Recorder {
        fn upload_instances(&mut self, instances: &[ResolvedInstance]) {
            self.calls.push(Call::Upload(instances.len()));
        }
        fn begin_shadow_pass(&mut self, light_space: Mat4) {
            self.calls.push(Call::BeginShadow(light_space));
        }
        fn draw_depth(&mut self, instance: &ResolvedInstance) {
            self.calls.push(Call::Depth(instance.model));
        }
        fn end_shadow_pass(&mut self) {
            self.calls.push(Call::EndShadow);
        }
        fn begin_color_pass(&mut self, uniforms: &FrameUniforms) {
            self.calls.push(Call::BeginColor(*uniforms));
        }
        fn bind_shadow_map(&mut self) {
            self.calls.push(Call::BindShadowMap);
        }
        fn draw_skybox(&mut self, _camera: &CameraView) {
            self.calls.push(Call::Skybox);
        }
        fn draw_lit(&mut self, instance: &ResolvedInstance) {
            self.calls.push(Call::Lit(instance.model));
        }
        fn end_color_pass(&mut self) {
            self.calls.push(Call::EndColor);
        }
        fn present(&mut self) {
            self.calls.push(Call::Present);
        }
    }

    fn record_frame(dt: f32) -> (Recorder, PassOrder) {
        let config = SceneConfig::stadium();
        let (scene, _) = config.build_scene();
        let mut ball = Ball::new(LaunchParams::default());
        ball.kick();
        let instances = scene.resolve(&mut ball, dt);

        let camera = CameraView::from_camera(&config.camera, 16.0 / 9.0);
        let mut recorder = Recorder::default();
        let mut order = PassOrder::new();
        render_frame(&mut recorder, &mut order, &config.light, &camera, &instances);
        (recorder, order)
    }

    #[test]
    fn shadow_pass_finishes_before_color_uniforms_and_binding() {
        let (rec, _) = record_frame(0.016);
        let end_shadow = rec.position(&Call::EndShadow);
        let begin_color = rec
            .calls
            .iter()
            .position(|c| matches!(c, Call::BeginColor(_)))
            .unwrap();
        assert!(end_shadow < begin_color);
        assert!(end_shadow < rec.position(&Call::BindShadowMap));
    }

    #[test]
    fn both_passes_draw_ball_character_stadium() {
        let (rec, _) = record_frame(0.016);
        let depth: Vec<_> = rec
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Depth(m) => Some(*m),
                _ => None,
            })
            .collect();
        let lit: Vec<_> = rec
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Lit(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(depth, [ModelId(0), ModelId(1), ModelId(2)]);
        assert_eq!(depth, lit);
    }

    #[test]
    fn skybox_is_drawn_before_scene_geometry() {
        let (rec, _) = record_frame(0.016);
        assert!(rec.position(&Call::Skybox) < rec.position(&Call::Lit(ModelId(0))));
    }

    #[test]
    fn frame_is_a_complete_sequence() {
        let (rec, order) = record_frame(0.016);
        assert_eq!(rec.calls.first(), Some(&Call::Upload(3)));
        assert_eq!(rec.calls.last(), Some(&Call::Present));
        assert_eq!(order.state(), PassState::Idle);
    }

    #[test]
    fn both_passes_share_the_light_transform() {
        let (rec, _) = record_frame(0.016);
        let shadow = rec
            .calls
            .iter()
            .find_map(|c| match c {
                Call::BeginShadow(m) => Some(*m),
                _ => None,
            })
            .unwrap();
        let color = rec
            .calls
            .iter()
            .find_map(|c| match c {
                Call::BeginColor(u) => Some(u.light_space),
                _ => None,
            })
            .unwrap();
        assert_eq!(shadow.to_cols_array_2d(), color);
    }

    #[test]
    #[should_panic(expected = "illegal pass transition")]
    fn rendering_mid_frame_panics() {
        let mut order = PassOrder::new();
        order.advance(PassState::ShadowPass);
        render_frame(
            &mut Recorder::default(),
            &mut order,
            &LightConfig::default(),
            &CameraView::from_camera(&FirstPersonCamera::default(), 1.0),
            &[],
        );
    }
}
