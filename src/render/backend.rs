use glam::Mat4;

use crate::render::frame::CameraView;
use crate::render::uniforms::FrameUniforms;
use crate::scene::ResolvedInstance;

/// Where a frame is in its pass sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PassState {
    #[default]
    Idle,
    ShadowPass,
    ColorPass,
    Present,
}

impl PassState {
    /// The only state reachable from `self`.
    pub fn next(self) -> Self {
        match self {
            PassState::Idle => PassState::ShadowPass,
            PassState::ShadowPass => PassState::ColorPass,
            PassState::ColorPass => PassState::Present,
            PassState::Present => PassState::Idle,
        }
    }
}

/// Enforces `Idle → ShadowPass → ColorPass → Present → Idle`.
///
/// The color pass samples the shadow map, so skipping or reordering passes
/// is a bug; an illegal transition panics.
#[derive(Clone, Debug, Default)]
pub struct PassOrder {
    state: PassState,
}

impl PassOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Move to `to`.
    ///
    /// # Panics
    ///
    /// If `to` does not directly follow the current state.
    pub fn advance(&mut self, to: PassState) {
        assert_eq!(
            self.state.next(),
            to,
            "illegal pass transition {:?} -> {:?}",
            self.state,
            to
        );
        self.state = to;
    }
}

/// The GPU operations a frame is made of.
///
/// [`render_frame`](super::render_frame) calls these in a fixed order; an
/// implementation only has to carry each one out.
pub trait RenderBackend {
    /// Make this frame's instance transforms available to both passes.
    fn upload_instances(&mut self, instances: &[ResolvedInstance]);

    /// Open the depth-only pass into the shadow map, cleared to the far plane.
    fn begin_shadow_pass(&mut self, light_space: Mat4);

    fn draw_depth(&mut self, instance: &ResolvedInstance);

    /// Close the shadow pass. The shadow map is complete after this.
    fn end_shadow_pass(&mut self);

    /// Open the window pass, clearing color and depth, and upload the
    /// camera and light uniforms.
    fn begin_color_pass(&mut self, uniforms: &FrameUniforms);

    /// Bind the finished shadow map as a lighting input.
    fn bind_shadow_map(&mut self);

    /// Draw the background, if there is one.
    fn draw_skybox(&mut self, camera: &CameraView);

    fn draw_lit(&mut self, instance: &ResolvedInstance);

    fn end_color_pass(&mut self);

    /// Submit the frame and show it.
    fn present(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut order = PassOrder::new();
        for state in [
            PassState::ShadowPass,
            PassState::ColorPass,
            PassState::Present,
            PassState::Idle,
        ] {
            order.advance(state);
            assert_eq!(order.state(), state);
        }
    }

    #[test]
    #[should_panic(expected = "illegal pass transition Idle -> ColorPass")]
    fn color_pass_cannot_skip_shadow_pass() {
        PassOrder::new().advance(PassState::ColorPass);
    }

    #[test]
    #[should_panic(expected = "illegal pass transition ShadowPass -> Present")]
    fn present_cannot_skip_color_pass() {
        let mut order = PassOrder::new();
        order.advance(PassState::ShadowPass);
        order.advance(PassState::Present);
    }

    #[test]
    #[should_panic]
    fn passes_cannot_repeat() {
        let mut order = PassOrder::new();
        order.advance(PassState::ShadowPass);
        order.advance(PassState::ShadowPass);
    }
}
