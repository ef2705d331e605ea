use std::collections::HashSet;

use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard and mouse state, sampled once per frame.
///
/// Events are folded in as they arrive; the frame driver reads the snapshot and
/// then calls [`begin_frame`](Self::begin_frame) to clear the per-frame parts.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    mouse_delta: Vec2,
    close_requested: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call after each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press(key),
                        ElementState::Released => self.release(key),
                    }
                }
            }
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Focused(false) => self.keys_down.clear(),
            _ => {}
        }
    }

    /// Process raw device motion. Used for mouse look while the cursor is grabbed.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.add_mouse_motion(delta.0 as f32, delta.1 as f32);
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        if self.keys_down.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        if self.keys_down.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    /// Accumulate raw mouse motion (screen axes, +y down).
    pub fn add_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key went down this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Raw mouse motion accumulated since the last frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Mouse motion as a look delta: +x turns right, +y looks up.
    pub fn look_delta(&self) -> Vec2 {
        Vec2::new(self.mouse_delta.x, -self.mouse_delta.y)
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_reported_once_per_hold() {
        let mut input = Input::new();
        input.press(KeyCode::KeyF);
        assert!(input.key_pressed(KeyCode::KeyF));
        assert!(input.key_down(KeyCode::KeyF));

        input.begin_frame();
        // Key repeat delivers another press while held.
        input.press(KeyCode::KeyF);
        assert!(!input.key_pressed(KeyCode::KeyF));
        assert!(input.key_down(KeyCode::KeyF));

        input.release(KeyCode::KeyF);
        assert!(input.key_released(KeyCode::KeyF));
        assert!(!input.key_down(KeyCode::KeyF));
    }

    #[test]
    fn mouse_motion_accumulates_until_frame_ends() {
        let mut input = Input::new();
        input.add_mouse_motion(3.0, 1.0);
        input.add_mouse_motion(2.0, 4.0);
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 5.0));
        assert_eq!(input.look_delta(), Vec2::new(5.0, -5.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn close_request_survives_frame_reset() {
        let mut input = Input::new();
        input.request_close();
        input.begin_frame();
        assert!(input.close_requested());
    }
}
