//! First-person fly camera.
//!
//! Yaw and pitch are kept in degrees. Yaw 0° looks along +X and -90° along -Z;
//! pitch is clamped just short of straight up/down so the look-at basis never
//! flips.
//!
//! ```
//! use freekick::{FirstPersonCamera, MoveKeys, Vec3};
//!
//! let mut camera = FirstPersonCamera::new(Vec3::new(0.0, 0.5, 0.0));
//! camera.apply_look(10.0, 4.0);
//! camera.apply_movement(MoveKeys { forward: true, ..MoveKeys::default() }, 0.016);
//! let view = camera.view_matrix();
//! ```

use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

use crate::input::Input;

/// Largest pitch magnitude the camera accepts, in degrees.
pub const PITCH_LIMIT: f32 = 89.0;

/// Which movement keys are held this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MoveKeys {
    /// WASD to move and strafe, Space/Left Shift to rise and sink.
    pub fn from_input(input: &Input) -> Self {
        Self {
            forward: input.key_down(KeyCode::KeyW),
            back: input.key_down(KeyCode::KeyS),
            left: input.key_down(KeyCode::KeyA),
            right: input.key_down(KeyCode::KeyD),
            up: input.key_down(KeyCode::Space),
            down: input.key_down(KeyCode::ShiftLeft),
        }
    }
}

/// A free-flying first-person camera.
#[derive(Clone, Debug)]
pub struct FirstPersonCamera {
    pub position: Vec3,
    /// World up used to build the camera basis.
    pub world_up: Vec3,
    /// Horizontal angle in degrees.
    pub yaw: f32,
    /// Vertical angle in degrees, positive looks up.
    pub pitch: f32,
    /// Movement speed in units per second.
    pub move_speed: f32,
    /// Degrees of rotation per unit of mouse motion.
    pub turn_speed: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            move_speed: 5.0,
            turn_speed: 0.5,
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl FirstPersonCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn yaw(mut self, degrees: f32) -> Self {
        self.yaw = degrees;
        self
    }

    pub fn pitch(mut self, degrees: f32) -> Self {
        self.pitch = degrees.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self
    }

    pub fn speeds(mut self, move_speed: f32, turn_speed: f32) -> Self {
        self.move_speed = move_speed;
        self.turn_speed = turn_speed;
        self
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.world_up).normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize_or_zero()
    }

    /// Move along the camera's local axes for `dt` seconds.
    pub fn apply_movement(&mut self, keys: MoveKeys, dt: f32) {
        let forward = self.forward();
        let right = self.right();
        let up = self.up();

        let mut direction = Vec3::ZERO;
        if keys.forward {
            direction += forward;
        }
        if keys.back {
            direction -= forward;
        }
        if keys.right {
            direction += right;
        }
        if keys.left {
            direction -= right;
        }
        if keys.up {
            direction += up;
        }
        if keys.down {
            direction -= up;
        }

        if direction.length_squared() > 0.0 {
            self.position += direction.normalize() * self.move_speed * dt;
        }
    }

    /// Turn by a mouse delta. Positive `dy` looks up.
    pub fn apply_look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.turn_speed;
        self.pitch = (self.pitch + dy * self.turn_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), self.up())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_looks_down_negative_z() {
        let camera = FirstPersonCamera::default();
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(camera.right().abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn pitch_stays_clamped_under_huge_mouse_input() {
        let mut camera = FirstPersonCamera::default();
        for _ in 0..1000 {
            camera.apply_look(3.0, 10_000.0);
        }
        assert!(camera.pitch < 90.0);
        assert_relative_eq!(camera.pitch, PITCH_LIMIT);

        camera.apply_look(0.0, -1.0e9);
        assert!(camera.pitch > -90.0);
        assert_relative_eq!(camera.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn movement_scales_with_dt() {
        let mut camera = FirstPersonCamera::new(Vec3::ZERO).speeds(5.0, 0.5);
        let forward = MoveKeys {
            forward: true,
            ..MoveKeys::default()
        };
        camera.apply_movement(forward, 2.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, -10.0), 1e-5));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut camera = FirstPersonCamera::new(Vec3::ONE);
        camera.apply_movement(
            MoveKeys {
                left: true,
                right: true,
                ..MoveKeys::default()
            },
            1.0,
        );
        assert_eq!(camera.position, Vec3::ONE);
    }

    #[test]
    fn view_matrix_puts_eye_at_origin() {
        let mut camera = FirstPersonCamera::new(Vec3::new(3.0, 1.5, -7.0));
        camera.apply_look(25.0, -12.0);
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-4));

        let ahead = camera
            .view_matrix()
            .transform_point3(camera.position + camera.forward());
        assert!(ahead.abs_diff_eq(Vec3::NEG_Z, 1e-4));
    }
}
