//! Closed-form projectile motion for the kicked ball.
//!
//! The ball's position is a pure function of the time since it was kicked:
//! constant launch velocity horizontally, constant downward acceleration
//! vertically, no drag and no collisions. The launch velocity is decomposed
//! from a speed and two angles:
//!
//! - **pitch** lifts the shot above the ground plane (0° is a grazing shot)
//! - **yaw** turns it around the vertical axis (0° points along +X, 90° along +Z)
//!
//! The launch plane acts as a floor: once the ball comes back down to it, it
//! keeps rolling at launch height instead of sinking through. A zero-pitch
//! shot therefore skims along the ground for its whole flight.
//!
//! Spin is purely visual. It is accumulated frame by frame from the angular
//! velocity and is not coupled to the trajectory.
//!
//! ```
//! use freekick::{Ball, LaunchParams, Vec3};
//!
//! let mut ball = Ball::new(LaunchParams::default());
//! assert_eq!(ball.position_at(0.5), Vec3::ZERO); // not kicked yet
//!
//! ball.kick();
//! let offset = ball.position_at(1.0);
//! assert!(offset.length() > 0.0);
//! ```

use glam::Vec3;

/// Downward acceleration applied to the ball, in units per second squared.
pub const GRAVITY: f32 = 9.81;

/// Divisor turning angular velocity into the per-second visual spin rate.
pub const SPIN_RATE_DIVISOR: f32 = 1000.0;

/// Parameters a kick starts from, and what [`Ball::reset`] restores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaunchParams {
    /// Spin rate fed into [`Ball::spin_angle_delta`].
    pub angular_velocity: f32,
    /// Launch speed in units per second.
    pub speed: f32,
    /// Elevation above the ground plane, in degrees.
    pub pitch: f32,
    /// Heading around the vertical axis, in degrees.
    pub yaw: f32,
    /// Axis the ball spins about. Normalized on use.
    pub spin_axis: Vec3,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            angular_velocity: 80.0,
            speed: 36.0,
            pitch: 0.0,
            yaw: 45.0,
            spin_axis: Vec3::Y,
        }
    }
}

impl LaunchParams {
    /// Initial velocity vector of the kick.
    pub fn velocity(&self) -> Vec3 {
        let pitch = self.pitch.to_radians();
        let yaw = self.yaw.to_radians();
        let horizontal = self.speed * pitch.cos();

        Vec3::new(
            horizontal * yaw.cos(),
            self.speed * pitch.sin(),
            horizontal * yaw.sin(),
        )
    }

    /// Displacement from the launch point `t` seconds after the kick.
    ///
    /// Height never drops below the launch plane.
    pub fn displacement_at(&self, t: f32) -> Vec3 {
        let v = self.velocity();
        let height = v.y * t - 0.5 * GRAVITY * t * t;
        Vec3::new(v.x * t, height.max(0.0), v.z * t)
    }

    /// Seconds from the kick until the ball returns to the launch plane.
    pub fn flight_time(&self) -> f32 {
        (2.0 * self.velocity().y / GRAVITY).max(0.0)
    }

    /// The spin axis as a unit vector, falling back to +Y for a zero axis.
    pub fn unit_spin_axis(&self) -> Vec3 {
        self.spin_axis.try_normalize().unwrap_or(Vec3::Y)
    }
}

/// The ball's displacement and accumulated spin for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallPose {
    pub displacement: Vec3,
    pub spin_angle: f32,
    pub spin_axis: Vec3,
}

/// Kick state, flight clock and visual spin of the ball.
#[derive(Clone, Debug)]
pub struct Ball {
    launch: LaunchParams,
    kicked: bool,
    elapsed: f32,
    spin_angle: f32,
}

impl Ball {
    pub fn new(launch: LaunchParams) -> Self {
        Self {
            launch,
            kicked: false,
            elapsed: 0.0,
            spin_angle: 0.0,
        }
    }

    /// Start the flight. Has no effect once the ball is already in flight.
    ///
    /// Returns `true` if this call started the flight.
    pub fn kick(&mut self) -> bool {
        if self.kicked {
            return false;
        }
        self.kicked = true;
        self.elapsed = 0.0;
        true
    }

    /// Put the ball back on its spot with new launch parameters.
    pub fn reset(&mut self, launch: LaunchParams) {
        self.launch = launch;
        self.kicked = false;
        self.elapsed = 0.0;
        self.spin_angle = 0.0;
    }

    /// Advance the flight clock by `dt` seconds and return the displacement
    /// from the launch point.
    ///
    /// Before a kick the clock does not run and the displacement is zero.
    pub fn position_at(&mut self, dt: f32) -> Vec3 {
        if !self.kicked {
            return Vec3::ZERO;
        }
        self.elapsed += dt;
        self.launch.displacement_at(self.elapsed)
    }

    /// Accumulate `dt` seconds of spin and return the change in angle (radians).
    pub fn spin_angle_delta(&mut self, dt: f32) -> f32 {
        let delta = -self.launch.angular_velocity * dt / SPIN_RATE_DIVISOR;
        self.spin_angle += delta;
        delta
    }

    /// Advance both the trajectory and, while in flight, the spin.
    ///
    /// This is the once-per-frame entry point used by the scene.
    pub fn advance(&mut self, dt: f32) -> BallPose {
        let displacement = self.position_at(dt);
        if self.kicked {
            self.spin_angle_delta(dt);
        }
        BallPose {
            displacement,
            spin_angle: self.spin_angle,
            spin_axis: self.launch.unit_spin_axis(),
        }
    }

    pub fn is_kicked(&self) -> bool {
        self.kicked
    }

    /// Seconds of flight since the kick.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn spin_angle(&self) -> f32 {
        self.spin_angle
    }

    pub fn launch(&self) -> &LaunchParams {
        &self.launch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lofted() -> LaunchParams {
        LaunchParams {
            pitch: 30.0,
            ..LaunchParams::default()
        }
    }

    #[test]
    fn no_motion_before_kick() {
        let mut ball = Ball::new(lofted());
        for dt in [0.0, 0.016, 1.0, 250.0] {
            assert_eq!(ball.position_at(dt), Vec3::ZERO);
        }
        assert_eq!(ball.elapsed(), 0.0);
    }

    #[test]
    fn kick_is_idempotent() {
        let mut ball = Ball::new(lofted());
        assert!(ball.kick());
        ball.position_at(0.5);
        assert!(!ball.kick());
        assert_relative_eq!(ball.elapsed(), 0.5);
    }

    #[test]
    fn grazing_shot_at_one_second() {
        let mut ball = Ball::new(LaunchParams {
            speed: 36.0,
            pitch: 0.0,
            yaw: 45.0,
            ..LaunchParams::default()
        });
        ball.kick();
        let offset = ball.position_at(1.0);

        let expected = 36.0 / 2.0_f32.sqrt();
        assert_relative_eq!(offset.x, expected, epsilon = 1e-4);
        assert_relative_eq!(offset.z, expected, epsilon = 1e-4);
        assert_relative_eq!(Vec3::new(offset.x, 0.0, offset.z).length(), 36.0, epsilon = 1e-4);
        assert_eq!(offset.y, 0.0);
    }

    #[test]
    fn height_is_symmetric_about_the_peak() {
        let launch = lofted();
        let peak_time = launch.velocity().y / GRAVITY;
        let peak = launch.displacement_at(peak_time).y;

        for d in [0.1, 0.5, 1.0] {
            let before = launch.displacement_at(peak_time - d).y;
            let after = launch.displacement_at(peak_time + d).y;
            assert_relative_eq!(before, after, epsilon = 1e-3);
            assert!(before < peak);
        }
    }

    #[test]
    fn ball_rolls_on_after_landing() {
        let launch = lofted();
        let landed = launch.displacement_at(launch.flight_time() + 2.0);
        assert_eq!(landed.y, 0.0);
        assert!(landed.x > launch.displacement_at(launch.flight_time()).x);
    }

    #[test]
    fn horizontal_distance_grows_monotonically() {
        let launch = lofted();
        let mut last = 0.0;
        for step in 1..50 {
            let d = launch.displacement_at(step as f32 * 0.1);
            let horizontal = Vec3::new(d.x, 0.0, d.z).length();
            assert!(horizontal > last);
            last = horizontal;
        }
    }

    #[test]
    fn reset_restores_launch_spot() {
        let launch = lofted();
        let mut ball = Ball::new(launch);
        ball.kick();
        ball.advance(0.7);
        ball.advance(0.3);
        assert_ne!(ball.spin_angle(), 0.0);

        ball.reset(launch);
        assert!(!ball.is_kicked());
        assert_eq!(ball.spin_angle(), 0.0);
        assert_eq!(ball.position_at(0.0), Vec3::ZERO);
    }

    #[test]
    fn spin_accumulates_linearly() {
        let mut ball = Ball::new(LaunchParams::default());
        for _ in 0..100 {
            ball.spin_angle_delta(0.01);
        }
        assert_relative_eq!(ball.spin_angle(), -80.0 * 1.0 / 1000.0, epsilon = 1e-5);
    }

    #[test]
    fn no_spin_before_kick() {
        let mut ball = Ball::new(LaunchParams::default());
        let pose = ball.advance(1.0);
        assert_eq!(pose.spin_angle, 0.0);
        assert_eq!(pose.displacement, Vec3::ZERO);
    }

    #[test]
    fn zero_spin_axis_falls_back_to_up() {
        let launch = LaunchParams {
            spin_axis: Vec3::ZERO,
            ..LaunchParams::default()
        };
        assert_eq!(launch.unit_spin_axis(), Vec3::Y);
    }
}
