//! The placed model instances and how each one is positioned per frame.
//!
//! A [`Scene`] is a flat list of [`SceneInstance`]s. Each instance names the
//! model it draws and a [`TransformRule`]: either a fixed placement, or a
//! placement that follows the ball. [`Scene::resolve`] turns the list into
//! world matrices once per frame; the shadow and color passes both draw from
//! that one resolved list.

use glam::{Mat4, Quat, Vec3};

use crate::ball::Ball;
use crate::mesh::Transform;

/// Index of a loaded model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelId(pub usize);

/// How an instance's world transform is produced each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformRule {
    /// Always the same placement.
    Fixed(Transform),
    /// Rides the ball: translated by its displacement from `start`, spun about
    /// its spin axis, then scaled.
    Projectile { start: Vec3, scale: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneInstance {
    pub name: String,
    pub model: ModelId,
    pub rule: TransformRule,
}

impl SceneInstance {
    pub fn fixed(name: impl Into<String>, model: ModelId, transform: Transform) -> Self {
        Self {
            name: name.into(),
            model,
            rule: TransformRule::Fixed(transform),
        }
    }

    pub fn projectile(name: impl Into<String>, model: ModelId, start: Vec3, scale: f32) -> Self {
        Self {
            name: name.into(),
            model,
            rule: TransformRule::Projectile { start, scale },
        }
    }
}

/// One instance ready to draw this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedInstance {
    /// Position in the scene's instance list; also the instance's uniform slot.
    pub slot: usize,
    pub model: ModelId,
    pub world: Mat4,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    instances: Vec<SceneInstance>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance. Draw order follows insertion order.
    pub fn with(mut self, instance: SceneInstance) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn instances(&self) -> &[SceneInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Advance the ball by `dt` and compute every instance's world matrix.
    ///
    /// The ball is advanced exactly once per call, however many instances
    /// follow it.
    pub fn resolve(&self, ball: &mut Ball, dt: f32) -> Vec<ResolvedInstance> {
        let pose = ball.advance(dt);

        self.instances
            .iter()
            .enumerate()
            .map(|(slot, instance)| {
                let world = match instance.rule {
                    TransformRule::Fixed(transform) => transform.matrix(),
                    TransformRule::Projectile { start, scale } => Transform::new()
                        .position(start + pose.displacement)
                        .rotation(Quat::from_axis_angle(pose.spin_axis, pose.spin_angle))
                        .uniform_scale(scale)
                        .matrix(),
                };
                ResolvedInstance {
                    slot,
                    model: instance.model,
                    world,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::LaunchParams;
    use approx::assert_relative_eq;

    const BALL: ModelId = ModelId(0);
    const CHARACTER: ModelId = ModelId(1);
    const STADIUM: ModelId = ModelId(2);

    fn scene() -> Scene {
        Scene::new()
            .with(SceneInstance::projectile(
                "ball",
                BALL,
                Vec3::new(20.0, 0.0, 10.0),
                0.06,
            ))
            .with(SceneInstance::fixed(
                "character",
                CHARACTER,
                Transform::from_position(Vec3::new(20.0, 0.0, -20.0)),
            ))
            .with(SceneInstance::fixed(
                "stadium",
                STADIUM,
                Transform::from_position(Vec3::new(-125.0, 0.0, 204.0)).uniform_scale(1.8),
            ))
    }

    #[test]
    fn resolves_in_insertion_order() {
        let mut ball = Ball::new(LaunchParams::default());
        let resolved = scene().resolve(&mut ball, 0.016);
        let models: Vec<_> = resolved.iter().map(|r| r.model).collect();
        assert_eq!(models, [BALL, CHARACTER, STADIUM]);
        let slots: Vec<_> = resolved.iter().map(|r| r.slot).collect();
        assert_eq!(slots, [0, 1, 2]);
    }

    #[test]
    fn resting_ball_sits_on_its_spot() {
        let mut ball = Ball::new(LaunchParams::default());
        let resolved = scene().resolve(&mut ball, 0.5);
        let (scale, rotation, translation) = resolved[0].world.to_scale_rotation_translation();
        assert!(translation.abs_diff_eq(Vec3::new(20.0, 0.0, 10.0), 1e-5));
        assert!(scale.abs_diff_eq(Vec3::splat(0.06), 1e-6));
        assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn kicked_ball_follows_trajectory() {
        let launch = LaunchParams::default();
        let mut ball = Ball::new(launch);
        ball.kick();
        let resolved = scene().resolve(&mut ball, 1.0);

        let expected = Vec3::new(20.0, 0.0, 10.0) + launch.displacement_at(1.0);
        let center = resolved[0].world.transform_point3(Vec3::ZERO);
        assert!(center.abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn ball_advances_once_per_frame() {
        let scene = scene().with(SceneInstance::projectile("shadow twin", BALL, Vec3::ZERO, 1.0));
        let mut ball = Ball::new(LaunchParams::default());
        ball.kick();
        scene.resolve(&mut ball, 0.25);
        assert_relative_eq!(ball.elapsed(), 0.25);
        assert_relative_eq!(ball.spin_angle(), -80.0 * 0.25 / 1000.0);
    }

    #[test]
    fn fixed_instances_ignore_the_ball() {
        let mut ball = Ball::new(LaunchParams::default());
        let before = scene().resolve(&mut ball, 0.0);
        ball.kick();
        let after = scene().resolve(&mut ball, 2.0);
        assert_eq!(before[1].world, after[1].world);
        assert_eq!(before[2].world, after[2].world);
    }

    #[test]
    fn spin_rotates_about_configured_axis() {
        let launch = LaunchParams {
            angular_velocity: 1000.0 * std::f32::consts::FRAC_PI_2,
            spin_axis: Vec3::Y,
            ..LaunchParams::default()
        };
        let scene = Scene::new().with(SceneInstance::projectile("ball", BALL, Vec3::ZERO, 1.0));
        let mut ball = Ball::new(launch);
        ball.kick();
        let world = scene.resolve(&mut ball, 1.0)[0].world;

        // A quarter turn the negative way about +Y takes +X to +Z.
        let spun = world.transform_vector3(Vec3::X);
        assert!(spun.abs_diff_eq(Vec3::Z, 1e-4));
    }
}
