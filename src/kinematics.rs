//! Local kinematic model for agents.
//!
//! Snapshots are authoritative: every snapshot overwrites an agent's
//! [`Kinematics`] wholesale. When prediction is enabled, frames that see no
//! snapshot advance agents with one explicit Euler step each, in simulation
//! space, and the next snapshot discards whatever was predicted.

use bevy::prelude::*;

use crate::components::Agent;
use crate::config::SceneConfig;

/// Simulation-space motion state of an agent.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    /// Position in simulation units.
    pub position: Vec3,
    /// Velocity per step; `z` stays zero.
    pub velocity: Vec3,
    /// Acceleration for the next step; consumed by [`Self::integrate`].
    pub acceleration: Vec3,
    /// Unit heading, `None` while the agent is not moving.
    pub direction: Option<Vec3>,
}

impl Kinematics {
    /// Builds the state reported by a snapshot.
    ///
    /// The heading is derived from `velocity` the same way
    /// [`Self::integrate`] derives it.
    #[must_use]
    pub fn new(position: Vec3, velocity: Vec2, acceleration: Vec2) -> Self {
        let velocity = velocity.extend(0.0);
        Self {
            position,
            velocity,
            acceleration: acceleration.extend(0.0),
            direction: heading(velocity),
        }
    }

    /// Adds `force` to the pending acceleration (unit mass).
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    /// Advances one unit time step.
    ///
    /// `velocity += acceleration`, `position += velocity`, then the
    /// acceleration is reset so forces must be reapplied every step.
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::{Vec2, Vec3};
    /// use swarm_view::kinematics::Kinematics;
    ///
    /// let mut k = Kinematics::new(Vec3::ZERO, Vec2::X, Vec2::Y);
    /// k.integrate();
    /// assert_eq!(k.velocity, Vec3::new(1.0, 1.0, 0.0));
    /// assert_eq!(k.position, Vec3::new(1.0, 1.0, 0.0));
    /// assert_eq!(k.acceleration, Vec3::ZERO);
    /// ```
    pub fn integrate(&mut self) {
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration = Vec3::ZERO;
        self.direction = heading(self.velocity);
    }
}

fn heading(velocity: Vec3) -> Option<Vec3> {
    velocity.try_normalize()
}

/// Advances every agent one step and moves its transform to match.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn predict_agents(
    config: Res<SceneConfig>,
    mut agents: Query<(&mut Kinematics, &mut Transform), With<Agent>>,
) {
    let mapping = config.mapping();
    for (mut kinematics, mut transform) in &mut agents {
        kinematics.integrate();
        transform.translation = mapping.to_render_position(kinematics.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn one_step_matches_explicit_euler() {
        let start = Vec3::new(3.0, 4.0, 0.0);
        let mut k = Kinematics::new(start, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        k.integrate();
        assert_eq!(k.velocity, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(k.position, start + Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(k.acceleration, Vec3::ZERO);
    }

    #[test]
    fn acceleration_is_consumed() {
        let mut k = Kinematics::new(Vec3::ZERO, Vec2::ZERO, Vec2::X);
        k.integrate();
        k.integrate();
        assert_eq!(k.velocity, Vec3::X);
        assert_eq!(k.position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn forces_accumulate_until_the_next_step() {
        let mut k = Kinematics::default();
        k.apply_force(Vec3::X);
        k.apply_force(Vec3::Y);
        assert_eq!(k.acceleration, Vec3::new(1.0, 1.0, 0.0));
        k.integrate();
        assert_eq!(k.acceleration, Vec3::ZERO);
    }

    #[rstest]
    #[case(Vec2::new(3.0, 4.0), Some(Vec3::new(0.6, 0.8, 0.0)))]
    #[case(Vec2::ZERO, None)]
    #[case(Vec2::new(f32::NAN, 0.0), None)]
    fn direction_is_guarded(#[case] velocity: Vec2, #[case] expected: Option<Vec3>) {
        let k = Kinematics::new(Vec3::ZERO, velocity, Vec2::ZERO);
        match (k.direction, expected) {
            (Some(got), Some(want)) => {
                assert_relative_eq!(got.x, want.x);
                assert_relative_eq!(got.y, want.y);
                assert_relative_eq!(got.length(), 1.0, epsilon = 1e-6);
            }
            (got, want) => assert_eq!(got, want),
        }
    }

    #[test]
    fn prediction_moves_transforms() {
        let mut app = App::new();
        app.insert_resource(SceneConfig::default());
        app.add_systems(Update, predict_agents);
        let agent = app
            .world_mut()
            .spawn((
                Agent::default(),
                Kinematics::new(Vec3::new(400.0, 300.0, 0.0), Vec2::new(8.0, 0.0), Vec2::ZERO),
                Transform::default(),
            ))
            .id();
        app.update();
        let transform = app.world().get::<Transform>(agent).copied().unwrap_or_default();
        assert_relative_eq!(transform.translation.x, 0.1);
        assert_relative_eq!(transform.translation.y, 0.0);
    }
}
