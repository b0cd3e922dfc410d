//! Indicator overlays attached to agents.
//!
//! An overlay is a root entity following its agent with one child per
//! enabled part. The root is kept separate from the agent's own hierarchy
//! so the agent's mesh transform never affects the indicators; the agent
//! holds an [`OverlayHandle`] pointing at it and despawning the agent's
//! overlay goes through [`detach`].

use std::f32::consts::TAU;

use bevy::prelude::*;
use serde::Deserialize;

use crate::components::{Agent, Health};
use crate::constants::{
    AGENT_MAX_HEALTH, CROSSHAIR_DEPTH, CROSSHAIR_HALF_LENGTH, DETECTION_RING_SEGMENTS,
    DIRECTION_ARROW_LENGTH, HEALTH_BAR_HEIGHT, HEALTH_BAR_LIFT, HEALTH_BAR_WIDTH,
};
use crate::kinematics::Kinematics;
use crate::scene::{Rgb, Shape, Visual};

/// Which overlay parts to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayOptions {
    /// Wireframe cube of the agent's size.
    pub bounding_box: bool,
    /// Two short lines crossing at the agent, nudged towards the viewer.
    pub crosshair: bool,
    /// Ring at the agent's detection radius.
    pub detection_radius: bool,
    /// Bar above the agent whose width and color follow health.
    pub health_bar: bool,
    /// Arrow along the agent's heading.
    pub direction_arrow: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            bounding_box: true,
            crosshair: false,
            detection_radius: false,
            health_bar: false,
            direction_arrow: false,
        }
    }
}

/// Root of an agent's overlay.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    /// Agent the overlay follows.
    pub owner: Entity,
}

/// Points from an agent to its overlay root.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Deref)]
pub struct OverlayHandle(pub Entity);

/// Role of an overlay child.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[reflect(Component)]
pub enum OverlayPart {
    /// Wireframe cube.
    BoundingBox,
    /// Crossed lines.
    Crosshair,
    /// Detection ring.
    DetectionRing,
    /// Health bar.
    HealthBar,
    /// Heading arrow.
    DirectionArrow,
}

/// Color of the bounding-box wireframe.
pub const BOUNDING_BOX_COLOR: Rgb = Rgb::GREEN;
/// Color of the crosshair.
pub const CROSSHAIR_COLOR: Rgb = Rgb::RED;
/// Color of the detection ring.
pub const DETECTION_RING_COLOR: Rgb = Rgb::YELLOW;
/// Health-bar color at full health.
pub const HEALTHY_COLOR: Rgb = Rgb::GREEN;
/// Health-bar color at zero health.
pub const CRITICAL_COLOR: Rgb = Rgb::RED;
/// Color of the heading arrow.
pub const DIRECTION_ARROW_COLOR: Rgb = Rgb::WHITE;

/// Closed circle of `segments` chords; the first point is repeated at the end.
///
/// Point `i` sits at angle `2πi / segments`.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "segment counts are tiny"
)]
pub fn ring_points(radius: f32, segments: usize) -> Vec<Vec3> {
    let n = segments.max(1);
    (0..=n)
        .map(|i| {
            let angle = TAU * i as f32 / n as f32;
            Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
        })
        .collect()
}

/// Crosshair arms as two segments through the origin.
#[must_use]
pub fn crosshair_segments(half_length: f32) -> Vec<Vec3> {
    vec![
        Vec3::new(-half_length, 0.0, 0.0),
        Vec3::new(half_length, 0.0, 0.0),
        Vec3::new(0.0, -half_length, 0.0),
        Vec3::new(0.0, half_length, 0.0),
    ]
}

/// Health as a fraction of full health, clamped to `[0, 1]`.
#[must_use]
pub fn health_fraction(health: f32) -> f32 {
    (health / AGENT_MAX_HEALTH).clamp(0.0, 1.0)
}

/// Health-bar color: healthy at full health, critical at zero.
#[must_use]
pub fn health_color(health: f32) -> Rgb {
    HEALTHY_COLOR.lerp(CRITICAL_COLOR, 1.0 - health_fraction(health))
}

fn arrow_rotation(direction: Vec3) -> Quat {
    Quat::from_rotation_arc(Vec3::X, direction)
}

/// Spawns the overlay for `owner` at render position `at`.
///
/// Returns the overlay root and records it on the owner as an
/// [`OverlayHandle`].
pub fn attach(
    commands: &mut Commands,
    owner: Entity,
    agent: &Agent,
    at: Vec3,
    options: &OverlayOptions,
) -> Entity {
    let root = commands
        .spawn((Overlay { owner }, Transform::from_translation(at)))
        .id();
    let mut parts: Vec<(OverlayPart, Transform, Visual)> = Vec::new();
    if options.bounding_box {
        parts.push((
            OverlayPart::BoundingBox,
            Transform::IDENTITY,
            Visual::solid(Shape::WireCube { size: agent.size }, BOUNDING_BOX_COLOR),
        ));
    }
    if options.crosshair {
        parts.push((
            OverlayPart::Crosshair,
            Transform::from_xyz(0.0, 0.0, CROSSHAIR_DEPTH),
            Visual::solid(
                Shape::Segments {
                    points: crosshair_segments(CROSSHAIR_HALF_LENGTH),
                },
                CROSSHAIR_COLOR,
            ),
        ));
    }
    if options.detection_radius {
        parts.push((
            OverlayPart::DetectionRing,
            Transform::IDENTITY,
            Visual::solid(
                Shape::Polyline {
                    points: ring_points(agent.detection_radius, DETECTION_RING_SEGMENTS),
                },
                DETECTION_RING_COLOR,
            ),
        ));
    }
    if options.health_bar {
        parts.push((
            OverlayPart::HealthBar,
            Transform::from_xyz(0.0, HEALTH_BAR_LIFT, 0.0),
            Visual::solid(
                Shape::Rectangle {
                    size: Vec2::new(HEALTH_BAR_WIDTH, HEALTH_BAR_HEIGHT),
                },
                HEALTHY_COLOR,
            ),
        ));
    }
    if options.direction_arrow {
        parts.push((
            OverlayPart::DirectionArrow,
            Transform::IDENTITY,
            Visual::solid(
                Shape::Arrow {
                    length: DIRECTION_ARROW_LENGTH,
                },
                DIRECTION_ARROW_COLOR,
            ),
        ));
    }
    for (part, transform, visual) in parts {
        commands.spawn((part, transform, visual, ChildOf(root)));
    }
    commands.entity(owner).insert(OverlayHandle(root));
    root
}

/// Despawns an overlay root and its parts.
pub fn detach(commands: &mut Commands, handle: OverlayHandle) {
    commands.entity(handle.0).despawn();
}

/// Moves overlay roots onto their agents and refreshes health and heading.
///
/// Overlays whose owner has gone are despawned.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
pub fn update_overlays(
    mut commands: Commands,
    owners: Query<
        (&Transform, Option<&Health>, Option<&Kinematics>),
        (With<Agent>, Without<Overlay>, Without<OverlayPart>),
    >,
    mut roots: Query<(Entity, &Overlay, &mut Transform), Without<OverlayPart>>,
    mut parts: Query<(&OverlayPart, &ChildOf, &mut Transform, &mut Visual), Without<Overlay>>,
) {
    for (root, overlay, mut transform) in &mut roots {
        match owners.get(overlay.owner) {
            Ok((owner, _, _)) => transform.translation = owner.translation,
            Err(_) => {
                log::debug!("despawning orphaned overlay {root:?}");
                commands.entity(root).despawn();
            }
        }
    }
    for (part, child_of, mut transform, mut visual) in &mut parts {
        let Ok((_, overlay, _)) = roots.get(child_of.parent()) else {
            continue;
        };
        let Ok((_, health, kinematics)) = owners.get(overlay.owner) else {
            continue;
        };
        match part {
            OverlayPart::HealthBar => {
                let health = health.map_or(AGENT_MAX_HEALTH, |h| h.0);
                transform.scale.x = health_fraction(health);
                let color = health_color(health);
                if visual.color != color {
                    visual.color = color;
                }
            }
            OverlayPart::DirectionArrow => {
                if let Some(direction) = kinematics.and_then(|k| k.direction) {
                    transform.rotation = arrow_rotation(direction);
                }
            }
            OverlayPart::BoundingBox | OverlayPart::Crosshair | OverlayPart::DetectionRing => {}
        }
    }
}
