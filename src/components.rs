//! ECS component types for replicated simulation entities.
//! Agents, targets and obstacles each get a marker plus the state the
//! reconciler and overlays read back.
use bevy::prelude::*;

use crate::constants::{AGENT_DETECTION_RADIUS, AGENT_MAX_HEALTH, AGENT_SIZE};
use crate::store::EntityId;

/// Swarm member; sizes are in render units.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct Agent {
    /// Edge length of the bounding-box overlay.
    pub size: f32,
    /// Radius of the detection ring overlay.
    pub detection_radius: f32,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            size: AGENT_SIZE,
            detection_radius: AGENT_DETECTION_RADIUS,
        }
    }
}

/// Goal marker with its render radius.
#[derive(Component, Reflect, Debug, Default, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct Target {
    /// Radius in render units.
    pub radius: f32,
}

/// Obstruction with its render radius.
#[derive(Component, Reflect, Debug, Default, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct Obstacle {
    /// Radius in render units.
    pub radius: f32,
}

/// Health in `[0, 100]`.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Deref, DerefMut)]
#[reflect(Component)]
pub struct Health(pub f32);

impl Default for Health {
    fn default() -> Self {
        Self(AGENT_MAX_HEALTH)
    }
}

/// Target id an agent is pursuing. Used only to pick its color.
#[derive(Component, Debug, Clone, PartialEq, Eq, Deref)]
pub struct TargetRef(pub EntityId);

/// Name of the last map object an agent reported.
#[derive(Component, Debug, Clone, PartialEq, Eq, Deref)]
pub struct LastDetection(pub String);
