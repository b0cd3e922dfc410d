//! Serde shapes of the feed JSON.
//!
//! These mirror the simulator output closely and are converted into the
//! validated types in the parent module one record at a time.

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::store::EntityId;

/// Two-component vector sent either as `{x, y}` or `[x, y]`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub(super) enum WireVec2 {
    Object { x: f32, y: f32 },
    Pair([f32; 2]),
}

impl From<WireVec2> for Vec2 {
    fn from(value: WireVec2) -> Self {
        match value {
            WireVec2::Object { x, y } => Self::new(x, y),
            WireVec2::Pair([x, y]) => Self::new(x, y),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireAgent {
    pub target_id: EntityId,
    pub position: Vec<f32>,
    #[serde(default)]
    pub z_position: Option<f32>,
    /// Misspelt key some simulator builds emit. `z_position` wins when both appear.
    #[serde(default)]
    pub z_positon: Option<f32>,
    pub velocity: WireVec2,
    pub acceleration: WireVec2,
    #[serde(default)]
    pub health: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireBody {
    pub position: Vec<f32>,
    pub radius: f32,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireMapObject {
    pub name: String,
    pub position: Vec<f32>,
    #[serde(rename = "boundingBox")]
    pub bounding_box: [[f32; 2]; 2],
    pub object_type: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Value,
    #[serde(default)]
    pub detected: bool,
}

impl WireAgent {
    pub(super) fn z(&self) -> Option<f32> {
        self.z_position.or(self.z_positon)
    }
}

/// Reads a 2- or 3-component position; `z` defaults to zero.
pub(super) fn position(coords: &[f32]) -> Option<Vec3> {
    let point = match *coords {
        [x, y] => Vec3::new(x, y, 0.0),
        [x, y, z] => Vec3::new(x, y, z),
        _ => return None,
    };
    point.is_finite().then_some(point)
}
