//! Builders for simulator-shaped JSON used across tests.
//!
//! The builders emit the wire format the simulator sends, including its
//! misspelled `z_positon` key, so tests exercise the real parser.

use serde_json::{json, Map, Value};

/// Agent record as the simulator sends it.
///
/// # Examples
/// ```
/// use test_utils::fixtures::agent;
/// let (id, record) = agent("a1", "0", [400.0, 300.0]);
/// assert_eq!(id, "a1");
/// assert_eq!(record["target_id"], "0");
/// ```
#[must_use]
pub fn agent(id: &str, target_id: &str, position: [f32; 2]) -> (String, Value) {
    (
        id.to_owned(),
        json!({
            "target_id": target_id,
            "position": position,
            "z_positon": 0.0,
            "velocity": [0.0, 0.0],
            "acceleration": [0.0, 0.0],
        }),
    )
}

/// Adds a velocity to an agent record.
#[must_use]
pub fn moving(mut record: (String, Value), velocity: [f32; 2]) -> (String, Value) {
    record.1["velocity"] = json!(velocity);
    record
}

/// Adds a health value to an agent record.
#[must_use]
pub fn with_health(mut record: (String, Value), health: f32) -> (String, Value) {
    record.1["health"] = json!(health);
    record
}

/// Target or obstacle record.
#[must_use]
pub fn body(id: &str, position: [f32; 2], radius: f32) -> (String, Value) {
    (
        id.to_owned(),
        json!({ "position": position, "radius": radius }),
    )
}

fn keyed(records: Vec<(String, Value)>) -> Value {
    Value::Object(records.into_iter().collect::<Map<String, Value>>())
}

/// Full snapshot with all three entity maps present.
#[must_use]
pub fn snapshot(
    agents: Vec<(String, Value)>,
    targets: Vec<(String, Value)>,
    obstacles: Vec<(String, Value)>,
) -> Value {
    json!({
        "agents": keyed(agents),
        "targets": keyed(targets),
        "obstacles": keyed(obstacles),
    })
}

/// Map-object record with a bounding box of `size` anchored at the origin.
#[must_use]
pub fn map_object(
    name: &str,
    object_type: &str,
    position: [f32; 2],
    size: [f32; 2],
    detected: bool,
) -> Value {
    json!({
        "name": name,
        "position": position,
        "boundingBox": [[0.0, 0.0], size],
        "object_type": object_type,
        "detected": detected,
        "properties": {},
    })
}

/// Marks a map-object record as damaged.
#[must_use]
pub fn damaged(mut record: Value) -> Value {
    record["condition"] = json!("damaged");
    record
}

/// Snapshot carrying only new detections.
#[must_use]
pub fn detections(records: Vec<Value>) -> Value {
    json!({ "new_detections": records })
}
