//! Validated snapshot and map-record types parsed from feed JSON.
//!
//! Parsing is lenient per record: a record with missing or ill-typed fields
//! is dropped with a warning and the rest of the message is kept. Only a
//! message that is not a JSON object at all fails as a whole.

mod wire;

use glam::{Vec2, Vec3};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::AGENT_MAX_HEALTH;
use crate::store::{EntityClass, EntityId};

/// Failure to read a whole feed message.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The text was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON was valid but had the wrong top-level shape.
    #[error("expected a JSON {expected}, found {found}")]
    Shape {
        /// Shape that was required.
        expected: &'static str,
        /// Shape that was received.
        found: &'static str,
    },
}

/// Agent state as reported by one snapshot, in simulation space.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    /// Agent id.
    pub id: EntityId,
    /// Target the agent is pursuing.
    pub target_id: EntityId,
    /// Position; `z` is zero when the feed omits it.
    pub position: Vec3,
    /// Planar velocity.
    pub velocity: Vec2,
    /// Planar acceleration.
    pub acceleration: Vec2,
    /// Health in `[0, 100]`.
    pub health: f32,
}

/// Target or obstacle state: a disc at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    /// Entity id.
    pub id: EntityId,
    /// Position; `z` is zero when the feed omits it.
    pub position: Vec3,
    /// Radius in simulation units.
    pub radius: f32,
}

/// Map object or detection record.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObjectRecord {
    /// Display key; unique only within the detection namespace.
    pub name: String,
    /// Centre in simulation space.
    pub position: Vec3,
    /// Two opposite corners of the axis-aligned footprint.
    pub bounding_box: [Vec2; 2],
    /// Raw kind tag such as `building` or `tree`.
    pub object_type: String,
    /// Free-form condition; only `damaged` changes rendering.
    pub condition: Option<String>,
    /// Opaque property bag.
    pub properties: Value,
    /// Whether the object has been detected and may be shown.
    pub detected: bool,
}

impl MapObjectRecord {
    /// Width and height of the bounding box in simulation units.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        let [a, b] = self.bounding_box;
        (b - a).abs()
    }

    /// Returns `true` when the condition is `damaged`.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.condition.as_deref() == Some("damaged")
    }
}

/// One complete state push from the simulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Agents, ordered by id.
    pub agents: Vec<AgentState>,
    /// Targets, ordered by id.
    pub targets: Vec<BodyState>,
    /// Obstacles, ordered by id.
    pub obstacles: Vec<BodyState>,
    /// Objects detected since the previous snapshot.
    pub new_detections: Vec<MapObjectRecord>,
    /// Last object name each agent reported, ordered by agent id.
    pub agent_detections: Vec<(EntityId, String)>,
    /// Ids whose records were present but malformed.
    ///
    /// Their render objects are neither updated nor evicted.
    pub retained: Vec<(EntityClass, EntityId)>,
    /// Classes whose keyed map was present in the message.
    ///
    /// Only these take part in eviction; a message that omits `agents`
    /// says nothing about which agents exist.
    pub reported: Vec<EntityClass>,
}

impl Snapshot {
    /// Parses a feed message.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when `text` is not a JSON object.
    ///
    /// # Examples
    ///
    /// ```
    /// use swarm_view::snapshot::Snapshot;
    ///
    /// let snapshot = Snapshot::parse(
    ///     r#"{"targets": {"t1": {"position": [400, 300], "radius": 10}}}"#,
    /// )
    /// .expect("valid snapshot");
    /// assert_eq!(snapshot.targets.len(), 1);
    /// assert!(snapshot.agents.is_empty());
    /// ```
    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Builds a snapshot from an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Shape`] when `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let mut root = match value {
            Value::Object(root) => root,
            other => {
                return Err(SnapshotError::Shape {
                    expected: "object",
                    found: kind_of(&other),
                })
            }
        };
        let mut snapshot = Self::default();
        let agents = keyed(&mut root, "agents");
        if agents.is_some() {
            snapshot.reported.push(EntityClass::Agent);
        }
        for (id, raw) in agents.into_iter().flatten() {
            match agent(id.clone(), raw) {
                Some(state) => snapshot.agents.push(state),
                None => snapshot.retained.push((EntityClass::Agent, id)),
            }
        }
        for (class, key) in [
            (EntityClass::Target, "targets"),
            (EntityClass::Obstacle, "obstacles"),
        ] {
            let entries = keyed(&mut root, key);
            if entries.is_some() {
                snapshot.reported.push(class);
            }
            for (id, raw) in entries.into_iter().flatten() {
                match body(id.clone(), raw, class) {
                    Some(state) if class == EntityClass::Target => snapshot.targets.push(state),
                    Some(state) => snapshot.obstacles.push(state),
                    None => snapshot.retained.push((class, id)),
                }
            }
        }
        if let Some(list) = root.remove("new_detections") {
            snapshot.new_detections = map_records(list, "new_detections");
        }
        for (id, raw) in keyed(&mut root, "agent_detections").into_iter().flatten() {
            match raw {
                Value::String(name) => snapshot.agent_detections.push((id, name)),
                Value::Null => {}
                other => log::warn!(
                    "agent_detections[{id}] should be a string, found {}",
                    kind_of(&other)
                ),
            }
        }
        Ok(snapshot)
    }

    /// Returns `true` when the message carries no entities or detections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
            && self.targets.is_empty()
            && self.obstacles.is_empty()
            && self.new_detections.is_empty()
            && self.agent_detections.is_empty()
            && self.retained.is_empty()
            && self.reported.is_empty()
    }
}

/// Parses a JSON array of map objects, skipping malformed entries.
///
/// # Errors
///
/// Returns [`SnapshotError`] when `text` is not a JSON array.
pub fn parse_map_objects(text: &str) -> Result<Vec<MapObjectRecord>, SnapshotError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_array() {
        return Err(SnapshotError::Shape {
            expected: "array",
            found: kind_of(&value),
        });
    }
    Ok(map_records(value, "map"))
}

fn map_records(list: Value, source: &str) -> Vec<MapObjectRecord> {
    let items = match list {
        Value::Array(items) => items,
        other => {
            log::warn!("{source} should be an array, found {}", kind_of(&other));
            return Vec::new();
        }
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| map_object(raw, source, index))
        .collect()
}

fn keyed(root: &mut Map<String, Value>, key: &str) -> Option<Vec<(EntityId, Value)>> {
    match root.remove(key) {
        None | Some(Value::Null) => None,
        Some(Value::Object(entries)) => {
            let mut out: Vec<(EntityId, Value)> = entries
                .into_iter()
                .map(|(id, raw)| (EntityId::from(id), raw))
                .collect();
            out.sort_by(|a, b| a.0.cmp(&b.0));
            Some(out)
        }
        Some(other) => {
            log::warn!("{key} should be an object, found {}", kind_of(&other));
            None
        }
    }
}

fn decode<T: DeserializeOwned>(raw: Value, what: &str) -> Option<T> {
    serde_json::from_value(raw)
        .map_err(|err| log::warn!("skipping malformed {what}: {err}"))
        .ok()
}

fn agent(id: EntityId, raw: Value) -> Option<AgentState> {
    let what = format!("agent {id}");
    let wire: wire::WireAgent = decode(raw, &what)?;
    let Some(mut position) = wire::position(&wire.position) else {
        log::warn!("skipping {what}: position must be 2 or 3 finite numbers");
        return None;
    };
    if let Some(z) = wire.z().filter(|z| z.is_finite()) {
        position.z = z;
    }
    let health = wire
        .health
        .filter(|h| h.is_finite())
        .map_or(AGENT_MAX_HEALTH, |h| h.clamp(0.0, AGENT_MAX_HEALTH));
    Some(AgentState {
        id,
        target_id: wire.target_id,
        position,
        velocity: wire.velocity.into(),
        acceleration: wire.acceleration.into(),
        health,
    })
}

fn body(id: EntityId, raw: Value, class: EntityClass) -> Option<BodyState> {
    let what = format!("{class} {id}");
    let wire: wire::WireBody = decode(raw, &what)?;
    let Some(position) = wire::position(&wire.position) else {
        log::warn!("skipping {what}: position must be 2 or 3 finite numbers");
        return None;
    };
    if !wire.radius.is_finite() || wire.radius < 0.0 {
        log::warn!("skipping {what}: radius {} is not a length", wire.radius);
        return None;
    }
    Some(BodyState {
        id,
        position,
        radius: wire.radius,
    })
}

fn map_object(raw: Value, source: &str, index: usize) -> Option<MapObjectRecord> {
    let what = format!("{source}[{index}]");
    let wire: wire::WireMapObject = decode(raw, &what)?;
    let Some(position) = wire::position(&wire.position) else {
        log::warn!("skipping {what} ({}): bad position", wire.name);
        return None;
    };
    let [a, b] = wire.bounding_box;
    let bounding_box = [Vec2::from_array(a), Vec2::from_array(b)];
    if !bounding_box.iter().all(|c| c.is_finite()) {
        log::warn!("skipping {what} ({}): bad bounding box", wire.name);
        return None;
    }
    Some(MapObjectRecord {
        name: wire.name,
        position,
        bounding_box,
        object_type: wire.object_type,
        condition: wire.condition,
        properties: wire.properties,
        detected: wire.detected,
    })
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
