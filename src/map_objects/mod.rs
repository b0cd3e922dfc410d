//! Static map content and name-keyed detection highlights.
//!
//! Map objects live in their own namespace keyed by [`ObjectName`], separate
//! from the `(class, id)` keys of replicated entities: an agent `a1` and a
//! detection named `a1` are unrelated. Names are not unique across object
//! kinds in a map; when two static objects share a name the later one owns
//! the index entry.

mod kind;

pub use kind::{
    ObjectKind, UnknownKind, BUILDING_DAMAGED, BUILDING_INTACT, FLOOD_COLOR, PERSON_COLOR,
    TREE_COLOR, VEHICLE_COLOR,
};

use std::fmt;

use bevy::prelude::*;
use hashbrown::HashMap;

use crate::constants::{DETECTION_DEPTH, DETECTION_OPACITY, LABEL_LIFT};
use crate::coords::SpaceMapping;
use crate::scene::{Label, Rgb, Shape, Visual};
use crate::snapshot::MapObjectRecord;

/// Display key of a map object or detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName(String);

impl ObjectName {
    /// Wraps a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrowed name text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static map object spawned from a map load.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct MapObject {
    /// Display key.
    pub name: ObjectName,
    /// Opaque property bag carried from the record.
    pub properties: serde_json::Value,
}

/// Translucent highlight created for a detection.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Display key.
    pub name: ObjectName,
}

/// Name index over static objects and detections.
#[derive(Resource, Debug, Default)]
pub struct ObjectIndex {
    statics: HashMap<ObjectName, Entity>,
    static_entities: Vec<Entity>,
    detections: HashMap<ObjectName, Entity>,
}

impl ObjectIndex {
    /// Scene entry for `name`, preferring detections over static objects.
    #[must_use]
    pub fn find_by_name(&self, name: &ObjectName) -> Option<Entity> {
        self.detections
            .get(name)
            .or_else(|| self.statics.get(name))
            .copied()
    }

    /// Detection highlight for `name`, if one was created.
    #[must_use]
    pub fn detection(&self, name: &ObjectName) -> Option<Entity> {
        self.detections.get(name).copied()
    }

    /// Number of detection highlights.
    #[must_use]
    pub fn detection_count(&self) -> usize {
        self.detections.len()
    }

    /// Number of static objects spawned by the current map.
    #[must_use]
    pub fn static_count(&self) -> usize {
        self.static_entities.len()
    }

    /// Forgets the current static map and returns its entities.
    pub fn take_statics(&mut self) -> Vec<Entity> {
        self.statics.clear();
        std::mem::take(&mut self.static_entities)
    }

    fn insert_static(&mut self, name: ObjectName, entity: Entity) {
        if let Some(previous) = self.statics.insert(name.clone(), entity) {
            log::debug!("map object name {name} reused; {previous:?} no longer indexed");
        }
        self.static_entities.push(entity);
    }
}

fn parse_kind(record: &MapObjectRecord) -> Option<ObjectKind> {
    match record.object_type.parse() {
        Ok(kind) => Some(kind),
        Err(err) => {
            log::warn!("skipping map object {}: {err}", record.name);
            None
        }
    }
}

/// Spawns static scene content for `records`.
///
/// Records of unknown kind are skipped with a warning. With
/// `filter_detected_only`, records not flagged `detected` are skipped too.
/// Returns the number of objects spawned.
pub fn build(
    commands: &mut Commands,
    index: &mut ObjectIndex,
    records: &[MapObjectRecord],
    mapping: &SpaceMapping,
    filter_detected_only: bool,
) -> usize {
    let mut spawned = 0;
    for record in records {
        if filter_detected_only && !record.detected {
            continue;
        }
        let Some(kind) = parse_kind(record) else {
            continue;
        };
        let size = mapping.to_render_extent(record.size());
        let at = mapping.to_render_position(record.position);
        let name = ObjectName::new(record.name.clone());
        let entity = commands
            .spawn((
                MapObject {
                    name: name.clone(),
                    properties: record.properties.clone(),
                },
                kind,
                kind.visual(size, record.is_damaged()),
                kind.placement(at),
            ))
            .id();
        index.insert_static(name, entity);
        spawned += 1;
    }
    spawned
}

/// Replaces the static map with `records`, keeping detections.
pub fn replace_static_map(
    commands: &mut Commands,
    index: &mut ObjectIndex,
    records: &[MapObjectRecord],
    mapping: &SpaceMapping,
) -> usize {
    for entity in index.take_statics() {
        commands.entity(entity).despawn();
    }
    build(commands, index, records, mapping, true)
}

/// Moves the scene entry named like `record`, or creates a highlight for it.
///
/// `transforms` must give mutable access to every indexed entity.
pub fn upsert_detection(
    commands: &mut Commands,
    index: &mut ObjectIndex,
    transforms: &mut Query<&mut Transform, Or<(With<MapObject>, With<Detection>)>>,
    record: &MapObjectRecord,
    mapping: &SpaceMapping,
) -> Entity {
    let name = ObjectName::new(record.name.clone());
    let at = mapping.to_render_position(record.position);
    if let Some(entity) = index.find_by_name(&name) {
        if let Ok(mut transform) = transforms.get_mut(entity) {
            transform.translation = at;
            return entity;
        }
        log::debug!("indexed object {name} is gone; recreating");
    }
    let size = mapping.to_render_extent(record.size());
    let color = record
        .object_type
        .parse::<ObjectKind>()
        .map_or(Rgb::WHITE, |kind| kind.color(record.is_damaged()));
    let entity = commands
        .spawn((
            Detection { name: name.clone() },
            Visual::translucent(
                Shape::Cuboid {
                    size: size.extend(DETECTION_DEPTH),
                },
                color,
                DETECTION_OPACITY,
            ),
            Transform::from_translation(at),
        ))
        .id();
    commands.spawn((
        Label(record.name.clone()),
        Transform::from_xyz(0.0, size.y / 2.0 + LABEL_LIFT, DETECTION_DEPTH),
        ChildOf(entity),
    ));
    log::info!("new detection {name} ({})", record.object_type);
    index.detections.insert(name, entity);
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Extent;
    use bevy::ecs::system::RunSystemOnce;
    use serde_json::Value;

    fn record(name: &str, object_type: &str, detected: bool) -> MapObjectRecord {
        MapObjectRecord {
            name: name.to_owned(),
            position: Vec3::new(400.0, 300.0, 0.0),
            bounding_box: [Vec2::ZERO, Vec2::new(80.0, 40.0)],
            object_type: object_type.to_owned(),
            condition: None,
            properties: Value::Null,
            detected,
        }
    }

    fn mapping() -> SpaceMapping {
        SpaceMapping::new(Extent::new(800.0, 600.0), Extent::new(10.0, 7.5))
    }

    fn run_build(records: Vec<MapObjectRecord>, filter: bool) -> (World, usize) {
        let mut world = World::new();
        world.init_resource::<ObjectIndex>();
        let spawned = world
            .run_system_once(move |mut commands: Commands, mut index: ResMut<ObjectIndex>| {
                build(&mut commands, &mut index, &records, &mapping(), filter)
            })
            .unwrap_or_default();
        (world, spawned)
    }

    #[test]
    fn filter_hides_undetected_objects() {
        let records = vec![record("a", "tree", true), record("b", "tree", false)];
        let (_, filtered) = run_build(records.clone(), true);
        let (_, all) = run_build(records, false);
        assert_eq!((filtered, all), (1, 2));
    }

    #[test]
    fn unknown_kinds_add_nothing() {
        let (mut world, spawned) = run_build(vec![record("ufo", "spaceship", true)], false);
        assert_eq!(spawned, 0);
        let visuals = world.query::<&Visual>().iter(&world).count();
        assert_eq!(visuals, 0);
    }

    #[test]
    fn footprint_uses_the_position_scale() {
        let (mut world, _) = run_build(vec![record("h", "building", true)], false);
        let mut q = world.query::<(&Visual, &Transform)>();
        let Some((visual, transform)) = q.iter(&world).next() else {
            panic!("building not spawned");
        };
        assert_eq!(transform.translation, Vec3::ZERO);
        assert_eq!(
            visual.shape,
            Shape::Cuboid {
                size: Vec3::new(1.0, 0.5, crate::constants::BUILDING_DEPTH)
            }
        );
    }
}
