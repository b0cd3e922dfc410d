//! Identity map from simulation ids to render entities.
//!
//! Agents, targets and obstacles live in separate id namespaces: agent `"1"`
//! and target `"1"` are different entities. Each render entity also carries
//! a [`SimEntity`] component naming the key it was stored under.

use std::fmt;

use bevy::prelude::*;
use hashbrown::{HashMap, HashSet};
use serde::Deserialize;

/// Kind of simulation entity a render handle represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityClass {
    /// Swarm member.
    Agent,
    /// Goal marker.
    Target,
    /// Static or moving obstruction.
    Obstacle,
}

impl EntityClass {
    /// All classes in reconciliation order.
    pub const ALL: [Self; 3] = [Self::Obstacle, Self::Target, Self::Agent];

    /// Lowercase name used in log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Target => "target",
            Self::Obstacle => "obstacle",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulation identifier, normalised to text.
///
/// The feed sends ids either as strings or as integers; both normalise to
/// the same key so `1` and `"1"` address the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawId")]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrowed id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for EntityId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        }
    }
}

/// Key a render entity was created for.
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimEntity {
    /// Namespace.
    pub class: EntityClass,
    /// Id within the namespace.
    pub id: EntityId,
}

/// Resource mapping `(class, id)` to the render entity for it.
#[derive(Resource, Debug, Default)]
pub struct EntityStore {
    agents: HashMap<EntityId, Entity>,
    targets: HashMap<EntityId, Entity>,
    obstacles: HashMap<EntityId, Entity>,
}

impl EntityStore {
    const fn table(&self, class: EntityClass) -> &HashMap<EntityId, Entity> {
        match class {
            EntityClass::Agent => &self.agents,
            EntityClass::Target => &self.targets,
            EntityClass::Obstacle => &self.obstacles,
        }
    }

    fn table_mut(&mut self, class: EntityClass) -> &mut HashMap<EntityId, Entity> {
        match class {
            EntityClass::Agent => &mut self.agents,
            EntityClass::Target => &mut self.targets,
            EntityClass::Obstacle => &mut self.obstacles,
        }
    }

    /// Looks up the render entity for `id` in `class`.
    #[must_use]
    pub fn find_by_id(&self, class: EntityClass, id: &EntityId) -> Option<Entity> {
        self.table(class).get(id).copied()
    }

    /// Returns `true` when `id` is known in `class`.
    #[must_use]
    pub fn contains(&self, class: EntityClass, id: &EntityId) -> bool {
        self.table(class).contains_key(id)
    }

    /// Stores `entity` under `(class, id)` and returns any entity it replaced.
    pub fn insert(&mut self, class: EntityClass, id: EntityId, entity: Entity) -> Option<Entity> {
        let previous = self.table_mut(class).insert(id, entity);
        if let Some(old) = previous.filter(|old| *old != entity) {
            log::warn!("{class} entry {old:?} replaced by {entity:?}");
        }
        previous
    }

    /// Forgets `(class, id)`, returning its entity.
    pub fn remove(&mut self, class: EntityClass, id: &EntityId) -> Option<Entity> {
        self.table_mut(class).remove(id)
    }

    /// Number of entries in `class`.
    #[must_use]
    pub fn len(&self, class: EntityClass) -> usize {
        self.table(class).len()
    }

    /// Returns `true` when no class has any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        EntityClass::ALL.iter().all(|c| self.table(*c).is_empty())
    }

    /// Ids currently stored in `class`, in no particular order.
    pub fn ids(&self, class: EntityClass) -> impl Iterator<Item = &EntityId> {
        self.table(class).keys()
    }

    /// Removes every entry in `class` whose id is not in `keep`.
    ///
    /// Returns the removed pairs sorted by id so callers can despawn them in
    /// a stable order.
    pub fn sweep(
        &mut self,
        class: EntityClass,
        keep: &HashSet<EntityId>,
    ) -> Vec<(EntityId, Entity)> {
        let table = self.table_mut(class);
        let mut gone: Vec<(EntityId, Entity)> = table
            .extract_if(|id, _| !keep.contains(id))
            .collect();
        gone.sort_by(|a, b| a.0.cmp(&b.0));
        gone
    }
}
