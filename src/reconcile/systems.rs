//! Systems applying feed messages to the ECS world.
//!
//! Reconciliation is keyed by `(class, id)`: a known id updates its entity in
//! place, an unknown id spawns one, and an id missing from a reported class
//! is evicted. Obstacles and targets are handled before agents so an agent
//! can pick its color from a target created by the same snapshot.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use hashbrown::HashSet;
use log::{debug, info};

use crate::channel::FeedMessage;
use crate::components::{Agent, Health, LastDetection, Obstacle, Target, TargetRef};
use crate::config::SceneConfig;
use crate::constants::AGENT_MESH_RADIUS;
use crate::coords::SpaceMapping;
use crate::kinematics::Kinematics;
use crate::map_objects::{upsert_detection, Detection, MapObject, ObjectIndex};
use crate::overlay::{self, OverlayHandle};
use crate::scene::{color_for_id, Rgb, Shape, Visual};
use crate::snapshot::{AgentState, BodyState, MapObjectRecord, Snapshot};
use crate::store::{EntityClass, EntityId, EntityStore, SimEntity};

use super::{FeedInbox, LinkStatus, PendingSnapshot, SceneSyncError, SceneSyncErrorContext};

/// Records whether the current frame applied a snapshot.
///
/// Local prediction only runs on frames where it is `false`.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotFrame {
    /// A snapshot was reconciled this frame.
    pub applied: bool,
}

type BodyQuery<'w, 's> = Query<
    'w,
    's,
    (&'static mut Transform, &'static mut Visual),
    (Without<Agent>, Or<(With<Target>, With<Obstacle>)>),
>;

type AgentQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Transform,
        &'static mut Visual,
        &'static mut Kinematics,
        &'static mut Health,
        &'static mut TargetRef,
    ),
    With<Agent>,
>;

#[derive(SystemParam)]
/// Queries the reconciler writes through.
pub struct SceneQueries<'w, 's> {
    /// Targets and obstacles.
    pub bodies: BodyQuery<'w, 's>,
    /// Agents.
    pub agents: AgentQuery<'w, 's>,
    /// Agents' links to their overlays.
    pub overlays: Query<'w, 's, &'static OverlayHandle>,
    /// Last detection each agent reported.
    pub reports: Query<'w, 's, &'static LastDetection, With<Agent>>,
}

/// Drains the feed inbox into [`PendingSnapshot`] and tracks the link.
///
/// A lost link is raised as a [`SceneSyncError`] once per transition; the
/// scene keeps its last state until the feed returns.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn ingest_feed_system(
    mut commands: Commands,
    inbox: Option<NonSend<FeedInbox>>,
    mut pending: ResMut<PendingSnapshot>,
    mut status: ResMut<LinkStatus>,
) {
    let Some(inbox) = inbox else {
        return;
    };
    let mut received = 0_usize;
    for message in inbox.drain() {
        match message {
            FeedMessage::Snapshot(snapshot) => {
                received += 1;
                pending.absorb(snapshot);
            }
            FeedMessage::Link(event) => {
                if !status.apply(event) {
                    continue;
                }
                match &*status {
                    LinkStatus::Up => info!("snapshot feed connected"),
                    LinkStatus::Down { reason } => commands.trigger(SceneSyncError::new(
                        SceneSyncErrorContext::Feed,
                        reason.clone(),
                    )),
                    LinkStatus::Waiting => {}
                }
            }
        }
    }
    if received > 1 {
        debug!("{received} snapshots arrived in one frame; applying the merged state");
    }
}

/// Applies the pending snapshot to every entity class.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn reconcile_entities_system(
    mut commands: Commands,
    config: Res<SceneConfig>,
    mut store: ResMut<EntityStore>,
    mut pending: ResMut<PendingSnapshot>,
    mut frame: ResMut<SnapshotFrame>,
    mut queries: SceneQueries,
) {
    let Some(snapshot) = pending.take_latest() else {
        frame.applied = false;
        return;
    };
    frame.applied = true;
    let mapping = config.mapping();

    if snapshot.reported.contains(&EntityClass::Obstacle) {
        reconcile_bodies(
            &mut commands,
            &mut store,
            &mut queries.bodies,
            EntityClass::Obstacle,
            &snapshot.obstacles,
            &mapping,
            |radius| Obstacle { radius },
        );
    }
    if snapshot.reported.contains(&EntityClass::Target) {
        reconcile_bodies(
            &mut commands,
            &mut store,
            &mut queries.bodies,
            EntityClass::Target,
            &snapshot.targets,
            &mapping,
            |radius| Target { radius },
        );
    }
    if snapshot.reported.contains(&EntityClass::Agent) {
        reconcile_agents(
            &mut commands,
            &mut store,
            &mut queries.agents,
            &snapshot.agents,
            &mapping,
            &config,
        );
    }
    record_agent_detections(&mut commands, &store, &queries.reports, &snapshot);
    if config.eviction {
        evict_missing(&mut commands, &mut store, &queries.overlays, &snapshot);
    }
}

fn body_visual(id: &EntityId, radius: f32) -> Visual {
    Visual::solid(Shape::Sphere { radius }, color_for_id(id.as_str()))
}

fn reconcile_bodies<B: Bundle>(
    commands: &mut Commands,
    store: &mut EntityStore,
    bodies: &mut BodyQuery<'_, '_>,
    class: EntityClass,
    states: &[BodyState],
    mapping: &SpaceMapping,
    marker: impl Fn(f32) -> B,
) {
    for state in states {
        let at = mapping.to_render_position(state.position);
        let radius = mapping.to_render_radius(state.radius);
        if let Some(entity) = store.find_by_id(class, &state.id) {
            if let Ok((mut transform, mut visual)) = bodies.get_mut(entity) {
                transform.translation = at;
                let shape = Shape::Sphere { radius };
                if visual.shape != shape {
                    visual.shape = shape;
                    commands.entity(entity).insert(marker(radius));
                }
                continue;
            }
            debug!("{class} {} lost its entity; respawning", state.id);
        }
        let entity = commands
            .spawn((
                marker(radius),
                SimEntity {
                    class,
                    id: state.id.clone(),
                },
                body_visual(&state.id, radius),
                Transform::from_translation(at),
            ))
            .id();
        store.insert(class, state.id.clone(), entity);
    }
}

fn agent_color(store: &EntityStore, target_id: &EntityId) -> Rgb {
    if store.contains(EntityClass::Target, target_id) {
        color_for_id(target_id.as_str())
    } else {
        Rgb::WHITE
    }
}

fn reconcile_agents(
    commands: &mut Commands,
    store: &mut EntityStore,
    agents: &mut AgentQuery<'_, '_>,
    states: &[AgentState],
    mapping: &SpaceMapping,
    config: &SceneConfig,
) {
    for state in states {
        let at = mapping.to_render_position(state.position);
        let color = agent_color(store, &state.target_id);
        let kinematics = Kinematics::new(state.position, state.velocity, state.acceleration);
        if let Some(entity) = store.find_by_id(EntityClass::Agent, &state.id) {
            if let Ok((mut transform, mut visual, mut motion, mut health, mut target)) =
                agents.get_mut(entity)
            {
                transform.translation = at;
                *motion = kinematics;
                health.0 = state.health;
                if target.0 != state.target_id {
                    target.0 = state.target_id.clone();
                }
                if visual.color != color {
                    visual.color = color;
                }
                continue;
            }
            debug!("agent {} lost its entity; respawning", state.id);
        }
        let agent = Agent::default();
        let entity = commands
            .spawn((
                agent,
                SimEntity {
                    class: EntityClass::Agent,
                    id: state.id.clone(),
                },
                kinematics,
                Health(state.health),
                TargetRef(state.target_id.clone()),
                Visual::solid(
                    Shape::Sphere {
                        radius: AGENT_MESH_RADIUS,
                    },
                    color,
                ),
                Transform::from_translation(at),
            ))
            .id();
        overlay::attach(commands, entity, &agent, at, &config.overlay);
        store.insert(EntityClass::Agent, state.id.clone(), entity);
    }
}

fn record_agent_detections(
    commands: &mut Commands,
    store: &EntityStore,
    reports: &Query<&LastDetection, With<Agent>>,
    snapshot: &Snapshot,
) {
    for (id, name) in &snapshot.agent_detections {
        let Some(entity) = store.find_by_id(EntityClass::Agent, id) else {
            debug!("detection report for unknown agent {id}");
            continue;
        };
        if reports.get(entity).is_ok_and(|last| last.0 == *name) {
            continue;
        }
        info!("agent {id} detected {name}");
        commands.entity(entity).insert(LastDetection(name.clone()));
    }
}

fn evict_missing(
    commands: &mut Commands,
    store: &mut EntityStore,
    overlays: &Query<&OverlayHandle>,
    snapshot: &Snapshot,
) {
    for &class in &snapshot.reported {
        let present: Vec<&EntityId> = match class {
            EntityClass::Agent => snapshot.agents.iter().map(|a| &a.id).collect(),
            EntityClass::Target => snapshot.targets.iter().map(|t| &t.id).collect(),
            EntityClass::Obstacle => snapshot.obstacles.iter().map(|o| &o.id).collect(),
        };
        let keep: HashSet<EntityId> = present
            .into_iter()
            .chain(
                snapshot
                    .retained
                    .iter()
                    .filter(|(c, _)| *c == class)
                    .map(|(_, id)| id),
            )
            .cloned()
            .collect();
        for (id, entity) in store.sweep(class, &keep) {
            if let Ok(handle) = overlays.get(entity) {
                overlay::detach(commands, *handle);
            }
            commands.entity(entity).despawn();
            debug!("evicted {class} {id}");
        }
    }
}

/// Creates or moves a highlight for every queued detection.
///
/// When one frame carries several records for the same name only the last
/// is applied.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn apply_detections_system(
    mut commands: Commands,
    config: Res<SceneConfig>,
    mut pending: ResMut<PendingSnapshot>,
    mut index: ResMut<ObjectIndex>,
    mut transforms: Query<&mut Transform, Or<(With<MapObject>, With<Detection>)>>,
) {
    let mut latest: Vec<MapObjectRecord> = Vec::new();
    for record in pending.drain_detections() {
        match latest.iter_mut().find(|r| r.name == record.name) {
            Some(slot) => *slot = record,
            None => latest.push(record),
        }
    }
    if latest.is_empty() {
        return;
    }
    let mapping = config.mapping();
    for record in &latest {
        upsert_detection(&mut commands, &mut index, &mut transforms, record, &mapping);
    }
}
