//! Keeps the ECS world in step with the simulation feed.
//!
//! This module re-exports the plugin, the inbox resources and the systems
//! that turn snapshots into spawned, moved and evicted entities.

mod inbox;
mod plugin;
mod systems;

pub use inbox::{FeedInbox, LinkStatus, PendingSnapshot};
pub use plugin::{SceneSyncError, SceneSyncErrorContext, SwarmScenePlugin};
pub use systems::{
    apply_detections_system, ingest_feed_system, reconcile_entities_system, SceneQueries,
    SnapshotFrame,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Agent, Health, LastDetection, Target};
    use crate::overlay::{Overlay, OverlayHandle};
    use crate::scene::{Rgb, Shape, Visual};
    use crate::snapshot::Snapshot;
    use crate::store::{EntityClass, EntityId, EntityStore};
    use approx::assert_relative_eq;
    use bevy::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SwarmScenePlugin::default());
        app.update();
        app
    }

    fn push(app: &mut App, text: &str) {
        let snapshot = Snapshot::parse(text).unwrap_or_else(|e| panic!("bad fixture: {e}"));
        app.world_mut()
            .resource_mut::<PendingSnapshot>()
            .absorb(snapshot);
        app.update();
    }

    fn entity(app: &App, class: EntityClass, id: &str) -> Option<Entity> {
        app.world()
            .resource::<EntityStore>()
            .find_by_id(class, &EntityId::from(id))
    }

    fn count<T: Component>(app: &mut App) -> usize {
        let mut query = app.world_mut().query_filtered::<(), With<T>>();
        query.iter(app.world()).count()
    }

    const ONE_OF_EACH: &str = r#"{
        "agents": {"a1": {"target_id": "0", "position": [400, 300],
                          "velocity": [1, 0], "acceleration": [0, 0]}},
        "targets": {"0": {"position": [400, 300], "radius": 8}},
        "obstacles": {"o1": {"position": [0, 0], "radius": 16}}
    }"#;

    #[rstest]
    fn first_snapshot_spawns_one_entity_per_record(mut app: App) {
        push(&mut app, ONE_OF_EACH);
        assert_eq!(count::<Agent>(&mut app), 1);
        assert_eq!(count::<Target>(&mut app), 1);
        assert_eq!(count::<Overlay>(&mut app), 1);

        let Some(agent) = entity(&app, EntityClass::Agent, "a1") else {
            panic!("agent not stored");
        };
        let transform = app.world().get::<Transform>(agent).copied().unwrap_or_default();
        assert_relative_eq!(transform.translation.length(), 0.0);
        let visual = app.world().get::<Visual>(agent).cloned();
        assert_eq!(visual.map(|v| v.color), Some(Rgb::RED));

        let Some(obstacle) = entity(&app, EntityClass::Obstacle, "o1") else {
            panic!("obstacle not stored");
        };
        let shape = app.world().get::<Visual>(obstacle).map(|v| v.shape.clone());
        assert_eq!(shape, Some(Shape::Sphere { radius: 0.2 }));
    }

    #[rstest]
    fn repeating_a_snapshot_changes_nothing(mut app: App) {
        push(&mut app, ONE_OF_EACH);
        let before = entity(&app, EntityClass::Agent, "a1");
        push(&mut app, ONE_OF_EACH);
        assert_eq!(entity(&app, EntityClass::Agent, "a1"), before);
        assert_eq!(count::<Agent>(&mut app), 1);
        assert_eq!(count::<Overlay>(&mut app), 1);
    }

    #[rstest]
    fn updates_move_entities_in_place(mut app: App) {
        push(&mut app, ONE_OF_EACH);
        push(
            &mut app,
            r#"{"agents": {"a1": {"target_id": "0", "position": [480, 300, 2],
                "velocity": [0, 0], "acceleration": [0, 0], "health": 25}}}"#,
        );
        let Some(agent) = entity(&app, EntityClass::Agent, "a1") else {
            panic!("agent evicted");
        };
        let transform = app.world().get::<Transform>(agent).copied().unwrap_or_default();
        assert_relative_eq!(transform.translation.x, 1.0);
        assert_relative_eq!(transform.translation.z, 0.025);
        assert_eq!(app.world().get::<Health>(agent).map(|h| h.0), Some(25.0));

        let handle = app.world().get::<OverlayHandle>(agent).copied();
        let root = handle.and_then(|h| app.world().get::<Transform>(h.0).copied());
        assert_eq!(root.map(|t| t.translation), Some(transform.translation));
        assert!(entity(&app, EntityClass::Target, "0").is_some());
    }

    #[rstest]
    fn missing_ids_are_evicted_with_their_overlays(mut app: App) {
        push(&mut app, ONE_OF_EACH);
        push(&mut app, r#"{"agents": {}, "targets": {}}"#);
        assert_eq!(count::<Agent>(&mut app), 0);
        assert_eq!(count::<Target>(&mut app), 0);
        assert_eq!(count::<Overlay>(&mut app), 0);
        assert!(entity(&app, EntityClass::Obstacle, "o1").is_some());
    }

    #[rstest]
    fn malformed_records_are_kept_not_evicted(mut app: App) {
        push(&mut app, ONE_OF_EACH);
        push(&mut app, r#"{"targets": {"0": {"position": "here", "radius": 8}}}"#);
        assert!(entity(&app, EntityClass::Target, "0").is_some());
    }

    #[rstest]
    fn eviction_can_be_disabled() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(crate::config::SceneConfig {
            eviction: false,
            ..Default::default()
        });
        app.add_plugins(SwarmScenePlugin::default());
        push(&mut app, ONE_OF_EACH);
        push(&mut app, r#"{"agents": {}, "targets": {}, "obstacles": {}}"#);
        assert_eq!(count::<Agent>(&mut app), 1);
    }

    #[rstest]
    fn namespaces_do_not_collide(mut app: App) {
        push(
            &mut app,
            r#"{"targets": {"7": {"position": [0, 0], "radius": 4}},
                "obstacles": {"7": {"position": [800, 600], "radius": 4}}}"#,
        );
        let target = entity(&app, EntityClass::Target, "7");
        let obstacle = entity(&app, EntityClass::Obstacle, "7");
        assert!(target.is_some() && obstacle.is_some());
        assert_ne!(target, obstacle);
    }

    #[rstest]
    fn agents_without_a_known_target_are_white(mut app: App) {
        push(
            &mut app,
            r#"{"agents": {"a1": {"target_id": "3", "position": [0, 0],
                "velocity": [0, 0], "acceleration": [0, 0]}}}"#,
        );
        let agent = entity(&app, EntityClass::Agent, "a1");
        let color = agent.and_then(|a| app.world().get::<Visual>(a)).map(|v| v.color);
        assert_eq!(color, Some(Rgb::WHITE));
    }

    #[rstest]
    fn agent_reports_are_recorded(mut app: App) {
        push(&mut app, ONE_OF_EACH);
        push(&mut app, r#"{"agent_detections": {"a1": "house_3"}}"#);
        let agent = entity(&app, EntityClass::Agent, "a1");
        let last = agent.and_then(|a| app.world().get::<LastDetection>(a)).cloned();
        assert_eq!(last, Some(LastDetection("house_3".to_owned())));
    }

    #[rstest]
    fn new_detections_spawn_once_per_name(mut app: App) {
        let detection = r#"{"new_detections": [
            {"name": "car_1", "position": [100, 100], "boundingBox": [[0, 0], [40, 20]],
             "object_type": "vehicle"},
            {"name": "car_1", "position": [120, 100], "boundingBox": [[0, 0], [40, 20]],
             "object_type": "vehicle"}]}"#;
        push(&mut app, detection);
        push(&mut app, detection);
        assert_eq!(count::<crate::map_objects::Detection>(&mut app), 1);
    }

    #[rstest]
    fn prediction_runs_only_between_snapshots() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(crate::config::SceneConfig {
            prediction: true,
            ..Default::default()
        });
        app.add_plugins(SwarmScenePlugin::default());
        push(
            &mut app,
            r#"{"agents": {"a1": {"target_id": "0", "position": [400, 300],
                "velocity": [8, 0], "acceleration": [0, 0]}}}"#,
        );
        let agent = entity(&app, EntityClass::Agent, "a1");
        let x = |app: &App| {
            agent
                .and_then(|a| app.world().get::<Transform>(a))
                .map_or(f32::NAN, |t| t.translation.x)
        };
        assert_relative_eq!(x(&app), 0.0);
        app.update();
        assert_relative_eq!(x(&app), 0.1);
    }
}
