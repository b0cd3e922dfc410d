//! Helpers for driving a headless scene and observing its sync errors.
use std::thread;
use std::time::{Duration, Instant};

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use serde_json::Value;
use swarm_view::map_source::MapFetch;
use swarm_view::reconcile::{
    PendingSnapshot, SceneSyncError, SceneSyncErrorContext, SwarmScenePlugin,
};
use swarm_view::snapshot::Snapshot;
use swarm_view::store::{EntityClass, EntityId, EntityStore};

/// Scene sync errors raised while a test app ran, in order.
#[derive(Resource, Default, Debug)]
pub struct CapturedErrors(pub Vec<SceneSyncError>);

impl CapturedErrors {
    /// Contexts of the captured errors, in order.
    #[must_use]
    pub fn contexts(&self) -> Vec<SceneSyncErrorContext> {
        self.0.iter().map(|e| e.context).collect()
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn record_error(event: On<SceneSyncError>, mut errors: ResMut<CapturedErrors>) {
    errors.0.push(event.event().clone());
}

/// Installs the error-capturing observer and resource on the provided app.
pub fn install_error_observer(app: &mut App) {
    app.insert_resource(CapturedErrors::default());
    app.world_mut().add_observer(record_error);
}

/// Headless app with the scene plugin and error capture, ticked once so
/// startup content exists.
#[must_use]
pub fn headless_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    install_error_observer(&mut app);
    app.add_plugins(SwarmScenePlugin::default());
    app.update();
    app
}

/// Queues `snapshot` as if the feed had delivered it, without ticking.
///
/// # Panics
/// Panics if `snapshot` is not a snapshot object.
pub fn queue_snapshot(app: &mut App, snapshot: Value) {
    let parsed = Snapshot::from_value(snapshot)
        .unwrap_or_else(|e| panic!("fixture is not a snapshot: {e}"));
    app.world_mut()
        .resource_mut::<PendingSnapshot>()
        .absorb(parsed);
}

/// Queues `snapshot` and ticks the app once.
///
/// # Panics
/// Panics if `snapshot` is not a snapshot object.
pub fn apply_snapshot(app: &mut App, snapshot: Value) {
    queue_snapshot(app, snapshot);
    app.update();
}

/// Ticks until no map fetch is outstanding, giving up after five seconds.
pub fn settle_map_load(app: &mut App) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        app.update();
        if !app.world().resource::<MapFetch>().is_busy() || Instant::now() >= deadline {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

/// Render entity stored for `(class, id)`.
#[must_use]
pub fn stored(app: &App, class: EntityClass, id: &str) -> Option<Entity> {
    app.world()
        .resource::<EntityStore>()
        .find_by_id(class, &EntityId::from(id))
}

/// Number of entities carrying component `T`.
pub fn count<T: Component>(app: &mut App) -> usize {
    let world = app.world_mut();
    let mut query = world.query_filtered::<(), With<T>>();
    query.iter(world).count()
}
