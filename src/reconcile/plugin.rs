//! Bevy plugin wiring feed ingestion and reconciliation into the schedule.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::error;
use thiserror::Error;

use crate::channel::SnapshotChannel;
use crate::config::SceneConfig;
use crate::kinematics::predict_agents;
use crate::map_objects::ObjectIndex;
use crate::map_source::{finish_map_load_system, load_map, MapFetch};
use crate::overlay::update_overlays;
use crate::scene::spawn_furniture_system;
use crate::store::EntityStore;

use super::{
    apply_detections_system, ingest_feed_system, reconcile_entities_system, FeedInbox,
    LinkStatus, PendingSnapshot, SnapshotFrame,
};

/// Context carried by [`SceneSyncError`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSyncErrorContext {
    /// The snapshot feed dropped or could not connect.
    Feed,
    /// A static map could not be fetched or parsed.
    MapLoad,
    /// The terrain texture could not be synthesized.
    Terrain,
}

/// Event raised when keeping the scene in sync hits an error path.
///
/// The scene keeps showing its last good state; observers only report.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct SceneSyncError {
    /// Where the failure occurred.
    pub context: SceneSyncErrorContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl SceneSyncError {
    /// Convenience constructor used by systems to emit error events.
    pub fn new(context: SceneSyncErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
fn log_scene_error(event: On<SceneSyncError>) {
    let SceneSyncError { context, detail } = event.event();
    error!("scene sync error during {context:?}: {detail}");
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
fn prediction_due(config: Res<SceneConfig>, frame: Res<SnapshotFrame>) -> bool {
    config.prediction && !frame.applied
}

/// Bevy plugin keeping the ECS world in step with the simulation feed.
///
/// Without a feed the scene only changes through [`PendingSnapshot`] and
/// the map events, which is how tests drive it.
#[derive(Default)]
pub struct SwarmScenePlugin {
    feed: Option<SnapshotChannel>,
}

impl SwarmScenePlugin {
    /// Subscribes the scene to `channel` when the plugin is built.
    #[must_use]
    pub const fn with_feed(channel: SnapshotChannel) -> Self {
        Self {
            feed: Some(channel),
        }
    }
}

impl Plugin for SwarmScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_scene_error);
        app.add_observer(load_map);

        app.init_resource::<SceneConfig>()
            .init_resource::<EntityStore>()
            .init_resource::<ObjectIndex>()
            .init_resource::<MapFetch>()
            .init_resource::<PendingSnapshot>()
            .init_resource::<LinkStatus>()
            .init_resource::<SnapshotFrame>();

        if let Some(channel) = &self.feed {
            app.insert_non_send_resource(FeedInbox::new(channel.subscribe()));
        }

        app.add_systems(Startup, spawn_furniture_system);
        app.add_systems(
            Update,
            (
                finish_map_load_system,
                ingest_feed_system,
                reconcile_entities_system,
                apply_detections_system,
                predict_agents.run_if(prediction_due),
                update_overlays,
            )
                .chain(),
        );
    }
}
