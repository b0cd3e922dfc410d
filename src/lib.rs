#![cfg_attr(docsrs, feature(doc_cfg))]
//! Live 3D scene mirroring a multi-agent swarm simulation.
//!
//! Snapshots arrive over a feed, are coalesced per frame and reconciled into
//! ECS entities keyed by `(class, id)`. Static maps and detections become
//! scene objects; overlays follow each agent. The `render` feature adds the
//! camera, meshes and materials on top of the headless scene.
pub mod channel;
pub mod components;
pub mod config;
pub mod constants;
pub mod control;
pub mod coords;
#[cfg(feature = "render")]
#[cfg_attr(docsrs, doc(cfg(feature = "render")))]
pub mod graphics;
pub mod kinematics;
pub mod logging;
pub mod map_objects;
pub mod map_source;
pub mod overlay;
pub mod reconcile;
pub mod scene;
pub mod snapshot;
pub mod store;
pub mod terrain;
pub mod transport;
pub use constants::*;

// Re-export commonly used items
pub use channel::{FeedMessage, LinkEvent, SnapshotChannel};
pub use components::{Agent, Health, Obstacle, Target};
pub use config::SceneConfig;
pub use coords::{to_render_position, to_render_radius, Extent, SpaceMapping};
#[cfg(feature = "render")]
#[cfg_attr(docsrs, doc(cfg(feature = "render")))]
pub use graphics::ScenePresentationPlugin;
pub use logging::init as init_logging;
pub use map_source::{LoadMap, MapLoaded, MapSourceHandle};
pub use reconcile::{SceneSyncError, SceneSyncErrorContext, SwarmScenePlugin};
pub use snapshot::Snapshot;
pub use store::{EntityClass, EntityId, EntityStore};
pub use transport::FeedWorker;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use swarm_view::prelude::*;
    //! ```

    pub use crate::channel::SnapshotChannel;
    pub use crate::config::SceneConfig;
    pub use crate::map_source::LoadMap;
    pub use crate::reconcile::{PendingSnapshot, SwarmScenePlugin};
    pub use crate::snapshot::Snapshot;
    pub use crate::store::{EntityClass, EntityId, EntityStore};
}
