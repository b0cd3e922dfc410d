//! Where static maps come from, and loading them into the scene.
//!
//! A map is a JSON array of map-object records. [`HttpMapSource`] fetches it
//! from the simulation server, [`FileMapSource`] reads it from disk. Loading
//! is requested with a [`LoadMap`] event. The fetch runs on the I/O task pool
//! and is applied by [`finish_map_load_system`] once it completes; a failed
//! load leaves whatever map is already shown untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, IoTaskPool, Task};
use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::SceneConfig;
use crate::map_objects::{replace_static_map, ObjectIndex};
use crate::reconcile::{SceneSyncError, SceneSyncErrorContext};
use crate::snapshot::{parse_map_objects, MapObjectRecord, SnapshotError};

/// Errors raised while fetching a map.
#[derive(Debug, Error)]
pub enum MapLoadError {
    /// The map file could not be read.
    #[error("failed to read map {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The HTTP request failed.
    #[error("map request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("map {url} answered HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The body was not a JSON array.
    #[error("map is not a record list: {0}")]
    Parse(#[from] SnapshotError),
    /// No source was configured.
    #[error("no map source configured")]
    NoSource,
}

/// Supplies map-object records by map name.
#[cfg_attr(test, mockall::automock)]
pub trait MapSource: Send + Sync {
    /// Fetches the records of map `name`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`MapLoadError`] if the map cannot be read or parsed.
    fn fetch(&self, name: &str) -> Result<Vec<MapObjectRecord>, MapLoadError>;
}

/// Reads `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileMapSource {
    dir: PathBuf,
}

impl FileMapSource {
    /// Serves maps from `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Splits a map file path into a source for its directory and the map
    /// name to request.
    #[must_use]
    pub fn for_file(path: &Path) -> (Self, String) {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        (Self::new(dir), name)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl MapSource for FileMapSource {
    fn fetch(&self, name: &str) -> Result<Vec<MapObjectRecord>, MapLoadError> {
        let path = self.path_for(name);
        let text = fs::read_to_string(&path).map_err(|source| MapLoadError::Io { path, source })?;
        Ok(parse_map_objects(&text)?)
    }
}

/// GETs `<server>/api/maps/<name>`.
#[derive(Debug, Clone)]
pub struct HttpMapSource {
    server: String,
    client: Client,
}

impl HttpMapSource {
    /// Targets `server`, e.g. `http://localhost:8000`.
    ///
    /// # Errors
    ///
    /// Returns [`MapLoadError::Http`] if the client cannot be built.
    pub fn new(server: impl Into<String>) -> Result<Self, MapLoadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("swarm_view/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            server: server.into().trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// URL requested for map `name`.
    #[must_use]
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/api/maps/{name}", self.server)
    }
}

impl MapSource for HttpMapSource {
    fn fetch(&self, name: &str) -> Result<Vec<MapObjectRecord>, MapLoadError> {
        let url = self.url_for(name);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(MapLoadError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let text = response.text()?;
        Ok(parse_map_objects(&text)?)
    }
}

/// Resource holding the configured map source.
#[derive(Resource, Clone)]
pub struct MapSourceHandle(pub Arc<dyn MapSource>);

impl MapSourceHandle {
    /// Wraps a source.
    #[must_use]
    pub fn new(source: impl MapSource + 'static) -> Self {
        Self(Arc::new(source))
    }
}

/// Request to replace the static map with map `name`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct LoadMap {
    /// Map name passed to the [`MapSource`].
    pub name: String,
}

impl LoadMap {
    /// Requests map `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Raised after a map replaced the static content.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct MapLoaded {
    /// Map name.
    pub name: String,
    /// Objects spawned after filtering.
    pub spawned: usize,
}

type FetchResult = Result<Vec<MapObjectRecord>, MapLoadError>;

/// The map fetch running off the main thread, if any.
///
/// Only the latest request is kept; a newer [`LoadMap`] drops the task of
/// the previous one and its result is never applied.
#[derive(Resource, Default)]
pub struct MapFetch {
    in_flight: Option<(String, Task<FetchResult>)>,
}

impl MapFetch {
    /// Returns `true` while a fetch is outstanding.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Name of the map being fetched.
    #[must_use]
    pub fn pending_name(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|(name, _)| name.as_str())
    }
}

/// Starts fetching the requested map on the I/O task pool.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
pub fn load_map(
    event: On<LoadMap>,
    mut commands: Commands,
    source: Option<Res<MapSourceHandle>>,
    mut fetch: ResMut<MapFetch>,
) {
    let name = event.event().name.clone();
    let Some(source) = source else {
        commands.trigger(SceneSyncError::new(
            SceneSyncErrorContext::MapLoad,
            format!("{name}: {}", MapLoadError::NoSource),
        ));
        return;
    };
    let source = Arc::clone(&source.0);
    let request = name.clone();
    let task = IoTaskPool::get().spawn(async move { source.fetch(&request) });
    if let Some((previous, _)) = fetch.in_flight.replace((name.clone(), task)) {
        log::debug!("map {previous} superseded by {name}");
    }
    log::debug!("fetching map {name}");
}

/// Swaps in a finished map fetch, or reports its failure.
///
/// A failed fetch leaves the current static map untouched.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn finish_map_load_system(
    mut commands: Commands,
    config: Res<SceneConfig>,
    mut fetch: ResMut<MapFetch>,
    mut index: ResMut<ObjectIndex>,
) {
    let Some((_, task)) = fetch.in_flight.as_mut() else {
        return;
    };
    let Some(fetched) = block_on(future::poll_once(task)) else {
        return;
    };
    let Some((name, _)) = fetch.in_flight.take() else {
        return;
    };
    match fetched {
        Ok(records) => {
            let spawned = replace_static_map(&mut commands, &mut index, &records, &config.mapping());
            log::info!("map {name} loaded: {spawned} of {} objects shown", records.len());
            commands.trigger(MapLoaded { name, spawned });
        }
        Err(err) => {
            commands.trigger(SceneSyncError::new(
                SceneSyncErrorContext::MapLoad,
                format!("{name}: {err}"),
            ));
        }
    }
}
