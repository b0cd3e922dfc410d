//! Scene configuration.
//!
//! Values are read once when the scene plugin is built and stay fixed for the
//! lifetime of the scene. Every field has a default so a TOML file only needs
//! to name what it changes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    ENV_HEIGHT, ENV_WIDTH, RENDER_HEIGHT, RENDER_WIDTH, TERRAIN_DETAIL_FACTOR, TERRAIN_HEIGHT_MAP,
};
use crate::coords::{Extent, SpaceMapping};
use crate::overlay::OverlayOptions;
use crate::terrain::{HeightGrid, TerrainError};

/// Errors raised while loading or validating a [`SceneConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file was not valid TOML for this schema.
    #[error("invalid scene configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// An extent had a non-positive or non-finite side.
    #[error("{which} extent {width}x{height} must be finite and positive")]
    Extent {
        /// `"environment"` or `"render"`.
        which: &'static str,
        /// Reported width.
        width: f32,
        /// Reported height.
        height: f32,
    },
    /// The terrain detail factor was zero.
    #[error("terrain detail factor must be at least 1")]
    DetailFactor,
    /// The terrain target resolution had a zero side.
    #[error("terrain target resolution must be non-zero")]
    TargetResolution,
    /// The height grid was unusable.
    #[error("height grid: {0}")]
    HeightGrid(#[from] TerrainError),
}

/// Terrain synthesis settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerrainSettings {
    /// Integer upsampling factor for the second bilinear pass.
    pub detail_factor: u32,
    /// Optional `[width, height]` to resample the raw grid to first.
    pub target_resolution: Option<[usize; 2]>,
    /// Raw elevation rows, origin top-left.
    pub height_map: Vec<Vec<f32>>,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            detail_factor: TERRAIN_DETAIL_FACTOR,
            target_resolution: None,
            height_map: TERRAIN_HEIGHT_MAP.iter().map(|row| row.to_vec()).collect(),
        }
    }
}

/// Configuration resource for one scene instance.
///
/// # Examples
///
/// ```
/// use swarm_view::config::SceneConfig;
///
/// let config = SceneConfig::from_toml_str("prediction = true\n").unwrap();
/// assert!(config.prediction);
/// assert_eq!(config.env.width, 800.0);
/// ```
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Simulation environment extent.
    pub env: Extent,
    /// Render viewport extent.
    pub render: Extent,
    /// Terrain synthesis settings.
    pub terrain: TerrainSettings,
    /// Overlay parts attached to each agent.
    pub overlay: OverlayOptions,
    /// Advance agents locally between snapshots.
    pub prediction: bool,
    /// Despawn entities missing from a snapshot.
    pub eviction: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            env: Extent::new(ENV_WIDTH, ENV_HEIGHT),
            render: Extent::new(RENDER_WIDTH, RENDER_HEIGHT),
            terrain: TerrainSettings::default(),
            overlay: OverlayOptions::default(),
            prediction: false,
            eviction: true,
        }
    }
}

impl SceneConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text does not parse or fails
    /// [`Self::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// as for [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("loaded scene configuration from {}", path.display());
        Ok(config)
    }

    /// Checks extents, the detail factor and the height grid.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (which, extent) in [("environment", self.env), ("render", self.render)] {
            if !extent.is_valid() {
                return Err(ConfigError::Extent {
                    which,
                    width: extent.width,
                    height: extent.height,
                });
            }
        }
        if self.terrain.detail_factor == 0 {
            return Err(ConfigError::DetailFactor);
        }
        if self
            .terrain
            .target_resolution
            .is_some_and(|[w, h]| w == 0 || h == 0)
        {
            return Err(ConfigError::TargetResolution);
        }
        self.height_grid()?;
        Ok(())
    }

    /// Simulation-to-render mapping for the configured extents.
    #[must_use]
    pub fn mapping(&self) -> SpaceMapping {
        SpaceMapping::new(self.env, self.render)
    }

    /// Height grid built from the configured rows.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError`] for empty, ragged or non-finite rows.
    pub fn height_grid(&self) -> Result<HeightGrid, TerrainError> {
        HeightGrid::from_rows(&self.terrain.height_map)
    }

    /// Optional resample target as `(width, height)`.
    #[must_use]
    pub fn terrain_target(&self) -> Option<(usize, usize)> {
        self.terrain.target_resolution.map(|[w, h]| (w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SceneConfig::from_toml_str("").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config, SceneConfig::default());
        assert!(config.eviction);
        assert!(config.overlay.bounding_box);
        assert!(!config.overlay.health_bar);
    }

    #[test]
    fn nested_tables_override_fields() {
        let config = SceneConfig::from_toml_str(
            r"
            eviction = false

            [env]
            width = 1000.0
            height = 100.0

            [terrain]
            detail_factor = 2
            target_resolution = [10, 10]
            height_map = [[0.0, 1.0], [1.0, 0.0]]

            [overlay]
            health_bar = true
            ",
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert!(!config.eviction);
        assert_eq!(config.env, Extent::new(1000.0, 100.0));
        assert_eq!(config.terrain_target(), Some((10, 10)));
        assert!(config.overlay.health_bar);
        assert!(config.overlay.bounding_box);
        assert!((config.mapping().scale() - 0.01).abs() < f32::EPSILON);
    }

    #[rstest]
    #[case::zero_env("[env]\nwidth = 0.0\nheight = 1.0\n")]
    #[case::negative_render("[render]\nwidth = -1.0\nheight = 1.0\n")]
    #[case::zero_detail("[terrain]\ndetail_factor = 0\n")]
    #[case::zero_target("[terrain]\ntarget_resolution = [0, 4]\n")]
    #[case::ragged("[terrain]\nheight_map = [[1.0, 2.0], [3.0]]\n")]
    #[case::empty_grid("[terrain]\nheight_map = []\n")]
    #[case::unknown_key("colour = \"red\"\n")]
    fn invalid_configuration_is_rejected(#[case] text: &str) {
        assert!(SceneConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SceneConfig::load(Path::new("/nonexistent/scene.toml"))
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("/nonexistent/scene.toml"), "{err}");
    }
}
