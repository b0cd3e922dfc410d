//! Fixed scene content: the terrain plane and the border around it.

use bevy::prelude::*;

use crate::config::SceneConfig;
use crate::constants::TERRAIN_DEPTH;
use crate::reconcile::{SceneSyncError, SceneSyncErrorContext};
use crate::terrain::{synthesize, RasterTexture, TerrainError};

use super::{rectangle_outline, Rgb, SceneBorder, Shape, TerrainPlane, Visual};

/// Grayscale texture synthesized from the configured height grid.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Deref)]
pub struct TerrainTexture(pub RasterTexture);

fn terrain_texture(config: &SceneConfig) -> Result<RasterTexture, TerrainError> {
    let grid = config.height_grid()?;
    synthesize(&grid, config.terrain.detail_factor, config.terrain_target())
}

/// Spawns the terrain plane and the red border, and synthesizes the texture.
///
/// A texture failure is reported and leaves the plane untextured.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn spawn_furniture_system(mut commands: Commands, config: Res<SceneConfig>) {
    let size = Vec2::new(config.render.width, config.render.height);
    match terrain_texture(&config) {
        Ok(texture) => {
            log::debug!("terrain texture {}x{}", texture.width, texture.height);
            commands.insert_resource(TerrainTexture(texture));
        }
        Err(err) => commands.trigger(SceneSyncError::new(
            SceneSyncErrorContext::Terrain,
            err.to_string(),
        )),
    }
    commands.spawn((
        TerrainPlane,
        Visual::solid(Shape::Rectangle { size }, Rgb::WHITE),
        Transform::from_xyz(0.0, 0.0, TERRAIN_DEPTH),
    ));
    commands.spawn((
        SceneBorder,
        Visual::solid(
            Shape::Polyline {
                points: rectangle_outline(size),
            },
            Rgb::RED,
        ),
        Transform::IDENTITY,
    ));
}
