//! Mapping between simulation space and render space.
//!
//! The simulation reports positions in its own environment extent with the
//! origin at a corner. The scene is centred on the render origin. A single
//! uniform scale is chosen so the environment fits the render viewport
//! without anisotropic distortion, and the same scale is reused for
//! positions, radii and bounding-box extents so geometry stays aligned with
//! the positions it is drawn at.

use glam::{Vec2, Vec3};
use serde::Deserialize;

/// Width and height of a rectangular space.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Extent {
    /// Horizontal size.
    pub width: f32,
    /// Vertical size.
    pub height: f32,
}

impl Extent {
    /// Creates an extent from its two sides.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect(self) -> f32 {
        self.width / self.height
    }

    /// Returns `true` when both sides are finite and strictly positive.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Half of the extent, the offset of its centre from the corner origin.
    #[must_use]
    pub fn half(self) -> Vec2 {
        Vec2::new(self.width, self.height) * 0.5
    }
}

/// Precomputed simulation-to-render mapping for a fixed pair of extents.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use swarm_view::coords::{Extent, SpaceMapping};
///
/// let mapping = SpaceMapping::new(Extent::new(800.0, 600.0), Extent::new(10.0, 7.5));
/// assert_eq!(mapping.to_render_position(Vec3::new(400.0, 300.0, 0.0)), Vec3::ZERO);
/// assert!((mapping.to_render_radius(10.0) - 0.125).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceMapping {
    env: Extent,
    scale: f32,
}

impl SpaceMapping {
    /// Builds the mapping for an environment shown inside a render viewport.
    ///
    /// A wider environment is fitted by width, otherwise by height.
    #[must_use]
    pub fn new(env: Extent, render: Extent) -> Self {
        let scale = if env.aspect() > render.aspect() {
            render.width / env.width
        } else {
            render.height / env.height
        };
        Self { env, scale }
    }

    /// Uniform scale applied on every axis.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Environment extent this mapping was built for.
    #[must_use]
    pub const fn env(&self) -> Extent {
        self.env
    }

    /// Maps a simulation point to render space, centred on the origin.
    ///
    /// `z` has no recentering and is only scaled.
    #[must_use]
    pub fn to_render_position(&self, sim: Vec3) -> Vec3 {
        let half = self.env.half();
        Vec3::new(
            (sim.x - half.x) * self.scale,
            (sim.y - half.y) * self.scale,
            sim.z * self.scale,
        )
    }

    /// Inverse of [`Self::to_render_position`].
    #[must_use]
    pub fn to_sim_position(&self, render: Vec3) -> Vec3 {
        let half = self.env.half();
        Vec3::new(
            render.x / self.scale + half.x,
            render.y / self.scale + half.y,
            render.z / self.scale,
        )
    }

    /// Maps a simulation radius to render space.
    #[must_use]
    pub fn to_render_radius(&self, radius: f32) -> f32 {
        radius * self.scale
    }

    /// Maps a width/height pair, such as a bounding-box size, to render space.
    #[must_use]
    pub fn to_render_extent(&self, size: Vec2) -> Vec2 {
        size * self.scale
    }
}

/// Free-function form of [`SpaceMapping::to_render_position`].
#[must_use]
pub fn to_render_position(pos: Vec3, env: Extent, render: Extent) -> Vec3 {
    SpaceMapping::new(env, render).to_render_position(pos)
}

/// Free-function form of [`SpaceMapping::to_render_radius`].
#[must_use]
pub fn to_render_radius(radius: f32, env: Extent, render: Extent) -> f32 {
    SpaceMapping::new(env, render).to_render_radius(radius)
}
