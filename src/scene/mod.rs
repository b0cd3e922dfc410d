//! Render-side vocabulary shared by the reconciler, overlays and map builder.
//!
//! Entities in the ECS world carry a [`Visual`] describing what to draw and a
//! `Transform` describing where. The headless build stops there; the
//! `render` feature turns each `Visual` into a mesh and material.

pub mod camera;
mod furniture;
mod lines;
mod palette;

pub use furniture::{spawn_furniture_system, TerrainTexture};
pub use lines::line_list;
pub use palette::{color_for_id, palette_color, Rgb};

use bevy::prelude::*;

/// Geometry of a render object, in render units.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Solid sphere.
    Sphere {
        /// Sphere radius.
        radius: f32,
    },
    /// Solid axis-aligned box.
    Cuboid {
        /// Edge lengths along x, y and z.
        size: Vec3,
    },
    /// Solid cylinder whose axis runs along local y.
    Cylinder {
        /// Cylinder radius.
        radius: f32,
        /// Full height along the axis.
        height: f32,
    },
    /// Flat rectangle in the local xy plane.
    Rectangle {
        /// Width and height.
        size: Vec2,
    },
    /// Edges of a cube.
    WireCube {
        /// Edge length.
        size: f32,
    },
    /// Open or closed line strip.
    Polyline {
        /// Points in local space, drawn in order.
        points: Vec<Vec3>,
    },
    /// Independent line segments, one per consecutive pair of points.
    Segments {
        /// Segment endpoints in local space.
        points: Vec<Vec3>,
    },
    /// Arrow from the local origin along local `+x`.
    Arrow {
        /// Arrow length.
        length: f32,
    },
}

/// What to draw for an entity.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Visual {
    /// Geometry.
    pub shape: Shape,
    /// Base color.
    pub color: Rgb,
    /// Opacity in `[0, 1]`; anything below 1 is drawn translucent.
    pub opacity: f32,
}

impl Visual {
    /// Opaque visual.
    #[must_use]
    pub const fn solid(shape: Shape, color: Rgb) -> Self {
        Self {
            shape,
            color,
            opacity: 1.0,
        }
    }

    /// Translucent visual.
    #[must_use]
    pub const fn translucent(shape: Shape, color: Rgb, opacity: f32) -> Self {
        Self {
            shape,
            color,
            opacity,
        }
    }

    /// Returns `true` when the visual needs alpha blending.
    #[must_use]
    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Floating text attached to a detection.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Label(pub String);

/// Marker for the textured terrain plane behind the scene.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct TerrainPlane;

/// Marker for the outline drawn around the render extent.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct SceneBorder;

/// Closed rectangle outline centred on the origin.
#[must_use]
pub fn rectangle_outline(size: Vec2) -> Vec<Vec3> {
    let h = size * 0.5;
    vec![
        Vec3::new(-h.x, -h.y, 0.0),
        Vec3::new(h.x, -h.y, 0.0),
        Vec3::new(h.x, h.y, 0.0),
        Vec3::new(-h.x, h.y, 0.0),
        Vec3::new(-h.x, -h.y, 0.0),
    ]
}
