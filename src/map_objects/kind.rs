//! Object kinds and the geometry/material policy for each.

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use thiserror::Error;

use crate::constants::{BUILDING_DEPTH, FLOOD_DEPTH, FLOOD_OPACITY, VEHICLE_DEPTH};
use crate::scene::{Rgb, Shape, Visual};

/// Intact building color.
pub const BUILDING_INTACT: Rgb = Rgb::GREEN;
/// Damaged building color.
pub const BUILDING_DAMAGED: Rgb = Rgb::RED;
/// Flood plane color.
pub const FLOOD_COLOR: Rgb = Rgb::BLUE;
/// Tree trunk color.
pub const TREE_COLOR: Rgb = Rgb(0x8b_4513);
/// Vehicle color.
pub const VEHICLE_COLOR: Rgb = Rgb(0x68_7487);
/// Person color.
pub const PERSON_COLOR: Rgb = Rgb(0xff_d700);

/// `object_type` value this build does not know how to draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown object type `{0}`")]
pub struct UnknownKind(pub String);

/// Kind of a map object.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[reflect(Component)]
pub enum ObjectKind {
    /// Extruded footprint colored by condition.
    Building,
    /// Translucent water plane.
    Flood,
    /// Cylinder trunk.
    Tree,
    /// Thin box.
    Vehicle,
    /// Sphere.
    Person,
}

impl ObjectKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Building,
        Self::Flood,
        Self::Tree,
        Self::Vehicle,
        Self::Person,
    ];

    /// Wire tag of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Flood => "flood",
            Self::Tree => "tree",
            Self::Vehicle => "vehicle",
            Self::Person => "person",
        }
    }

    /// Base color; only buildings depend on `damaged`.
    #[must_use]
    pub const fn color(self, damaged: bool) -> Rgb {
        match self {
            Self::Building if damaged => BUILDING_DAMAGED,
            Self::Building => BUILDING_INTACT,
            Self::Flood => FLOOD_COLOR,
            Self::Tree => TREE_COLOR,
            Self::Vehicle => VEHICLE_COLOR,
            Self::Person => PERSON_COLOR,
        }
    }

    /// Visual for an object whose render-space footprint is `size`.
    #[must_use]
    pub fn visual(self, size: Vec2, damaged: bool) -> Visual {
        let color = self.color(damaged);
        match self {
            Self::Building => Visual::solid(
                Shape::Cuboid {
                    size: size.extend(BUILDING_DEPTH),
                },
                color,
            ),
            Self::Flood => Visual::translucent(Shape::Rectangle { size }, color, FLOOD_OPACITY),
            Self::Tree => Visual::solid(
                Shape::Cylinder {
                    radius: size.x / 2.0,
                    height: size.y,
                },
                color,
            ),
            Self::Vehicle => Visual::solid(
                Shape::Cuboid {
                    size: size.extend(VEHICLE_DEPTH),
                },
                color,
            ),
            Self::Person => Visual::solid(Shape::Sphere { radius: size.x / 2.0 }, color),
        }
    }

    /// Placement of an object centred at render position `at`.
    ///
    /// Trees, vehicles and people are turned a quarter turn about `x`;
    /// floods sit just behind the `z = 0` plane.
    #[must_use]
    pub fn placement(self, at: Vec3) -> Transform {
        match self {
            Self::Building => Transform::from_translation(at),
            Self::Flood => Transform::from_translation(at + Vec3::Z * FLOOD_DEPTH),
            Self::Tree | Self::Vehicle | Self::Person => {
                Transform::from_translation(at).with_rotation(Quat::from_rotation_x(-FRAC_PI_2))
            }
        }
    }
}

impl FromStr for ObjectKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("building", Ok(ObjectKind::Building))]
    #[case("flood", Ok(ObjectKind::Flood))]
    #[case("tree", Ok(ObjectKind::Tree))]
    #[case("vehicle", Ok(ObjectKind::Vehicle))]
    #[case("person", Ok(ObjectKind::Person))]
    #[case("spaceship", Err(UnknownKind("spaceship".to_owned())))]
    #[case("Building", Err(UnknownKind("Building".to_owned())))]
    fn parses_wire_tags(#[case] tag: &str, #[case] expected: Result<ObjectKind, UnknownKind>) {
        assert_eq!(tag.parse::<ObjectKind>(), expected);
    }

    #[rstest]
    #[case(true, BUILDING_DAMAGED)]
    #[case(false, BUILDING_INTACT)]
    fn building_color_tracks_condition(#[case] damaged: bool, #[case] expected: Rgb) {
        assert_eq!(ObjectKind::Building.visual(Vec2::ONE, damaged).color, expected);
    }

    #[test]
    fn only_buildings_care_about_damage() {
        for kind in ObjectKind::ALL.into_iter().filter(|k| *k != ObjectKind::Building) {
            assert_eq!(kind.color(true), kind.color(false), "{kind}");
        }
    }

    #[test]
    fn geometry_is_sized_from_the_footprint() {
        let size = Vec2::new(0.5, 0.25);
        assert_eq!(
            ObjectKind::Tree.visual(size, false).shape,
            Shape::Cylinder {
                radius: 0.25,
                height: 0.25
            }
        );
        assert_eq!(
            ObjectKind::Vehicle.visual(size, false).shape,
            Shape::Cuboid {
                size: Vec3::new(0.5, 0.25, VEHICLE_DEPTH)
            }
        );
        assert_eq!(
            ObjectKind::Person.visual(size, false).shape,
            Shape::Sphere { radius: 0.25 }
        );
        assert!(ObjectKind::Flood.visual(size, false).is_translucent());
    }

    #[test]
    fn upright_kinds_are_rotated() {
        let tree = ObjectKind::Tree.placement(Vec3::ZERO);
        let (axis, angle) = tree.rotation.to_axis_angle();
        assert_relative_eq!(angle, FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(axis.x, -1.0, epsilon = 1e-6);
        assert_eq!(ObjectKind::Building.placement(Vec3::ONE).rotation, Quat::IDENTITY);
        assert!(ObjectKind::Flood.placement(Vec3::ZERO).translation.z < 0.0);
    }
}
