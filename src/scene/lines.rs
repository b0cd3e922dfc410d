//! Line-list geometry for the wireframe shapes.

use bevy::prelude::*;

use crate::constants::ARROW_HEAD_FRACTION;

use super::Shape;

/// Endpoint pairs for drawing `shape` as independent segments.
///
/// Returns `None` for solid shapes, which are meshed directly.
#[must_use]
pub fn line_list(shape: &Shape) -> Option<Vec<Vec3>> {
    match shape {
        Shape::Polyline { points } => Some(
            points
                .windows(2)
                .flat_map(|pair| pair.iter().copied())
                .collect(),
        ),
        Shape::Segments { points } => Some(
            points
                .chunks_exact(2)
                .flat_map(|pair| pair.iter().copied())
                .collect(),
        ),
        Shape::WireCube { size } => Some(cube_edges(*size)),
        Shape::Arrow { length } => Some(arrow(*length)),
        Shape::Sphere { .. }
        | Shape::Cuboid { .. }
        | Shape::Cylinder { .. }
        | Shape::Rectangle { .. } => None,
    }
}

fn cube_edges(size: f32) -> Vec<Vec3> {
    let h = size * 0.5;
    let corner = |i: u8| {
        Vec3::new(
            if i & 1 == 0 { -h } else { h },
            if i & 2 == 0 { -h } else { h },
            if i & 4 == 0 { -h } else { h },
        )
    };
    let mut points = Vec::with_capacity(24);
    for i in 0..8_u8 {
        for bit in [1_u8, 2, 4] {
            if i & bit == 0 {
                points.push(corner(i));
                points.push(corner(i | bit));
            }
        }
    }
    points
}

fn arrow(length: f32) -> Vec<Vec3> {
    let tip = Vec3::new(length, 0.0, 0.0);
    let head = length * ARROW_HEAD_FRACTION;
    vec![
        Vec3::ZERO,
        tip,
        tip,
        Vec3::new(length - head, head * 0.5, 0.0),
        tip,
        Vec3::new(length - head, -head * 0.5, 0.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn polyline_becomes_consecutive_pairs() {
        let shape = Shape::Polyline {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        };
        assert_eq!(
            line_list(&shape),
            Some(vec![Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Y])
        );
    }

    #[test]
    fn odd_segment_endpoint_is_dropped() {
        let shape = Shape::Segments {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        };
        assert_eq!(line_list(&shape).map(|p| p.len()), Some(2));
    }

    #[test]
    fn wire_cube_has_twelve_edges() {
        let points = line_list(&Shape::WireCube { size: 2.0 }).unwrap_or_default();
        assert_eq!(points.len(), 24);
        for pair in points.chunks_exact(2) {
            if let [a, b] = pair {
                assert_eq!(a.distance(*b), 2.0);
            }
        }
    }

    #[rstest]
    #[case(Shape::Sphere { radius: 1.0 })]
    #[case(Shape::Rectangle { size: Vec2::ONE })]
    fn solids_have_no_lines(#[case] shape: Shape) {
        assert!(line_list(&shape).is_none());
    }

    #[test]
    fn arrow_starts_at_the_origin() {
        let points = line_list(&Shape::Arrow { length: 0.3 }).unwrap_or_default();
        assert_eq!(points.first(), Some(&Vec3::ZERO));
        assert_eq!(points.get(1), Some(&Vec3::new(0.3, 0.0, 0.0)));
    }
}
