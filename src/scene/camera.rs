//! Camera placement and keyboard panning, independent of the renderer.
//!
//! The scene is viewed head-on by an orthographic camera on the `+z` axis.
//! Panning moves the camera in its own plane; zooming changes how much of
//! the scene fits vertically.

use bevy::prelude::*;

use crate::constants::{CAMERA_DISTANCE, CAMERA_HALF_HEIGHT};

/// Marker component for the scene camera.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct CameraController;

/// Runtime configuration for camera movement.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct CameraSettings {
    /// Pan speed in render units per second.
    pub pan_speed: f32,
    /// Fractional change of the visible height per second of zooming.
    pub zoom_rate: f32,
    /// Visible half-height bounds as `(closest, widest)`.
    pub zoom_limits: (f32, f32),
    /// Clamp for frame time used in movement, so hitches do not jump.
    pub max_delta_seconds: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            pan_speed: 4.0,
            zoom_rate: 1.0,
            zoom_limits: (0.5, 12.0),
            max_delta_seconds: 0.1,
        }
    }
}

/// Directional key states for camera panning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "This struct represents the pressed state of exactly four directional keys."
)]
pub struct PanInput {
    /// W or `ArrowUp`.
    pub up: bool,
    /// S or `ArrowDown`.
    pub down: bool,
    /// A or `ArrowLeft`.
    pub left: bool,
    /// D or `ArrowRight`.
    pub right: bool,
}

/// Normalized pan direction for the pressed keys.
///
/// Opposing keys cancel; diagonals have unit length.
///
/// # Examples
///
/// ```
/// use bevy::math::Vec2;
/// use swarm_view::scene::camera::{compute_pan_direction, PanInput};
///
/// let input = PanInput { up: true, right: true, ..Default::default() };
/// assert!((compute_pan_direction(input).length() - 1.0).abs() < 0.001);
/// assert_eq!(compute_pan_direction(PanInput::default()), Vec2::ZERO);
/// ```
#[must_use]
pub fn compute_pan_direction(input: PanInput) -> Vec2 {
    const fn axis(neg: bool, pos: bool) -> f32 {
        match (neg, pos) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    Vec2::new(axis(input.left, input.right), axis(input.down, input.up)).normalize_or_zero()
}

/// Pan offset for one frame, with the frame time clamped.
#[must_use]
pub fn pan_step(direction: Vec2, delta_seconds: f32, settings: &CameraSettings) -> Vec2 {
    let delta = delta_seconds.min(settings.max_delta_seconds.max(f32::EPSILON));
    direction * settings.pan_speed * delta
}

/// New visible half-height after zooming for `delta_seconds`.
///
/// `zoom` is positive to zoom in and negative to zoom out. The result stays
/// within [`CameraSettings::zoom_limits`].
#[must_use]
pub fn zoom_half_height(
    half_height: f32,
    zoom: f32,
    delta_seconds: f32,
    settings: &CameraSettings,
) -> f32 {
    let delta = delta_seconds.min(settings.max_delta_seconds.max(f32::EPSILON));
    let (closest, widest) = settings.zoom_limits;
    (half_height * (1.0 - zoom * settings.zoom_rate * delta)).clamp(closest, widest)
}

/// Initial camera transform: on `+z`, looking at the origin with `+y` up.
#[must_use]
pub fn home_transform() -> Transform {
    Transform::from_xyz(0.0, 0.0, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y)
}

/// Initial visible half-height.
#[must_use]
pub const fn home_half_height() -> f32 {
    CAMERA_HALF_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::no_keys(PanInput::default(), Vec2::ZERO)]
    #[case::up_only(PanInput { up: true, ..Default::default() }, Vec2::Y)]
    #[case::left_only(PanInput { left: true, ..Default::default() }, Vec2::NEG_X)]
    #[case::left_and_right(PanInput { left: true, right: true, ..Default::default() }, Vec2::ZERO)]
    fn pan_direction_cardinal(#[case] input: PanInput, #[case] expected: Vec2) {
        assert_eq!(compute_pan_direction(input), expected);
    }

    #[test]
    fn pan_step_clamps_hitches() {
        let settings = CameraSettings::default();
        let step = pan_step(Vec2::X, 2.0, &settings);
        assert_relative_eq!(step.x, settings.pan_speed * settings.max_delta_seconds);
    }

    #[rstest]
    #[case(1.0, 4.0 * 0.9)]
    #[case(-1.0, 4.0 * 1.1)]
    #[case(0.0, 4.0)]
    fn zoom_scales_the_view(#[case] zoom: f32, #[case] expected: f32) {
        let settings = CameraSettings::default();
        assert_relative_eq!(
            zoom_half_height(4.0, zoom, 0.1, &settings),
            expected,
            epsilon = 1e-5
        );
    }

    #[test]
    fn zoom_respects_limits() {
        let settings = CameraSettings::default();
        assert_relative_eq!(zoom_half_height(0.5, 1.0, 0.1, &settings), 0.5);
        assert_relative_eq!(zoom_half_height(12.0, -1.0, 0.1, &settings), 12.0);
    }

    #[test]
    fn home_camera_faces_the_scene() {
        let transform = home_transform();
        assert_relative_eq!(transform.translation.z, CAMERA_DISTANCE);
        let forward = transform.forward();
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-6);
    }
}
