//! Scene defaults shared across systems.
//!
//! The extents and terrain inputs are the fallbacks used by
//! `SceneConfig::default()`; the per-entity sizes are fixed.

/// Width of the simulation environment in simulation units.
pub const ENV_WIDTH: f32 = 800.0;
/// Height of the simulation environment in simulation units.
pub const ENV_HEIGHT: f32 = 600.0;
/// Width of the rendered viewport in render units.
pub const RENDER_WIDTH: f32 = 10.0;
/// Height of the rendered viewport in render units.
pub const RENDER_HEIGHT: f32 = 7.5;
/// Integer upsampling factor applied to the height grid.
pub const TERRAIN_DETAIL_FACTOR: u32 = 8;
/// Coarse elevation samples, origin top-left.
pub const TERRAIN_HEIGHT_MAP: [[f32; 5]; 5] = [
    [0.0, 0.0, 0.0, 0.0, 6.0],
    [2.0, 4.0, 0.0, 0.0, 0.0],
    [2.0, 0.0, 8.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 2.0, 0.0],
    [6.0, 0.0, 0.0, 0.0, 0.0],
];
/// Depth of the terrain plane behind the z = 0 plane.
pub const TERRAIN_DEPTH: f32 = -1.0;

/// Edge length of an agent's bounding box in render units.
pub const AGENT_SIZE: f32 = 0.4;
/// Radius of the agent's sphere mesh in render units.
pub const AGENT_MESH_RADIUS: f32 = 0.025;
/// Detection ring radius used when a snapshot carries none.
pub const AGENT_DETECTION_RADIUS: f32 = 0.2;
/// Health of a freshly spawned agent.
pub const AGENT_MAX_HEALTH: f32 = 100.0;

/// Half-length of each crosshair arm.
pub const CROSSHAIR_HALF_LENGTH: f32 = 0.1;
/// Offset of the crosshair towards the viewer.
pub const CROSSHAIR_DEPTH: f32 = 1.0;
/// Segment count of the detection ring polyline.
pub const DETECTION_RING_SEGMENTS: usize = 32;
/// Width of a full health bar.
pub const HEALTH_BAR_WIDTH: f32 = 0.4;
/// Thickness of the health bar.
pub const HEALTH_BAR_HEIGHT: f32 = 0.05;
/// Height of the health bar above the agent centre.
pub const HEALTH_BAR_LIFT: f32 = 1.2;
/// Length of the heading arrow.
pub const DIRECTION_ARROW_LENGTH: f32 = 0.3;

/// Depth offset pushing flood planes just behind z = 0.
pub const FLOOD_DEPTH: f32 = -0.05;
/// Extrusion depth of building boxes.
pub const BUILDING_DEPTH: f32 = 1.0;
/// Fixed thin depth of vehicle boxes.
pub const VEHICLE_DEPTH: f32 = 0.5;
/// Extrusion depth of detection highlight boxes.
pub const DETECTION_DEPTH: f32 = 0.1;
/// Opacity of detection highlights.
pub const DETECTION_OPACITY: f32 = 0.4;
/// Opacity of flood planes.
pub const FLOOD_OPACITY: f32 = 0.5;
/// Gap between the top of a detection footprint and its label.
pub const LABEL_LIFT: f32 = 0.2;
/// Font size of detection labels, in text pixels.
pub const LABEL_FONT_SIZE: f32 = 24.0;
/// Scale from text pixels to render units for detection labels.
pub const LABEL_SCALE: f32 = 0.01;

/// Half the vertical extent seen by the orthographic camera.
pub const CAMERA_HALF_HEIGHT: f32 = 4.0;
/// Distance of the camera from the scene plane along `+z`.
pub const CAMERA_DISTANCE: f32 = 5.0;
/// Head length of the direction arrow as a fraction of its length.
pub const ARROW_HEAD_FRACTION: f32 = 0.25;
