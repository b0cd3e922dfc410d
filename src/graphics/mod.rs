//! Renderer glue: turns [`Visual`]s into meshes and drives the camera.
//!
//! Everything here needs the `render` feature. The ECS side of the scene
//! never depends on it; this plugin only reads `Visual`, `Transform` and the
//! terrain texture and attaches the matching Bevy render components. With
//! the `text` feature detection labels are drawn as floating text.

use bevy::asset::RenderAssetUsages;
use bevy::camera::ScalingMode;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, PrimitiveTopology, TextureDimension, TextureFormat};

#[cfg(feature = "text")]
use crate::constants::{LABEL_FONT_SIZE, LABEL_SCALE};
use crate::overlay::{update_overlays, Overlay};
use crate::scene::camera::{
    compute_pan_direction, home_half_height, home_transform, pan_step, zoom_half_height,
    CameraController, CameraSettings, PanInput,
};
use crate::scene::{line_list, Shape, TerrainPlane, TerrainTexture, Visual};
use crate::terrain::RasterTexture;

fn line_mesh(points: Vec<Vec3>) -> Mesh {
    Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, points)
}

/// Builds the mesh for `shape`.
#[must_use]
pub fn shape_mesh(shape: &Shape) -> Mesh {
    match shape {
        Shape::Sphere { radius } => Mesh::from(Sphere::new(*radius)),
        Shape::Cuboid { size } => Mesh::from(Cuboid::from_size(*size)),
        Shape::Cylinder { radius, height } => Mesh::from(Cylinder::new(*radius, *height)),
        Shape::Rectangle { size } => Mesh::from(Rectangle::from_size(*size)),
        Shape::WireCube { .. }
        | Shape::Polyline { .. }
        | Shape::Segments { .. }
        | Shape::Arrow { .. } => line_mesh(line_list(shape).unwrap_or_default()),
    }
}

fn visual_material(visual: &Visual) -> StandardMaterial {
    let [r, g, b] = visual.color.channels();
    StandardMaterial {
        base_color: Color::srgb_u8(r, g, b).with_alpha(visual.opacity),
        alpha_mode: if visual.is_translucent() {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

fn texture_image(texture: &RasterTexture) -> Image {
    Image::new(
        Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        texture.data.clone(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

/// Attaches a fresh mesh and material to every new or changed [`Visual`].
///
/// Overlay roots have no visual of their own; they get a `Visibility` so
/// their parts inherit one.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
pub fn attach_meshes_system(
    mut commands: Commands,
    visuals: Query<(Entity, &Visual), Changed<Visual>>,
    groups: Query<Entity, (With<Overlay>, Without<Visibility>)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for entity in &groups {
        commands.entity(entity).insert(Visibility::default());
    }
    for (entity, visual) in &visuals {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(shape_mesh(&visual.shape))),
            MeshMaterial3d(materials.add(visual_material(visual))),
        ));
    }
}

/// Puts the synthesized terrain texture on the terrain plane.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn texture_terrain_system(
    texture: Res<TerrainTexture>,
    planes: Query<&MeshMaterial3d<StandardMaterial>, With<TerrainPlane>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let image = images.add(texture_image(&texture));
    for handle in &planes {
        if let Some(material) = materials.get_mut(&handle.0) {
            material.base_color_texture = Some(image.clone());
        }
    }
}

/// Gives every new [`Label`](crate::scene::Label) its floating text.
///
/// The label keeps its placement above the detection and is scaled from
/// text pixels down to render units.
#[cfg(feature = "text")]
pub fn attach_label_text_system(
    mut commands: Commands,
    mut labels: Query<(Entity, &crate::scene::Label, &mut Transform), Added<crate::scene::Label>>,
) {
    for (entity, label, mut transform) in &mut labels {
        transform.scale = Vec3::splat(LABEL_SCALE);
        commands.entity(entity).insert((
            Text2d::new(label.0.clone()),
            TextFont {
                font_size: LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(Color::WHITE),
        ));
    }
}

fn camera_setup(mut commands: Commands, cameras: Query<&Camera3d>) {
    if !cameras.is_empty() {
        return;
    }
    commands.spawn((
        Camera3d::default(),
        Projection::from(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: home_half_height() * 2.0,
            },
            ..OrthographicProjection::default_3d()
        }),
        home_transform(),
        CameraController,
        Name::new("SceneCamera"),
    ));
    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(0.0, 5.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Pans with WASD or the arrows and zooms with Q and E.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn camera_control_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    settings: Res<CameraSettings>,
    mut cameras: Query<(&mut Transform, &mut Projection), With<CameraController>>,
) {
    let Ok((mut transform, mut projection)) = cameras.single_mut() else {
        return;
    };
    let input = PanInput {
        up: keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp),
        down: keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown),
        left: keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft),
        right: keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight),
    };
    let step = pan_step(compute_pan_direction(input), time.delta_secs(), &settings);
    if step != Vec2::ZERO {
        transform.translation += step.extend(0.0);
    }

    let zoom = match (keyboard.pressed(KeyCode::KeyE), keyboard.pressed(KeyCode::KeyQ)) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => return,
    };
    if let Projection::Orthographic(ortho) = &mut *projection {
        if let ScalingMode::FixedVertical { viewport_height } = &mut ortho.scaling_mode {
            let half = zoom_half_height(*viewport_height / 2.0, zoom, time.delta_secs(), &settings);
            *viewport_height = half * 2.0;
        }
    }
}

/// Plugin owning the camera and the mesh and material attachment.
///
/// Add it next to [`crate::reconcile::SwarmScenePlugin`] in a windowed app.
#[derive(Debug, Default)]
pub struct ScenePresentationPlugin;

impl Plugin for ScenePresentationPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<CameraController>();
        app.init_resource::<CameraSettings>();
        app.add_systems(Startup, camera_setup);
        app.add_systems(
            Update,
            (
                attach_meshes_system,
                texture_terrain_system.run_if(resource_added::<TerrainTexture>),
            )
                .chain()
                .after(update_overlays),
        );
        app.add_systems(Update, camera_control_system);
        #[cfg(feature = "text")]
        app.add_systems(Update, attach_label_text_system.after(update_overlays));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Rgb;

    #[test]
    fn translucent_visuals_blend() {
        let visual = Visual::translucent(Shape::Sphere { radius: 1.0 }, Rgb::BLUE, 0.4);
        let material = visual_material(&visual);
        assert!(matches!(material.alpha_mode, AlphaMode::Blend));
        assert!(material.unlit);
    }

    #[test]
    fn wire_shapes_become_line_lists() {
        let mesh = shape_mesh(&Shape::WireCube { size: 1.0 });
        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::LineList);
        assert_eq!(mesh.count_vertices(), 24);
    }

    #[cfg(feature = "text")]
    #[test]
    fn labels_get_their_text() {
        use crate::scene::Label;
        use bevy::ecs::system::RunSystemOnce;

        let mut world = World::new();
        let label = world
            .spawn((Label("survivor".to_owned()), Transform::from_xyz(0.0, 0.3, 0.0)))
            .id();
        world
            .run_system_once(attach_label_text_system)
            .unwrap_or_else(|e| panic!("label system failed: {e}"));
        let text = world.get::<Text2d>(label).map(|t| t.0.clone());
        assert_eq!(text.as_deref(), Some("survivor"));
        let transform = world.get::<Transform>(label).copied();
        assert_eq!(transform.map(|t| t.scale), Some(Vec3::splat(LABEL_SCALE)));
        assert_eq!(transform.map(|t| t.translation.y), Some(0.3));
    }
}
