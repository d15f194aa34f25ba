//! Room mounting: objects, hotspot markers, focus targets and animated surfaces

use std::collections::HashMap;

use bevy::prelude::*;
use bevy_picking::Pickable;
use roomfolio_core::config::{
    parse_hex_color, FocusConfig, MarkerConfig, ObjectConfig, PortalConfig, ShapeConfig,
    SwayConfig,
};
use roomfolio_core::{AnnotationRegistry, CameraFocus};
use tracing::{error, info, warn};

use crate::interaction::{
    on_focus_exit_click, on_focus_trigger_click, on_hover_end, on_hover_start, on_marker_click,
};
use crate::scene::{spawn_lamps, srgb_color};
use crate::types::*;

/// Constant yaw rotation (hotspot markers)
#[derive(Component, Debug, Clone, Copy)]
pub struct Spin {
    pub speed: f32,
}

/// Idle yaw oscillation
#[derive(Component, Debug, Clone, Copy)]
pub struct Sway {
    pub frequency: f32,
    pub magnitude: f32,
    pub damping: f32,
}

impl Sway {
    /// Yaw increment for one frame
    pub fn step(&self, elapsed_secs: f32, delta_secs: f32) -> f32 {
        (elapsed_secs * self.frequency).sin() * self.magnitude * delta_secs * self.damping
    }
}

impl From<&SwayConfig> for Sway {
    fn from(config: &SwayConfig) -> Self {
        Self {
            frequency: config.frequency,
            magnitude: config.magnitude,
            damping: config.damping,
        }
    }
}

/// Surface whose colour oscillates with an accumulated time parameter
#[derive(Component, Debug, Clone)]
pub struct PortalSurface {
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub speed: f32,
    pub time: f32,
}

impl PortalSurface {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            start: parse_hex_color(&config.color_start).unwrap_or([1.0; 3]),
            end: parse_hex_color(&config.color_end).unwrap_or([1.0; 3]),
            speed: config.speed,
            time: 0.0,
        }
    }

    /// Advance the time parameter and return the colour for it
    pub fn advance(&mut self, delta_secs: f32) -> [f32; 3] {
        self.time += delta_secs * self.speed;
        let t = 0.5 + 0.5 * self.time.sin();
        let mut rgb = [0.0; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            *channel = self.start[i] + (self.end[i] - self.start[i]) * t;
        }
        rgb
    }
}

/// External document hosted on a screen surface
#[derive(Component, Debug, Clone)]
pub struct EmbeddedDocument {
    pub url: String,
    /// Width and height in world units
    pub size: Vec2,
}

/// Plugin for mounting the room and animating it
pub struct RoomPlugin;

impl Plugin for RoomPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::Room), mount_room)
            .add_systems(OnExit(AppState::Room), unmount_room)
            .add_systems(
                Update,
                (spin_markers, sway_objects, animate_portals).run_if(in_state(AppState::Room)),
            );
    }
}

pub fn shape_mesh(shape: &ShapeConfig) -> Mesh {
    match *shape {
        ShapeConfig::Box { size } => Cuboid::new(size[0], size[1], size[2]).into(),
        ShapeConfig::Plane { size } => Rectangle::new(size[0], size[1]).into(),
        ShapeConfig::Cylinder { radius, height } => Cylinder::new(radius, height).into(),
        ShapeConfig::Sphere { radius } => Sphere::new(radius).into(),
    }
}

fn object_transform(object: &ObjectConfig) -> Transform {
    let [rx, ry, rz] = object.rotation;
    Transform {
        translation: Vec3::from(object.position),
        rotation: Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
        scale: Vec3::from(object.scale),
    }
}

fn mount_room(
    mut commands: Commands,
    description: Res<RoomDescription>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let config = &description.0;
    let registry = config.registry().unwrap_or_else(|e| {
        error!("Hotspots disabled: {}", e);
        AnnotationRegistry::default()
    });

    let root = commands
        .spawn((
            RoomRoot,
            RoomScoped,
            Name::new("room"),
            Transform::from_translation(Vec3::from(config.scene.root_offset)),
            Visibility::default(),
        ))
        .id();

    // Objects first, then parenting, so declaration order does not matter
    let mut objects: HashMap<&str, Entity> = HashMap::new();
    for object in &config.objects {
        let mut entity = commands.spawn((
            RoomObject {
                id: object.id.clone(),
            },
            Name::new(object.id.clone()),
            object_transform(object),
            if object.visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            },
        ));

        if let Some(shape) = &object.shape {
            let material = match &object.portal {
                Some(portal) => StandardMaterial {
                    base_color: srgb_color(&portal.color_start),
                    unlit: true,
                    ..default()
                },
                None => StandardMaterial {
                    base_color: object
                        .color
                        .as_deref()
                        .map(srgb_color)
                        .unwrap_or(Color::srgb(0.8, 0.8, 0.8)),
                    perceptual_roughness: 0.8,
                    ..default()
                },
            };
            entity.insert((
                Mesh3d(meshes.add(shape_mesh(shape))),
                MeshMaterial3d(materials.add(material)),
            ));
        }
        if let Some(sway) = &object.sway {
            entity.insert(Sway::from(sway));
        }
        if let Some(portal) = &object.portal {
            entity.insert(PortalSurface::from_config(portal));
        }

        objects.insert(object.id.as_str(), entity.id());
    }

    for object in &config.objects {
        let Some(&entity) = objects.get(object.id.as_str()) else {
            continue;
        };
        let parent = match object.parent.as_deref() {
            Some(parent) => objects.get(parent).copied().unwrap_or_else(|| {
                warn!("Object '{}' has unknown parent '{}'", object.id, parent);
                root
            }),
            None => root,
        };
        commands.entity(entity).insert(ChildOf(parent));
    }

    if let Some(focus) = &config.focus {
        attach_focus_targets(&mut commands, &mut materials, config, focus, &objects);
    }

    let marker_materials = MarkerMaterials {
        idle: materials.add(marker_material(&config.markers.idle_color)),
        active: materials.add(marker_material(&config.markers.active_color)),
    };
    spawn_hotspots(
        &mut commands,
        &registry,
        &config.markers,
        &marker_materials,
        meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        &objects,
    );

    for embed in &config.embeds {
        let Some(&host) = objects.get(embed.object.as_str()) else {
            warn!("Embed '{}' targets unknown object '{}'", embed.url, embed.object);
            continue;
        };
        commands.spawn((
            EmbeddedDocument {
                url: embed.url.clone(),
                size: Vec2::from(embed.size),
            },
            Name::new(format!("embed:{}", embed.object)),
            Transform::from_translation(Vec3::from(embed.offset)),
            Visibility::default(),
            ChildOf(host),
        ));
    }

    spawn_lamps(&mut commands, &config.lighting);

    if let Some(backdrop) = &config.scene.backdrop {
        info!("Loading backdrop scene {}", backdrop);
        commands.spawn((
            SceneRoot(asset_server.load(backdrop.clone())),
            Name::new("backdrop"),
            ChildOf(root),
        ));
    }

    info!(
        "Room mounted: {} objects, {} hotspots, {} embeds",
        config.objects.len(),
        registry.len(),
        config.embeds.len()
    );

    commands.insert_resource(ActiveAnnotation::default());
    commands.insert_resource(FocusController {
        focus: CameraFocus::new(),
        follow_up_eye: config
            .focus
            .as_ref()
            .map(|focus| Vec3::from(focus.follow_up_eye))
            .unwrap_or_default(),
    });
    commands.insert_resource(Annotations(registry));
    commands.insert_resource(marker_materials);
}

fn attach_focus_targets(
    commands: &mut Commands,
    materials: &mut Assets<StandardMaterial>,
    config: &roomfolio_core::RoomConfig,
    focus: &FocusConfig,
    objects: &HashMap<&str, Entity>,
) {
    if let Some(&trigger) = objects.get(focus.trigger.as_str()) {
        commands
            .entity(trigger)
            .insert(FocusTrigger)
            .observe(on_focus_trigger_click)
            .observe(on_hover_start)
            .observe(on_hover_end);
    }

    let volume_shape = config.object(&focus.volume).and_then(|o| o.shape.as_ref());
    match (objects.get(focus.volume.as_str()), volume_shape) {
        (Some(&volume), Some(ShapeConfig::Box { size })) => {
            let mut entity = commands.entity(volume);
            entity.insert(FocusVolume {
                half_extents: Vec3::from(*size) * 0.5,
            });
            if volume_is_exit_target(config, focus) {
                // Hidden meshes are not ray cast; keep the box in the render
                // world but draw nothing so the whole volume takes exit clicks
                entity.insert((
                    Visibility::Inherited,
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::NONE,
                        alpha_mode: AlphaMode::Blend,
                        unlit: true,
                        ..default()
                    })),
                    Pickable {
                        should_block_lower: false,
                        is_hoverable: true,
                    },
                ));
            } else {
                entity.insert(Pickable::IGNORE);
            }
        }
        _ => warn!("Focus volume '{}' is not a mounted box", focus.volume),
    }

    for exit in &focus.exit {
        if let Some(&entity) = objects.get(exit.as_str()) {
            commands
                .entity(entity)
                .insert(FocusExit)
                .observe(on_focus_exit_click);
        }
    }
}

/// The volume sits inside one of the exit groups
fn volume_is_exit_target(config: &roomfolio_core::RoomConfig, focus: &FocusConfig) -> bool {
    focus
        .exit
        .iter()
        .any(|exit| config.is_within(&focus.volume, exit))
}

fn marker_material(hex: &str) -> StandardMaterial {
    StandardMaterial {
        base_color: srgb_color(hex),
        unlit: true,
        ..default()
    }
}

fn spawn_hotspots(
    commands: &mut Commands,
    registry: &AnnotationRegistry,
    markers: &MarkerConfig,
    materials: &MarkerMaterials,
    marker_mesh: Handle<Mesh>,
    objects: &HashMap<&str, Entity>,
) {
    for hotspot in registry.iter() {
        let Some(&host) = objects.get(hotspot.object.as_str()) else {
            warn!("Hotspot '{}' has no mounted object '{}'", hotspot.id, hotspot.object);
            continue;
        };

        commands
            .spawn((
                HotspotMarker {
                    id: hotspot.id.clone(),
                },
                Spin {
                    speed: markers.spin_speed,
                },
                Name::new(format!("marker:{}", hotspot.id)),
                Mesh3d(marker_mesh.clone()),
                MeshMaterial3d(materials.idle.clone()),
                Transform::from_translation(Vec3::from(hotspot.marker_offset))
                    .with_scale(Vec3::splat(markers.size)),
                ChildOf(host),
            ))
            .observe(on_marker_click)
            .observe(on_hover_start)
            .observe(on_hover_end);

        commands.spawn((
            TooltipAnchor {
                id: hotspot.id.clone(),
            },
            Name::new(format!("anchor:{}", hotspot.id)),
            Transform::from_translation(Vec3::from(hotspot.anchor_offset)),
            ChildOf(host),
        ));
    }
}

fn unmount_room(mut commands: Commands, scoped: Query<Entity, With<RoomScoped>>) {
    for entity in &scoped {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<ActiveAnnotation>();
    commands.remove_resource::<FocusController>();
    commands.remove_resource::<Annotations>();
    commands.remove_resource::<MarkerMaterials>();
    info!("Room unmounted");
}

fn spin_markers(time: Res<Time>, mut markers: Query<(&mut Transform, &Spin)>) {
    let dt = time.delta_secs();
    for (mut transform, spin) in &mut markers {
        transform.rotate_y(spin.speed * dt);
    }
}

fn sway_objects(time: Res<Time>, mut objects: Query<(&mut Transform, &Sway)>) {
    let elapsed = time.elapsed_secs();
    let dt = time.delta_secs();
    for (mut transform, sway) in &mut objects {
        transform.rotate_local_y(sway.step(elapsed, dt));
    }
}

fn animate_portals(
    time: Res<Time>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut portals: Query<(&mut PortalSurface, &MeshMaterial3d<StandardMaterial>)>,
) {
    let dt = time.delta_secs();
    for (mut portal, material) in &mut portals {
        let [r, g, b] = portal.advance(dt);
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = Color::srgb(r, g, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_oscillates_between_colors() {
        let mut portal = PortalSurface {
            start: [0.0, 0.0, 0.0],
            end: [1.0, 1.0, 1.0],
            speed: 1.0,
            time: 0.0,
        };
        // sin(pi/2) = 1: fully at the end colour
        let rgb = portal.advance(std::f32::consts::FRAC_PI_2);
        assert!((rgb[0] - 1.0).abs() < 1e-5);
        // sin(3pi/2) = -1: back at the start colour
        let rgb = portal.advance(std::f32::consts::PI);
        assert!(rgb[0].abs() < 1e-5);
    }

    #[test]
    fn test_sway_step_scales_with_frame_time() {
        let sway = Sway {
            frequency: 1.0,
            magnitude: -2.0,
            damping: 0.24,
        };
        assert_eq!(sway.step(0.0, 0.016), 0.0);
        let step = sway.step(std::f32::consts::FRAC_PI_2, 0.5);
        assert!((step - (-2.0 * 0.5 * 0.24)).abs() < 1e-5);
    }

    #[test]
    fn test_object_transform_from_config() {
        let object = ObjectConfig {
            id: "chair".into(),
            parent: None,
            shape: None,
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, std::f32::consts::FRAC_PI_2, 0.0],
            scale: [1.0; 3],
            color: None,
            visible: true,
            sway: None,
            portal: None,
        };
        let transform = object_transform(&object);
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        let forward = transform.rotation * Vec3::Z;
        assert!((forward - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_desk_volume_takes_exit_clicks() {
        let config = roomfolio_core::RoomConfig::builtin().unwrap();
        let focus = config.focus.as_ref().unwrap();
        assert!(volume_is_exit_target(&config, focus));

        let detached = roomfolio_core::RoomConfig::from_toml(
            r#"
[[object]]
id = "chair"

[[object]]
id = "deskGroup"

[[object]]
id = "deskBounds"
shape = { kind = "box", size = [0.7, 0.8, 1.2] }

[focus]
trigger = "chair"
volume = "deskBounds"
exit = ["deskGroup"]
"#,
        )
        .unwrap();
        let focus = detached.focus.as_ref().unwrap();
        assert!(!volume_is_exit_target(&detached, focus));
    }
}
