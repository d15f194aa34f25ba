//! Scene setup - camera, background colour, ambient light and lamps

use bevy::camera::ScalingMode;
use bevy::prelude::*;
use roomfolio_core::config::{parse_hex_color, LampConfig, LampKind, LightingConfig};
use tracing::{error, info, warn};

use crate::camera::{CameraRig, MainCamera};
use crate::types::{RoomDescription, RoomScoped};

/// Marker for a configured lamp
#[derive(Component, Debug, Clone)]
pub struct Lamp {
    pub name: String,
}

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene);
    }
}

/// Parse a validated `#rrggbb` colour, falling back to white
pub fn srgb_color(hex: &str) -> Color {
    match parse_hex_color(hex) {
        Ok([r, g, b]) => Color::srgb(r, g, b),
        Err(e) => {
            warn!("{}", e);
            Color::WHITE
        }
    }
}

fn setup_scene(
    mut commands: Commands,
    description: Option<Res<RoomDescription>>,
    mut rig: ResMut<CameraRig>,
) {
    let Some(description) = description else {
        error!("No room description inserted; nothing to render");
        return;
    };
    let config = &description.0;

    commands.insert_resource(ClearColor(srgb_color(&config.scene.background)));

    // The rendering surface owns the camera; the home pose is captured here
    *rig = CameraRig::from_config(&config.camera);

    commands.spawn((
        Camera3d::default(),
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::WindowSize,
            scale: 1.0 / rig.pose.zoom.max(f32::EPSILON),
            near: config.camera.near,
            far: config.camera.far,
            ..OrthographicProjection::default_3d()
        }),
        Transform::from_translation(rig.pose.eye).looking_at(rig.pose.target, Vec3::Y),
        AmbientLight {
            color: Color::WHITE,
            brightness: config.lighting.effective_ambient(),
            ..default()
        },
        MainCamera,
    ));
}

/// Spawn every configured lamp; lamp positions are world space, not room-local
pub fn spawn_lamps(commands: &mut Commands, lighting: &LightingConfig) {
    for lamp in &lighting.lamps {
        spawn_lamp(commands, lamp);
    }
    info!(
        "Lighting: {} lamps, ambient {:.0}{}",
        lighting.lamps.len(),
        lighting.effective_ambient(),
        if lighting.sleep { " (sleep)" } else { "" }
    );
}

fn spawn_lamp(commands: &mut Commands, lamp: &LampConfig) {
    let color = srgb_color(&lamp.color);
    // Disabled lamps stay in the scene, just dark
    let intensity = if lamp.enabled { lamp.intensity } else { 0.0 };
    let position = Vec3::from(lamp.position);

    let mut entity = match lamp.kind {
        LampKind::Point => commands.spawn((
            PointLight {
                color,
                intensity,
                range: lamp.range,
                ..default()
            },
            Transform::from_translation(position),
        )),
        LampKind::Spot => {
            let look_at = lamp.look_at.map(Vec3::from).unwrap_or(position - Vec3::Y);
            commands.spawn((
                SpotLight {
                    color,
                    intensity,
                    range: lamp.range,
                    outer_angle: lamp.angle.min(std::f32::consts::FRAC_PI_2),
                    inner_angle: lamp.angle.min(std::f32::consts::FRAC_PI_2) * 0.5,
                    ..default()
                },
                Transform::from_translation(position).looking_at(look_at, Vec3::Y),
            ))
        }
    };
    entity.insert((
        Lamp {
            name: lamp.name.clone(),
        },
        Name::new(format!("lamp:{}", lamp.name)),
        RoomScoped,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp(name: &str, kind: LampKind, position: [f32; 3], enabled: bool) -> LampConfig {
        LampConfig {
            name: name.to_string(),
            kind,
            position,
            look_at: None,
            color: "#ffffff".to_string(),
            intensity: 5000.0,
            range: 1.5,
            angle: 0.6,
            enabled,
        }
    }

    #[test]
    fn test_lamps_stay_in_world_space() {
        let lighting = LightingConfig {
            lamps: vec![
                lamp("ambilight", LampKind::Spot, [-0.08, -0.11, -1.92], true),
                lamp("donut", LampKind::Point, [-1.14, 0.53, -1.75], false),
            ],
            ..default()
        };

        let mut app = App::new();
        app.add_systems(Update, move |mut commands: Commands| {
            spawn_lamps(&mut commands, &lighting);
        });
        app.update();

        let world = app.world_mut();
        let mut lamps = world.query_filtered::<(&Lamp, &Transform, Has<ChildOf>), With<RoomScoped>>();
        let mut found: Vec<(String, Vec3, bool)> = lamps
            .iter(world)
            .map(|(lamp, transform, parented)| (lamp.name.clone(), transform.translation, parented))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, "ambilight");
        assert_eq!(found[0].1, Vec3::new(-0.08, -0.11, -1.92));
        assert!(found.iter().all(|(_, _, parented)| !parented));

        let mut points = world.query::<&PointLight>();
        let donut = points.single(world).map(|light| light.intensity);
        assert_eq!(donut.ok(), Some(0.0));
    }
}
