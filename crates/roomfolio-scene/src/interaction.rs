//! Pointer bindings: hotspot toggles, background-click clearing and focus actuators
//!
//! Hotspot markers consume their own clicks (toggle + stop propagation). A
//! global click observer lives for exactly as long as the room is mounted and
//! clears the selection for every click that did not land on a marker.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_picking::events::{Click, Out, Over, Pointer};
use bevy_picking::pointer::PointerButton;
use roomfolio_core::FocusCommand;
use tracing::{debug, warn};

use crate::camera::{CameraRig, CameraRigSystems, CameraTransitionFinished, VolumeBounds};
use crate::types::*;

/// The room-scoped background click observer
#[derive(Component)]
pub struct BackgroundClickListener;

/// Plugin for pointer and keyboard interaction
pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HoverCursor>()
            .add_message::<FocusRequest>()
            .add_systems(OnEnter(AppState::Room), install_background_listener)
            .add_systems(OnExit(AppState::Room), remove_background_listener)
            .add_systems(
                Update,
                (
                    handle_deselection,
                    sync_marker_materials,
                    apply_focus_requests.before(CameraRigSystems),
                    finish_focus_transitions.after(CameraRigSystems),
                )
                    .run_if(in_state(AppState::Room)),
            );
    }
}

/// Toggle this marker's annotation and keep the click from reaching the background
pub fn on_marker_click(
    mut click: On<Pointer<Click>>,
    markers: Query<&HotspotMarker>,
    selection: Option<ResMut<ActiveAnnotation>>,
) {
    click.propagate(false);
    if click.event.button != PointerButton::Primary {
        return;
    }
    let (Ok(marker), Some(mut selection)) = (markers.get(click.entity), selection) else {
        return;
    };
    selection.toggle(&marker.id);
}

pub fn on_hover_start(_over: On<Pointer<Over>>, mut hover: ResMut<HoverCursor>) {
    hover.0 = true;
}

pub fn on_hover_end(_out: On<Pointer<Out>>, mut hover: ResMut<HoverCursor>) {
    hover.0 = false;
}

/// Chair click
pub fn on_focus_trigger_click(click: On<Pointer<Click>>, mut requests: MessageWriter<FocusRequest>) {
    if click.event.button == PointerButton::Primary {
        requests.write(FocusRequest::Toggle);
    }
}

/// Desk click; also reached by clicks bubbling up from the desk's children
pub fn on_focus_exit_click(mut click: On<Pointer<Click>>, mut requests: MessageWriter<FocusRequest>) {
    // One exit request per click even when exit objects are nested
    click.propagate(false);
    if click.event.button == PointerButton::Primary {
        requests.write(FocusRequest::Exit);
    }
}

fn clear_on_background_click(
    click: On<Pointer<Click>>,
    markers: Query<(), With<HotspotMarker>>,
    selection: Option<ResMut<ActiveAnnotation>>,
) {
    if click.event.button != PointerButton::Primary || markers.contains(click.entity) {
        return;
    }
    if let Some(mut selection) = selection {
        // Only touch the resource when something changes
        if selection.active().is_some() {
            selection.clear();
        }
    }
}

fn install_background_listener(
    mut commands: Commands,
    existing: Query<(), With<BackgroundClickListener>>,
) {
    if !existing.is_empty() {
        warn!("Background click listener already installed");
        return;
    }
    commands.spawn((
        Observer::new(clear_on_background_click),
        BackgroundClickListener,
        Name::new("background-click-listener"),
    ));
    debug!("Background click listener installed");
}

fn remove_background_listener(
    mut commands: Commands,
    listeners: Query<Entity, With<BackgroundClickListener>>,
    mut hover: ResMut<HoverCursor>,
) {
    for entity in &listeners {
        commands.entity(entity).despawn();
    }
    hover.0 = false;
    debug!("Background click listener removed");
}

/// Handle Escape key to close the open tooltip
fn handle_deselection(mut selection: ResMut<ActiveAnnotation>, keyboard: Res<ButtonInput<KeyCode>>) {
    if keyboard.just_pressed(KeyCode::Escape) && selection.active().is_some() {
        selection.clear();
    }
}

/// Re-derive every marker's colour from the selection
fn sync_marker_materials(
    selection: Res<ActiveAnnotation>,
    materials: Res<MarkerMaterials>,
    mut markers: Query<(&HotspotMarker, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    if !selection.is_changed() {
        return;
    }
    for (marker, mut material) in &mut markers {
        let wanted = if selection.is_active(&marker.id) {
            &materials.active
        } else {
            &materials.idle
        };
        if material.0 != *wanted {
            material.0 = wanted.clone();
        }
    }
}

fn focus_volume(volumes: &Query<(&FocusVolume, &GlobalTransform)>) -> Option<VolumeBounds> {
    let (volume, transform) = volumes.iter().next()?;
    let (scale, rotation, center) = transform.to_scale_rotation_translation();
    Some(VolumeBounds {
        center,
        rotation,
        half_extents: volume.half_extents * scale,
    })
}

fn viewport_size(windows: &Query<&Window, With<PrimaryWindow>>) -> Vec2 {
    windows
        .single()
        .map(|window| Vec2::new(window.physical_width() as f32, window.physical_height() as f32))
        .unwrap_or(Vec2::new(1920.0, 1080.0))
}

fn run_command(
    rig: &mut CameraRig,
    command: FocusCommand,
    volume: Option<&VolumeBounds>,
    viewport: Vec2,
    follow_up_eye: Vec3,
) {
    if !rig.start_move(command, volume, viewport, follow_up_eye) {
        warn!("Camera move {:?} skipped: focus volume not mounted", command.movement);
    }
}

fn apply_focus_requests(
    mut requests: MessageReader<FocusRequest>,
    mut controller: ResMut<FocusController>,
    mut rig: ResMut<CameraRig>,
    volumes: Query<(&FocusVolume, &GlobalTransform)>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if requests.is_empty() {
        return;
    }
    let volume = focus_volume(&volumes);
    let viewport = viewport_size(&windows);
    let follow_up_eye = controller.follow_up_eye;

    for request in requests.read() {
        let command = match request {
            FocusRequest::Toggle => controller.focus.toggle(volume.is_some()),
            FocusRequest::Exit => controller.focus.deactivate(),
        };
        if let Some(command) = command {
            run_command(&mut rig, command, volume.as_ref(), viewport, follow_up_eye);
        }
    }
}

/// Feed rig completions back into the focus state machine
fn finish_focus_transitions(
    mut finished: MessageReader<CameraTransitionFinished>,
    mut controller: ResMut<FocusController>,
    mut rig: ResMut<CameraRig>,
    volumes: Query<(&FocusVolume, &GlobalTransform)>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    for done in finished.read() {
        let Some(command) = controller.focus.transition_finished(done.ticket) else {
            continue;
        };
        let follow_up_eye = controller.follow_up_eye;
        let volume = focus_volume(&volumes);
        run_command(
            &mut rig,
            command,
            volume.as_ref(),
            viewport_size(&windows),
            follow_up_eye,
        );
    }
}
