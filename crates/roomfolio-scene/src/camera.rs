//! Orthographic camera rig: orbit input, zoom and timed pose transitions

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::camera::ScalingMode;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;
use roomfolio_core::config::CameraConfig;
use roomfolio_core::{CameraMove, FocusCommand, TransitionTicket};
use tracing::debug;

/// Keeps the eye off the poles so `looking_at` stays well defined
const POLE_EPSILON: f32 = 0.01;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Emitted when a ticketed pose transition reaches its end
#[derive(Message, Debug, Clone, Copy)]
pub struct CameraTransitionFinished {
    pub ticket: TransitionTicket,
}

/// Eye, look-at target and orthographic zoom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
    pub zoom: f32,
}

impl CameraPose {
    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            eye: self.eye.lerp(other.eye, t),
            target: self.target.lerp(other.target, t),
            zoom: self.zoom + (other.zoom - self.zoom) * t,
        }
    }

    /// Azimuth (from +Z toward +X), polar angle (from +Y) and radius
    pub fn spherical(&self) -> (f32, f32, f32) {
        let offset = self.eye - self.target;
        let radius = offset.length().max(f32::EPSILON);
        let azimuth = offset.x.atan2(offset.z).rem_euclid(TAU);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        (azimuth, polar, radius)
    }
}

/// Direction from target to eye for the given angles
pub fn spherical_offset(azimuth: f32, polar: f32, radius: f32) -> Vec3 {
    Vec3::new(
        radius * polar.sin() * azimuth.sin(),
        radius * polar.cos(),
        radius * polar.sin() * azimuth.cos(),
    )
}

/// Clamp an azimuth into `[min, max]`, measured modulo a full turn
///
/// Out-of-range angles snap to whichever bound is angularly closer.
pub fn clamp_azimuth(azimuth: f32, min: f32, max: f32) -> f32 {
    if max - min >= TAU {
        return azimuth;
    }
    let wrapped = min + (azimuth - min).rem_euclid(TAU);
    if wrapped <= max {
        return wrapped;
    }
    let past_max = wrapped - max;
    let before_min = min + TAU - wrapped;
    if past_max <= before_min { max } else { min }
}

pub fn clamp_polar(polar: f32, min: f32, max: f32) -> f32 {
    let lo = min.max(POLE_EPSILON);
    let hi = max.min(PI - POLE_EPSILON).max(lo);
    polar.clamp(lo, hi)
}

fn snap_quarter_turn(angle: f32) -> f32 {
    (angle / FRAC_PI_2).round() * FRAC_PI_2
}

/// Oriented box in world space
#[derive(Debug, Clone, Copy)]
pub struct VolumeBounds {
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
}

impl VolumeBounds {
    pub fn corners(&self) -> [Vec3; 8] {
        let h = self.half_extents;
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sign = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            );
            *corner = self.center + self.rotation * (sign * h);
        }
        corners
    }
}

/// Angular and zoom limits for user orbiting
#[derive(Debug, Clone, Copy)]
pub struct OrbitLimits {
    pub azimuth: [f32; 2],
    pub polar: [f32; 2],
    pub zoom: [f32; 2],
}

impl OrbitLimits {
    /// Apply the angular limits to a pose, keeping its radius
    pub fn constrain(&self, pose: CameraPose) -> CameraPose {
        let (azimuth, polar, radius) = pose.spherical();
        let azimuth = clamp_azimuth(azimuth, self.azimuth[0], self.azimuth[1]);
        let polar = clamp_polar(polar, self.polar[0], self.polar[1]);
        CameraPose {
            eye: pose.target + spherical_offset(azimuth, polar, radius),
            ..pose
        }
    }
}

/// Frame `volume` squarely from the nearest axis-aligned view direction
///
/// The result looks at the volume center and zooms so the projected box
/// fits the viewport. The eye keeps its distance unless that would place
/// it inside the box.
pub fn fit_pose(
    current: &CameraPose,
    volume: &VolumeBounds,
    viewport: Vec2,
    limits: &OrbitLimits,
) -> CameraPose {
    let (azimuth, polar, radius) = current.spherical();
    let azimuth = clamp_azimuth(snap_quarter_turn(azimuth), limits.azimuth[0], limits.azimuth[1]);
    let polar = clamp_polar(snap_quarter_turn(polar), 0.0, PI);

    let back = spherical_offset(azimuth, polar, 1.0).normalize();
    let forward = -back;
    let right = {
        let r = forward.cross(Vec3::Y);
        if r.length_squared() < 1e-6 { Vec3::X } else { r.normalize() }
    };
    let up = right.cross(forward).normalize();

    let (mut min_r, mut max_r) = (f32::MAX, f32::MIN);
    let (mut min_u, mut max_u) = (f32::MAX, f32::MIN);
    let mut depth = 0.0f32;
    for corner in volume.corners() {
        let local = corner - volume.center;
        let r = local.dot(right);
        let u = local.dot(up);
        min_r = min_r.min(r);
        max_r = max_r.max(r);
        min_u = min_u.min(u);
        max_u = max_u.max(u);
        depth = depth.max(local.dot(back));
    }

    let width = (max_r - min_r).max(f32::EPSILON);
    let height = (max_u - min_u).max(f32::EPSILON);
    let zoom = (viewport.x / width).min(viewport.y / height);
    let distance = radius.max(depth + 1.0);

    CameraPose {
        eye: volume.center + back * distance,
        target: volume.center,
        zoom,
    }
}

/// Ease-in-out curve for pose transitions
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Clone)]
struct PoseTransition {
    from: CameraPose,
    to: CameraPose,
    elapsed: f32,
    duration: f32,
    ticket: Option<TransitionTicket>,
}

/// Camera controller state
#[derive(Debug, Clone, Resource)]
pub struct CameraRig {
    pub pose: CameraPose,
    /// Pose captured at setup; `ResetToHome` returns here
    pub home: CameraPose,
    pub limits: OrbitLimits,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub transition_secs: f32,
    transition: Option<PoseTransition>,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl CameraRig {
    pub fn from_config(config: &CameraConfig) -> Self {
        let limits = OrbitLimits {
            azimuth: config.azimuth_limits,
            polar: config.polar_limits,
            zoom: config.zoom_limits,
        };
        let home = limits.constrain(CameraPose {
            eye: Vec3::from(config.eye),
            target: Vec3::from(config.target),
            zoom: config.zoom,
        });
        Self {
            pose: home,
            home,
            limits,
            sensitivity: config.sensitivity,
            zoom_speed: config.zoom_speed,
            transition_secs: config.transition_secs,
            transition: None,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Ticket of the transition in flight, if it carries one
    pub fn pending_ticket(&self) -> Option<TransitionTicket> {
        self.transition.as_ref().and_then(|t| t.ticket)
    }

    /// Start moving toward `to`, superseding any transition in flight
    ///
    /// The new move starts from the current interpolated pose. A superseded
    /// ticket is dropped and never reported.
    pub fn transition_to(&mut self, to: CameraPose, ticket: Option<TransitionTicket>) {
        if let Some(previous) = self.transition.as_ref().and_then(|t| t.ticket) {
            debug!("Camera transition {:?} superseded", previous);
        }
        self.transition = Some(PoseTransition {
            from: self.pose,
            to,
            elapsed: 0.0,
            duration: self.transition_secs,
            ticket,
        });
    }

    /// Step the transition; returns the ticket of a transition that just ended
    pub fn advance(&mut self, delta_secs: f32) -> Option<TransitionTicket> {
        let transition = self.transition.as_mut()?;
        transition.elapsed += delta_secs;

        if transition.duration <= 0.0 || transition.elapsed >= transition.duration {
            self.pose = transition.to;
            let ticket = transition.ticket;
            self.transition = None;
            return ticket;
        }

        let t = smoothstep(transition.elapsed / transition.duration);
        self.pose = transition.from.lerp(&transition.to, t);
        None
    }

    /// Start the camera side of a focus command
    ///
    /// Returns false when a fit is requested without a volume to frame.
    pub fn start_move(
        &mut self,
        command: FocusCommand,
        volume: Option<&VolumeBounds>,
        viewport: Vec2,
        follow_up_eye: Vec3,
    ) -> bool {
        let to = match command.movement {
            CameraMove::FitToVolume => match volume {
                Some(volume) => fit_pose(&self.pose, volume, viewport, &self.limits),
                None => return false,
            },
            CameraMove::ApplyFollowUp => self.limits.constrain(CameraPose {
                eye: follow_up_eye,
                ..self.pose
            }),
            CameraMove::ResetToHome => self.home,
        };
        debug!("Camera {:?} -> {:?}", command.movement, to);
        self.transition_to(to, Some(command.ticket));
        true
    }

    /// Rotate around the target by a drag delta in pixels
    pub fn orbit(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        let (azimuth, polar, radius) = self.pose.spherical();
        let azimuth = clamp_azimuth(
            azimuth - delta.x * self.sensitivity,
            self.limits.azimuth[0],
            self.limits.azimuth[1],
        );
        let polar = clamp_polar(
            polar - delta.y * self.sensitivity,
            self.limits.polar[0],
            self.limits.polar[1],
        );
        self.pose.eye = self.pose.target + spherical_offset(azimuth, polar, radius);
    }

    /// Multiply the zoom by `factor` within the zoom limits
    ///
    /// A zoom already outside the limits (after a fit) may move back toward
    /// them but not further away.
    pub fn zoom_by(&mut self, factor: f32) {
        let lo = self.limits.zoom[0].min(self.pose.zoom);
        let hi = self.limits.zoom[1].max(self.pose.zoom);
        self.pose.zoom = (self.pose.zoom * factor).clamp(lo, hi);
    }
}

/// Orbit input, transition stepping and camera write-back
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CameraRigSystems;

/// Plugin for the camera rig
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraRig>()
            .add_message::<CameraTransitionFinished>()
            .add_systems(
                Update,
                (handle_orbit_input, advance_camera_rig, apply_rig_to_camera)
                    .chain()
                    .in_set(CameraRigSystems),
            );
    }
}

fn handle_orbit_input(
    mut rig: ResMut<CameraRig>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    mut contexts: EguiContexts,
) {
    // Check if egui wants the mouse - if so, don't process camera controls
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let mut total_motion = Vec2::ZERO;
    for motion in mouse_motion.read() {
        total_motion += motion.delta;
    }
    let scroll: f32 = mouse_wheel.read().map(|wheel| wheel.y).sum();

    // Scripted moves own the camera until they finish
    if egui_wants_pointer || rig.is_transitioning() {
        return;
    }

    if mouse_button.pressed(MouseButton::Left) {
        rig.orbit(total_motion);
    }

    if scroll != 0.0 {
        let factor = 1.0 + scroll.signum() * rig.zoom_speed;
        rig.zoom_by(factor);
    }

    let touches: Vec<_> = touch_input.iter().collect();
    match touches.as_slice() {
        [touch] => rig.orbit(touch.delta()),
        [t1, t2] => {
            let curr_dist = t1.position().distance(t2.position());
            let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
            if prev_dist > 1.0 {
                rig.zoom_by(curr_dist / prev_dist);
            }
        }
        _ => {}
    }
}

fn advance_camera_rig(
    mut rig: ResMut<CameraRig>,
    time: Res<Time>,
    mut finished: MessageWriter<CameraTransitionFinished>,
) {
    if let Some(ticket) = rig.advance(time.delta_secs()) {
        finished.write(CameraTransitionFinished { ticket });
    }
}

fn apply_rig_to_camera(
    rig: Res<CameraRig>,
    mut camera_query: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
) {
    let Ok((mut transform, mut projection)) = camera_query.single_mut() else {
        return;
    };

    *transform = Transform::from_translation(rig.pose.eye).looking_at(rig.pose.target, Vec3::Y);
    if let Projection::Orthographic(ortho) = projection.as_mut() {
        ortho.scaling_mode = ScalingMode::WindowSize;
        ortho.scale = 1.0 / rig.pose.zoom.max(f32::EPSILON);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> OrbitLimits {
        OrbitLimits {
            azimuth: [TAU - 1.57, TAU],
            polar: [-0.5, FRAC_PI_2],
            zoom: [80.0, 600.0],
        }
    }

    fn rig() -> CameraRig {
        CameraRig {
            transition_secs: 1.0,
            ..CameraRig::default()
        }
    }

    #[test]
    fn test_spherical_round_trip() {
        let pose = CameraPose {
            eye: Vec3::new(-2.5, 1.0, 2.5),
            target: Vec3::ZERO,
            zoom: 200.0,
        };
        let (azimuth, polar, radius) = pose.spherical();
        let eye = spherical_offset(azimuth, polar, radius);
        assert!(eye.distance(pose.eye) < 1e-4);
        assert!(azimuth > 4.7 && azimuth < TAU);
    }

    #[test]
    fn test_clamp_azimuth_wraps_at_full_turn() {
        let (min, max) = (TAU - 1.57, TAU);
        // Slightly past +Z is just beyond the max bound
        assert!((clamp_azimuth(0.1, min, max) - max).abs() < 1e-5);
        // Far side of the room snaps to the nearer min bound
        assert!((clamp_azimuth(4.0, min, max) - min).abs() < 1e-5);
        let inside = TAU - 0.5;
        assert!((clamp_azimuth(inside, min, max) - inside).abs() < 1e-5);
    }

    #[test]
    fn test_clamp_polar_stays_off_poles() {
        assert!(clamp_polar(-0.5, -0.5, FRAC_PI_2) > 0.0);
        assert_eq!(clamp_polar(2.0, -0.5, FRAC_PI_2), FRAC_PI_2);
    }

    #[test]
    fn test_fit_pose_targets_volume_center() {
        let current = CameraPose {
            eye: Vec3::new(-1.0, 1.0, 3.0),
            target: Vec3::ZERO,
            zoom: 200.0,
        };
        let volume = VolumeBounds {
            center: Vec3::new(1.5, 1.1, -0.5),
            rotation: Quat::IDENTITY,
            half_extents: Vec3::new(0.35, 0.4, 0.6),
        };
        let pose = fit_pose(&current, &volume, Vec2::new(1000.0, 800.0), &limits());

        assert_eq!(pose.target, volume.center);
        // Snapped to a quarter turn: looking along an axis at the horizon
        let offset = pose.eye - pose.target;
        assert!(offset.y.abs() < 1e-4);
        assert!(offset.x.abs() < 1e-4 || offset.z.abs() < 1e-4);
        assert!(offset.length() >= current.spherical().2 - 1e-4);

        // Viewed along an axis the box covers at most one viewport dimension
        let w: f32 = 2.0 * if offset.z.abs() > offset.x.abs() { 0.35 } else { 0.6 };
        let expected = (1000.0 / w).min(800.0 / 0.8);
        assert!((pose.zoom - expected).abs() < 1e-2);
    }

    #[test]
    fn test_transition_reports_ticket_once() {
        let mut rig = rig();
        let to = CameraPose {
            eye: Vec3::new(-6.9, 2.3, -0.5),
            ..rig.pose
        };
        rig.transition_to(to, Some(TransitionTicket(7)));
        assert!(rig.is_transitioning());

        assert_eq!(rig.advance(0.5), None);
        assert_eq!(rig.advance(0.6), Some(TransitionTicket(7)));
        assert_eq!(rig.pose, to);
        assert_eq!(rig.advance(0.1), None);
    }

    #[test]
    fn test_superseded_transition_is_never_reported() {
        let mut rig = rig();
        let home = rig.home;
        let away = CameraPose {
            eye: home.eye + Vec3::X,
            ..home
        };

        rig.transition_to(away, Some(TransitionTicket(1)));
        rig.advance(0.5);
        let midway = rig.pose;
        rig.transition_to(home, Some(TransitionTicket(2)));
        assert_eq!(rig.pending_ticket(), Some(TransitionTicket(2)));

        // Retarget starts from the interpolated pose
        rig.advance(0.0);
        assert!(rig.pose.eye.distance(midway.eye) < 1e-5);

        assert_eq!(rig.advance(2.0), Some(TransitionTicket(2)));
        assert_eq!(rig.pose, home);
    }

    #[test]
    fn test_focus_sequence_moves() {
        let mut rig = rig();
        let volume = VolumeBounds {
            center: Vec3::new(1.5, -0.2, -0.5),
            rotation: Quat::IDENTITY,
            half_extents: Vec3::new(0.35, 0.4, 0.6),
        };
        let viewport = Vec2::new(1280.0, 720.0);
        let follow_up_eye = Vec3::new(-6.9, 2.3, -0.5);

        let fit = FocusCommand {
            ticket: TransitionTicket(1),
            movement: CameraMove::FitToVolume,
        };
        assert!(!rig.start_move(fit, None, viewport, follow_up_eye));
        assert!(!rig.is_transitioning());

        assert!(rig.start_move(fit, Some(&volume), viewport, follow_up_eye));
        assert_eq!(rig.advance(5.0), Some(TransitionTicket(1)));
        assert_eq!(rig.pose.target, volume.center);

        let follow_up = FocusCommand {
            ticket: TransitionTicket(2),
            movement: CameraMove::ApplyFollowUp,
        };
        assert!(rig.start_move(follow_up, Some(&volume), viewport, follow_up_eye));
        rig.advance(5.0);
        // Target kept, eye on the follow-up side of the desk
        assert_eq!(rig.pose.target, volume.center);
        assert!(rig.pose.eye.x < volume.center.x);

        let reset = FocusCommand {
            ticket: TransitionTicket(3),
            movement: CameraMove::ResetToHome,
        };
        assert!(rig.start_move(reset, None, viewport, follow_up_eye));
        rig.advance(5.0);
        assert_eq!(rig.pose, rig.home);
    }

    #[test]
    fn test_zoom_by_respects_limits() {
        let mut rig = rig();
        rig.pose.zoom = 590.0;
        rig.zoom_by(2.0);
        assert_eq!(rig.pose.zoom, 600.0);

        // After a fit beyond the max, wheel-in cannot push further
        rig.pose.zoom = 1200.0;
        rig.zoom_by(1.5);
        assert_eq!(rig.pose.zoom, 1200.0);
        rig.zoom_by(0.5);
        assert_eq!(rig.pose.zoom, 600.0);
    }
}
