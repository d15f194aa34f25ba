//! Shared resources, components and messages for the room scene

use bevy::prelude::*;
use roomfolio_core::{AnnotationRegistry, CameraFocus, LoadingGate, RoomConfig, Selection};

/// Top-level app flow: splash screen, then the mounted room
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Loading,
    Room,
}

/// The room description the app was started with
#[derive(Debug, Clone, Resource, Deref)]
pub struct RoomDescription(pub RoomConfig);

/// Hotspot registry built when the room mounts
#[derive(Debug, Clone, Resource, Deref)]
pub struct Annotations(pub AnnotationRegistry);

/// The single open tooltip; lives exactly as long as the mounted room
#[derive(Debug, Clone, Resource, Default, Deref, DerefMut)]
pub struct ActiveAnnotation(pub Selection);

/// Camera focus state plus the fixed follow-up eye position
#[derive(Debug, Clone, Resource)]
pub struct FocusController {
    pub focus: CameraFocus,
    pub follow_up_eye: Vec3,
}

/// Splash-screen timer
#[derive(Debug, Clone, Resource, Deref, DerefMut)]
pub struct Gate(pub LoadingGate);

/// Whether the pointer is over something clickable in the scene
#[derive(Debug, Clone, Resource, Default)]
pub struct HoverCursor(pub bool);

/// Requests from the focus actuators
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequest {
    /// Chair click: flip between default and focused framing
    Toggle,
    /// Desk click: leave focus if engaged
    Exit,
}

/// Everything spawned for the mounted room; despawned on unmount
#[derive(Component)]
pub struct RoomScoped;

/// Parent of all room objects, offset by the scene root offset
#[derive(Component)]
pub struct RoomRoot;

/// A configured room object
#[derive(Component, Debug, Clone)]
pub struct RoomObject {
    pub id: String,
}

/// Clickable marker that toggles one hotspot's tooltip
#[derive(Component, Debug, Clone)]
pub struct HotspotMarker {
    pub id: String,
}

/// World-space point a hotspot's tooltip is pinned to
#[derive(Component, Debug, Clone)]
pub struct TooltipAnchor {
    pub id: String,
}

/// Object whose click toggles camera focus
#[derive(Component)]
pub struct FocusTrigger;

/// Object whose click leaves camera focus
#[derive(Component)]
pub struct FocusExit;

/// Box framed when focus activates
#[derive(Component, Debug, Clone, Copy)]
pub struct FocusVolume {
    pub half_extents: Vec3,
}

/// Idle/active marker materials, shared by all markers
#[derive(Debug, Clone, Resource)]
pub struct MarkerMaterials {
    pub idle: Handle<StandardMaterial>,
    pub active: Handle<StandardMaterial>,
}

/// UI layout state for responsive design
#[derive(Debug, Clone, Resource)]
pub struct UiLayout {
    pub is_mobile: bool,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            is_mobile: false,
            screen_width: 1920.0,
            screen_height: 1080.0,
        }
    }
}

impl UiLayout {
    pub fn update_from_window(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
        // Consider mobile if width < 800 or in portrait orientation
        self.is_mobile = width < 800.0 || (height > width * 1.2);
    }

    pub fn ui_scale(&self) -> f32 {
        if self.is_mobile { 1.2 } else { 1.0 }
    }

    /// Widest a tooltip may grow before wrapping
    pub fn tooltip_width(&self) -> f32 {
        if self.is_mobile {
            self.screen_width * 0.7
        } else {
            320.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_layout_mobile_detection() {
        let mut layout = UiLayout::default();
        assert!(!layout.is_mobile);

        layout.update_from_window(390.0, 844.0);
        assert!(layout.is_mobile);
        assert_eq!(layout.ui_scale(), 1.2);
        assert!((layout.tooltip_width() - 273.0).abs() < 1e-3);

        layout.update_from_window(1280.0, 720.0);
        assert!(!layout.is_mobile);
        assert_eq!(layout.tooltip_width(), 320.0);
    }
}
