//! Roomfolio Scene - Bevy rendering, interaction and overlays for the room
//!
//! This crate turns a [`roomfolio_core::RoomConfig`] into a live scene:
//! - Orthographic camera rig with orbit, fit-to-volume and reset moves
//! - Room objects, hotspot markers, lamps and animated surfaces
//! - Pointer bindings for tooltips and the seated camera focus
//! - egui loading splash and tooltip overlays
//!
//! The host app adds `DefaultPlugins`, the picking plugins and `EguiPlugin`,
//! inserts a [`RoomDescription`] and then adds [`RoomScenePlugin`].

pub mod camera;
pub mod interaction;
pub mod room;
pub mod scene;
pub mod types;
pub mod ui;

use bevy::prelude::*;

/// Plugin that sets up the whole room experience
pub struct RoomScenePlugin;

impl Plugin for RoomScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>()
            .add_plugins(camera::CameraPlugin)
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(room::RoomPlugin)
            .add_plugins(interaction::InteractionPlugin)
            .add_plugins(ui::UiPlugin);
    }
}

// Re-export commonly used types
pub use types::*;
pub use camera::{CameraPose, CameraRig, MainCamera};
pub use room::EmbeddedDocument;
