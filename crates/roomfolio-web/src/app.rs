//! Bevy application setup

use bevy::app::PluginGroupBuilder;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::{DefaultPickingPlugins, prelude::MeshPickingPlugin};
use roomfolio_core::RoomConfig;
use roomfolio_scene::{RoomDescription, RoomScenePlugin};

use crate::embed::EmbedOverlayPlugin;

/// Bevy's default plugins set up for the room window and static hosting
pub fn default_plugins(config: &RoomConfig) -> PluginGroupBuilder {
    let window = Window {
        title: config.scene.title.clone(),
        canvas: config.scene.canvas.clone(),
        fit_canvas_to_parent: true,
        prevent_default_event_handling: false,
        ..default()
    };

    DefaultPlugins
        .build()
        // The entry points install their own tracing subscriber
        .disable::<bevy::log::LogPlugin>()
        .set(WindowPlugin {
            primary_window: Some(window),
            ..default()
        })
        .set(AssetPlugin {
            // Backdrop scenes are served next to index.html
            file_path: "".to_string(),
            // Don't look for .meta files - static hosting doesn't have them
            meta_check: bevy::asset::AssetMetaCheck::Never,
            ..default()
        })
}

/// Run the Bevy application for `config`
pub fn run(config: RoomConfig) {
    App::new()
        .add_plugins(default_plugins(&config))
        // These must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .insert_resource(RoomDescription(config))
        .add_plugins(RoomScenePlugin)
        .add_plugins(EmbedOverlayPlugin)
        .run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_plugin_left_to_entry_points() {
        let config = RoomConfig::default();
        let plugins = default_plugins(&config);

        assert!(plugins.contains::<bevy::log::LogPlugin>());
        assert!(!plugins.enabled::<bevy::log::LogPlugin>());
        assert!(plugins.enabled::<WindowPlugin>());
    }
}
