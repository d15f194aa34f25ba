//! Embedded documents: iframes laid over their screen surfaces
//!
//! Each `EmbeddedDocument` gets one iframe. Every frame the document's quad is
//! projected to the viewport and the iframe is fitted to its screen rectangle.
//! Without a browser the documents only occupy their transforms.

use bevy::prelude::*;
use roomfolio_scene::{AppState, EmbeddedDocument};

/// Plugin for the embedded document overlay
pub struct EmbedOverlayPlugin;

impl Plugin for EmbedOverlayPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(target_arch = "wasm32")]
        app.insert_non_send_resource(dom::EmbedFrames::default())
            .add_systems(Update, dom::sync_embed_frames.run_if(in_state(AppState::Room)))
            .add_systems(OnExit(AppState::Room), dom::remove_embed_frames);

        #[cfg(not(target_arch = "wasm32"))]
        app.add_systems(Update, log_embedded_documents.run_if(in_state(AppState::Room)));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn log_embedded_documents(added: Query<&EmbeddedDocument, Added<EmbeddedDocument>>) {
    for document in &added {
        tracing::info!("Embedded document {} (no browser surface)", document.url);
    }
}

#[cfg(target_arch = "wasm32")]
mod dom {
    use std::collections::HashMap;

    use bevy::prelude::*;
    use roomfolio_scene::MainCamera;

    use super::EmbeddedDocument;

    /// Screen rectangle `[left, top, width, height]` in logical pixels
    pub fn screen_rect(
        camera: &Camera,
        camera_transform: &GlobalTransform,
        document_transform: &GlobalTransform,
        size: Vec2,
    ) -> Option<[f32; 4]> {
        let half = size * 0.5;
        let corners = [
            Vec3::new(-half.x, -half.y, 0.0),
            Vec3::new(half.x, -half.y, 0.0),
            Vec3::new(half.x, half.y, 0.0),
            Vec3::new(-half.x, half.y, 0.0),
        ];

        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for corner in corners {
            let world = document_transform.transform_point(corner);
            let screen = camera.world_to_viewport(camera_transform, world).ok()?;
            min = min.min(screen);
            max = max.max(screen);
        }
        let extent = max - min;
        Some([min.x, min.y, extent.x, extent.y])
    }

    /// Live iframe elements by owning entity
    #[derive(Default)]
    pub struct EmbedFrames {
        frames: HashMap<Entity, web_sys::Element>,
    }

    fn create_frame(url: &str) -> Option<web_sys::Element> {
        let document = web_sys::window()?.document()?;
        let frame = document.create_element("iframe").ok()?;
        frame.set_attribute("src", url).ok()?;
        frame.set_attribute("loading", "lazy").ok()?;
        document.body()?.append_child(&frame).ok()?;
        Some(frame)
    }

    pub fn sync_embed_frames(
        mut frames: NonSendMut<EmbedFrames>,
        documents: Query<(Entity, &EmbeddedDocument, &GlobalTransform)>,
        camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    ) {
        let Ok((camera, camera_transform)) = camera_query.single() else {
            return;
        };

        for (entity, document, transform) in &documents {
            if !frames.frames.contains_key(&entity) {
                match create_frame(&document.url) {
                    Some(frame) => {
                        tracing::info!("Embedded document {} attached", document.url);
                        frames.frames.insert(entity, frame);
                    }
                    None => {
                        tracing::warn!("Could not create iframe for {}", document.url);
                        continue;
                    }
                }
            }
            let Some(frame) = frames.frames.get(&entity) else {
                continue;
            };

            let style = match screen_rect(camera, camera_transform, transform, document.size) {
                Some([left, top, width, height]) => format!(
                    "position:fixed;left:{left:.0}px;top:{top:.0}px;width:{width:.0}px;height:{height:.0}px;border:0;"
                ),
                None => "display:none;".to_string(),
            };
            if frame.get_attribute("style").as_deref() != Some(style.as_str()) {
                let _ = frame.set_attribute("style", &style);
            }
        }

        // Drop iframes whose documents are gone
        frames.frames.retain(|entity, frame| {
            let alive = documents.contains(*entity);
            if !alive {
                frame.remove();
            }
            alive
        });
    }

    pub fn remove_embed_frames(mut frames: NonSendMut<EmbedFrames>) {
        for (_, frame) in frames.frames.drain() {
            frame.remove();
        }
    }
}
