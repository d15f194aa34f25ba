//! egui overlays: loading splash, anchored tooltips and the hover cursor

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use roomfolio_core::config::parse_hex_color;
use roomfolio_core::{GatePhase, LoadingGate, Payload, TooltipView};
use tracing::info;

use crate::camera::MainCamera;
use crate::types::*;

/// Plugin for the egui overlays
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UiLayout>()
            .add_systems(Startup, setup_gate)
            .add_systems(
                Update,
                (
                    update_ui_layout,
                    tick_loading_gate.run_if(in_state(AppState::Loading)),
                ),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    loading_screen.run_if(in_state(AppState::Loading)),
                    (tooltip_overlay, apply_hover_cursor).run_if(in_state(AppState::Room)),
                ),
            );
    }
}

fn setup_gate(mut commands: Commands, description: Option<Res<RoomDescription>>) {
    let config = description
        .map(|description| description.0.loading.clone())
        .unwrap_or_default();
    commands.insert_resource(Gate(LoadingGate::new(&config)));
}

fn update_ui_layout(windows: Query<&Window, With<PrimaryWindow>>, mut layout: ResMut<UiLayout>) {
    let Ok(window) = windows.single() else {
        return;
    };
    if layout.screen_width != window.width() || layout.screen_height != window.height() {
        layout.update_from_window(window.width(), window.height());
    }
}

fn tick_loading_gate(time: Res<Time>, gate: Option<ResMut<Gate>>) {
    if let Some(mut gate) = gate {
        gate.tick(time.delta_secs());
    }
}

fn loading_screen(
    mut contexts: EguiContexts,
    gate: Option<ResMut<Gate>>,
    description: Option<Res<RoomDescription>>,
    layout: Res<UiLayout>,
    mut next_state: ResMut<NextState<AppState>>,
) -> Result {
    let (Some(mut gate), Some(description)) = (gate, description) else {
        return Ok(());
    };
    let ctx = contexts.ctx_mut()?;
    let config = &description.0;
    let scale = layout.ui_scale();
    let [r, g, b] = parse_hex_color(&config.scene.background).unwrap_or([1.0; 3]);
    let background = egui::Color32::from_rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8);

    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(background))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.35);
                ui.heading(
                    egui::RichText::new(&config.scene.title)
                        .size(28.0 * scale)
                        .color(egui::Color32::from_rgb(40, 40, 40)),
                );
                ui.add_space(16.0);

                match gate.phase() {
                    GatePhase::Preparing { .. } => {
                        ui.spinner();
                        ui.label(egui::RichText::new(gate.headline()).size(16.0 * scale));
                    }
                    GatePhase::Ready | GatePhase::Started => {
                        ui.label(egui::RichText::new(gate.headline()).size(18.0 * scale));
                        ui.add_space(12.0);
                        let button = egui::Button::new(
                            egui::RichText::new(&config.loading.button_label).size(20.0 * scale),
                        );
                        if ui.add(button).clicked() && gate.start() {
                            info!("Entering the room");
                            next_state.set(AppState::Room);
                        }
                    }
                }
            });
        });

    Ok(())
}

/// Show the payload of whichever hotspot is active, pinned to its anchor
fn tooltip_overlay(
    mut contexts: EguiContexts,
    selection: Option<Res<ActiveAnnotation>>,
    annotations: Option<Res<Annotations>>,
    anchors: Query<(&TooltipAnchor, &GlobalTransform)>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    layout: Res<UiLayout>,
) -> Result {
    let (Some(selection), Some(annotations)) = (selection, annotations) else {
        return Ok(());
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return Ok(());
    };
    let ctx = contexts.ctx_mut()?;

    for (anchor, transform) in &anchors {
        let Some(hotspot) = annotations.get(&anchor.id) else {
            continue;
        };
        let TooltipView::Visible(payload) = hotspot.view(selection.active()) else {
            continue;
        };
        let Ok(position) = camera.world_to_viewport(camera_transform, transform.translation())
        else {
            continue;
        };

        egui::Area::new(egui::Id::new(("tooltip", anchor.id.as_str())))
            .fixed_pos(egui::pos2(position.x, position.y))
            .pivot(egui::Align2::CENTER_CENTER)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(layout.tooltip_width());
                    render_payload(ui, payload, &layout);
                });
            });
    }

    Ok(())
}

/// Render a tooltip payload: first non-empty line as the title, links last
pub fn render_payload(ui: &mut egui::Ui, payload: &Payload, ui_layout: &UiLayout) {
    let ui_scale = ui_layout.ui_scale();

    // Leading blank lines are skipped; later ones become paragraph gaps
    let mut lines = payload.lines.iter().skip_while(|line| line.trim().is_empty());
    if let Some(title) = lines.next() {
        ui.label(egui::RichText::new(title.trim()).strong().size(14.0 * ui_scale));
    }
    for line in lines {
        if line.trim().is_empty() {
            ui.add_space(6.0 * ui_scale);
        } else {
            ui.label(egui::RichText::new(line).size(12.0 * ui_scale));
        }
    }

    if !payload.links.is_empty() {
        ui.horizontal_wrapped(|ui| {
            for link in &payload.links {
                ui.hyperlink_to(&link.label, &link.url);
            }
        });
    }
}

fn apply_hover_cursor(mut contexts: EguiContexts, hover: Res<HoverCursor>) -> Result {
    if hover.0 {
        contexts
            .ctx_mut()?
            .set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    Ok(())
}
