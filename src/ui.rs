use egui::Context;
use glam::Vec3;

use crate::config::AppConfig;

/// UI toggles that survive between frames
#[derive(Debug, Clone)]
pub struct UiState {
    pub help_visible: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self { help_visible: true }
    }
}

/// Snapshot of the frame the overlay reports on
#[derive(Debug, Clone, Copy)]
pub struct HudInfo {
    pub fps: f32,
    pub vehicle_loaded: bool,
    pub vehicle_pos: Vec3,
    pub character_pos: Vec3,
    pub show_bounds: bool,
}

/// Build the complete UI and return egui output
pub fn build_ui(
    egui_ctx: &Context,
    raw_input: egui::RawInput,
    ui_state: &mut UiState,
    hud: &HudInfo,
    config: &AppConfig,
) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        if ui_state.help_visible {
            draw_help_window(ctx, ui_state, config);
        } else {
            draw_show_help_button(ctx, ui_state);
        }
        if !hud.vehicle_loaded {
            draw_loading_indicator(ctx);
        }
        draw_status_line(ctx, hud);
    })
}

fn key_list(keys: &[String]) -> String {
    keys.iter()
        .map(|k| k.strip_prefix("Key").unwrap_or(k.as_str()))
        .collect::<Vec<_>>()
        .join(" / ")
}

fn draw_help_window(ctx: &Context, ui_state: &mut UiState, config: &AppConfig) {
    let car = &config.vehicle.motion.bindings;
    let person = &config.character.motion.bindings;

    egui::Window::new("Controls")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Car").strong());
            ui.label(egui::RichText::new(format!("{} / {} - Forward / Back", key_list(&car.forward), key_list(&car.backward))).small());
            ui.label(egui::RichText::new(format!("{} / {} - Turn", key_list(&car.turn_left), key_list(&car.turn_right))).small());
            ui.label(egui::RichText::new(format!("{} / {} - Tilt", key_list(&car.tilt_positive), key_list(&car.tilt_negative))).small());
            ui.label(egui::RichText::new(format!("{} - Jump", key_list(&car.jump))).small());
            ui.label(egui::RichText::new(format!("{} - Boost", key_list(&car.run))).small());
            ui.label(egui::RichText::new(format!("{} - Reset car", key_list(std::slice::from_ref(&config.reset_key)))).small());
            ui.separator();
            ui.label(egui::RichText::new("Character").strong());
            ui.label(egui::RichText::new(format!("{} / {} - Forward / Back", key_list(&person.forward), key_list(&person.backward))).small());
            ui.label(egui::RichText::new(format!("{} / {} - Turn", key_list(&person.turn_left), key_list(&person.turn_right))).small());
            ui.label(egui::RichText::new(format!("{} - Jump", key_list(&person.jump))).small());
            ui.separator();
            ui.label(egui::RichText::new("Drag - Orbit camera, Wheel - Zoom").small());
            ui.label(egui::RichText::new(format!("{} - Toggle bounding boxes", key_list(std::slice::from_ref(&config.toggle_bounds_key)))).small());
            if ui.button("Hide help").clicked() {
                ui_state.help_visible = false;
            }
        });
}

fn draw_show_help_button(ctx: &Context, ui_state: &mut UiState) {
    egui::Area::new(egui::Id::new("show_help"))
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .show(ctx, |ui| {
            if ui.button("Show help").clicked() {
                ui_state.help_visible = true;
            }
        });
}

fn draw_loading_indicator(ctx: &Context) {
    egui::Area::new(egui::Id::new("loading"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Loading car…").size(20.0).color(egui::Color32::WHITE));
        });
}

fn draw_status_line(ctx: &Context, hud: &HudInfo) {
    egui::Area::new(egui::Id::new("status"))
        .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
        .show(ctx, |ui| {
            let v = hud.vehicle_pos;
            let c = hud.character_pos;
            let mut line = format!(
                "FPS: {:.0}  Car: {:.1}, {:.1}, {:.1}  Character: {:.1}, {:.1}, {:.1}",
                hud.fps, v.x, v.y, v.z, c.x, c.y, c.z
            );
            if hud.show_bounds {
                line.push_str("  [bounds]");
            }
            ui.label(egui::RichText::new(line).small().color(egui::Color32::LIGHT_GRAY));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_list_strips_key_prefix() {
        let keys = vec!["KeyW".to_string(), "ArrowUp".to_string()];
        assert_eq!(key_list(&keys), "W / ArrowUp");
    }

    #[test]
    fn test_first_frame_shows_help() {
        let ctx = Context::default();
        let mut state = UiState::default();
        let hud = HudInfo {
            fps: 60.0,
            vehicle_loaded: false,
            vehicle_pos: Vec3::ZERO,
            character_pos: Vec3::new(5.0, 0.0, 0.0),
            show_bounds: false,
        };
        let config = AppConfig::default();
        let out = build_ui(&ctx, egui::RawInput::default(), &mut state, &hud, &config);
        assert!(!out.shapes.is_empty());
        assert!(state.help_visible);
    }
}
