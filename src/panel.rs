//! Live tweak panel. Only built with the `egui` feature.
//!
//! Slider edits go through the same clamping setters as the settings file,
//! so whatever the panel writes is valid for the next simulation step.

use crate::config::FlowConfig;
use crate::flow::{FREQUENCY_RANGE, INFLUENCE_RANGE, POINT_SIZE_RANGE, STRENGTH_RANGE};

/// Read-only numbers shown under the sliders.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStats {
    pub fps: f32,
    pub particle_count: usize,
    pub steps: u64,
    pub paused: bool,
}

/// Draw the panel. Returns true if any value changed this frame.
pub fn tweak_panel(ctx: &egui::Context, config: &mut FlowConfig, stats: &PanelStats) -> bool {
    let mut changed = false;

    egui::Window::new("Flow Field")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            let flow = &mut config.flow_field;

            let mut influence = flow.influence;
            if ui
                .add(egui::Slider::new(&mut influence, INFLUENCE_RANGE).text("influence"))
                .changed()
            {
                flow.set_influence(influence);
                changed = true;
            }

            let mut strength = flow.strength;
            if ui
                .add(egui::Slider::new(&mut strength, STRENGTH_RANGE).text("strength"))
                .changed()
            {
                flow.set_strength(strength);
                changed = true;
            }

            let mut frequency = flow.frequency;
            if ui
                .add(egui::Slider::new(&mut frequency, FREQUENCY_RANGE).text("frequency"))
                .changed()
            {
                flow.set_frequency(frequency);
                changed = true;
            }

            ui.separator();

            let mut point_size = config.render.point_size;
            if ui
                .add(egui::Slider::new(&mut point_size, POINT_SIZE_RANGE).text("point size"))
                .changed()
            {
                config.render.set_point_size(point_size);
                changed = true;
            }

            ui.horizontal(|ui| {
                ui.label("background");
                changed |= ui
                    .color_edit_button_srgb(&mut config.render.clear_color)
                    .changed();
            });

            ui.separator();
            ui.label(format!("{} particles", stats.particle_count));
            ui.label(format!("{:.0} fps, step {}", stats.fps, stats.steps));
            if stats.paused {
                ui.label("paused (space to resume)");
            }
        });

    changed
}
