use eframe::egui::{self, Key, Response, RichText, Ui};

use crate::graph::store::pick_export_path;

use super::super::ViewModel;
use super::super::session::{MAX_REPULSION, MIN_REPULSION};

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn default_slider_key_step(min: f32, max: f32) -> f32 {
    ((max - min) / 200.0).max(0.0005)
}

/// Held arrow keys move a focused slider, speeding up the longer they are held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
    step: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };

    let direction = (increase_down as i8) - (decrease_down as i8);
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search families and anchors")
            .on_hover_text("Every word must appear in one of a node's family or anchor tags.");
        let search_response = ui.text_edit_singleline(&mut self.search);
        let submitted =
            search_response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
        search_response.on_hover_text("Names matching as you type are highlighted; Enter jumps.");
        ui.horizontal(|ui| {
            if ui.button("Find").clicked() || submitted {
                let query = self.search.clone();
                self.session.search(&query);
            }
            if ui.button("Clear").clicked() {
                self.search.clear();
            }
        });

        ui.separator();
        ui.label(RichText::new("Layout").strong());
        ui.horizontal(|ui| {
            let next = self.session.mode().toggled();
            if ui
                .button(format!("Switch to {}", next.label()))
                .on_hover_text("Toggle between the planar and spatial layouts.")
                .clicked()
            {
                self.session.toggle_layout_mode();
            }
            if ui
                .button("Reset view")
                .on_hover_text("Restore the default pan, zoom and orbit.")
                .clicked()
            {
                self.session.reset_view();
            }
        });

        let repulsion_slider = ui
            .add(
                egui::Slider::new(&mut self.repulsion, MIN_REPULSION..=MAX_REPULSION)
                    .text("Repulsion")
                    .logarithmic(true)
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly nodes push away from each other.");
        if repulsion_slider.hovered() {
            repulsion_slider.request_focus();
        }
        let mut repulsion_changed = repulsion_slider.changed();
        repulsion_changed |= apply_slider_arrow_acceleration(
            ui,
            &repulsion_slider,
            &mut self.repulsion,
            MIN_REPULSION,
            MAX_REPULSION,
            default_slider_key_step(MIN_REPULSION, MAX_REPULSION),
        );
        if repulsion_changed {
            self.session.set_repulsion_strength(self.repulsion);
        }

        ui.separator();
        ui.label(RichText::new("Files").strong());
        ui.horizontal_wrapped(|ui| {
            let export_path = self.session.export_path().to_path_buf();
            if ui
                .button("Save to file")
                .on_hover_text(format!("Write {}", export_path.display()))
                .clicked()
            {
                let _ = self.session.save_to_file(&export_path);
            }
            if ui.button("Export as...").clicked() {
                let file_name = export_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if let Some(path) = pick_export_path(&file_name) {
                    let _ = self.session.save_to_file(&path);
                }
            }
            let loading = self.import_rx.is_some();
            if ui
                .add_enabled(!loading, egui::Button::new("Load from file"))
                .on_hover_text("Replace the graph with a JSON document.")
                .clicked()
            {
                self.start_import();
            }
        });
        if ui
            .button("Reassign ids")
            .on_hover_text("Renumber nodes 1..n in their current id order.")
            .clicked()
        {
            self.session.reassign_ids();
        }

        ui.separator();
        ui.collapsing("Families", |ui| {
            let families = self.session.graph().family_list();
            if families.is_empty() {
                ui.label("No families yet.");
            }
            ui.horizontal_wrapped(|ui| {
                for family in families {
                    if ui
                        .small_button(family.as_str())
                        .on_hover_text("Search for this family")
                        .clicked()
                    {
                        self.search = family;
                        let query = self.search.clone();
                        self.session.search(&query);
                    }
                }
            });
        });

        ui.separator();
        ui.label(RichText::new("Portals").strong());
        let groups = self
            .session
            .portals()
            .groups()
            .iter()
            .map(|group| (group.name.clone(), group.members.clone()))
            .collect::<Vec<_>>();
        if groups.is_empty() {
            ui.label("No nodes share a name.");
            return;
        }
        egui::ScrollArea::vertical()
            .id_salt("portal_groups_scroll")
            .auto_shrink([false, true])
            .max_height(220.0)
            .show(ui, |ui| {
                for (name, members) in groups {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(format!("{name} ×{}", members.len()));
                        for member in members {
                            if ui.small_button(format!("#{member}")).clicked() {
                                self.session.focus_node(member);
                            }
                        }
                    });
                }
            });
    }
}
