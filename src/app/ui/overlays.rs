use eframe::egui::{self, Align2, Color32, Context, Id, Order, Rect, RichText, vec2};

use crate::util::truncate_label;

use super::super::ViewModel;
use super::super::session::NoticeLevel;

const MENU_NEIGHBOUR_PREVIEW: usize = 4;

impl ViewModel {
    /// Transient notices stacked in the bottom-right corner.
    pub(in crate::app) fn draw_notices(&self, ctx: &Context) {
        let notices = self.session.notices();
        if notices.is_empty() {
            return;
        }

        egui::Area::new(Id::new("notices"))
            .order(Order::Foreground)
            .anchor(Align2::RIGHT_BOTTOM, vec2(-12.0, -12.0))
            .interactable(false)
            .show(ctx, |ui| {
                for notice in notices {
                    let color = match notice.level {
                        NoticeLevel::Info => Color32::from_gray(235),
                        NoticeLevel::Error => Color32::from_rgb(236, 112, 128),
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(RichText::new(&notice.text).color(color));
                    });
                }
            });
    }

    /// Lists a portal's same-named twins next to the clicked node.
    pub(in crate::app) fn draw_portal_menu(&mut self, ctx: &Context, rect: Rect) {
        let Some(menu) = self.session.portal_menu() else {
            return;
        };
        let anchor = self
            .session
            .graph()
            .index_of(menu.origin)
            .and_then(|index| {
                let position = *self.view_scratch.screen_positions.get(index)?;
                let radius = *self.view_scratch.screen_radii.get(index)?;
                position.is_finite().then(|| position + vec2(radius + 10.0, -radius))
            })
            .unwrap_or_else(|| rect.center())
            .clamp(rect.min, rect.max);
        let entries = menu
            .connections
            .iter()
            .map(|connection| {
                let mut neighbours = connection
                    .neighbor_names
                    .iter()
                    .take(MENU_NEIGHBOUR_PREVIEW)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                if connection.neighbor_names.len() > MENU_NEIGHBOUR_PREVIEW {
                    neighbours.push_str(", …");
                }
                (
                    connection.node,
                    format!(
                        "{} ({})",
                        truncate_label(&connection.name, 24),
                        connection.family.join(", ")
                    ),
                    neighbours,
                )
            })
            .collect::<Vec<_>>();

        let mut chosen = None;
        let mut dismissed = false;
        let area = egui::Area::new(Id::new("portal_menu"))
            .order(Order::Foreground)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("Portal").strong());
                        if ui.small_button("✕").clicked() {
                            dismissed = true;
                        }
                    });
                    ui.separator();
                    for (node, label, neighbours) in entries {
                        let response = ui.button(label);
                        let response = if neighbours.is_empty() {
                            response
                        } else {
                            response.on_hover_text(format!("Next to: {neighbours}"))
                        };
                        if response.clicked() {
                            chosen = Some(node);
                        }
                    }
                });
            });

        let inside = ctx
            .pointer_hover_pos()
            .is_some_and(|pointer| area.response.rect.contains(pointer));
        self.session.portal_pointer_inside(inside);

        if let Some(node) = chosen {
            self.session.navigate_portal(node);
        } else if dismissed {
            self.session.close_portal_menu();
        }
    }
}
