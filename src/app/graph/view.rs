use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::{LayoutMode, NodeId};
use crate::util::truncate_label;

use super::super::render_utils::{
    blend_color, dim_color, draw_background, edge_visible, fill_background, node_color, to_pos2,
};
use super::super::{NameMatchCache, ViewModel};

const LABEL_MAX_CHARS: usize = 28;
const IDLE_TIMER_REPAINT: std::time::Duration = std::time::Duration::from_millis(50);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Nodes whose name fuzzily matches the search box. Highlight only; the
    /// view moves when the search is submitted.
    fn cached_name_matches(&mut self) -> Option<Arc<HashSet<NodeId>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.session.revision();
        if let Some(cached) = &self.name_match_cache
            && cached.revision == revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .session
            .graph()
            .nodes
            .iter()
            .filter(|node| fuzzy_match_score(&matcher, &node.name, query).is_some())
            .map(|node| node.id)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.name_match_cache = Some(NameMatchCache {
            query: query.to_owned(),
            revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let mode = self.session.mode();

        match mode {
            LayoutMode::Planar => {
                let camera = self.session.camera_2d;
                draw_background(&painter, rect, to_pos2(camera.pan).to_vec2(), camera.zoom);
            }
            LayoutMode::Spatial => fill_background(&painter, rect),
        }

        self.handle_graph_zoom(ui, rect, &response);

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = self
            .session
            .dragging()
            .or_else(|| self.hovered_node(rect, pointer));
        self.session.hover_at(hovered);

        self.handle_node_drag(rect, &response, hovered);
        self.handle_graph_pan(&response);
        self.apply_graph_click(&response, hovered);

        let status = self.session.tick();
        if status.animating || response.dragged() {
            ui.ctx().request_repaint();
        } else if status.timers_pending {
            ui.ctx().request_repaint_after(IDLE_TIMER_REPAINT);
        }

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if self.session.graph().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes yet. Add one from the node panel.",
                FontId::proportional(15.0),
                Color32::from_gray(190),
            );
            return;
        }

        self.project_frame(rect);
        let name_matches = self.cached_name_matches();
        let highlight = self.session.highlight();
        let highlight_active = !highlight.is_empty();
        let matches_active = name_matches.as_ref().is_some_and(|matches| !matches.is_empty());

        let session = &self.session;
        let graph = session.graph();
        let scratch = &self.view_scratch;
        let index_by_id = graph.index_by_id();
        let zoom_scale = match mode {
            LayoutMode::Planar => session.camera_2d.zoom.sqrt(),
            LayoutMode::Spatial => 1.0,
        };

        for (link_index, link) in graph.links.iter().enumerate() {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                continue;
            };
            let start = scratch.screen_positions[source];
            let end = scratch.screen_positions[target];
            if !start.is_finite() || !end.is_finite() {
                continue;
            }
            if !scratch.visible[source] && !scratch.visible[target] && !edge_visible(rect, start, end, 2.5)
            {
                continue;
            }

            let is_lit = highlight.links.contains(&link_index);
            let (width, color) = if is_lit {
                (
                    (2.5 * zoom_scale).clamp(1.2, 4.4),
                    Color32::from_rgb(241, 146, 94),
                )
            } else if highlight_active {
                (
                    (0.82 * zoom_scale).clamp(0.45, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 110),
                )
            } else {
                (
                    (1.18 * zoom_scale).clamp(0.6, 3.4),
                    Color32::from_rgba_unmultiplied(120, 128, 140, 170),
                )
            };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        let selected = session.selected();
        let hovered = session.hovered();
        let portals = session.portals();
        let camera_distance = session.camera_3d.distance;

        for index in scratch.draw_order.iter().copied() {
            if !self.is_projected_visible(index) {
                continue;
            }

            let node = &graph.nodes[index];
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];
            let is_hovered = hovered == Some(node.id);
            let is_selected = selected == Some(node.id);
            let is_lit = highlight.nodes.contains(&node.id);
            let is_match = name_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&node.id));

            let mut base = node_color(node);
            if mode == LayoutMode::Spatial {
                let fade = (camera_distance / scratch.depths[index].max(1.0)).clamp(0.35, 1.0);
                base = dim_color(base, fade);
            }
            let color = if is_hovered {
                blend_color(base, Color32::from_rgb(255, 164, 101), 0.7)
            } else if is_selected {
                blend_color(base, Color32::from_rgb(245, 206, 93), 0.65)
            } else if is_lit {
                blend_color(base, Color32::from_rgb(246, 137, 92), 0.45)
            } else if is_match {
                blend_color(base, Color32::from_rgb(103, 196, 255), 0.68)
            } else if highlight_active {
                dim_color(base, 0.52)
            } else if matches_active {
                dim_color(base, 0.38)
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_match { 1.55 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );
            if node.is_central {
                painter.circle_stroke(
                    position,
                    radius + 3.0,
                    Stroke::new(1.6, Color32::from_rgb(245, 206, 93)),
                );
            }
            if portals.is_portal(node.id) {
                painter.circle_stroke(
                    position,
                    radius + if node.is_central { 6.0 } else { 3.0 },
                    Stroke::new(1.2, Color32::from_rgba_unmultiplied(103, 196, 255, 200)),
                );
            }
            if is_selected {
                painter.circle_stroke(
                    position,
                    radius + 8.0,
                    Stroke::new(1.4, Color32::from_rgba_unmultiplied(245, 206, 93, 150)),
                );
            }

            let should_draw_label = is_hovered
                || is_selected
                || is_lit
                || is_match
                || node.is_central
                || radius > 12.0;
            if should_draw_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_label(&node.name, LABEL_MAX_CHARS),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(node) = hovered.and_then(|id| graph.node(id)) {
            let panel_text = format!(
                "{}  |  {}  |  links {}",
                node.name,
                node.family.join(", "),
                node.join.len()
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.draw_portal_menu(ui.ctx(), rect);
    }
}
