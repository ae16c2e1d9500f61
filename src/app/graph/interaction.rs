use eframe::egui::{self, Pos2, Rect, Ui};

use crate::graph::{LayoutMode, NodeId};

use super::super::ViewModel;
use super::super::render_utils::to_glam;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        match self.session.mode() {
            LayoutMode::Planar => {
                let pointer = ui
                    .input(|input| input.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center());
                self.session.camera_2d.zoom_at(
                    to_glam(rect.center()),
                    to_glam(pointer),
                    zoom_factor,
                );
            }
            LayoutMode::Spatial => self.session.camera_3d.dolly(zoom_factor),
        }
    }

    /// Secondary or middle drag pans the plane; in space, any drag that did
    /// not grab a node orbits the camera.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let delta = to_glam(response.drag_delta().to_pos2());
        match self.session.mode() {
            LayoutMode::Planar => {
                if response.dragged_by(egui::PointerButton::Secondary)
                    || response.dragged_by(egui::PointerButton::Middle)
                {
                    self.session.camera_2d.pan_by(delta);
                }
            }
            LayoutMode::Spatial => {
                if response.dragged() && self.session.dragging().is_none() {
                    self.session.camera_3d.orbit(delta);
                }
            }
        }
    }

    pub(in crate::app) fn hovered_node(&self, rect: Rect, pointer: Option<Pos2>) -> Option<NodeId> {
        let pointer = pointer.filter(|pointer| rect.contains(*pointer))?;
        let nodes = &self.session.graph().nodes;
        let index = match self.session.mode() {
            LayoutMode::Planar => {
                self.session
                    .camera_2d
                    .hit_test(nodes, to_glam(rect.center()), to_glam(pointer))
            }
            LayoutMode::Spatial => self.session.camera_3d.hit_test(
                nodes,
                glam::Vec2::new(rect.width(), rect.height()),
                to_glam(pointer) - to_glam(rect.min),
            ),
        }?;
        nodes.get(index).map(|node| node.id)
    }

    /// Primary drag on a node pins it under the pointer until release.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<NodeId>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(id) = hovered
        {
            self.session.begin_drag(id);
        }

        if let Some(id) = self.session.dragging()
            && response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(world) = self.pointer_world(rect, pointer, id)
        {
            self.session.drag_to(world);
        }

        if response.drag_stopped() {
            self.session.end_drag();
        }
    }

    fn pointer_world(&self, rect: Rect, pointer: Pos2, id: NodeId) -> Option<glam::Vec2> {
        match self.session.mode() {
            LayoutMode::Planar => Some(
                self.session
                    .camera_2d
                    .screen_to_world(to_glam(rect.center()), to_glam(pointer)),
            ),
            LayoutMode::Spatial => {
                let node = self.session.graph().node(id)?;
                self.session
                    .camera_3d
                    .screen_to_plane(
                        glam::Vec2::new(rect.width(), rect.height()),
                        to_glam(pointer) - to_glam(rect.min),
                        glam::Vec3::new(node.x, node.y, node.z),
                    )
                    .map(|point| point.truncate())
            }
        }
    }

    pub(in crate::app) fn apply_graph_click(&mut self, response: &egui::Response, hovered: Option<NodeId>) {
        if response.clicked_by(egui::PointerButton::Primary) {
            self.session.click_node(hovered);
        }
    }
}
