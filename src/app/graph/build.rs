use eframe::egui::{Pos2, Rect};

use crate::graph::LayoutMode;

use super::super::ViewModel;
use super::super::render_utils::{circle_visible, to_glam, to_pos2};

const MIN_SCREEN_RADIUS: f32 = 2.5;
const MAX_SCREEN_RADIUS: f32 = 60.0;

impl ViewModel {
    /// Projects every node into `rect` for this frame and orders them for
    /// painting: by size in the plane, far-to-near in space.
    pub(in crate::app) fn project_frame(&mut self, rect: Rect) {
        let session = &self.session;
        let nodes = &session.graph().nodes;
        let scratch = &mut self.view_scratch;

        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        scratch.depths.clear();
        scratch.visible.clear();

        match session.mode() {
            LayoutMode::Planar => {
                let camera = session.camera_2d;
                let center = to_glam(rect.center());
                for node in nodes {
                    let screen = camera.world_to_screen(center, glam::Vec2::new(node.x, node.y));
                    let radius = camera
                        .screen_radius(node.size)
                        .clamp(MIN_SCREEN_RADIUS, MAX_SCREEN_RADIUS);
                    let position = to_pos2(screen);
                    scratch.screen_positions.push(position);
                    scratch.screen_radii.push(radius);
                    scratch.depths.push(0.0);
                    scratch.visible.push(circle_visible(rect, position, radius));
                }
            }
            LayoutMode::Spatial => {
                let camera = session.camera_3d;
                let viewport = glam::Vec2::new(rect.width(), rect.height());
                for node in nodes {
                    let world = glam::Vec3::new(node.x, node.y, node.z);
                    match camera.project(viewport, world) {
                        Some(projected) => {
                            let position = rect.min + to_pos2(projected.screen).to_vec2();
                            let radius = camera
                                .screen_radius(viewport, node.size, projected.depth)
                                .clamp(MIN_SCREEN_RADIUS, MAX_SCREEN_RADIUS);
                            scratch.screen_positions.push(position);
                            scratch.screen_radii.push(radius);
                            scratch.depths.push(projected.depth);
                            scratch.visible.push(circle_visible(rect, position, radius));
                        }
                        None => {
                            scratch.screen_positions.push(Pos2::new(f32::NAN, f32::NAN));
                            scratch.screen_radii.push(0.0);
                            scratch.depths.push(f32::INFINITY);
                            scratch.visible.push(false);
                        }
                    }
                }
            }
        }

        let depths = &scratch.depths;
        let draw_order = &mut scratch.draw_order;
        draw_order.clear();
        draw_order.extend(0..nodes.len());
        match session.mode() {
            LayoutMode::Planar => draw_order.sort_by(|a, b| nodes[*a].size.total_cmp(&nodes[*b].size)),
            LayoutMode::Spatial => draw_order.sort_by(|a, b| depths[*b].total_cmp(&depths[*a])),
        }
    }

    pub(in crate::app) fn is_projected_visible(&self, index: usize) -> bool {
        self.view_scratch.visible.get(index).copied().unwrap_or(false)
    }
}
