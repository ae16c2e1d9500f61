use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::graph::Node;
use crate::util::stable_pair;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);

const FAMILY_PALETTE: [Color32; 8] = [
    Color32::from_rgb(103, 196, 255),
    Color32::from_rgb(241, 146, 94),
    Color32::from_rgb(142, 214, 120),
    Color32::from_rgb(214, 132, 220),
    Color32::from_rgb(246, 206, 104),
    Color32::from_rgb(98, 212, 196),
    Color32::from_rgb(236, 112, 128),
    Color32::from_rgb(170, 170, 250),
];

pub(super) fn to_pos2(point: glam::Vec2) -> Pos2 {
    Pos2::new(point.x, point.y)
}

pub(super) fn to_glam(point: Pos2) -> glam::Vec2 {
    glam::Vec2::new(point.x, point.y)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// The node's own `#rrggbb` colour, else a palette entry picked by its first family.
pub(super) fn node_color(node: &Node) -> Color32 {
    if let Ok(color) = Color32::from_hex(node.color.trim()) {
        return color;
    }
    let key = node.family.first().map(String::as_str).unwrap_or("");
    let (hash, _) = stable_pair(key);
    let slot = (((hash + 1.0) * 0.5) * FAMILY_PALETTE.len() as f32) as usize;
    FAMILY_PALETTE[slot.min(FAMILY_PALETTE.len() - 1)]
}

/// Grid backdrop that follows the planar camera.
pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn fill_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, BACKGROUND);
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    #[test]
    fn explicit_colour_wins_over_family_palette() {
        let mut node = Node::new(NodeId(1), "a").with_family(["x"]);
        let family_colour = node_color(&node);
        assert!(FAMILY_PALETTE.contains(&family_colour));

        node.color = "#ff8800".to_owned();
        assert_eq!(node_color(&node), Color32::from_rgb(255, 136, 0));

        node.color = "orange".to_owned();
        assert_eq!(node_color(&node), family_colour);
    }

    #[test]
    fn diagonal_edge_through_viewport_is_visible() {
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(100.0, 100.0));
        assert!(edge_visible(rect, Pos2::new(-50.0, 50.0), Pos2::new(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, Pos2::new(-50.0, -50.0), Pos2::new(-10.0, 150.0), 0.0));
    }
}
