use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::graph::Node;

pub(in crate::app) const MIN_ZOOM: f32 = 0.5;
pub(in crate::app) const MAX_ZOOM: f32 = 4.0;

const ORBIT_DISTANCE: f32 = 600.0;
const ORBIT_MIN_DISTANCE: f32 = 120.0;
const ORBIT_MAX_DISTANCE: f32 = 4_000.0;
const ORBIT_PITCH_LIMIT: f32 = 1.45;
const ORBIT_SENSITIVITY: f32 = 0.008;
const FIELD_OF_VIEW: f32 = std::f32::consts::FRAC_PI_4;
const NEAR_PLANE: f32 = 1.0;
const FAR_PLANE: f32 = 20_000.0;

/// Planar viewport: `screen = centre + pan + world * zoom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Camera2D {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera2D {
    pub(in crate::app) fn world_to_screen(&self, center: Vec2, world: Vec2) -> Vec2 {
        center + self.pan + world * self.zoom
    }

    pub(in crate::app) fn screen_to_world(&self, center: Vec2, screen: Vec2) -> Vec2 {
        (screen - center - self.pan) / self.zoom
    }

    /// Scales by `factor` while keeping the world point under `pointer` fixed.
    pub(in crate::app) fn zoom_at(&mut self, center: Vec2, pointer: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world_before = self.screen_to_world(center, pointer);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - center - world_before * self.zoom;
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pan += delta;
        }
    }

    /// Brings `world` to the viewport centre at the current zoom.
    pub(in crate::app) fn center_on(&mut self, world: Vec2) {
        self.pan = -world * self.zoom;
    }

    pub(in crate::app) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(in crate::app) fn screen_radius(&self, size: f32) -> f32 {
        size * self.zoom
    }

    /// Node whose circle contains `pointer`; the nearest centre wins on overlap.
    pub(in crate::app) fn hit_test(&self, nodes: &[Node], center: Vec2, pointer: Vec2) -> Option<usize> {
        let world = self.screen_to_world(center, pointer);
        nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let distance = Vec2::new(node.x, node.y).distance(world);
                (distance <= node.size).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

/// Orbit camera looking at `target` from `distance` away.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Camera3D {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: ORBIT_DISTANCE,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Projected {
    /// Offset from the viewport's top-left corner.
    pub screen: Vec2,
    pub depth: f32,
}

impl Camera3D {
    pub(in crate::app) fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub(in crate::app) fn view_proj(&self, viewport: Vec2) -> Mat4 {
        let aspect = (viewport.x / viewport.y.max(1.0)).max(0.01);
        let projection = Mat4::perspective_rh(FIELD_OF_VIEW, aspect, NEAR_PLANE, FAR_PLANE);
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        projection * view
    }

    /// Screen position of `world`, or `None` when it is behind the camera.
    pub(in crate::app) fn project(&self, viewport: Vec2, world: Vec3) -> Option<Projected> {
        let clip = self.view_proj(viewport) * world.extend(1.0);
        if clip.w <= NEAR_PLANE * 0.5 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !ndc.is_finite() {
            return None;
        }
        Some(Projected {
            screen: Vec2::new((ndc.x + 1.0) * 0.5 * viewport.x, (1.0 - ndc.y) * 0.5 * viewport.y),
            depth: clip.w,
        })
    }

    /// Pixel radius of a sphere of `size` seen at `depth`.
    pub(in crate::app) fn screen_radius(&self, viewport: Vec2, size: f32, depth: f32) -> f32 {
        let focal = viewport.y * 0.5 / (FIELD_OF_VIEW * 0.5).tan();
        size * focal / depth.max(NEAR_PLANE)
    }

    pub(in crate::app) fn ray_from_screen(&self, viewport: Vec2, screen: Vec2) -> (Vec3, Vec3) {
        let ndc = Vec2::new(
            screen.x / viewport.x.max(1.0) * 2.0 - 1.0,
            1.0 - screen.y / viewport.y.max(1.0) * 2.0,
        );
        let origin = self.eye();
        let forward = (self.target - origin).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        let half_height = (FIELD_OF_VIEW * 0.5).tan();
        let aspect = (viewport.x / viewport.y.max(1.0)).max(0.01);
        let direction =
            forward + right * (ndc.x * half_height * aspect) + up * (ndc.y * half_height);
        (origin, direction.normalize_or_zero())
    }

    /// Where the pointer ray meets the plane through `anchor` facing the camera.
    pub(in crate::app) fn screen_to_plane(&self, viewport: Vec2, screen: Vec2, anchor: Vec3) -> Option<Vec3> {
        let (origin, direction) = self.ray_from_screen(viewport, screen);
        let normal = (self.eye() - self.target).normalize_or_zero();
        let facing = direction.dot(normal);
        if facing.abs() <= 1e-6 {
            return None;
        }
        let distance = (anchor - origin).dot(normal) / facing;
        (distance > 0.0).then(|| origin + direction * distance)
    }

    /// Nearest node whose bounding sphere the pointer ray passes through.
    pub(in crate::app) fn hit_test(&self, nodes: &[Node], viewport: Vec2, screen: Vec2) -> Option<usize> {
        let (origin, direction) = self.ray_from_screen(viewport, screen);
        if direction == Vec3::ZERO {
            return None;
        }
        nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                ray_sphere(origin, direction, Vec3::new(node.x, node.y, node.z), node.size)
                    .map(|distance| (index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn orbit(&mut self, drag: Vec2) {
        if !drag.is_finite() {
            return;
        }
        self.yaw -= drag.x * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + drag.y * ORBIT_SENSITIVITY)
            .clamp(-ORBIT_PITCH_LIMIT, ORBIT_PITCH_LIMIT);
    }

    pub(in crate::app) fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance / factor).clamp(ORBIT_MIN_DISTANCE, ORBIT_MAX_DISTANCE);
        }
    }

    pub(in crate::app) fn center_on(&mut self, world: Vec3) {
        self.target = world;
    }

    pub(in crate::app) fn reset(&mut self) {
        *self = Self::default();
    }
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}
