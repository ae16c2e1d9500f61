use glam::{Vec2, Vec3, vec2};

use super::quadtree::QuadNode;

/// Deterministic escape direction for bodies sitting on top of each other.
pub(super) fn separation_direction(a: usize, b: usize) -> Vec3 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    Vec3::new(angle.cos(), angle.sin(), 0.0)
}

fn repulsion_between(point_a: Vec2, point_b: Vec2, strength: f32, softening: f32) -> Vec2 {
    let delta = point_a - point_b;
    let distance_sq = delta.length_squared();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (strength / (distance_sq + softening))
}

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) scale: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

/// Barnes–Hut walk for one body in the plane.
pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strengths: &[f32],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if node.charge <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            let delta = point - positions[other_index];
            if delta.length_squared() <= 0.0001 * 0.0001 {
                let escape = separation_direction(index, other_index).truncate();
                *force += escape * (strengths[other_index] * params.scale / params.softening);
                continue;
            }
            *force += repulsion_between(
                point,
                positions[other_index],
                strengths[other_index] * params.scale,
                params.softening,
            );
        }
        return;
    }

    let delta = point - node.center_of_charge;
    let distance_sq = delta.length_squared().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < params.theta)
        && node.body_count > 1;

    if can_approximate {
        let direction = delta / distance;
        let scaled = (params.scale * node.charge) / (distance_sq + params.softening);
        *force += direction * scaled;
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, strengths, params, force);
    }
}

/// Exact pairwise repulsion in space.
pub(super) fn accumulate_spatial_repulsion(
    positions: &[Vec3],
    strengths: &[f32],
    params: RepulsionParams,
    forces: &mut [Vec3],
) {
    let count = positions.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let delta = positions[i] - positions[j];
            let distance_sq = delta.length_squared();
            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                separation_direction(i, j)
            };

            let falloff = params.scale / (distance_sq + params.softening);
            forces[i] += direction * (strengths[j] * falloff);
            forces[j] -= direction * (strengths[i] * falloff);
        }
    }
}

pub(super) struct LinkParams<'a> {
    pub(super) rest_lengths: &'a [f32],
    pub(super) strengths: &'a [f32],
    pub(super) biases: &'a [f32],
    pub(super) alpha: f32,
}

/// Spring pass over links, pulling each pair toward its rest length. Uses
/// velocity-predicted positions and splits the correction by degree bias.
pub(super) fn accumulate_link_forces(
    edges: &[(usize, usize)],
    positions: &[Vec3],
    velocities: &[Vec3],
    params: LinkParams<'_>,
    forces: &mut [Vec3],
) {
    for (edge_index, &(source, target)) in edges.iter().enumerate() {
        if source >= positions.len() || target >= positions.len() || source == target {
            continue;
        }

        let mut delta = (positions[target] + velocities[target] + forces[target])
            - (positions[source] + velocities[source] + forces[source]);
        let mut distance = delta.length();
        if distance <= 0.0001 {
            delta = separation_direction(source, target) * 0.0001;
            distance = 0.0001;
        }

        let stretch = (distance - params.rest_lengths[edge_index]) / distance
            * params.alpha
            * params.strengths[edge_index];
        let correction = delta * stretch;
        let bias = params.biases[edge_index];

        forces[target] -= correction * bias;
        forces[source] += correction * (1.0 - bias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spatial_repulsion_is_symmetric_for_equal_strengths() {
        let positions = [Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 5.0)];
        let mut forces = [Vec3::ZERO; 2];
        accumulate_spatial_repulsion(
            &positions,
            &[1.0, 1.0],
            RepulsionParams {
                scale: 100.0,
                softening: 1.0,
                theta: 0.72,
            },
            &mut forces,
        );

        assert!((forces[0] + forces[1]).length() < 1e-5);
        assert!(forces[0].x < 0.0 && forces[1].x > 0.0);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = [Vec3::ZERO, Vec3::new(200.0, 0.0, 0.0)];
        let velocities = [Vec3::ZERO; 2];
        let mut forces = [Vec3::ZERO; 2];
        accumulate_link_forces(
            &[(0, 1)],
            &positions,
            &velocities,
            LinkParams {
                rest_lengths: &[100.0],
                strengths: &[1.0],
                biases: &[0.5],
                alpha: 1.0,
            },
            &mut forces,
        );

        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
    }
}
