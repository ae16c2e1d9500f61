mod forces;
mod quadtree;

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::graph::{GraphData, LayoutMode, NodeId};
use crate::util::stable_pair;

use forces::{
    LinkParams, RepulsionParams, accumulate_link_forces, accumulate_repulsion_for_node,
    accumulate_spatial_repulsion,
};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.72;
pub(in crate::app) const ALPHA_MIN: f32 = 0.001;
const ALPHA_DECAY: f32 = 0.0228;
const DRAG_ALPHA_TARGET: f32 = 0.3;
const HUB_WEIGHT: f32 = 0.1;
const LINK_PER_JOIN: f32 = 5.0;
const REPULSION_SCALE: f32 = 400.0;
const SOFTENING: f32 = 100.0;
const MAX_SPEED: f32 = 60.0;
const INITIAL_SPEED: f32 = 6.0;
const SPATIAL_DEPTH: f32 = 500.0;
const SPATIAL_JITTER: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct PhysicsConfig {
    pub repulsion: f32,
    pub link_distance: f32,
    pub center_strength: f32,
    pub velocity_decay: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion: 120.0,
            link_distance: 100.0,
            center_strength: 0.05,
            velocity_decay: 0.4,
        }
    }
}

#[derive(Default)]
struct PhysicsScratch {
    forces: Vec<Vec3>,
    positions: Vec<Vec3>,
    planar_positions: Vec<Vec2>,
}

/// Energy-decaying force layout over a borrowed [`GraphData`].
///
/// The simulation keeps only per-body velocities and the link topology; node
/// coordinates live on the graph and are written in place each step.
pub(in crate::app) struct Simulation {
    mode: LayoutMode,
    config: PhysicsConfig,
    alpha: f32,
    alpha_target: f32,
    ids: Vec<NodeId>,
    velocities: Vec<Vec3>,
    strengths: Vec<f32>,
    edges: Vec<(usize, usize)>,
    rest_lengths: Vec<f32>,
    link_strengths: Vec<f32>,
    biases: Vec<f32>,
    scratch: PhysicsScratch,
}

impl Simulation {
    pub(in crate::app) fn new(mode: LayoutMode, config: PhysicsConfig) -> Self {
        Self {
            mode,
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            ids: Vec::new(),
            velocities: Vec::new(),
            strengths: Vec::new(),
            edges: Vec::new(),
            rest_lengths: Vec::new(),
            link_strengths: Vec::new(),
            biases: Vec::new(),
            scratch: PhysicsScratch::default(),
        }
    }

    pub(in crate::app) fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub(in crate::app) fn config(&self) -> PhysicsConfig {
        self.config
    }

    #[cfg(test)]
    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        self.alpha >= ALPHA_MIN
    }

    pub(in crate::app) fn reheat(&mut self) {
        self.alpha = 1.0;
    }

    pub(in crate::app) fn set_config(&mut self, graph: &GraphData, config: PhysicsConfig) {
        if self.config == config {
            return;
        }
        self.config = config;
        self.rebuild_strengths(graph);
        self.rebuild_links(graph);
        self.reheat();
    }

    /// Switches between planar and spatial layout. Planar flattens `z`;
    /// spatial gives flat nodes a starting depth.
    pub(in crate::app) fn set_mode(&mut self, graph: &mut GraphData, mode: LayoutMode) {
        self.mode = mode;
        match mode {
            LayoutMode::Planar => {
                for node in &mut graph.nodes {
                    node.z = 0.0;
                }
                for velocity in &mut self.velocities {
                    velocity.z = 0.0;
                }
            }
            LayoutMode::Spatial => seed_depth(graph),
        }
        self.reheat();
    }

    /// Takes the current node and link arrays after a topology change.
    /// Velocities of surviving nodes are kept; new nodes get an outward kick.
    pub(in crate::app) fn reseed(&mut self, graph: &mut GraphData) {
        let prior = self
            .ids
            .iter()
            .copied()
            .zip(self.velocities.iter().copied())
            .collect::<HashMap<_, _>>();

        self.ids = graph.nodes.iter().map(|node| node.id).collect();
        self.velocities = graph
            .nodes
            .iter()
            .map(|node| {
                prior
                    .get(&node.id)
                    .copied()
                    .unwrap_or_else(|| initial_velocity(node.id))
            })
            .collect();

        if self.mode == LayoutMode::Spatial {
            seed_depth(graph);
        } else {
            for velocity in &mut self.velocities {
                velocity.z = 0.0;
            }
        }

        self.rebuild_strengths(graph);
        self.rebuild_links(graph);
        self.reheat();
        tracing::debug!(
            nodes = self.ids.len(),
            links = self.edges.len(),
            "reseeded layout simulation"
        );
    }

    fn rebuild_strengths(&mut self, graph: &GraphData) {
        self.strengths = graph
            .nodes
            .iter()
            .map(|node| self.config.repulsion * (1.0 + HUB_WEIGHT * node.join.len() as f32))
            .collect();
    }

    fn rebuild_links(&mut self, graph: &GraphData) {
        let index_by_id = graph.index_by_id();
        self.edges = graph
            .links
            .iter()
            .filter_map(|link| {
                let source = *index_by_id.get(&link.source)?;
                let target = *index_by_id.get(&link.target)?;
                (source != target).then_some((source, target))
            })
            .collect();

        let mut degree = vec![0usize; graph.nodes.len()];
        for &(source, target) in &self.edges {
            degree[source] += 1;
            degree[target] += 1;
        }

        self.rest_lengths = self
            .edges
            .iter()
            .map(|&(source, _)| {
                self.config.link_distance + LINK_PER_JOIN * graph.nodes[source].join.len() as f32
            })
            .collect();
        self.link_strengths = self
            .edges
            .iter()
            .map(|&(source, target)| 1.0 / degree[source].min(degree[target]).max(1) as f32)
            .collect();
        self.biases = self
            .edges
            .iter()
            .map(|&(source, target)| {
                degree[source] as f32 / (degree[source] + degree[target]).max(1) as f32
            })
            .collect();
    }

    pub(in crate::app) fn begin_drag(&mut self, graph: &mut GraphData, index: usize) {
        let Some(node) = graph.nodes.get_mut(index) else {
            return;
        };
        node.fx = Some(node.x);
        node.fy = Some(node.y);
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.alpha = self.alpha.max(ALPHA_MIN);
    }

    pub(in crate::app) fn drag_to(&mut self, graph: &mut GraphData, index: usize, world: Vec2) {
        if !world.is_finite() {
            return;
        }
        if let Some(node) = graph.nodes.get_mut(index) {
            node.fx = Some(world.x);
            node.fy = Some(world.y);
        }
    }

    pub(in crate::app) fn end_drag(&mut self, graph: &mut GraphData, index: usize) {
        if let Some(node) = graph.nodes.get_mut(index) {
            if let Some(fx) = node.fx.take() {
                node.x = fx;
            }
            if let Some(fy) = node.fy.take() {
                node.y = fy;
            }
        }
        self.alpha_target = 0.0;
    }

    /// Advances one tick. Returns whether the layout still has energy.
    pub(in crate::app) fn step(&mut self, graph: &mut GraphData) -> bool {
        let node_count = graph.nodes.len();
        if node_count == 0 || !self.is_active() {
            return false;
        }
        if self.ids.len() != node_count {
            self.reseed(graph);
        }

        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
        let alpha = self.alpha;
        let planar = self.mode == LayoutMode::Planar;

        let scratch = &mut self.scratch;
        scratch.forces.clear();
        scratch.forces.resize(node_count, Vec3::ZERO);
        scratch.positions.clear();
        scratch.planar_positions.clear();
        for node in &mut graph.nodes {
            node.sanitize_position();
            let z = if planar { 0.0 } else { node.z };
            scratch.positions.push(Vec3::new(node.x, node.y, z));
            scratch.planar_positions.push(Vec2::new(node.x, node.y));
        }

        let repulsion = RepulsionParams {
            scale: REPULSION_SCALE * alpha,
            softening: SOFTENING,
            theta: BARNES_HUT_THETA,
        };
        if planar {
            if let Some(quadtree) = QuadNode::build(&scratch.planar_positions, &self.strengths) {
                for (index, force) in scratch.forces.iter_mut().enumerate() {
                    let mut planar_force = Vec2::ZERO;
                    accumulate_repulsion_for_node(
                        &quadtree,
                        index,
                        &scratch.planar_positions,
                        &self.strengths,
                        repulsion,
                        &mut planar_force,
                    );
                    *force += planar_force.extend(0.0);
                }
            }
        } else {
            accumulate_spatial_repulsion(
                &scratch.positions,
                &self.strengths,
                repulsion,
                &mut scratch.forces,
            );
        }

        accumulate_link_forces(
            &self.edges,
            &scratch.positions,
            &self.velocities,
            LinkParams {
                rest_lengths: &self.rest_lengths,
                strengths: &self.link_strengths,
                biases: &self.biases,
                alpha,
            },
            &mut scratch.forces,
        );

        let keep = 1.0 - self.config.velocity_decay.clamp(0.0, 1.0);
        for (index, node) in graph.nodes.iter_mut().enumerate() {
            let mut velocity = (self.velocities[index] + scratch.forces[index]) * keep;
            if planar {
                velocity.z = 0.0;
            }
            if !velocity.is_finite() {
                velocity = Vec3::ZERO;
            }
            velocity = velocity.clamp_length_max(MAX_SPEED);

            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    velocity.x = 0.0;
                }
                None => node.x += velocity.x,
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    velocity.y = 0.0;
                }
                None => node.y += velocity.y,
            }
            node.z = if planar { 0.0 } else { node.z + velocity.z };

            if node.sanitize_position() {
                velocity = Vec3::ZERO;
            }
            self.velocities[index] = velocity;
        }

        let centroid = graph
            .nodes
            .iter()
            .map(|node| Vec3::new(node.x, node.y, node.z))
            .sum::<Vec3>()
            / node_count as f32;
        let shift = centroid * self.config.center_strength;
        if shift.length_squared() > 1e-12 {
            for node in &mut graph.nodes {
                if node.fx.is_none() {
                    node.x -= shift.x;
                }
                if node.fy.is_none() {
                    node.y -= shift.y;
                }
                if !planar {
                    node.z -= shift.z;
                }
            }
        }

        self.is_active()
    }
}

fn initial_velocity(id: NodeId) -> Vec3 {
    let (jx, jy) = stable_pair(&id.to_string());
    let mut direction = Vec2::new(jx, jy);
    if direction.length_squared() <= 0.0001 {
        let angle = ((id.0 as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
        direction = Vec2::new(angle.cos(), angle.sin());
    } else {
        direction = direction.normalize();
    }
    (direction * INITIAL_SPEED).extend(0.0)
}

/// Gives nodes still at `z == 0` a depth proportional to their adjacency,
/// plus a per-id jitter so equal-degree nodes do not share a plane.
fn seed_depth(graph: &mut GraphData) {
    let max_join = graph
        .nodes
        .iter()
        .map(|node| node.join.len())
        .max()
        .unwrap_or(0)
        .max(1);
    for node in &mut graph.nodes {
        if node.z != 0.0 {
            continue;
        }
        let (jitter, _) = stable_pair(&node.id.to_string());
        node.z = (node.join.len() as f32 / max_join as f32) * SPATIAL_DEPTH - SPATIAL_DEPTH / 2.0
            + jitter * SPATIAL_JITTER;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn settle(simulation: &mut Simulation, graph: &mut GraphData) -> usize {
        let mut steps = 0;
        while simulation.step(graph) {
            steps += 1;
            assert!(steps < 2_000, "simulation never settled");
        }
        steps
    }

    fn triangle() -> GraphData {
        let mut graph = GraphData::new(vec![
            Node::new(NodeId(1), "A").with_family(["x"]),
            Node::new(NodeId(2), "B").with_family(["x"]),
            Node::new(NodeId(3), "C").with_family(["y"]),
        ]);
        graph.nodes[0].x = -50.0;
        graph.nodes[1].x = 50.0;
        graph.nodes[2].y = 80.0;
        graph
    }

    fn distance(graph: &GraphData, a: usize, b: usize) -> f32 {
        let a = &graph.nodes[a];
        let b = &graph.nodes[b];
        Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z).length()
    }

    #[test]
    fn settles_and_stays_idle_until_reheated() {
        let mut graph = triangle();
        let mut simulation = Simulation::new(LayoutMode::Planar, PhysicsConfig::default());
        simulation.reseed(&mut graph);

        let steps = settle(&mut simulation, &mut graph);
        assert!(steps > 100);
        assert!(!simulation.is_active());

        let frozen = graph.clone();
        assert!(!simulation.step(&mut graph));
        assert_eq!(graph, frozen);

        simulation.reseed(&mut graph);
        assert!(simulation.is_active());
        assert_eq!(simulation.alpha(), 1.0);
    }

    #[test]
    fn linked_nodes_end_closer_than_unlinked_ones() {
        let mut graph = triangle();
        let mut simulation = Simulation::new(LayoutMode::Planar, PhysicsConfig::default());
        simulation.reseed(&mut graph);
        settle(&mut simulation, &mut graph);

        assert!(distance(&graph, 0, 1) < distance(&graph, 0, 2));
        assert!(distance(&graph, 0, 1) < distance(&graph, 1, 2));
        assert!(graph.nodes.iter().all(|node| node.z == 0.0));
    }

    #[test]
    fn pinned_node_holds_its_position() {
        let mut graph = triangle();
        let mut simulation = Simulation::new(LayoutMode::Planar, PhysicsConfig::default());
        simulation.reseed(&mut graph);

        simulation.begin_drag(&mut graph, 0);
        simulation.drag_to(&mut graph, 0, Vec2::new(300.0, -120.0));
        for _ in 0..50 {
            simulation.step(&mut graph);
        }
        assert_eq!((graph.nodes[0].x, graph.nodes[0].y), (300.0, -120.0));
        assert!(simulation.is_active());

        simulation.end_drag(&mut graph, 0);
        assert!(!graph.nodes[0].is_pinned());
        assert_eq!((graph.nodes[0].x, graph.nodes[0].y), (300.0, -120.0));
    }

    #[test]
    fn non_finite_coordinates_do_not_spread() {
        let mut graph = triangle();
        graph.nodes[1].x = f32::NAN;
        graph.nodes[2].y = f32::INFINITY;
        let mut simulation = Simulation::new(LayoutMode::Planar, PhysicsConfig::default());
        simulation.reseed(&mut graph);

        for _ in 0..20 {
            simulation.step(&mut graph);
        }
        for node in &graph.nodes {
            assert!(node.x.is_finite() && node.y.is_finite() && node.z.is_finite());
        }
    }

    #[test]
    fn coincident_nodes_spread_apart() {
        let mut graph = GraphData::new(
            (1..=20)
                .map(|id| Node::new(NodeId(id), format!("n{id}")).with_family(["all"]))
                .collect(),
        );
        let mut simulation = Simulation::new(LayoutMode::Planar, PhysicsConfig::default());
        simulation.reseed(&mut graph);
        for _ in 0..100 {
            simulation.step(&mut graph);
        }

        for i in 0..graph.nodes.len() {
            for j in (i + 1)..graph.nodes.len() {
                assert!(distance(&graph, i, j) > 1.0, "{i} and {j} overlap");
            }
        }
    }

    #[test]
    fn spatial_mode_uses_depth_and_planar_flattens_it() {
        let mut graph = triangle();
        let mut simulation = Simulation::new(LayoutMode::Spatial, PhysicsConfig::default());
        simulation.reseed(&mut graph);
        assert!(graph.nodes.iter().any(|node| node.z != 0.0));
        settle(&mut simulation, &mut graph);
        assert!(graph.nodes.iter().all(|node| node.z.is_finite()));

        simulation.set_mode(&mut graph, LayoutMode::Planar);
        assert!(graph.nodes.iter().all(|node| node.z == 0.0));
        assert!(simulation.is_active());
    }

    #[test]
    fn parameter_change_reheats() {
        let mut graph = triangle();
        let mut simulation = Simulation::new(LayoutMode::Planar, PhysicsConfig::default());
        simulation.reseed(&mut graph);
        settle(&mut simulation, &mut graph);

        let config = PhysicsConfig {
            repulsion: 300.0,
            ..simulation.config()
        };
        simulation.set_config(&graph, config);
        assert!(simulation.is_active());
        assert_eq!(simulation.config().repulsion, 300.0);
    }
}
