use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const MIN_SIZE: f32 = 5.0;
pub const MAX_SIZE: f32 = 20.0;
/// Largest id accepted from input; leaves headroom for allocating fresh ids.
pub const MAX_NODE_ID: u64 = u32::MAX as u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which layout the graph is adapted for. Planar layouts carry no `z`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LayoutMode {
    #[default]
    Planar,
    Spatial,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Planar => "2D",
            Self::Spatial => "3D",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Planar => Self::Spatial,
            Self::Spatial => Self::Planar,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub family: Vec<String>,
    pub anchor: Vec<String>,
    pub binding: Vec<String>,
    pub quality: String,
    pub color: String,
    pub notes: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fy: Option<f32>,
    pub size: f32,
    pub is_central: bool,
    /// Derived adjacency, rebuilt by [`super::derive_links`].
    #[serde(skip)]
    pub join: Vec<NodeId>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            family: Vec::new(),
            anchor: Vec::new(),
            binding: Vec::new(),
            quality: String::new(),
            color: String::new(),
            notes: Vec::new(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            fx: None,
            fy: None,
            size: MIN_SIZE,
            is_central: false,
            join: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_family<I, S>(mut self, family: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.family = family.into_iter().map(Into::into).collect();
        self
    }

    #[cfg(test)]
    pub fn with_anchor<I, S>(mut self, anchor: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anchor = anchor.into_iter().map(Into::into).collect();
        self
    }

    #[cfg(test)]
    pub fn with_binding<I, S>(mut self, binding: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.binding = binding.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }

    /// Replaces non-finite coordinates with zero. Returns whether anything changed.
    pub fn sanitize_position(&mut self) -> bool {
        let mut repaired = false;
        for value in [&mut self.x, &mut self.y, &mut self.z] {
            if !value.is_finite() {
                *value = 0.0;
                repaired = true;
            }
        }
        for pin in [&mut self.fx, &mut self.fy] {
            if pin.is_some_and(|value| !value.is_finite()) {
                *pin = None;
                repaired = true;
            }
        }
        repaired
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
}

impl Link {
    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }

    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        if self.source == id {
            Some(self.target)
        } else if self.target == id {
            Some(self.source)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl GraphData {
    pub fn new(nodes: Vec<Node>) -> Self {
        let mut graph = Self {
            nodes,
            links: Vec::new(),
        };
        graph.refresh();
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    pub fn index_by_id(&self) -> HashMap<NodeId, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect()
    }

    /// Sorted, deduplicated family tags across all nodes.
    pub fn family_list(&self) -> Vec<String> {
        let mut families = self
            .nodes
            .iter()
            .flat_map(|node| node.family.iter().cloned())
            .collect::<Vec<_>>();
        families.sort();
        families.dedup();
        families
    }

    /// Coerces non-finite coordinates to zero, then re-derives links, adjacency and sizes.
    pub fn refresh(&mut self) -> &mut Self {
        let mut repaired = 0usize;
        for node in &mut self.nodes {
            if node.sanitize_position() {
                repaired += 1;
            }
        }
        if repaired > 0 {
            tracing::debug!(repaired, "coerced non-finite node coordinates to zero");
        }
        super::derive_links(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_position_zeroes_non_finite_values() {
        let mut node = Node::new(NodeId(1), "a");
        node.x = f32::NAN;
        node.z = f32::INFINITY;
        node.fx = Some(f32::NEG_INFINITY);
        node.fy = Some(3.0);

        assert!(node.sanitize_position());
        assert_eq!((node.x, node.y, node.z), (0.0, 0.0, 0.0));
        assert_eq!(node.fx, None);
        assert_eq!(node.fy, Some(3.0));
        assert!(!node.sanitize_position());
    }

    #[test]
    fn serialized_node_omits_adjacency_and_empty_pins() {
        let mut node = Node::new(NodeId(7), "Gate").with_family(["x"]);
        node.join = vec![NodeId(1), NodeId(2)];
        let value = serde_json::to_value(&node).expect("node serializes");

        assert!(value.get("join").is_none());
        assert!(value.get("fx").is_none());
        assert_eq!(value["isCentral"], serde_json::json!(false));
        assert_eq!(value["id"], serde_json::json!(7));
    }

    #[test]
    fn link_other_endpoint() {
        let link = Link {
            source: NodeId(1),
            target: NodeId(2),
        };
        assert_eq!(link.other(NodeId(1)), Some(NodeId(2)));
        assert_eq!(link.other(NodeId(2)), Some(NodeId(1)));
        assert_eq!(link.other(NodeId(3)), None);
        assert!(link.touches(NodeId(2)));
    }
}
