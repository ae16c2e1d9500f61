use std::collections::HashMap;

use super::model::{GraphData, NodeId};

pub fn next_id(graph: &GraphData) -> NodeId {
    graph
        .nodes
        .iter()
        .map(|node| node.id.0)
        .max()
        .map_or(NodeId(1), |max| NodeId(max.saturating_add(1)))
}

pub struct Reassigned {
    pub graph: GraphData,
    /// Old id to new id. A duplicated old id maps to its first occurrence.
    pub mapping: HashMap<NodeId, NodeId>,
}

/// Renumbers nodes densely from 1 in ascending order of their current id.
/// Node order follows the new numbering and links are re-derived, so they
/// come out in the same orientation a fresh load would produce.
pub fn reassign_ids(graph: &GraphData) -> Reassigned {
    let mut nodes = graph.nodes.clone();
    nodes.sort_by_key(|node| node.id);

    let mut mapping = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter_mut().enumerate() {
        let new_id = NodeId(index as u64 + 1);
        mapping.entry(node.id).or_insert(new_id);
        node.id = new_id;
    }

    tracing::info!(nodes = nodes.len(), "reassigned node ids");
    Reassigned {
        graph: GraphData::new(nodes),
        mapping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{Link, Node};

    fn sample() -> GraphData {
        GraphData::new(vec![
            Node::new(NodeId(40), "d").with_family(["x"]),
            Node::new(NodeId(3), "a").with_family(["x"]),
            Node::new(NodeId(17), "c").with_family(["y"]),
            Node::new(NodeId(9), "b").with_family(["y", "x"]),
        ])
    }

    #[test]
    fn next_id_is_max_plus_one() {
        assert_eq!(next_id(&GraphData::default()), NodeId(1));
        assert_eq!(next_id(&sample()), NodeId(41));
    }

    #[test]
    fn reassign_produces_dense_ids_in_previous_order() {
        let reassigned = reassign_ids(&sample()).graph;

        let ids = reassigned.nodes.iter().map(|n| n.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let names = reassigned
            .nodes
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn reassigned_links_point_at_existing_nodes() {
        let original = sample();
        let reassigned = reassign_ids(&original).graph;

        assert_eq!(reassigned.links.len(), original.links.len());
        for link in &reassigned.links {
            assert!(reassigned.node(link.source).is_some());
            assert!(reassigned.node(link.target).is_some());
        }

        let old_names = |graph: &GraphData, link: &Link| {
            let mut pair = [
                graph.node(link.source).map(|n| n.name.clone()),
                graph.node(link.target).map(|n| n.name.clone()),
            ];
            pair.sort();
            pair
        };
        let mut before = original
            .links
            .iter()
            .map(|link| old_names(&original, link))
            .collect::<Vec<_>>();
        let mut after = reassigned
            .links
            .iter()
            .map(|link| old_names(&reassigned, link))
            .collect::<Vec<_>>();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn next_id_saturates_at_the_top_of_the_range() {
        let graph = GraphData::new(vec![Node::new(NodeId(u64::MAX), "top")]);
        assert_eq!(next_id(&graph), NodeId(u64::MAX));
    }

    #[test]
    fn mapping_follows_each_node_and_links_are_canonical() {
        let original = GraphData::new(vec![
            Node::new(NodeId(30), "b").with_family(["x"]),
            Node::new(NodeId(10), "a").with_family(["x"]),
        ]);
        let reassigned = reassign_ids(&original);

        assert_eq!(reassigned.mapping[&NodeId(30)], NodeId(2));
        assert_eq!(reassigned.mapping[&NodeId(10)], NodeId(1));
        let renamed = reassigned.graph.node(NodeId(2)).map(|n| n.name.as_str());
        assert_eq!(renamed, Some("b"));
        let link = reassigned.graph.links[0];
        assert_eq!((link.source, link.target), (NodeId(1), NodeId(2)));
    }
}
