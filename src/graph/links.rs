use super::model::{GraphData, Link, MAX_SIZE, MIN_SIZE, Node};

fn shares_tag(a: &[String], b: &[String]) -> bool {
    a.iter().any(|tag| b.contains(tag))
}

/// Two nodes connect when they share a family tag, or when either one binds
/// to an anchor the other exposes.
pub fn connected(a: &Node, b: &Node) -> bool {
    shares_tag(&a.family, &b.family)
        || shares_tag(&a.binding, &b.anchor)
        || shares_tag(&b.binding, &a.anchor)
}

/// Recomputes every link, each node's `join` and each node's `size`.
///
/// Links come out ordered by the first endpoint's position, then the second's.
pub fn derive_links(graph: &mut GraphData) -> &mut GraphData {
    for node in &mut graph.nodes {
        node.join.clear();
    }

    let mut links = Vec::new();
    let count = graph.nodes.len();
    for i in 0..count {
        for j in (i + 1)..count {
            if !connected(&graph.nodes[i], &graph.nodes[j]) {
                continue;
            }

            let source = graph.nodes[i].id;
            let target = graph.nodes[j].id;
            links.push(Link { source, target });
            graph.nodes[i].join.push(target);
            graph.nodes[j].join.push(source);
        }
    }
    graph.links = links;

    apply_sizes(&mut graph.nodes);
    graph
}

fn apply_sizes(nodes: &mut [Node]) {
    let max_join = nodes.iter().map(|node| node.join.len()).max().unwrap_or(0);
    for node in nodes {
        node.size = if max_join == 0 {
            MIN_SIZE
        } else {
            MIN_SIZE + (node.join.len() as f32 / max_join as f32) * (MAX_SIZE - MIN_SIZE)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::NodeId;

    fn node(id: u64, name: &str, family: &[&str]) -> Node {
        Node::new(NodeId(id), name).with_family(family.iter().copied())
    }

    #[test]
    fn shared_family_links_and_sizes() {
        let mut graph = GraphData {
            nodes: vec![node(1, "A", &["x"]), node(2, "B", &["x"]), node(3, "C", &["y"])],
            links: Vec::new(),
        };
        derive_links(&mut graph);

        assert_eq!(
            graph.links,
            vec![Link {
                source: NodeId(1),
                target: NodeId(2)
            }]
        );
        let joins = graph.nodes.iter().map(|n| n.join.len()).collect::<Vec<_>>();
        assert_eq!(joins, vec![1, 1, 0]);
        let sizes = graph.nodes.iter().map(|n| n.size).collect::<Vec<_>>();
        assert_eq!(sizes, vec![20.0, 20.0, 5.0]);
    }

    #[test]
    fn binding_matches_anchor_in_either_direction() {
        let gate = Node::new(NodeId(1), "gate").with_anchor(["gate"]);
        let keeper = Node::new(NodeId(2), "keeper").with_binding(["gate"]);
        let stranger = Node::new(NodeId(3), "stranger").with_binding(["nowhere"]);
        let mut graph = GraphData {
            nodes: vec![keeper, gate, stranger],
            links: Vec::new(),
        };
        derive_links(&mut graph);

        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].source, NodeId(2));
        assert_eq!(graph.links[0].target, NodeId(1));
        assert_eq!(graph.nodes[0].join, vec![NodeId(1)]);
        assert_eq!(graph.nodes[1].join, vec![NodeId(2)]);
        assert!(graph.nodes[2].join.is_empty());
    }

    #[test]
    fn anchors_alone_do_not_link() {
        let mut graph = GraphData {
            nodes: vec![
                Node::new(NodeId(1), "a").with_anchor(["same"]),
                Node::new(NodeId(2), "b").with_anchor(["same"]),
            ],
            links: Vec::new(),
        };
        derive_links(&mut graph);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn empty_graph_has_no_links() {
        let mut graph = GraphData::default();
        derive_links(&mut graph);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn isolated_nodes_get_minimum_size() {
        let mut graph = GraphData {
            nodes: vec![node(1, "a", &["x"]), node(2, "b", &["y"])],
            links: Vec::new(),
        };
        graph.nodes[0].size = 17.0;
        derive_links(&mut graph);
        assert!(graph.nodes.iter().all(|n| n.size == MIN_SIZE));
    }

    #[test]
    fn derivation_is_idempotent_and_stale_joins_are_cleared() {
        let mut graph = GraphData {
            nodes: vec![
                node(1, "a", &["x", "y"]),
                node(2, "b", &["y"]),
                node(3, "c", &["x"]),
                node(4, "d", &["z"]),
            ],
            links: Vec::new(),
        };
        graph.nodes[3].join = vec![NodeId(1)];
        derive_links(&mut graph);
        let first = graph.clone();
        derive_links(&mut graph);

        assert_eq!(graph, first);
        assert!(graph.nodes[3].join.is_empty());
        assert_eq!(graph.links.len(), 2);
        for node in &graph.nodes {
            assert!((MIN_SIZE..=MAX_SIZE).contains(&node.size));
        }
    }

    #[test]
    fn every_family_sharing_pair_is_linked() {
        let mut graph = GraphData {
            nodes: vec![
                node(1, "a", &["x"]),
                node(2, "b", &["x", "q"]),
                node(3, "c", &["q"]),
                node(4, "d", &["r"]),
            ],
            links: Vec::new(),
        };
        derive_links(&mut graph);

        for (i, a) in graph.nodes.iter().enumerate() {
            for b in graph.nodes.iter().skip(i + 1) {
                let linked = graph
                    .links
                    .iter()
                    .any(|link| link.source == a.id && link.target == b.id);
                assert_eq!(linked, connected(a, b), "{} - {}", a.name, b.name);
            }
        }
    }
}
