use std::collections::HashMap;

use super::model::{GraphData, NodeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalGroup {
    /// Trimmed, lower-cased name shared by every member.
    pub name: String,
    pub members: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalConnection {
    pub node: NodeId,
    pub name: String,
    pub family: Vec<String>,
    pub neighbor_names: Vec<String>,
}

pub fn portal_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Same-named nodes, grouped once per topology change.
#[derive(Clone, Debug, Default)]
pub struct PortalIndex {
    groups: Vec<PortalGroup>,
    group_by_node: HashMap<NodeId, usize>,
}

impl PortalIndex {
    pub fn build(graph: &GraphData) -> Self {
        let mut order = Vec::new();
        let mut members_by_name: HashMap<String, Vec<NodeId>> = HashMap::new();
        for node in &graph.nodes {
            let key = portal_key(&node.name);
            let members = members_by_name.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            members.push(node.id);
        }

        let mut index = Self::default();
        for name in order {
            let Some(members) = members_by_name.remove(&name) else {
                continue;
            };
            if members.len() < 2 {
                continue;
            }

            let group_index = index.groups.len();
            for &member in &members {
                index.group_by_node.insert(member, group_index);
            }
            index.groups.push(PortalGroup { name, members });
        }
        index
    }

    pub fn groups(&self) -> &[PortalGroup] {
        &self.groups
    }

    pub fn is_portal(&self, id: NodeId) -> bool {
        self.group_by_node.contains_key(&id)
    }

    pub fn group_of(&self, id: NodeId) -> Option<&PortalGroup> {
        self.group_by_node
            .get(&id)
            .and_then(|&index| self.groups.get(index))
    }

    /// The other members of `id`'s portal group, each with the names of its
    /// direct neighbours (deduplicated, in link order).
    pub fn connections(&self, graph: &GraphData, id: NodeId) -> Vec<PortalConnection> {
        let Some(group) = self.group_of(id) else {
            return Vec::new();
        };

        group
            .members
            .iter()
            .filter(|&&member| member != id)
            .filter_map(|&member| {
                let node = graph.node(member)?;
                let mut neighbors = Vec::new();
                for link in &graph.links {
                    if let Some(other) = link.other(member)
                        && !neighbors.contains(&other)
                    {
                        neighbors.push(other);
                    }
                }

                let neighbor_names = neighbors
                    .into_iter()
                    .filter_map(|neighbor| graph.node(neighbor).map(|n| n.name.clone()))
                    .collect();
                Some(PortalConnection {
                    node: member,
                    name: node.name.clone(),
                    family: node.family.clone(),
                    neighbor_names,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::Node;

    fn large_graph() -> GraphData {
        let mut nodes = (1..=30)
            .map(|id| {
                Node::new(NodeId(id), format!("node-{id}")).with_family([format!("f{}", id % 5)])
            })
            .collect::<Vec<_>>();
        nodes.push(Node::new(NodeId(31), "Gate").with_family(["north"]));
        nodes.push(Node::new(NodeId(32), "Warden").with_family(["south"]));
        nodes.push(Node::new(NodeId(33), "  gate ").with_family(["south"]));
        GraphData::new(nodes)
    }

    #[test]
    fn same_name_nodes_form_one_group() {
        let graph = large_graph();
        let index = PortalIndex::build(&graph);

        assert_eq!(index.groups().len(), 1);
        assert_eq!(index.groups()[0].name, "gate");
        assert_eq!(index.groups()[0].members, vec![NodeId(31), NodeId(33)]);
        assert!(index.is_portal(NodeId(31)));
        assert!(!index.is_portal(NodeId(32)));
    }

    #[test]
    fn connections_list_the_other_member_with_neighbors() {
        let graph = large_graph();
        let index = PortalIndex::build(&graph);

        let from_first = index.connections(&graph, NodeId(31));
        assert_eq!(from_first.len(), 1);
        assert_eq!(from_first[0].node, NodeId(33));
        assert_eq!(from_first[0].neighbor_names, vec!["Warden".to_owned()]);

        let from_second = index.connections(&graph, NodeId(33));
        assert_eq!(from_second.len(), 1);
        assert_eq!(from_second[0].node, NodeId(31));
        assert!(from_second[0].neighbor_names.is_empty());
    }

    #[test]
    fn non_portal_nodes_have_no_connections() {
        let graph = large_graph();
        let index = PortalIndex::build(&graph);
        assert!(index.connections(&graph, NodeId(1)).is_empty());
        assert!(index.connections(&graph, NodeId(999)).is_empty());
    }
}
