use super::error::{GraphError, GraphResult};
use super::ids::next_id;
use super::model::{GraphData, Node, NodeId};

/// Raw form fields for creating or editing a node. Tag fields are
/// comma-separated; notes are one per line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeInput {
    pub name: String,
    pub family: String,
    pub anchor: String,
    pub binding: String,
    pub quality: String,
    pub color: String,
    pub notes: String,
    pub is_central: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct NodeFields {
    name: String,
    family: Vec<String>,
    anchor: Vec<String>,
    binding: Vec<String>,
    quality: String,
    color: String,
    notes: Vec<String>,
    is_central: bool,
}

pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for tag in raw.split(',').map(|tag| tag.trim().to_lowercase()) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

impl NodeInput {
    pub fn from_node(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            family: node.family.join(", "),
            anchor: node.anchor.join(", "),
            binding: node.binding.join(", "),
            quality: node.quality.clone(),
            color: node.color.clone(),
            notes: node.notes.join("\n"),
            is_central: node.is_central,
        }
    }

    /// Single-word names double as an anchor so other nodes can bind to them
    /// by name. They never join a family implicitly.
    fn validate(&self) -> GraphResult<NodeFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(GraphError::InvalidNodeInput { field: "name" });
        }
        let family = split_tags(&self.family);
        if family.is_empty() {
            return Err(GraphError::InvalidNodeInput { field: "family" });
        }

        let mut anchor = split_tags(&self.anchor);
        if !name.contains(char::is_whitespace) {
            let implicit = name.to_lowercase();
            if !anchor.contains(&implicit) {
                anchor.push(implicit);
            }
        }

        Ok(NodeFields {
            name: name.to_owned(),
            family,
            anchor,
            binding: split_tags(&self.binding),
            quality: self.quality.trim().to_owned(),
            color: self.color.trim().to_owned(),
            notes: self
                .notes
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
            is_central: self.is_central,
        })
    }
}

impl NodeFields {
    fn apply(self, node: &mut Node) {
        node.name = self.name;
        node.family = self.family;
        node.anchor = self.anchor;
        node.binding = self.binding;
        node.quality = self.quality;
        node.color = self.color;
        node.notes = self.notes;
        node.is_central = self.is_central;
    }
}

impl GraphData {
    /// Validates and appends a node at the world origin. Nothing changes on
    /// validation failure.
    pub fn add_node(&mut self, input: &NodeInput) -> GraphResult<NodeId> {
        let fields = input.validate()?;
        let id = next_id(self);
        let mut node = Node::new(id, String::new());
        fields.apply(&mut node);
        self.nodes.push(node);
        self.refresh();
        tracing::info!(%id, "added node");
        Ok(id)
    }

    pub fn edit_node(&mut self, id: NodeId, input: &NodeInput) -> GraphResult<()> {
        let fields = input.validate()?;
        let node = self.node_mut(id).ok_or(GraphError::UnknownNode(id))?;
        fields.apply(node);
        self.refresh();
        tracing::info!(%id, "edited node");
        Ok(())
    }

    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let index = self.index_of(id).ok_or(GraphError::UnknownNode(id))?;
        let removed = self.nodes.remove(index);
        self.refresh();
        tracing::info!(%id, "deleted node");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, family: &str) -> NodeInput {
        NodeInput {
            name: name.to_owned(),
            family: family.to_owned(),
            ..NodeInput::default()
        }
    }

    #[test]
    fn tags_are_trimmed_lowercased_and_unique() {
        assert_eq!(split_tags(" A, b ,,a, C "), vec!["a", "b", "c"]);
        assert!(split_tags("  ").is_empty());
    }

    #[test]
    fn missing_required_fields_abort_without_mutation() {
        let mut graph = GraphData::default();
        let missing_name = graph.add_node(&input("  ", "x"));
        let missing_family = graph.add_node(&input("Gate", " , "));

        assert!(matches!(
            missing_name,
            Err(GraphError::InvalidNodeInput { field: "name" })
        ));
        assert!(matches!(
            missing_family,
            Err(GraphError::InvalidNodeInput { field: "family" })
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn add_edit_delete_keep_links_current() {
        let mut graph = GraphData::default();
        let a = graph.add_node(&input("Alpha", "x")).expect("valid");
        let b = graph.add_node(&input("Beta", "y")).expect("valid");
        assert_eq!((a, b), (NodeId(1), NodeId(2)));
        assert!(graph.links.is_empty());

        graph.edit_node(b, &input("Beta", "y, X")).expect("valid");
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.node(a).map(|n| n.size), Some(20.0));

        graph.delete_node(a).expect("exists");
        assert!(graph.links.is_empty());
        assert_eq!(graph.node(b).map(|n| n.join.len()), Some(0));
        assert!(matches!(
            graph.delete_node(a),
            Err(GraphError::UnknownNode(id)) if id == a
        ));
    }

    #[test]
    fn single_word_names_become_anchors() {
        let mut graph = GraphData::default();
        let gate = graph.add_node(&input("Gate", "stone")).expect("valid");
        let keeper = graph
            .add_node(&NodeInput {
                binding: "gate".to_owned(),
                ..input("The Keeper", "people")
            })
            .expect("valid");

        let gate_node = graph.node(gate).expect("exists");
        assert_eq!(gate_node.anchor, vec!["gate"]);
        assert_eq!(gate_node.family, vec!["stone"]);
        assert!(graph.node(keeper).expect("exists").anchor.is_empty());
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn editing_keeps_position() {
        let mut graph = GraphData::default();
        let id = graph.add_node(&input("Alpha", "x")).expect("valid");
        if let Some(node) = graph.node_mut(id) {
            node.x = 40.0;
            node.y = -12.0;
        }
        graph.edit_node(id, &input("Alpha Prime", "x")).expect("valid");

        let node = graph.node(id).expect("exists");
        assert_eq!((node.x, node.y), (40.0, -12.0));
        assert_eq!(node.name, "Alpha Prime");
    }
}
