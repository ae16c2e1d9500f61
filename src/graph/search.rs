use super::model::{GraphData, Node};

/// Splits a raw query on whitespace, lower-casing each term.
pub fn query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

fn tag_matches(tags: &[String], term: &str) -> bool {
    tags.iter().any(|tag| tag.to_lowercase().contains(term))
}

/// Every term must appear (as a substring) in at least one family or anchor tag.
pub fn node_matches(node: &Node, terms: &[String]) -> bool {
    !terms.is_empty()
        && terms
            .iter()
            .all(|term| tag_matches(&node.family, term) || tag_matches(&node.anchor, term))
}

/// Index of the first node matching all terms.
pub fn find_match(graph: &GraphData, terms: &[String]) -> Option<usize> {
    graph.nodes.iter().position(|node| node_matches(node, terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::NodeId;

    fn graph() -> GraphData {
        GraphData::new(vec![
            Node::new(NodeId(1), "a").with_family(["forest", "river"]),
            Node::new(NodeId(2), "b").with_family(["Forest"]).with_anchor(["mill"]),
            Node::new(NodeId(3), "c").with_family(["forest", "mill"]),
        ])
    }

    #[test]
    fn all_terms_must_match_some_tag() {
        let graph = graph();
        assert_eq!(find_match(&graph, &query_terms("FOR riv")), Some(0));
        assert_eq!(find_match(&graph, &query_terms("forest mill")), Some(1));
        assert_eq!(find_match(&graph, &query_terms("river mill")), None);
    }

    #[test]
    fn empty_query_never_matches() {
        assert_eq!(find_match(&graph(), &query_terms("   ")), None);
    }
}
