//! Converts loosely shaped JSON into canonical [`Node`]s and [`GraphData`].
//!
//! Every field goes through one table-driven pass: either it parses, or the
//! default is used and a [`FieldRepair`] records why. Nothing here panics on
//! bad input; the worst case is a node made entirely of defaults.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::error::{GraphError, GraphResult};
use super::model::{GraphData, LayoutMode, MAX_NODE_ID, MIN_SIZE, Node, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairKind {
    Missing,
    WrongType,
    NonFinite,
    OutOfRange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRepair {
    pub field: &'static str,
    pub kind: RepairKind,
}

#[derive(Clone, Copy, Debug)]
pub struct AdaptContext {
    pub mode: LayoutMode,
    /// Id used when the entry carries no usable id of its own.
    pub fallback_id: NodeId,
}

#[derive(Clone, Debug)]
pub struct Normalized {
    pub node: Node,
    pub repairs: Vec<FieldRepair>,
}

#[derive(Clone, Debug, Default)]
pub struct Adapted {
    pub graph: GraphData,
    pub repaired_fields: usize,
    pub skipped_entries: usize,
    pub duplicate_ids: usize,
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    repairs: Vec<FieldRepair>,
}

impl<'a> FieldReader<'a> {
    fn repair<T>(&mut self, field: &'static str, kind: RepairKind, default: T) -> T {
        self.repairs.push(FieldRepair { field, kind });
        default
    }

    fn string(&mut self, field: &'static str) -> String {
        match self.object.get(field) {
            Some(Value::String(value)) => value.clone(),
            None | Some(Value::Null) => self.repair(field, RepairKind::Missing, String::new()),
            Some(_) => self.repair(field, RepairKind::WrongType, String::new()),
        }
    }

    fn strings(&mut self, field: &'static str) -> Vec<String> {
        match self.object.get(field) {
            Some(Value::Array(items)) => {
                let values = items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_owned))
                    .collect::<Vec<_>>();
                if values.len() != items.len() {
                    self.repairs.push(FieldRepair {
                        field,
                        kind: RepairKind::WrongType,
                    });
                }
                values
            }
            None | Some(Value::Null) => self.repair(field, RepairKind::Missing, Vec::new()),
            Some(_) => self.repair(field, RepairKind::WrongType, Vec::new()),
        }
    }

    fn coordinate(&mut self, field: &'static str) -> f32 {
        match self.object.get(field) {
            Some(Value::Number(number)) => match number.as_f64().map(|value| value as f32) {
                Some(value) if value.is_finite() => value,
                _ => self.repair(field, RepairKind::NonFinite, 0.0),
            },
            None | Some(Value::Null) => self.repair(field, RepairKind::Missing, 0.0),
            Some(_) => self.repair(field, RepairKind::WrongType, 0.0),
        }
    }

    fn pin(&mut self, field: &'static str) -> Option<f32> {
        match self.object.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => match number.as_f64().map(|value| value as f32) {
                Some(value) if value.is_finite() => Some(value),
                _ => self.repair(field, RepairKind::NonFinite, None),
            },
            Some(_) => self.repair(field, RepairKind::WrongType, None),
        }
    }

    fn size(&mut self) -> f32 {
        match self.object.get("size") {
            Some(Value::Number(number)) => match number.as_f64().map(|value| value as f32) {
                Some(value) if value.is_finite() && value > 0.0 => value,
                _ => self.repair("size", RepairKind::OutOfRange, MIN_SIZE),
            },
            None | Some(Value::Null) => self.repair("size", RepairKind::Missing, MIN_SIZE),
            Some(_) => self.repair("size", RepairKind::WrongType, MIN_SIZE),
        }
    }

    fn flag(&mut self, field: &'static str) -> bool {
        match self.object.get(field) {
            Some(Value::Bool(value)) => *value,
            None | Some(Value::Null) => self.repair(field, RepairKind::Missing, false),
            Some(_) => self.repair(field, RepairKind::WrongType, false),
        }
    }

    fn id(&mut self, fallback: NodeId) -> NodeId {
        match self.object.get("id") {
            Some(value) => match parse_id(value) {
                Some(id) => id,
                None => self.repair("id", RepairKind::OutOfRange, fallback),
            },
            None => self.repair("id", RepairKind::Missing, fallback),
        }
    }
}

/// Accepts positive integers, integral floats and numeric strings up to
/// [`MAX_NODE_ID`].
fn parse_id(value: &Value) -> Option<NodeId> {
    let id = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite() && value.fract() == 0.0 && *value >= 1.0)
                .map(|value| value as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (1..=MAX_NODE_ID).contains(&id).then_some(NodeId(id))
}

pub fn normalize_node(value: &Value, ctx: AdaptContext) -> GraphResult<Normalized> {
    let Some(object) = value.as_object() else {
        return Err(GraphError::MalformedNode { index: 0 });
    };

    let mut reader = FieldReader {
        object,
        repairs: Vec::new(),
    };

    let mut node = Node {
        id: reader.id(ctx.fallback_id),
        name: reader.string("name"),
        family: reader.strings("family"),
        anchor: reader.strings("anchor"),
        binding: reader.strings("binding"),
        quality: reader.string("quality"),
        color: reader.string("color"),
        notes: reader.strings("notes"),
        x: reader.coordinate("x"),
        y: reader.coordinate("y"),
        z: reader.coordinate("z"),
        fx: reader.pin("fx"),
        fy: reader.pin("fy"),
        size: reader.size(),
        is_central: reader.flag("isCentral"),
        join: Vec::new(),
    };

    if ctx.mode == LayoutMode::Planar {
        node.z = 0.0;
    }

    Ok(Normalized {
        node,
        repairs: reader.repairs,
    })
}

/// Adapts a whole document. Requires both `nodes` (a list) and `links`; the
/// `links` value itself is discarded because links are always re-derived.
pub fn normalize_graph(raw: &Value, mode: LayoutMode) -> GraphResult<Adapted> {
    let entries = raw
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(GraphError::InvalidGraphShape)?;
    if raw.get("links").is_none() {
        return Err(GraphError::InvalidGraphShape);
    }

    let mut next_free = entries
        .iter()
        .filter_map(|entry| entry.get("id").and_then(parse_id))
        .map(|id| id.0)
        .max()
        .unwrap_or(0)
        .saturating_add(1);

    let mut adapted = Adapted::default();
    let mut nodes: Vec<Node> = Vec::with_capacity(entries.len());
    let mut position_by_id: HashMap<NodeId, usize> = HashMap::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let ctx = AdaptContext {
            mode,
            fallback_id: NodeId(next_free),
        };
        let normalized = match normalize_node(entry, ctx) {
            Ok(normalized) => normalized,
            Err(_) => {
                tracing::warn!(index, "skipping node entry that is not an object");
                adapted.skipped_entries += 1;
                continue;
            }
        };

        if normalized.node.id == ctx.fallback_id {
            next_free = next_free.saturating_add(1);
        }
        if !normalized.repairs.is_empty() {
            tracing::debug!(
                index,
                id = %normalized.node.id,
                repairs = ?normalized.repairs,
                "filled defaults for node fields"
            );
            adapted.repaired_fields += normalized.repairs.len();
        }

        let node = normalized.node;
        match position_by_id.get(&node.id) {
            Some(&position) => {
                adapted.duplicate_ids += 1;
                nodes[position] = node;
            }
            None => {
                position_by_id.insert(node.id, nodes.len());
                nodes.push(node);
            }
        }
    }

    if adapted.duplicate_ids > 0 {
        tracing::warn!(
            duplicates = adapted.duplicate_ids,
            "collapsed nodes sharing an id (last entry wins)"
        );
    }

    adapted.graph = GraphData::new(nodes);
    Ok(adapted)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn planar(id: u64) -> AdaptContext {
        AdaptContext {
            mode: LayoutMode::Planar,
            fallback_id: NodeId(id),
        }
    }

    #[test]
    fn sparse_import_is_filled_with_defaults() {
        let raw = json!({"nodes": [{"id": 5, "name": "Foo"}], "links": []});
        let adapted = normalize_graph(&raw, LayoutMode::Planar).expect("valid shape");

        let node = &adapted.graph.nodes[0];
        assert_eq!(node.id, NodeId(5));
        assert_eq!(node.name, "Foo");
        assert!(node.family.is_empty());
        assert_eq!(node.color, "");
        assert_eq!(node.size, 5.0);
        assert_eq!((node.x, node.y, node.z), (0.0, 0.0, 0.0));
        assert!(adapted.graph.links.is_empty());
    }

    #[test]
    fn shape_without_links_or_nodes_is_rejected() {
        for raw in [
            json!({"nodes": []}),
            json!({"links": []}),
            json!({"nodes": {}, "links": []}),
            json!([1, 2, 3]),
        ] {
            assert!(matches!(
                normalize_graph(&raw, LayoutMode::Planar),
                Err(GraphError::InvalidGraphShape)
            ));
        }
    }

    #[test]
    fn bad_coordinates_are_coerced_to_zero() {
        let raw = json!({"id": 1, "x": "left", "y": null, "z": 4.5});
        let normalized = normalize_node(&raw, planar(1)).expect("object");

        assert_eq!(normalized.node.x, 0.0);
        assert_eq!(normalized.node.y, 0.0);
        assert_eq!(normalized.node.z, 0.0);
        assert!(normalized.repairs.contains(&FieldRepair {
            field: "x",
            kind: RepairKind::WrongType
        }));
    }

    #[test]
    fn spatial_mode_keeps_z() {
        let raw = json!({"id": 1, "z": 4.5});
        let ctx = AdaptContext {
            mode: LayoutMode::Spatial,
            fallback_id: NodeId(1),
        };
        assert_eq!(normalize_node(&raw, ctx).expect("object").node.z, 4.5);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({
            "id": 3, "name": "Gate", "family": ["x", 7], "anchor": ["gate"],
            "x": 12.5, "y": "?", "size": -1, "notes": "not a list"
        });
        let once = normalize_node(&raw, planar(99)).expect("object").node;
        let reencoded = serde_json::to_value(&once).expect("serializes");
        let twice = normalize_node(&reencoded, planar(99)).expect("object").node;

        assert_eq!(once, twice);
        assert_eq!(once.family, vec!["x".to_owned()]);
        assert_eq!(once.size, MIN_SIZE);
    }

    #[test]
    fn missing_ids_are_allocated_after_the_largest_valid_id() {
        let raw = json!({
            "nodes": [{"name": "a"}, {"id": 4, "name": "b"}, {"id": -2, "name": "c"}],
            "links": []
        });
        let adapted = normalize_graph(&raw, LayoutMode::Planar).expect("valid shape");
        let ids = adapted.graph.nodes.iter().map(|n| n.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![5, 4, 6]);
    }

    #[test]
    fn oversized_ids_are_replaced_instead_of_overflowing() {
        let raw = json!({
            "nodes": [{"id": 18446744073709551615u64, "name": "huge"}, {"name": "noid"}],
            "links": []
        });
        let adapted = normalize_graph(&raw, LayoutMode::Planar).expect("valid shape");
        let ids = adapted.graph.nodes.iter().map(|n| n.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
        assert!(adapted.repaired_fields > 0);

        let at_cap = json!({"nodes": [{"id": MAX_NODE_ID}, {"name": "noid"}], "links": []});
        let adapted = normalize_graph(&at_cap, LayoutMode::Planar).expect("valid shape");
        let ids = adapted.graph.nodes.iter().map(|n| n.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![MAX_NODE_ID, MAX_NODE_ID + 1]);
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_contents() {
        let raw = json!({
            "nodes": [
                {"id": 1, "name": "first"},
                {"id": 2, "name": "other"},
                {"id": 1, "name": "replacement"}
            ],
            "links": []
        });
        let adapted = normalize_graph(&raw, LayoutMode::Planar).expect("valid shape");

        let names = adapted
            .graph
            .nodes
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["replacement", "other"]);
        assert_eq!(adapted.duplicate_ids, 1);
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let raw = json!({"nodes": [42, {"id": 1, "family": ["x"]}], "links": "ignored"});
        let adapted = normalize_graph(&raw, LayoutMode::Planar).expect("valid shape");
        assert_eq!(adapted.graph.nodes.len(), 1);
        assert_eq!(adapted.skipped_entries, 1);
    }

    #[test]
    fn legacy_links_are_rederived() {
        let raw = json!({
            "nodes": [
                {"id": 1, "family": ["x"]},
                {"id": 2, "family": ["x"]}
            ],
            "links": [{"source": {"id": 1, "join": []}, "target": {"id": 9}}]
        });
        let adapted = normalize_graph(&raw, LayoutMode::Planar).expect("valid shape");
        assert_eq!(adapted.graph.links.len(), 1);
        assert_eq!(adapted.graph.links[0].target, NodeId(2));
    }
}
