use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use serde::Serialize;
use serde_json::Value;

use super::adapter::normalize_graph;
use super::error::{GraphError, GraphResult};
use super::model::{GraphData, LayoutMode, Link, Node};

pub const DEFAULT_STORAGE_FILE: &str = "nodes_data.json";
pub const DEFAULT_EXPORT_FILE: &str = "wild_graph.json";

#[derive(Serialize)]
struct PersistedGraph<'a> {
    nodes: Vec<&'a Node>,
    links: &'a [Link],
}

/// Borrowed, id-only view of a graph with nodes deduplicated by id (first
/// occurrence kept). Adjacency is never written.
fn persisted(graph: &GraphData) -> PersistedGraph<'_> {
    let mut seen = HashSet::with_capacity(graph.nodes.len());
    let nodes = graph
        .nodes
        .iter()
        .filter(|node| seen.insert(node.id))
        .collect();
    PersistedGraph {
        nodes,
        links: &graph.links,
    }
}

pub fn to_json(graph: &GraphData) -> GraphResult<String> {
    Ok(serde_json::to_string(&persisted(graph))?)
}

pub fn to_json_pretty(graph: &GraphData) -> GraphResult<String> {
    Ok(serde_json::to_string_pretty(&persisted(graph))?)
}

fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}

/// Local storage for the working graph: one JSON document on disk.
#[derive(Clone, Debug)]
pub struct GraphStore {
    path: PathBuf,
}

impl GraphStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, graph: &GraphData) -> GraphResult<()> {
        let encoded = to_json(graph)?;
        write_atomically(&self.path, &encoded)?;
        tracing::debug!(path = %self.path.display(), nodes = graph.nodes.len(), "saved graph");
        Ok(())
    }

    /// Missing, unreadable or corrupt storage yields an empty graph.
    pub fn load(&self, mode: LayoutMode) -> GraphData {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no stored graph, starting empty");
                return GraphData::default();
            }
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "could not read stored graph");
                return GraphData::default();
            }
        };

        match parse_document(&raw, mode) {
            Ok(graph) => {
                tracing::info!(
                    path = %self.path.display(),
                    nodes = graph.nodes.len(),
                    links = graph.links.len(),
                    "loaded stored graph"
                );
                graph
            }
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "stored graph is unusable, starting empty");
                GraphData::default()
            }
        }
    }
}

/// Parses and adapts a graph document; used for both storage and imports.
pub fn parse_document(raw: &str, mode: LayoutMode) -> GraphResult<GraphData> {
    let value: Value = serde_json::from_str(raw).map_err(GraphError::CorruptPersistedState)?;
    parse_value(&value, mode)
}

pub fn parse_value(value: &Value, mode: LayoutMode) -> GraphResult<GraphData> {
    let adapted = normalize_graph(value, mode)?;
    if adapted.repaired_fields + adapted.skipped_entries + adapted.duplicate_ids > 0 {
        tracing::info!(
            repaired = adapted.repaired_fields,
            skipped = adapted.skipped_entries,
            duplicates = adapted.duplicate_ids,
            "adapted graph document"
        );
    }
    Ok(adapted.graph)
}

pub fn export_file(graph: &GraphData, path: &Path) -> GraphResult<()> {
    let encoded = to_json_pretty(graph)?;
    write_atomically(path, &encoded)?;
    tracing::info!(path = %path.display(), nodes = graph.nodes.len(), "exported graph");
    Ok(())
}

pub fn import_file(path: &Path, mode: LayoutMode) -> GraphResult<GraphData> {
    let raw = fs::read_to_string(path)?;
    let graph = parse_document(&raw, mode)?;
    tracing::info!(path = %path.display(), nodes = graph.nodes.len(), "imported graph");
    Ok(graph)
}

/// Result of a file-picker import. Closing the dialog is not an error.
#[derive(Debug)]
pub enum ImportOutcome {
    Loaded { path: PathBuf, document: Value },
    Cancelled,
    Failed(String),
}

/// Opens a file dialog and reads the chosen JSON on a worker thread. The
/// receiver resolves exactly once.
pub fn spawn_import_dialog() -> Receiver<ImportOutcome> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let outcome = match rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            None => ImportOutcome::Cancelled,
            Some(path) => match read_document(&path) {
                Ok(document) => ImportOutcome::Loaded { path, document },
                Err(error) => ImportOutcome::Failed(error.to_string()),
            },
        };
        let _ = tx.send(outcome);
    });

    rx
}

fn read_document(path: &Path) -> GraphResult<Value> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(GraphError::CorruptPersistedState)
}

/// Asks for an export destination, defaulting to `file_name`.
pub fn pick_export_path(file_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("JSON", &["json"])
        .set_file_name(file_name)
        .save_file()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::graph::model::NodeId;

    fn sample() -> GraphData {
        let mut graph = GraphData::new(vec![
            Node::new(NodeId(1), "A").with_family(["x"]),
            Node::new(NodeId(2), "B").with_family(["x"]).with_anchor(["b"]),
            Node::new(NodeId(3), "C").with_binding(["b"]),
        ]);
        graph.nodes[0].x = 12.0;
        graph.nodes[1].color = "#ff8800".to_owned();
        graph.nodes[2].notes = vec!["first".to_owned()];
        graph
    }

    #[test]
    fn save_then_load_reproduces_nodes() {
        let dir = TempDir::new().expect("temp dir");
        let store = GraphStore::new(dir.path().join("graph.json"));
        let graph = sample();

        store.save(&graph).expect("save");
        let loaded = store.load(LayoutMode::Planar);

        assert_eq!(loaded, graph);
    }

    #[test]
    fn saved_document_contains_ids_only() {
        let mut graph = sample();
        graph.nodes.push(Node::new(NodeId(1), "shadow"));
        let value: Value = serde_json::from_str(&to_json(&graph).expect("encode")).expect("json");

        let nodes = value["nodes"].as_array().expect("nodes list");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0]["name"], json!("A"));
        assert!(nodes.iter().all(|node| node.get("join").is_none()));
        assert_eq!(value["links"][0], json!({"source": 1, "target": 2}));
    }

    #[test]
    fn saving_does_not_touch_live_adjacency() {
        let dir = TempDir::new().expect("temp dir");
        let store = GraphStore::new(dir.path().join("graph.json"));
        let graph = sample();
        let before = graph.clone();

        store.save(&graph).expect("save");
        assert_eq!(graph, before);
        assert_eq!(graph.nodes[0].join, vec![NodeId(2)]);
    }

    #[test]
    fn corrupt_or_missing_storage_loads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("graph.json");
        let store = GraphStore::new(&path);
        assert_eq!(store.load(LayoutMode::Planar), GraphData::default());

        fs::write(&path, "{not json").expect("write");
        assert_eq!(store.load(LayoutMode::Planar), GraphData::default());

        fs::write(&path, r#"{"nodes": []}"#).expect("write");
        assert_eq!(store.load(LayoutMode::Planar), GraphData::default());
    }

    #[test]
    fn export_then_import_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("export").join(DEFAULT_EXPORT_FILE);
        let graph = sample();

        export_file(&graph, &path).expect("export");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains('\n'), "export is pretty printed");

        let imported = import_file(&path, LayoutMode::Planar).expect("import");
        let summary = |graph: &GraphData| {
            graph
                .nodes
                .iter()
                .map(|n| (n.id, n.name.clone(), n.family.clone(), n.anchor.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&imported), summary(&graph));
        assert_eq!(imported.links, graph.links);
    }

    #[test]
    fn import_rejects_missing_keys() {
        assert!(matches!(
            parse_document(r#"{"nodes": [{"id": 1}]}"#, LayoutMode::Planar),
            Err(GraphError::InvalidGraphShape)
        ));
        assert!(matches!(
            parse_document("[]", LayoutMode::Planar),
            Err(GraphError::InvalidGraphShape)
        ));
        assert!(matches!(
            parse_document("nope", LayoutMode::Planar),
            Err(GraphError::CorruptPersistedState(_))
        ));
    }
}
