use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::{Vec2, Vec3};

use crate::clock::Clock;
use crate::graph::store::{self, GraphStore, ImportOutcome};
use crate::graph::{
    GraphData, GraphError, GraphResult, LayoutMode, NodeId, NodeInput, PortalIndex, Reassigned,
    find_match, query_terms, reassign_ids,
};
use crate::util::stable_pair;

use super::camera::{Camera2D, Camera3D};
use super::hover::{Highlight, HoverState, OpenPortalMenu, PortalMenu};
use super::physics::{PhysicsConfig, Simulation};

pub(in crate::app) const NOTICE_LIFETIME: Duration = Duration::from_secs(3);
pub(in crate::app) const MIN_REPULSION: f32 = 10.0;
pub(in crate::app) const MAX_REPULSION: f32 = 1_000.0;
const SPATIAL_SPAWN_DEPTH: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    expires_at: Duration,
}

pub(crate) struct SessionOptions {
    pub storage: PathBuf,
    pub export_path: PathBuf,
    pub mode: LayoutMode,
    pub repulsion: Option<f32>,
}

/// What the frame loop should do after a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct FrameStatus {
    pub animating: bool,
    pub timers_pending: bool,
}

/// Everything the viewer edits: the graph, its layout, view state and the
/// transient UI timers. Holds no egui types.
pub(crate) struct Session {
    graph: GraphData,
    store: GraphStore,
    export_path: PathBuf,
    mode: LayoutMode,
    simulation: Simulation,
    portals: PortalIndex,
    pub(in crate::app) camera_2d: Camera2D,
    pub(in crate::app) camera_3d: Camera3D,
    hover: HoverState,
    portal_menu: PortalMenu,
    selected: Option<NodeId>,
    dragging: Option<NodeId>,
    notices: Vec<Notice>,
    revision: u64,
    clock: Box<dyn Clock>,
}

impl Session {
    pub(crate) fn open(options: SessionOptions, clock: Box<dyn Clock>) -> Self {
        let store = GraphStore::new(options.storage.clone());
        let graph = store.load(options.mode);
        Self::with_graph(graph, store, options, clock)
    }

    fn with_graph(
        graph: GraphData,
        store: GraphStore,
        options: SessionOptions,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut config = PhysicsConfig::default();
        if let Some(repulsion) = options.repulsion {
            config.repulsion = repulsion.clamp(MIN_REPULSION, MAX_REPULSION);
        }

        let mut session = Self {
            portals: PortalIndex::build(&graph),
            graph,
            store,
            export_path: options.export_path,
            mode: options.mode,
            simulation: Simulation::new(options.mode, config),
            camera_2d: Camera2D::default(),
            camera_3d: Camera3D::default(),
            hover: HoverState::default(),
            portal_menu: PortalMenu::default(),
            selected: None,
            dragging: None,
            notices: Vec::new(),
            revision: 0,
            clock,
        };
        session.simulation.reseed(&mut session.graph);
        session
    }

    pub(in crate::app) fn graph(&self) -> &GraphData {
        &self.graph
    }

    /// Bumped on every change to the node set.
    pub(in crate::app) fn revision(&self) -> u64 {
        self.revision
    }

    pub(in crate::app) fn mode(&self) -> LayoutMode {
        self.simulation.mode()
    }

    pub(in crate::app) fn physics(&self) -> PhysicsConfig {
        self.simulation.config()
    }

    pub(in crate::app) fn storage_path(&self) -> &Path {
        self.store.path()
    }

    pub(in crate::app) fn export_path(&self) -> &Path {
        &self.export_path
    }

    pub(in crate::app) fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub(in crate::app) fn select(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|id| self.graph.node(*id).is_some());
    }

    pub(in crate::app) fn portals(&self) -> &PortalIndex {
        &self.portals
    }

    pub(in crate::app) fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub(in crate::app) fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let expires_at = self.clock.now() + NOTICE_LIFETIME;
        self.notices.push(Notice {
            text: text.into(),
            level,
            expires_at,
        });
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Rebuilds everything derived from the node set and writes storage.
    fn commit(&mut self) {
        self.revision += 1;
        self.portals = PortalIndex::build(&self.graph);
        self.simulation.reseed(&mut self.graph);
        if self.selected.is_some_and(|id| self.graph.node(id).is_none()) {
            self.selected = None;
        }
        if self.hover.hovered().is_some_and(|id| self.graph.node(id).is_none()) {
            self.hover.clear();
        }
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(error) = self.store.save(&self.graph) {
            tracing::warn!(path = %self.store.path().display(), %error, "could not save graph");
            self.notify(NoticeLevel::Error, format!("Could not save: {error}"));
        }
    }

    pub(in crate::app) fn add_node(&mut self, input: &NodeInput) -> GraphResult<NodeId> {
        let id = self.graph.add_node(input)?;
        if self.mode == LayoutMode::Spatial
            && let Some(node) = self.graph.node_mut(id)
        {
            let (jitter, _) = stable_pair(&id.to_string());
            node.z = jitter * SPATIAL_SPAWN_DEPTH;
        }
        self.selected = Some(id);
        self.commit();
        Ok(id)
    }

    pub(in crate::app) fn edit_node(&mut self, id: NodeId, input: &NodeInput) -> GraphResult<()> {
        self.graph.edit_node(id, input)?;
        self.commit();
        Ok(())
    }

    pub(in crate::app) fn delete_node(&mut self, id: NodeId) -> GraphResult<()> {
        let removed = self.graph.delete_node(id)?;
        if self.dragging == Some(id) {
            self.dragging = None;
        }
        if self
            .portal_menu
            .current()
            .is_some_and(|menu| menu.origin == id || menu.connections.iter().any(|c| c.node == id))
        {
            self.portal_menu.close();
        }
        self.commit();
        self.notify(NoticeLevel::Info, format!("Deleted \"{}\"", removed.name));
        Ok(())
    }

    pub(in crate::app) fn set_repulsion_strength(&mut self, repulsion: f32) {
        if !repulsion.is_finite() {
            return;
        }
        let config = PhysicsConfig {
            repulsion: repulsion.clamp(MIN_REPULSION, MAX_REPULSION),
            ..self.simulation.config()
        };
        self.simulation.set_config(&self.graph, config);
    }

    pub(in crate::app) fn toggle_layout_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.simulation.set_mode(&mut self.graph, self.mode);
        self.hover.clear();
        self.portal_menu.close();
        self.end_drag();
        tracing::info!(mode = self.mode.label(), "switched layout mode");
    }

    /// Centres the view on the first node whose tags satisfy every term. No
    /// match leaves the view untouched.
    pub(in crate::app) fn search(&mut self, query: &str) -> Option<NodeId> {
        let terms = query_terms(query);
        let Some(index) = find_match(&self.graph, &terms) else {
            if !terms.is_empty() {
                self.notify(NoticeLevel::Info, format!("No node matches \"{}\"", query.trim()));
            }
            return None;
        };
        let id = self.graph.nodes[index].id;
        self.focus_node(id);
        Some(id)
    }

    /// Selects `id` and centres both cameras on it.
    pub(in crate::app) fn focus_node(&mut self, id: NodeId) {
        let Some(node) = self.graph.node(id) else {
            return;
        };
        let world = Vec3::new(node.x, node.y, node.z);
        self.camera_2d.center_on(world.truncate());
        self.camera_3d.center_on(world);
        self.selected = Some(id);
    }

    pub(in crate::app) fn reset_view(&mut self) {
        self.camera_2d.reset();
        self.camera_3d.reset();
    }

    pub(in crate::app) fn save_to_file(&mut self, path: &Path) -> GraphResult<()> {
        match store::export_file(&self.graph, path) {
            Ok(()) => {
                self.notify(NoticeLevel::Info, format!("Exported to {}", path.display()));
                Ok(())
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "export failed");
                self.notify(NoticeLevel::Error, format!("Export failed: {error}"));
                Err(error)
            }
        }
    }

    /// Applies the result of an import dialog. Shape errors leave the current
    /// graph in place.
    pub(in crate::app) fn load_from_file(&mut self, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Cancelled => {}
            ImportOutcome::Failed(message) => {
                tracing::warn!(%message, "import failed");
                self.notify(NoticeLevel::Error, format!("Import failed: {message}"));
            }
            ImportOutcome::Loaded { path, document } => {
                match store::parse_value(&document, self.mode) {
                    Ok(graph) => {
                        tracing::info!(path = %path.display(), nodes = graph.nodes.len(), "imported graph");
                        self.replace_graph(graph);
                        self.notify(NoticeLevel::Info, format!("Imported {}", path.display()));
                    }
                    Err(error) => self.report_import_error(&path, error),
                }
            }
        }
    }

    pub(crate) fn import_path(&mut self, path: &Path) {
        match store::import_file(path, self.mode) {
            Ok(graph) => self.replace_graph(graph),
            Err(error) => self.report_import_error(path, error),
        }
    }

    fn report_import_error(&mut self, path: &Path, error: GraphError) {
        tracing::warn!(path = %path.display(), %error, "import ignored");
        self.notify(NoticeLevel::Error, format!("Import ignored: {error}"));
    }

    fn replace_graph(&mut self, graph: GraphData) {
        self.graph = graph;
        self.selected = None;
        self.dragging = None;
        self.hover.clear();
        self.portal_menu.close();
        self.commit();
    }

    pub(in crate::app) fn reassign_ids(&mut self) {
        let Reassigned { graph, mapping } = reassign_ids(&self.graph);
        self.graph = graph;
        self.selected = self.selected.and_then(|id| mapping.get(&id).copied());
        self.dragging = None;
        self.hover.clear();
        self.portal_menu.close();
        self.commit();
        self.notify(NoticeLevel::Info, "Ids reassigned");
    }

    pub(in crate::app) fn begin_drag(&mut self, id: NodeId) {
        let Some(index) = self.graph.index_of(id) else {
            return;
        };
        self.dragging = Some(id);
        self.simulation.begin_drag(&mut self.graph, index);
    }

    pub(in crate::app) fn dragging(&self) -> Option<NodeId> {
        self.dragging
    }

    pub(in crate::app) fn drag_to(&mut self, world: Vec2) {
        let Some(index) = self.dragging.and_then(|id| self.graph.index_of(id)) else {
            return;
        };
        self.simulation.drag_to(&mut self.graph, index, world);
    }

    /// Releases the pin and stores the dropped position.
    pub(in crate::app) fn end_drag(&mut self) {
        let Some(id) = self.dragging.take() else {
            return;
        };
        if let Some(index) = self.graph.index_of(id) {
            self.simulation.end_drag(&mut self.graph, index);
            self.persist();
        }
    }

    pub(in crate::app) fn hover_at(&mut self, target: Option<NodeId>) {
        let now = self.now();
        self.hover.pointer_over(target, now);
    }

    pub(in crate::app) fn hovered(&self) -> Option<NodeId> {
        self.hover.hovered()
    }

    pub(in crate::app) fn highlight(&self) -> Highlight {
        self.hover.highlight(&self.graph)
    }

    /// Clicking a node selects it and, for portals, lists its twins.
    pub(in crate::app) fn click_node(&mut self, id: Option<NodeId>) {
        self.select(id);
        match id {
            Some(id) if self.portals.is_portal(id) => {
                let connections = self.portals.connections(&self.graph, id);
                let now = self.now();
                self.portal_menu.open(id, connections, now);
            }
            _ => self.portal_menu.close(),
        }
    }

    pub(in crate::app) fn portal_menu(&self) -> Option<&OpenPortalMenu> {
        self.portal_menu.current()
    }

    pub(in crate::app) fn portal_pointer_inside(&mut self, inside: bool) {
        let now = self.now();
        self.portal_menu.pointer_inside(inside, now);
    }

    pub(in crate::app) fn navigate_portal(&mut self, target: NodeId) {
        if let Some(target) = self.portal_menu.navigate(target) {
            self.focus_node(target);
        }
    }

    pub(in crate::app) fn close_portal_menu(&mut self) {
        self.portal_menu.close();
    }

    /// One frame: advances the layout, fires due timers and drops stale notices.
    pub(in crate::app) fn tick(&mut self) -> FrameStatus {
        let now = self.now();
        let animating = self.simulation.step(&mut self.graph);
        self.hover.poll(now);
        self.portal_menu.poll(now);
        self.notices.retain(|notice| notice.expires_at > now);

        FrameStatus {
            animating: animating || self.dragging.is_some(),
            timers_pending: self.hover.is_pending()
                || self.portal_menu.is_pending()
                || !self.notices.is_empty(),
        }
    }
}
