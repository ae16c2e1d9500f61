use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use eframe::egui::{Context, Pos2};

use crate::graph::NodeId;
use crate::graph::NodeInput;
use crate::graph::store::ImportOutcome;

mod camera;
mod graph;
mod hover;
mod physics;
mod render_utils;
mod session;
mod ui;

pub(crate) use session::{Session, SessionOptions};

pub struct WildGraphApp {
    model: Box<ViewModel>,
}

struct ViewModel {
    session: Session,
    search: String,
    repulsion: f32,
    form: NodeForm,
    import_rx: Option<Receiver<ImportOutcome>>,
    name_match_cache: Option<NameMatchCache>,
    view_scratch: ViewScratch,
}

/// Fields of the add/edit panel. `editing` is `None` while adding.
#[derive(Default)]
struct NodeForm {
    input: NodeInput,
    editing: Option<NodeId>,
    error: Option<FormError>,
}

struct FormError {
    field: &'static str,
    message: String,
}

struct NameMatchCache {
    query: String,
    revision: u64,
    matches: Arc<HashSet<NodeId>>,
}

/// Per-frame screen geometry, indexed like `GraphData::nodes`.
#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    depths: Vec<f32>,
    visible: Vec<bool>,
    draw_order: Vec<usize>,
}

impl WildGraphApp {
    pub(crate) fn new(_cc: &eframe::CreationContext<'_>, session: Session) -> Self {
        Self {
            model: Box::new(ViewModel::new(session)),
        }
    }
}

impl eframe::App for WildGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.show(ctx);
    }
}
