use std::sync::mpsc::TryRecvError;
use std::time::Duration;

use eframe::egui::{self, Align, Context, Layout};

use crate::graph::store::spawn_import_dialog;

use super::super::session::NoticeLevel;
use super::super::{NodeForm, Session, ViewModel, ViewScratch};

const IMPORT_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl ViewModel {
    pub(in crate::app) fn new(session: Session) -> Self {
        Self {
            repulsion: session.physics().repulsion,
            session,
            search: String::new(),
            form: NodeForm::default(),
            import_rx: None,
            name_match_cache: None,
            view_scratch: ViewScratch::default(),
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.poll_import(ctx);
        self.sync_form_with_selection();

        let graph = self.session.graph();
        let node_count = graph.nodes.len();
        let link_count = graph.links.len();
        let portal_count = self.session.portals().groups().len();
        let storage = self.session.storage_path().display().to_string();
        let mode_label = self.session.mode().label();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("wild-graph");
                    ui.separator();
                    ui.label(format!("nodes: {node_count}"));
                    ui.label(format!("links: {link_count}"));
                    ui.label(format!("portals: {portal_count}"));
                    ui.label(format!("layout: {mode_label}"));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.small(format!("storage: {storage}"));
                        if self.import_rx.is_some() {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        self.draw_notices(ctx);
    }

    pub(in crate::app) fn start_import(&mut self) {
        if self.import_rx.is_none() {
            self.import_rx = Some(spawn_import_dialog());
        }
    }

    /// Picks up a finished import dialog. The channel resolves once.
    fn poll_import(&mut self, ctx: &Context) {
        let Some(rx) = self.import_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(outcome) => {
                self.session.load_from_file(outcome);
                self.name_match_cache = None;
            }
            Err(TryRecvError::Empty) => {
                self.import_rx = Some(rx);
                ctx.request_repaint_after(IMPORT_POLL_INTERVAL);
            }
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("import worker disconnected");
                self.session
                    .notify(NoticeLevel::Error, "Import worker stopped unexpectedly");
            }
        }
    }
}
