use eframe::egui::{self, Color32, RichText, Ui};

use crate::graph::{GraphError, NodeId, NodeInput};

use super::super::{FormError, NodeForm, ViewModel};

const ERROR_COLOR: Color32 = Color32::from_rgb(236, 112, 128);

impl NodeForm {
    fn load(&mut self, id: Option<NodeId>, input: NodeInput) {
        self.editing = id;
        self.input = input;
        self.error = None;
    }

    fn error_for(&self, field: &str) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

fn labelled_field(ui: &mut Ui, form: &NodeForm, label: &str, field: &'static str, value: &mut String) {
    ui.label(label);
    ui.text_edit_singleline(value);
    if let Some(message) = form.error_for(field) {
        ui.colored_label(ERROR_COLOR, message);
    }
}

impl ViewModel {
    /// Keeps the form on the selected node; a cleared selection leaves an
    /// in-progress "add" form alone.
    pub(in crate::app) fn sync_form_with_selection(&mut self) {
        let selected = self.session.selected();
        if selected == self.form.editing {
            return;
        }
        match selected.and_then(|id| self.session.graph().node(id)) {
            Some(node) => self.form.load(selected, NodeInput::from_node(node)),
            None if self.form.editing.is_some() => self.form.load(None, NodeInput::default()),
            None => {}
        }
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        match self.form.editing {
            Some(id) => ui.heading(format!("Edit node #{id}")),
            None => ui.heading("Add node"),
        };
        ui.add_space(6.0);

        let mut input = std::mem::take(&mut self.form.input);
        labelled_field(ui, &self.form, "Name", "name", &mut input.name);
        labelled_field(ui, &self.form, "Families (comma separated)", "family", &mut input.family);
        labelled_field(ui, &self.form, "Anchors", "anchor", &mut input.anchor);
        labelled_field(ui, &self.form, "Bindings", "binding", &mut input.binding);
        labelled_field(ui, &self.form, "Quality", "quality", &mut input.quality);
        labelled_field(ui, &self.form, "Color (#rrggbb)", "color", &mut input.color);
        ui.label("Notes (one per line)");
        ui.add(egui::TextEdit::multiline(&mut input.notes).desired_rows(3));
        ui.checkbox(&mut input.is_central, "Central node");
        self.form.input = input;

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let submit_label = if self.form.editing.is_some() { "Save" } else { "Add" };
            if ui.button(submit_label).clicked() {
                self.submit_form();
            }
            if self.form.editing.is_some() {
                if ui.button("New").clicked() {
                    self.session.select(None);
                    self.form.load(None, NodeInput::default());
                }
                if ui
                    .button(RichText::new("Delete").color(ERROR_COLOR))
                    .clicked()
                    && let Some(id) = self.form.editing
                    && self.session.delete_node(id).is_ok()
                {
                    self.form.load(None, NodeInput::default());
                }
            }
        });

        if let Some(id) = self.form.editing {
            ui.separator();
            self.draw_node_summary(ui, id);
        }
    }

    fn submit_form(&mut self) {
        let result = match self.form.editing {
            Some(id) => self.session.edit_node(id, &self.form.input).map(|()| id),
            None => self.session.add_node(&self.form.input),
        };
        match result {
            Ok(id) => {
                self.form.error = None;
                if let Some(node) = self.session.graph().node(id) {
                    self.form.load(Some(id), NodeInput::from_node(node));
                }
            }
            Err(GraphError::InvalidNodeInput { field }) => {
                self.form.error = Some(FormError {
                    field,
                    message: format!("{field} is required"),
                });
            }
            Err(error) => {
                tracing::warn!(%error, "node form rejected");
                self.form.error = Some(FormError {
                    field: "name",
                    message: error.to_string(),
                });
            }
        }
    }

    fn draw_node_summary(&mut self, ui: &mut Ui, id: NodeId) {
        let graph = self.session.graph();
        let Some(node) = graph.node(id) else {
            ui.label("Selected node no longer exists.");
            return;
        };

        ui.label(RichText::new(&node.name).strong());
        ui.label(format!("Size: {:.1}", node.size));
        ui.label(format!("Direct connections: {}", node.join.len()));
        if !node.notes.is_empty() {
            ui.add_space(4.0);
            for line in &node.notes {
                ui.label(format!("• {line}"));
            }
        }

        let neighbours = node
            .join
            .iter()
            .filter_map(|neighbour| graph.node(*neighbour))
            .map(|neighbour| (neighbour.id, neighbour.name.clone()))
            .collect::<Vec<_>>();
        let twins = self
            .session
            .portals()
            .group_of(id)
            .map(|group| group.members.len().saturating_sub(1))
            .unwrap_or(0);

        if twins > 0 {
            ui.label(format!("Portal: {twins} other node(s) share this name"));
        }

        ui.separator();
        ui.label(RichText::new("Connected nodes").strong());
        if neighbours.is_empty() {
            ui.label("No connections.");
            return;
        }
        egui::ScrollArea::vertical()
            .id_salt("neighbour_scroll")
            .max_height(260.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (neighbour, name) in neighbours {
                    if ui.link(name).clicked() {
                        self.session.focus_node(neighbour);
                    }
                }
            });
    }
}
