use eframe::egui::{self, Align, Layout, RichText, Ui};

use super::ViewModel;

impl ViewModel {
    fn fps_display_text(&self) -> String {
        let mut parts = vec![format!("FPS {:.0}", self.fps_current)];
        if !self.fps_samples.is_empty() {
            let avg = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
            parts.push(format!("avg {avg:.1}"));
        }
        if self.fps_current > f32::EPSILON {
            parts.push(format!("{:.1} ms", 1000.0 / self.fps_current));
        }
        parts.join(" | ")
    }

    pub(super) fn draw_top_bar(&mut self, ui: &mut Ui) {
        let progress = self.engine.progress();
        ui.horizontal(|ui| {
            ui.heading("taxograph");
            ui.separator();
            ui.add(
                egui::ProgressBar::new(progress.percentage / 100.0)
                    .desired_width(220.0)
                    .text(format!(
                        "{}  {}/{}",
                        progress.level, progress.loaded, progress.total
                    )),
            );
            if self.engine.loader().is_loading() {
                ui.spinner();
            }
            if let Some((added, links)) = self.last_batch {
                ui.label(format!("last batch +{added} ({links} links active)"));
            }

            if ui.button("Show all").clicked() {
                Self::report(self.engine.show_all());
            }
            if ui.button("Fit").clicked() {
                self.engine.fit_to_view();
            }
            if ui.button("Reset").clicked() {
                Self::report(self.engine.reset());
                self.needs_fit = true;
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(self.fps_display_text());
                ui.label(format!(
                    "alpha {:.3}  |  bodies {}",
                    self.engine.simulation().alpha(),
                    self.engine.simulation().len()
                ));
            });
        });
    }

    pub(super) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected) = self.engine.selected() else {
            ui.label("Click a node to inspect it. Drag nodes to pin them while held.");
            return;
        };
        let Some(graph) = self.engine.graph().cloned() else {
            return;
        };
        let Some(node) = graph.node(selected) else {
            ui.label("Selected node is no longer part of the graph.");
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.key.as_str());
        ui.add_space(6.0);

        ui.label(format!("Depth: {}", node.depth));
        if let Some(parent) = node.parent.and_then(|parent| graph.node(parent)) {
            ui.label(format!("Parent: {}", parent.label));
        }
        if let Some(category) = &node.category {
            ui.label(format!("Category: {category}"));
        }
        ui.label(format!("Status: {:?}", node.status));
        ui.label(format!("Metric: {:.0}", node.metric));
        ui.label(format!("Links: {}", graph.degree(selected)));

        let hidden = graph
            .neighbors(selected)
            .filter(|&neighbor| !self.engine.loader().is_active(neighbor))
            .count();
        ui.label(format!("Neighbours not loaded yet: {hidden}"));

        ui.separator();
        ui.horizontal(|ui| {
            ui.add(egui::Slider::new(&mut self.connected_depth, 1..=4).text("hops"));
            if ui.button("Show connected").clicked() {
                Self::report(self.engine.show_connected(selected, self.connected_depth));
            }
        });

        if let Some(position) = self.engine.simulation().position(selected) {
            ui.small(format!("world ({:.1}, {:.1})", position.x, position.y));
        }
    }
}
