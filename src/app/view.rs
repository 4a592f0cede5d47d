use std::collections::HashSet;
use std::time::Duration;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, vec2};
use taxograph::NodeId;
use taxograph::engine::FrameSnapshot;

use super::render_utils::{blend_color, dim_color, draw_background, node_color};
use super::{LayoutMode, ViewModel};

impl ViewModel {
    fn handle_graph_input(&mut self, ui: &Ui, rect: egui::Rect, response: &egui::Response) {
        let local = |pos: Pos2| (pos - rect.min).to_pos2();

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let point = local(pointer);
            Self::report(self.engine.pointer_down(point));
            Self::report(self.engine.pointer_up(point));
        }

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(origin) = ui.input(|input| input.pointer.press_origin())
        {
            Self::report(self.engine.pointer_down(local(origin)));
        }
        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            Self::report(self.engine.pointer_move(local(pointer)));
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            let pointer = response
                .interact_pointer_pos()
                .or_else(|| ui.input(|input| input.pointer.hover_pos()))
                .unwrap_or(rect.center());
            Self::report(self.engine.pointer_up(local(pointer)));
        }

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            Self::report(self.engine.pan_by(response.drag_delta()));
        }

        if !response.dragged()
            && let Some(hover) = response.hover_pos()
        {
            Self::report(self.engine.pointer_move(local(hover)));
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let anchor = response.hover_pos().unwrap_or(rect.center());
                Self::report(self.engine.scroll_zoom(local(anchor), scroll));
            }
        }
    }

    fn advance_layout(&mut self, ui: &Ui) {
        let dt = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let Some(report) = Self::report(self.engine.tick(Duration::from_secs_f32(dt))) else {
            return;
        };

        if let LayoutMode::Static { max_ticks } = self.mode
            && (!report.added.is_empty() || self.engine.simulation().is_running())
        {
            Self::report(self.engine.settle(max_ticks));
        }
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        let ppp = ui.ctx().pixels_per_point();
        self.engine.set_surface(rect.width() * ppp, rect.height() * ppp, ppp);
        if self.needs_fit && rect.width() > 0.0 && rect.height() > 0.0 {
            self.needs_fit = !self.engine.fit_to_view();
        }

        self.handle_graph_input(ui, rect, &response);
        self.advance_layout(ui);

        let frame = self.engine.frame();
        let offset = rect.min.to_vec2();
        draw_background(
            &painter,
            rect,
            rect.min + frame.transform.translate,
            frame.transform.scale,
        );

        let related = self.related_to_selection(&frame);
        self.draw_links(&painter, &frame, offset, &related);
        self.draw_nodes(&painter, &frame, offset, &related);
        self.draw_hover_caption(&painter, rect, &frame);

        if frame.hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if self.engine.loader().is_loading() || self.engine.simulation().is_running() || response.dragged() {
            ui.ctx().request_repaint();
        }
    }

    fn related_to_selection(&self, frame: &FrameSnapshot) -> HashSet<NodeId> {
        let Some(selected) = frame.selected else {
            return HashSet::new();
        };
        let mut related = HashSet::from([selected]);
        for link in &frame.links {
            if link.source == selected {
                related.insert(link.target);
            } else if link.target == selected {
                related.insert(link.source);
            }
        }
        related
    }

    fn draw_links(
        &self,
        painter: &egui::Painter,
        frame: &FrameSnapshot,
        offset: egui::Vec2,
        related: &HashSet<NodeId>,
    ) {
        let zoom_sqrt = frame.transform.scale.sqrt();
        let selection_active = frame.selected.is_some();
        for link in &frame.links {
            let touches_selection =
                frame.selected.is_some_and(|id| link.source == id || link.target == id);
            let (width, color) = if touches_selection {
                (
                    (2.5 * zoom_sqrt).clamp(1.2, 4.4),
                    Color32::from_rgb(241, 146, 94),
                )
            } else if selection_active && !(related.contains(&link.source) && related.contains(&link.target)) {
                (
                    (0.82 * zoom_sqrt).clamp(0.45, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 120),
                )
            } else {
                (
                    (1.18 * zoom_sqrt).clamp(0.60, 3.4),
                    Color32::from_rgba_unmultiplied(92, 92, 92, 190),
                )
            };
            painter.line_segment([link.start + offset, link.end + offset], Stroke::new(width, color));
        }
    }

    fn draw_nodes(
        &self,
        painter: &egui::Painter,
        frame: &FrameSnapshot,
        offset: egui::Vec2,
        related: &HashSet<NodeId>,
    ) {
        let selected_color = Color32::from_rgb(245, 206, 93);
        let selection_active = frame.selected.is_some();

        for node in &frame.nodes {
            let position = node.screen + offset;
            let radius = node.radius.max(1.5);
            let is_selected = frame.selected == Some(node.id);
            let is_hovered = frame.hovered == Some(node.id);
            let is_related = related.contains(&node.id);

            let base_color = node_color(node.status, node.depth);
            let color = if is_selected {
                selected_color
            } else if is_hovered {
                Color32::from_rgb(255, 164, 101)
            } else if is_related {
                blend_color(base_color, Color32::from_rgb(246, 137, 92), 0.45)
            } else if selection_active {
                dim_color(base_color, 0.52)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, color);
            let stroke_width = if node.pinned { 2.2 } else { 1.0 };
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(stroke_width, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            let should_draw_label =
                is_selected || is_hovered || (frame.show_labels && (radius > 9.0 || is_related));
            if should_draw_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.label.as_str(),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }
    }

    fn draw_hover_caption(&self, painter: &egui::Painter, rect: egui::Rect, frame: &FrameSnapshot) {
        let Some(hovered) = frame.hovered else {
            return;
        };
        let Some(graph) = self.engine.graph() else {
            return;
        };
        let Some(node) = graph.node(hovered) else {
            return;
        };

        let panel_text = format!(
            "{}  |  depth {}  |  metric {:.0}  |  links {}",
            node.label,
            node.depth,
            node.metric,
            graph.degree(hovered)
        );
        painter.text(
            rect.left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            panel_text,
            FontId::proportional(13.0),
            Color32::from_gray(240),
        );
    }
}
