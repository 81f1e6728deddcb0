use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2,
    vec2,
};
use graph_lens::render::{RenderFrame, Renderer};
use graph_lens::{PointerEvent, Tooltip};

use super::GraphLensApp;

const BACKGROUND: Color32 = Color32::from_rgb(250, 250, 250);
const HIGHLIGHT: Color32 = Color32::from_rgb(255, 193, 7);
const LABEL_COLOR: Color32 = Color32::from_gray(51);

/// Paints engine frames with the egui painter. Frame positions are relative
/// to the canvas, so everything is shifted by the canvas origin.
struct EguiRenderer<'p> {
    painter: &'p Painter,
    origin: Vec2,
}

impl EguiRenderer<'_> {
    fn draw_tooltip(&self, tooltip: &Tooltip<'_>) {
        let mut lines = vec![tooltip.title.to_owned(), format!("type: {}", tooltip.kind)];
        lines.extend(
            tooltip
                .entries
                .iter()
                .map(|(key, value)| format!("{key}: {value}")),
        );

        self.painter.text(
            self.painter.clip_rect().left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            lines.join("\n"),
            FontId::proportional(13.0),
            Color32::from_gray(30),
        );
    }
}

impl Renderer for EguiRenderer<'_> {
    fn draw(&mut self, frame: &RenderFrame<'_>) {
        let scale = frame.transform.scale;

        for edge in &frame.edges {
            let from = edge.from + self.origin;
            let to = edge.to + self.origin;
            let color = if edge.highlighted {
                HIGHLIGHT
            } else {
                edge.style.color
            };
            let stroke = Stroke::new((edge.style.width * scale).max(0.5), color);
            match edge.style.dash {
                Some([dash, gap]) => self.painter.extend(Shape::dashed_line(
                    &[from, to],
                    stroke,
                    (dash * scale).max(1.0),
                    (gap * scale).max(1.0),
                )),
                None => {
                    self.painter.line_segment([from, to], stroke);
                }
            }
        }

        for node in &frame.nodes {
            let center = node.screen + self.origin;
            let radius = node.screen_radius(frame.transform);
            self.painter.circle_filled(center, radius, node.style.color);

            let outline = if node.highlighted {
                Stroke::new(3.0, HIGHLIGHT)
            } else if node.hovered || node.pinned {
                Stroke::new(2.0, Color32::from_gray(40))
            } else {
                Stroke::new(1.5, Color32::WHITE)
            };
            self.painter.circle_stroke(center, radius, outline);

            self.painter.text(
                center + vec2(0.0, radius + 3.0),
                Align2::CENTER_TOP,
                node.label,
                FontId::proportional((11.0 * scale.sqrt()).clamp(8.0, 18.0)),
                LABEL_COLOR,
            );
        }

        if let Some(tooltip) = &frame.tooltip {
            self.draw_tooltip(tooltip);
        }
    }
}

impl GraphLensApp {
    pub(super) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);

        self.engine.set_surface_size(rect.size());
        self.forward_pointer(ui, rect, &response);
        self.engine.advance();

        let mut renderer = EguiRenderer {
            painter: &painter,
            origin: rect.min.to_vec2(),
        };
        self.engine.render(&mut renderer);

        if self.engine.drag_session().is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if self.engine.hovered_node().is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        if self.engine.is_animating() || self.engine.drag_session().is_some() {
            ui.ctx().request_repaint();
        }
    }

    /// Translates this frame's egui pointer state into engine events in
    /// canvas coordinates.
    fn forward_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let (hover, pressed, released, scroll) = ui.input(|input| {
            (
                input.pointer.hover_pos(),
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.raw_scroll_delta.y,
            )
        });
        let local = |position: Pos2| position - rect.min.to_vec2();

        let inside = hover.is_some_and(|position| rect.contains(position));
        if self.pointer_inside && !inside {
            self.engine.handle_pointer(PointerEvent::Leave);
        }
        self.pointer_inside = inside;

        if let Some(position) = hover {
            self.last_pointer = Some(local(position));
        }
        let Some(position) = self.last_pointer else {
            return;
        };

        if hover.is_some()
            && (inside || self.engine.drag_session().is_some() || self.engine.is_panning())
        {
            self.engine.handle_pointer(PointerEvent::Move(position));
        }
        if pressed && response.hovered() {
            self.engine.handle_pointer(PointerEvent::Down(position));
        }
        if released {
            self.engine.handle_pointer(PointerEvent::Up(position));
        }
        if inside && scroll.abs() > f32::EPSILON {
            self.engine.handle_pointer(PointerEvent::Wheel {
                delta: scroll,
                position,
            });
        }
    }
}
