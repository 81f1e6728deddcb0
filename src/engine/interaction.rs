use std::mem;

use eframe::egui::Pos2;
use serde_json::Value;
use tracing::debug;

use crate::events::EngineEvent;
use crate::physics::DRAG_ALPHA_TARGET;

use super::Engine;

/// Pointer input in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
    Leave,
    /// Positive `delta` zooms in around `position`.
    Wheel { delta: f32, position: Pos2 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub node: usize,
    /// Pointer position of the press.
    pub origin: Pos2,
    /// Set once the pointer travelled beyond the click slop.
    pub moved: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) enum Gesture {
    #[default]
    Idle,
    Dragging(DragSession),
    /// Press on a node that cannot be dragged; may still become a click.
    Pressing { node: usize, origin: Pos2 },
    Panning { last: Pos2 },
}

#[derive(Debug, Default)]
pub(super) struct InteractionState {
    pub(super) gesture: Gesture,
    pub(super) hovered: Option<usize>,
    pub(super) highlighted: Option<usize>,
}

/// Hover card contents for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub kind: &'a str,
    pub entries: Vec<(&'a str, String)>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Engine {
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.scene.is_none() {
            return;
        }

        match event {
            PointerEvent::Down(position) => self.pointer_down(position),
            PointerEvent::Move(position) => self.pointer_move(position),
            PointerEvent::Up(position) => self.pointer_up(position),
            PointerEvent::Leave => self.set_hovered(None),
            PointerEvent::Wheel { delta, position } => {
                if let Err(error) = self.viewport.wheel(delta, position) {
                    debug!(%error, "wheel zoom rejected");
                }
            }
        }
    }

    fn pointer_down(&mut self, position: Pos2) {
        if self.interaction.gesture != Gesture::Idle || !position.is_finite() {
            return;
        }

        let Some(node) = self.node_at(position) else {
            self.interaction.gesture = Gesture::Panning { last: position };
            return;
        };

        let Some(simulation) = self.simulation_mut() else {
            self.interaction.gesture = Gesture::Pressing {
                node,
                origin: position,
            };
            return;
        };
        let Some(current) = simulation.position(node) else {
            return;
        };

        simulation.pin(node, current);
        simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        simulation.reheat(DRAG_ALPHA_TARGET);
        self.interaction.gesture = Gesture::Dragging(DragSession {
            node,
            origin: position,
            moved: false,
        });
        debug!(node, "drag started");
    }

    fn pointer_move(&mut self, position: Pos2) {
        if !position.is_finite() {
            return;
        }

        match self.interaction.gesture {
            Gesture::Dragging(mut session) => {
                if position.distance(session.origin) > self.config.interaction.click_slop {
                    session.moved = true;
                }
                let world = self.viewport.to_world(position);
                if let Some(simulation) = self.simulation_mut() {
                    simulation.pin(session.node, world);
                }
                self.interaction.gesture = Gesture::Dragging(session);
            }
            Gesture::Panning { last } => match self.viewport.pan_by(position - last) {
                Ok(()) => self.interaction.gesture = Gesture::Panning { last: position },
                Err(error) => debug!(%error, "pan rejected"),
            },
            Gesture::Pressing { .. } => {}
            Gesture::Idle => {
                let hovered = self.node_at(position);
                self.set_hovered(hovered);
            }
        }
    }

    fn pointer_up(&mut self, position: Pos2) {
        let slop = self.config.interaction.click_slop;
        match mem::take(&mut self.interaction.gesture) {
            Gesture::Dragging(session) => {
                self.release_drag(session.node, true);
                debug!(node = session.node, moved = session.moved, "drag ended");
                if !session.moved && position.distance(session.origin) <= slop {
                    self.click(session.node);
                }
            }
            Gesture::Pressing { node, origin } => {
                if position.distance(origin) <= slop {
                    self.click(node);
                }
            }
            Gesture::Panning { .. } | Gesture::Idle => {}
        }

        if position.is_finite() {
            let hovered = self.node_at(position);
            self.set_hovered(hovered);
        }
    }

    fn release_drag(&mut self, node: usize, reheat: bool) {
        if let Some(simulation) = self.simulation_mut() {
            simulation.unpin(node);
            simulation.set_alpha_target(0.0);
            if reheat {
                simulation.reheat(DRAG_ALPHA_TARGET);
            }
        }
    }

    /// Ends any gesture in progress. A dragged node is released, reheating
    /// only when `reheat` is set.
    pub(super) fn cancel_gesture(&mut self, reheat: bool) {
        if let Gesture::Dragging(session) = mem::take(&mut self.interaction.gesture) {
            self.release_drag(session.node, reheat);
        }
    }

    fn click(&mut self, node: usize) {
        let Some(id) = self.node_id(node) else {
            return;
        };
        debug!(%id, "node clicked");
        self.events.push(EngineEvent::NodeClicked { id });

        let highlighted = if self.interaction.highlighted == Some(node) {
            None
        } else {
            Some(node)
        };
        self.set_highlight(highlighted);
    }

    fn node_id(&self, index: usize) -> Option<String> {
        self.graph()?.node(index).map(|node| node.id.clone())
    }

    /// Nearest node whose drawn circle contains `position`.
    fn node_at(&self, position: Pos2) -> Option<usize> {
        let scene = self.scene.as_ref()?;
        let world = self.viewport.to_world(position);

        let mut best: Option<(usize, f32)> = None;
        for (index, style) in scene.node_styles.iter().enumerate() {
            let Some(center) = scene.position(index) else {
                continue;
            };
            let distance = (center - world).length();
            if distance > style.radius() {
                continue;
            }
            if best.is_none_or(|(_, nearest)| distance < nearest) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    fn set_hovered(&mut self, hovered: Option<usize>) {
        let previous = self.interaction.hovered;
        if previous == hovered {
            return;
        }

        self.interaction.hovered = hovered;
        if let Some(id) = previous.and_then(|index| self.node_id(index)) {
            self.events.push(EngineEvent::NodeUnhovered { id });
        }
        if let Some(id) = hovered.and_then(|index| self.node_id(index)) {
            self.events.push(EngineEvent::NodeHovered { id });
        }
    }

    pub(super) fn set_highlight(&mut self, highlighted: Option<usize>) {
        if self.interaction.highlighted == highlighted {
            return;
        }

        self.interaction.highlighted = highlighted;
        let id = highlighted.and_then(|index| self.node_id(index));
        self.events.push(EngineEvent::HighlightChanged { id });
    }

    /// Highlights the node with `id`. Returns false when no such node exists.
    pub fn highlight_node(&mut self, id: &str) -> bool {
        let Some(index) = self.graph().and_then(|graph| graph.index_of(id)) else {
            return false;
        };
        self.set_highlight(Some(index));
        true
    }

    pub fn clear_highlight(&mut self) {
        self.set_highlight(None);
    }

    pub fn hovered_node(&self) -> Option<&str> {
        let index = self.interaction.hovered?;
        self.graph()?.node(index).map(|node| node.id.as_str())
    }

    pub fn highlighted_node(&self) -> Option<&str> {
        let index = self.interaction.highlighted?;
        self.graph()?.node(index).map(|node| node.id.as_str())
    }

    pub fn drag_session(&self) -> Option<DragSession> {
        match self.interaction.gesture {
            Gesture::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.interaction.gesture, Gesture::Panning { .. })
    }

    /// Label, type and data of the hovered node.
    pub fn tooltip(&self) -> Option<Tooltip<'_>> {
        let index = self.interaction.hovered?;
        let node = self.graph()?.node(index)?;
        Some(Tooltip {
            id: node.id.as_str(),
            title: node.display_label(),
            kind: node.kind.as_deref().unwrap_or("unknown"),
            entries: node
                .payload
                .iter()
                .map(|(key, value)| (key.as_str(), value_text(value)))
                .collect(),
        })
    }
}
