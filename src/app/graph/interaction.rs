use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::render_utils::{distance_to_segment, screen_to_world};
use super::super::{SelectedFiber, ViewModel};

const FIBER_HIT_TOLERANCE: f32 = 5.0;

struct FiberHit {
    start: Pos2,
    end: Pos2,
    selection: SelectedFiber,
}

/// Clickable screen regions collected while painting one frame. Later
/// entries were painted on top, so lookups search back to front.
#[derive(Default)]
pub(in crate::app) struct HitTargets {
    labels: Vec<(Rect, String)>,
    fibers: Vec<FiberHit>,
}

impl HitTargets {
    pub(in crate::app) fn push_label(&mut self, rect: Rect, field_id: &str) {
        self.labels.push((rect, field_id.to_owned()));
    }

    pub(in crate::app) fn push_fiber(&mut self, start: Pos2, end: Pos2, selection: SelectedFiber) {
        self.fibers.push(FiberHit {
            start,
            end,
            selection,
        });
    }

    pub(in crate::app) fn field_at(&self, pointer: Pos2) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(pointer))
            .map(|(_, id)| id.as_str())
    }

    fn fiber_at(&self, pointer: Pos2) -> Option<&SelectedFiber> {
        self.fibers
            .iter()
            .rev()
            .find(|hit| distance_to_segment(pointer, hit.start, hit.end) <= FIBER_HIT_TOLERANCE)
            .map(|hit| &hit.selection)
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// A click on a field label toggles that field; a click on a fiber
    /// selects it for the details panel; anything else clears the selection.
    pub(in crate::app) fn handle_graph_click(
        &mut self,
        response: &egui::Response,
        hits: &HitTargets,
    ) {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return;
        }
        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };

        if let Some(field_id) = hits.field_at(pointer) {
            let field_id = field_id.to_owned();
            self.apply_toggle(&field_id);
            return;
        }

        self.selected_fiber = hits.fiber_at(pointer).cloned();
    }
}
