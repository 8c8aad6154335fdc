use eframe::egui::{self, RichText, Ui};

use crate::deps::Direction;
use crate::view::Fiber;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Fiber Details");
        ui.add_space(6.0);

        if self.selected_fiber.is_none() {
            ui.label("Click a fiber in the graph to see the imports behind it.");
            return;
        }
        let Some(fiber) = self.selected_fiber_details() else {
            ui.label("Selected fiber is not part of the current view.");
            return;
        };

        let arrow = match fiber.direction {
            Direction::Either => "->",
            Direction::Mutual => "<->",
        };
        ui.label(RichText::new(format!("{} {arrow} {}", fiber.source_id, fiber.target_id)).strong());
        ui.small(fiber.id.to_string());
        ui.add_space(6.0);

        ui.label(format!(
            "Direction: {}",
            match fiber.direction {
                Direction::Either => "one way",
                Direction::Mutual => "both ways",
            }
        ));
        ui.label(format!("Contributing imports: {}", fiber.origins.len()));

        ui.separator();
        let report = match fiber.direction {
            Direction::Mutual => mutual_message(fiber),
            Direction::Either => origin_lines(fiber),
        };
        egui::ScrollArea::vertical()
            .id_salt("fiber_origins")
            .show(ui, |ui| {
                ui.label(RichText::new(report).monospace());
            });
    }

    /// The selected fiber, looked up again in the current tree.
    pub(in crate::app) fn selected_fiber_details(&self) -> Option<&Fiber> {
        let selection = self.selected_fiber.as_ref()?;
        self.session
            .field()
            .find_field(&selection.field_id)?
            .fibers
            .iter()
            .find(|fiber| fiber.id == selection.fiber_id)
    }
}

/// One `source -> target` line per origin, sources padded to a common width.
fn origin_lines(fiber: &Fiber) -> String {
    let width = fiber
        .origins
        .iter()
        .map(|origin| origin.source_id.chars().count())
        .max()
        .unwrap_or(0);

    fiber
        .origins
        .iter()
        .map(|origin| format!("{:<width$} -> {}", origin.source_id, origin.target_id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn mutual_message(fiber: &Fiber) -> String {
    format!(
        "# {} and {} depend each other!\n{}\n{}",
        fiber.source_id,
        fiber.target_id,
        "-".repeat(46),
        origin_lines(fiber)
    )
}
