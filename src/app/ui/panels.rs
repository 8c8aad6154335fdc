use eframe::egui::{self, Align, Color32, Context, Layout, Vec2};
use tracing::warn;

use crate::session::{Session, SessionError};

use super::super::physics::{PhysicsConfig, Simulations};
use super::super::{LoadSource, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(mut session: Session) -> Self {
        let mut simulations = Simulations::default();
        simulations.restart(session.present());

        Self {
            session,
            simulations,
            physics: PhysicsConfig::default(),
            live_physics: true,
            pan: Vec2::ZERO,
            zoom: 1.0,
            search: String::new(),
            search_cache: None,
            selected_fiber: None,
            last_error: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &LoadSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("depocon");
                    ui.separator();
                    ui.label(format!("input: {}", source.input.display()));
                    ui.label(format!("nodes: {}", self.session.model().node_count()));
                    ui.label(format!("edges: {}", self.session.model().edge_count()));
                    ui.label(format!("expanded: {}", self.session.expansions().len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload records"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        if let Some(error) = &self.last_error {
                            ui.colored_label(Color32::LIGHT_RED, error.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading dependency graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn visible_graph_text(&self) -> String {
        let root = self.session.field();
        let mut particles = 0;
        let mut fibers = root.fibers.len();
        root.walk(&mut |particle| {
            particles += 1;
            if let Some(field) = particle.as_field() {
                fibers += field.fibers.len();
            }
        });
        format!("visible: {particles} particles / {fibers} fibers")
    }

    pub(in crate::app) fn apply_toggle(&mut self, id: &str) {
        let result = self.session.toggle(id).map(|_| ());
        self.after_rebuild("toggle", result);
    }

    pub(in crate::app) fn apply_reveal(&mut self, id: &str) {
        let result = self.session.reveal(id).map(|_| ());
        self.after_rebuild("reveal", result);
    }

    pub(in crate::app) fn apply_collapse_all(&mut self) {
        let result = self.session.collapse_all();
        self.after_rebuild("collapse all", result);
    }

    /// Hands the rebuilt tree back to the renderer and restarts the
    /// per-field simulations on it.
    fn after_rebuild(&mut self, action: &str, result: Result<(), SessionError>) {
        match result {
            Ok(()) => self.last_error = None,
            Err(error) => {
                warn!(action, "rebuild failed: {error}");
                self.last_error = Some(format!("{action} failed: {error}"));
            }
        }

        self.simulations.restart(self.session.present());
        if self.selected_fiber_details().is_none() {
            self.selected_fiber = None;
        }
    }
}
