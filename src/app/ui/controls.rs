use std::sync::Arc;

use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::deps::DependencyModel;

use super::super::{SearchCache, ViewModel};

const MAX_SEARCH_RESULTS: usize = 40;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (module id)")
            .on_hover_text("Fuzzy-match module ids across the whole hierarchy.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Click a match to expand every group above it.");

        let matches = self.search_results();
        let mut reveal = None;
        if !matches.is_empty() {
            egui::ScrollArea::vertical()
                .id_salt("search_results")
                .max_height(220.0)
                .show(ui, |ui| {
                    for id in matches.iter() {
                        if ui.selectable_label(false, id.as_str()).clicked() {
                            reveal = Some(id.clone());
                        }
                    }
                });
        } else if !self.search.trim().is_empty() {
            ui.small("No matching modules.");
        }
        if let Some(id) = reveal {
            self.apply_reveal(&id);
        }

        ui.separator();
        ui.label(RichText::new("Expanded groups").strong());

        let expanded = self
            .session
            .expansions()
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if self.session.expansions().is_empty() {
            ui.label("Click a group label in the graph to expand it.");
        }

        let mut collapse = None;
        egui::ScrollArea::vertical()
            .id_salt("expanded_groups")
            .max_height(200.0)
            .show(ui, |ui| {
                for id in &expanded {
                    ui.horizontal(|ui| {
                        if ui.small_button("Collapse").clicked() {
                            collapse = Some(id.clone());
                        }
                        ui.label(id.as_str());
                    });
                }
            });
        if let Some(id) = collapse {
            self.apply_toggle(&id);
        }

        let collapse_all = ui
            .add_enabled(!expanded.is_empty(), egui::Button::new("Collapse all"))
            .on_hover_text("Collapse every expanded group, innermost first.");
        if collapse_all.clicked() {
            self.apply_collapse_all();
        }

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep simulating each field's layout forces while viewing the graph.");

        let mut physics_changed = false;
        ui.collapsing("Physics tuning", |ui| {
            let config = &mut self.physics;
            physics_changed |= ui
                .add(egui::Slider::new(&mut config.link_strength, 0.0..=1.0).text("Link strength"))
                .on_hover_text("How strongly fibers pull their endpoints together.")
                .changed();
            physics_changed |= ui
                .add(
                    egui::Slider::new(&mut config.link_distance, 0.0..=200.0)
                        .text("Link distance"),
                )
                .on_hover_text("Rest length of a fiber.")
                .changed();
            physics_changed |= ui
                .add(
                    egui::Slider::new(&mut config.center_strength, 0.0..=1.0)
                        .text("Centering"),
                )
                .on_hover_text("Pull toward the middle of the enclosing field.")
                .changed();
            physics_changed |= ui
                .add(
                    egui::Slider::new(&mut config.collide_strength, 0.0..=1.0)
                        .text("Collision"),
                )
                .on_hover_text("How firmly overlapping particles are pushed apart.")
                .changed();
            physics_changed |= ui
                .add(
                    egui::Slider::new(&mut config.velocity_decay, 0.05..=0.95)
                        .text("Velocity decay"),
                )
                .on_hover_text("Fraction of velocity lost on every tick.")
                .changed();
        });

        if ui.button("Reheat layout").clicked() || physics_changed {
            self.simulations.reheat();
        }
    }
}

impl ViewModel {
    fn search_results(&mut self) -> Arc<Vec<String>> {
        if let Some(cache) = &self.search_cache
            && cache.query == self.search
        {
            return Arc::clone(&cache.matches);
        }

        let matches = Arc::new(search_matches(
            self.session.model(),
            &self.search,
            MAX_SEARCH_RESULTS,
        ));
        self.search_cache = Some(SearchCache {
            query: self.search.clone(),
            matches: Arc::clone(&matches),
        });
        matches
    }
}

/// Ids of the best fuzzy matches for `query`, best first.
fn search_matches(model: &DependencyModel, query: &str, limit: usize) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = model
        .nodes()
        .filter_map(|node| {
            fuzzy_match_score(&matcher, &node.id, query).map(|score| (score, node.id.clone()))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, id)| id).collect()
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}
