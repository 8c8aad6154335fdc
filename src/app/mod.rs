use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context as _, Result};
use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use crate::deps::{DependencyModel, EdgeKey, ModelOptions, load_records};
use crate::session::Session;
use crate::view::{ExpansionSet, Geometry};

mod graph;
mod physics;
mod render_utils;
mod ui;

use physics::{PhysicsConfig, Simulations};

/// Everything needed to (re)build a session from disk.
#[derive(Clone, Debug)]
pub struct LoadSource {
    pub input: PathBuf,
    pub options: ModelOptions,
    pub expansions: Vec<String>,
    pub geometry: Geometry,
}

pub fn load_session(source: &LoadSource) -> Result<Session> {
    let records = load_records(&source.input)?;
    let model = DependencyModel::build(&records, &source.options)
        .with_context(|| format!("invalid dependency records in {}", source.input.display()))?;
    let expansions = source.expansions.iter().map(String::as_str).collect::<ExpansionSet>();
    let session = Session::new(model, source.geometry, expansions)
        .context("failed to build the initial view")?;

    info!(
        input = %source.input.display(),
        nodes = session.model().node_count(),
        edges = session.model().edge_count(),
        "loaded dependency graph"
    );
    Ok(session)
}

pub struct DepoconApp {
    source: LoadSource,
    state: AppState,
    reload_rx: Option<Receiver<Result<Session, String>>>,
}

enum AppState {
    Loading { rx: Receiver<Result<Session, String>> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    session: Session,
    simulations: Simulations,
    physics: PhysicsConfig,
    live_physics: bool,
    pan: Vec2,
    zoom: f32,
    search: String,
    search_cache: Option<SearchCache>,
    selected_fiber: Option<SelectedFiber>,
    last_error: Option<String>,
}

/// Fuzzy matches for the last search query. The model never changes for the
/// lifetime of a view model, so the query alone keys the cache.
struct SearchCache {
    query: String,
    matches: Arc<Vec<String>>,
}

/// A fiber picked in the graph, remembered by where it lives so it can be
/// looked up again in a rebuilt tree.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SelectedFiber {
    field_id: String,
    fiber_id: EdgeKey,
}

impl DepoconApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: LoadSource) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: LoadSource) -> Receiver<Result<Session, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_session(&source).map_err(|error| {
                warn!("failed to load dependency graph: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: LoadSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }
}

impl eframe::App for DepoconApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(session) => AppState::Ready(Box::new(ViewModel::new(session))),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading dependency graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load dependency graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.source.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(session) => AppState::Ready(Box::new(ViewModel::new(session))),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
