use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use eframe::egui::{self, Context};
use taxograph::engine::{EngineConfig, EngineError, GraphEngine};
use taxograph::graph::GraphData;
use taxograph::graph::dataset::load_dataset;
use taxograph::loader::LoaderEvent;
use tracing::{info, warn};

mod panels;
mod render_utils;
mod view;

#[derive(Clone, Copy, Debug)]
pub enum LayoutMode {
    Animated,
    Static { max_ticks: usize },
}

pub struct TaxographApp {
    graph_path: PathBuf,
    config: EngineConfig,
    mode: LayoutMode,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphData, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: GraphEngine,
    events: Receiver<LoaderEvent>,
    mode: LayoutMode,
    needs_fit: bool,
    connected_depth: usize,
    last_batch: Option<(usize, usize)>,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl TaxographApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        graph_path: PathBuf,
        config: EngineConfig,
        mode: LayoutMode,
    ) -> Self {
        let state = Self::start_load(graph_path.clone(), &config);
        Self {
            graph_path,
            config,
            mode,
            state,
        }
    }

    fn start_load(graph_path: PathBuf, config: &EngineConfig) -> AppState {
        let (tx, rx) = mpsc::channel();
        let radius = config.radius;

        thread::spawn(move || {
            let result = load_dataset(&graph_path, radius).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        AppState::Loading { rx }
    }
}

impl eframe::App for TaxographApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(graph) => match ViewModel::new(graph, self.config.clone(), self.mode) {
                            Ok(model) => AppState::Ready(Box::new(model)),
                            Err(error) => AppState::Error(error.to_string()),
                        },
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading taxonomy graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load taxonomy graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.graph_path.clone(), &self.config));
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(graph: GraphData, config: EngineConfig, mode: LayoutMode) -> Result<Self, EngineError> {
        let mut engine = GraphEngine::new(config);
        let events = engine.subscribe();
        let batch = engine.load_graph(Arc::new(graph))?;
        if let LayoutMode::Static { max_ticks } = mode {
            let ticks = engine.settle(max_ticks)?;
            info!(ticks, "initial layout settled");
        }
        Ok(Self {
            engine,
            events,
            mode,
            needs_fit: true,
            connected_depth: 1,
            last_batch: Some((batch.nodes.len(), batch.links.len())),
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        })
    }

    /// Logs engine failures; the viewer keeps running on the last good state.
    fn report<T>(result: Result<T, EngineError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(%error, "engine call failed");
                None
            }
        }
    }

    fn drain_events(&mut self) {
        for event in self.events.try_iter() {
            if let LoaderEvent::NodesChanged {
                added,
                active_links,
                ..
            } = event
                && !added.is_empty()
            {
                self.last_batch = Some((added.len(), active_links));
            }
        }
    }

    fn update_fps_counter(&mut self, ctx: &Context) {
        const FPS_SAMPLE_WINDOW: usize = 180;

        let dt = ctx.input(|input| input.stable_dt);
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    fn show(&mut self, ctx: &Context) {
        self.update_fps_counter(ctx);
        self.drain_events();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }
}
