use std::path::PathBuf;

use eframe::egui::{self, Context, Pos2};
use graph_lens::config::PhysicsConfig;
use graph_lens::{Engine, EngineEvent, SearchHit};
use tracing::{info, warn};

mod canvas;
mod controls;

pub struct GraphLensApp {
    engine: Engine,
    graph_path: PathBuf,
    search: String,
    search_hits: Vec<SearchHit>,
    physics: PhysicsConfig,
    pointer_inside: bool,
    /// Last pointer position over the window, in canvas coordinates.
    last_pointer: Option<Pos2>,
    last_clicked: Option<String>,
    last_warning: Option<String>,
    last_error: Option<String>,
}

impl GraphLensApp {
    pub fn new(engine: Engine, graph_path: PathBuf) -> Self {
        let physics = engine.config().physics;
        let mut app = Self {
            engine,
            graph_path,
            search: String::new(),
            search_hits: Vec::new(),
            physics,
            pointer_inside: false,
            last_pointer: None,
            last_clicked: None,
            last_warning: None,
            last_error: None,
        };
        app.collect_events();
        app
    }

    /// Re-reads the graph file. A file that fails to read, parse or validate
    /// leaves the current graph on screen.
    fn reload(&mut self) {
        let result = crate::read_payload(&self.graph_path)
            .and_then(|payload| self.engine.load(payload).map_err(anyhow::Error::from));

        match result {
            Ok(report) => {
                info!(
                    path = %self.graph_path.display(),
                    nodes = report.nodes,
                    "graph reloaded"
                );
                self.last_error = None;
                self.last_warning = None;
                self.last_clicked = None;
                self.search_hits = self.engine.search(&self.search, controls::SEARCH_LIMIT);
            }
            Err(error) => {
                let message = format!("{error:#}");
                warn!(error = %message, "reload failed, keeping the current graph");
                self.last_error = Some(message);
            }
        }
    }

    fn collect_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::Warning(warning) => self.last_warning = Some(warning.to_string()),
                EngineEvent::NodeClicked { id } => self.last_clicked = Some(id),
                _ => {}
            }
        }
    }
}

impl eframe::App for GraphLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut reload_requested = false;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graph-lens");
                    ui.separator();
                    ui.label(self.graph_path.display().to_string());
                    if ui.button("Reload").clicked() {
                        reload_requested = true;
                    }
                });
            });

        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_status(ui));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));

        if reload_requested {
            self.reload();
        }
        self.collect_events();
    }
}
