use eframe::egui::{self, Color32, Key, RichText, Ui};
use graph_lens::LayoutMode;
use graph_lens::physics::SimulationStatus;
use tracing::debug;

use super::GraphLensApp;

pub(super) const SEARCH_LIMIT: usize = 12;

impl GraphLensApp {
    pub(super) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("View");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Layout");
        ui.horizontal_wrapped(|ui| {
            for mode in LayoutMode::ALL {
                let selected = self.engine.layout() == mode;
                if ui.selectable_label(selected, mode.label()).clicked() && !selected {
                    self.engine.set_layout(mode);
                }
            }
        });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked()
                && let Err(error) = self.engine.zoom_in()
            {
                debug!(%error, "zoom in rejected");
            }
            if ui.button("Zoom out").clicked()
                && let Err(error) = self.engine.zoom_out()
            {
                debug!(%error, "zoom out rejected");
            }
            if ui.button("Reset").clicked() {
                self.engine.reset_view();
            }
        });

        ui.separator();
        self.draw_search(ui);

        ui.separator();
        ui.collapsing("Physics tuning", |ui| {
            ui.add_enabled_ui(self.engine.layout() == LayoutMode::Force, |ui| {
                self.draw_physics(ui);
            });
        });
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search (label or id)")
            .on_hover_text("Fuzzy match; press Enter to focus the best hit.");
        let response = ui.text_edit_singleline(&mut self.search);
        if response.changed() {
            self.search_hits = self.engine.search(&self.search, SEARCH_LIMIT);
        }

        let submitted = response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
        let mut focus = submitted
            .then(|| self.search_hits.first().map(|hit| hit.id.clone()))
            .flatten();

        let highlighted = self.engine.highlighted_node().map(str::to_owned);
        for hit in &self.search_hits {
            let selected = highlighted.as_deref() == Some(hit.id.as_str());
            if ui.selectable_label(selected, hit.id.as_str()).clicked() {
                focus = Some(hit.id.clone());
            }
        }

        if let Some(id) = focus {
            self.engine.focus_node(&id);
        }
    }

    fn draw_physics(&mut self, ui: &mut Ui) {
        let physics = &mut self.physics;
        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut physics.link_distance, 20.0..=300.0).text("Link distance"))
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut physics.charge_strength, 0.0..=80_000.0)
                    .text("Repulsion")
                    .logarithmic(true),
            )
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut physics.center_strength, 0.0..=1.0).text("Centering"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut physics.collision_strength, 0.0..=1.0).text("Collision"))
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut physics.velocity_decay, 0.05..=0.9)
                    .text("Velocity decay"),
            )
            .changed();

        if changed && let Err(error) = self.engine.set_physics(self.physics) {
            self.last_error = Some(error.to_string());
        }
    }

    pub(super) fn draw_status(&mut self, ui: &mut Ui) {
        let stats = self.engine.stats();
        ui.horizontal(|ui| {
            ui.label(format!("nodes: {}", stats.nodes));
            ui.label(format!("edges: {}", stats.edges));
            if stats.dropped_edges > 0 {
                ui.label(format!("dropped: {}", stats.dropped_edges));
            }
            ui.separator();
            let simulation = match (stats.layout, stats.simulation) {
                (LayoutMode::Force, SimulationStatus::Running) => {
                    format!("simulating (alpha {:.3})", stats.alpha)
                }
                (LayoutMode::Force, SimulationStatus::Idle) => "settled".to_owned(),
                (mode, _) => format!("{mode} layout"),
            };
            ui.label(simulation);
            ui.label(format!("zoom: {:.0}%", stats.scale * 100.0));

            if let Some(id) = &self.last_clicked {
                ui.separator();
                ui.label(format!("clicked: {id}"));
            }
            if let Some(warning) = &self.last_warning {
                ui.separator();
                ui.label(RichText::new(warning).color(Color32::from_rgb(255, 193, 7)));
            }
            if let Some(error) = &self.last_error {
                ui.separator();
                ui.label(RichText::new(error).color(Color32::from_rgb(244, 67, 54)));
            }
        });
    }
}
