use eframe::egui;

use crate::state::AppState;
use crate::ui::map_view::{self, MapRenderer};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PidStopsApp {
    pub state: AppState,
    /// Map backend, chosen at startup; the filter/projection core never
    /// branches on it.
    renderer: Box<dyn MapRenderer>,
}

impl PidStopsApp {
    pub fn new(state: AppState, renderer: Box<dyn MapRenderer>) -> Self {
        Self { state, renderer }
    }
}

impl eframe::App for PidStopsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + metrics ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: filtered table ----
        egui::TopBottomPanel::bottom("table_panel")
            .default_height(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::table_panel(ui, &self.state);
            });

        // ---- Central panel: map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            map_view::central_map(ui, &self.state, self.renderer.as_ref());
        });
    }
}
