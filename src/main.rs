mod app;
mod color;
mod data;
mod export;
mod map;
mod query;
mod state;
mod summary;
mod ui;

use std::path::PathBuf;

use app::PidStopsApp;
use eframe::egui;
use state::AppState;
use ui::map_view::{BasicMapRenderer, MapRenderer, RichMapRenderer};

const DEFAULT_DATASET: &str = "data/stops_clean.xlsx";

/// Usage: `pid-stops [--basic-map] [dataset-path] [filter-query]`
///
/// `filter-query` is a shareable link produced by "Copy filter link",
/// e.g. `types=bus,tram&districts=AB&q=and`.
fn main() -> eframe::Result {
    env_logger::init();

    let mut basic_map = false;
    let mut positional: Vec<String> = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--basic-map" {
            basic_map = true;
        } else {
            positional.push(arg);
        }
    }

    let dataset_path = PathBuf::from(
        positional
            .first()
            .map_or(DEFAULT_DATASET, String::as_str),
    );
    let initial = positional.get(1).map(|qs| query::decode(qs));

    let mut app_state = AppState::default();
    app_state.load_dataset(&dataset_path, initial);

    let renderer: Box<dyn MapRenderer> = if basic_map {
        Box::new(BasicMapRenderer)
    } else {
        Box::new(RichMapRenderer)
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PID Stops",
        options,
        Box::new(|_cc| Ok(Box::new(PidStopsApp::new(app_state, renderer)))),
    )
}
