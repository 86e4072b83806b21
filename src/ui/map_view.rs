use std::collections::BTreeMap;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::map::{self, MapProjection};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Renderer interface
// ---------------------------------------------------------------------------

/// A map rendering backend.
///
/// The core always produces the full [`MapProjection`]; a renderer is free
/// to use only the positions. Filtering and projection never branch on
/// which renderer is active.
pub trait MapRenderer {
    fn draw(&self, ui: &mut Ui, projection: &MapProjection);
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the central map panel: placeholder before a dataset is loaded,
/// an explicit "no stops match" state for an empty view, otherwise the map.
pub fn central_map(ui: &mut Ui, state: &AppState, renderer: &dyn MapRenderer) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data file to view stops  (File → Open…)");
        });
        return;
    };

    // Empty view: never project (a centroid of zero rows is undefined).
    match map::project_for_map(dataset, &state.visible, &state.colors) {
        Some(projection) => renderer.draw(ui, &projection),
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(
                    RichText::new("No stops match the current filter.")
                        .color(Color32::ORANGE)
                        .heading(),
                );
            });
        }
    }
}

/// Initial viewport derived from the projection: `(x_range, y_range)`.
///
/// The zoom hint widens the view beyond the data's bounding box
/// (auto-bounds only ever grow through `include_*`).
fn initial_view(projection: &MapProjection) -> ([f64; 2], [f64; 2]) {
    let (center_lat, center_lon) = projection.center;
    let half_span = 180.0 / f64::powi(2.0, i32::from(projection.zoom));
    (
        [center_lon - half_span, center_lon + half_span],
        [center_lat - half_span / 2.0, center_lat + half_span / 2.0],
    )
}

/// Screen units of longitude per unit of latitude: one degree of longitude
/// spans cos(lat) of a latitude degree.
fn lonlat_aspect(projection: &MapProjection) -> f32 {
    let (center_lat, _) = projection.center;
    (1.0 / center_lat.to_radians().cos().max(0.01)) as f32
}

// ---------------------------------------------------------------------------
// Rich renderer: colored scatter with a per-type legend
// ---------------------------------------------------------------------------

/// Grid resolution of the density layer (cells across the larger axis).
const DENSITY_CELLS: usize = 24;

pub struct RichMapRenderer;

impl MapRenderer for RichMapRenderer {
    fn draw(&self, ui: &mut Ui, projection: &MapProjection) {
        // Group points by traffic type so each type is one legend entry.
        let mut groups: BTreeMap<String, (Color32, Vec<[f64; 2]>)> = BTreeMap::new();
        for point in &projection.points {
            let name = point
                .traffic_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            let color = Color32::from_rgb(point.color[0], point.color[1], point.color[2]);
            groups
                .entry(name)
                .or_insert_with(|| (color, Vec::new()))
                .1
                .push([point.lon, point.lat]);
        }

        let (x_range, y_range) = initial_view(projection);

        Plot::new("stop_map")
            .legend(Legend::default())
            .data_aspect(lonlat_aspect(projection))
            .x_axis_label("lon")
            .y_axis_label("lat")
            .include_x(x_range[0])
            .include_x(x_range[1])
            .include_y(y_range[0])
            .include_y(y_range[1])
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                // Translucent density layer under the scatter (the richer
                // rendering the basic fallback omits).
                let bins = map::density_bins(&projection.points, DENSITY_CELLS);
                let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1);
                for bin in &bins {
                    let alpha =
                        20.0 + 100.0 * bin.count as f32 / max_count as f32;
                    let points = Points::new(PlotPoints::from(vec![[bin.lon, bin.lat]]))
                        .color(Color32::from_rgba_unmultiplied(255, 160, 0, alpha as u8))
                        .radius(16.0);
                    plot_ui.points(points);
                }

                for (name, (color, positions)) in groups {
                    let points = Points::new(PlotPoints::from(positions))
                        .name(&name)
                        .color(color)
                        .radius(2.5);
                    plot_ui.points(points);
                }

                // Stop names are readable only on small views.
                if projection.points.len() <= 25 {
                    for point in &projection.points {
                        if let Some(label) = &point.label {
                            plot_ui.text(Text::new(
                                PlotPoint::new(point.lon, point.lat),
                                RichText::new(label).small(),
                            ));
                        }
                    }
                }
            });
    }
}

// ---------------------------------------------------------------------------
// Basic renderer: position-only fallback
// ---------------------------------------------------------------------------

pub struct BasicMapRenderer;

impl MapRenderer for BasicMapRenderer {
    fn draw(&self, ui: &mut Ui, projection: &MapProjection) {
        let positions: Vec<[f64; 2]> = projection
            .points
            .iter()
            .map(|p| [p.lon, p.lat])
            .collect();

        let (x_range, y_range) = initial_view(projection);

        Plot::new("stop_map_basic")
            .data_aspect(lonlat_aspect(projection))
            .x_axis_label("lon")
            .y_axis_label("lat")
            .include_x(x_range[0])
            .include_x(x_range[1])
            .include_y(y_range[0])
            .include_y(y_range[1])
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                let points = Points::new(PlotPoints::from(positions))
                    .name("stops")
                    .color(Color32::LIGHT_BLUE)
                    .radius(2.5);
                plot_ui.points(points);
            });
    }
}
