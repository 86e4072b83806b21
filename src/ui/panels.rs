use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Value;
use crate::export;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let known_types = state.known_types();
    let known_districts = state.known_districts();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Name search ----
            ui.strong("Search name");
            if ui
                .text_edit_singleline(&mut state.criteria.name_query)
                .changed()
            {
                state.refilter();
            }
            ui.separator();

            // ---- Traffic type selection ----
            selection_group(
                ui,
                "Traffic type",
                &known_types,
                state,
                |state| &state.criteria.types,
                |state, value| state.toggle_type(value),
                |state| state.select_all_types(),
                |state| state.select_no_types(),
            );

            // ---- District selection ----
            selection_group(
                ui,
                "District",
                &known_districts,
                state,
                |state| &state.criteria.districts,
                |state, value| state.toggle_district(value),
                |state| state.select_all_districts(),
                |state| state.select_no_districts(),
            );

            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

/// One collapsible checkbox group over a categorical column's values, with
/// All/None shortcuts (header shows selected/total).
#[allow(clippy::too_many_arguments)]
fn selection_group(
    ui: &mut Ui,
    title: &str,
    values: &BTreeSet<String>,
    state: &mut AppState,
    selected: impl Fn(&AppState) -> &BTreeSet<String>,
    toggle: impl Fn(&mut AppState, &str),
    select_all: impl Fn(&mut AppState),
    select_none: impl Fn(&mut AppState),
) {
    let header = format!("{title}  ({}/{})", selected(state).len(), values.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    select_all(state);
                }
                if ui.small_button("None").clicked() {
                    select_none(state);
                }
            });

            for value in values {
                let mut checked = selected(state).contains(value);
                if ui.checkbox(&mut checked, value).changed() {
                    toggle(state, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let loaded = state.dataset.is_some();
            if ui
                .add_enabled(loaded, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_dialog(state, ExportFormat::Csv);
                ui.close_menu();
            }
            if ui
                .add_enabled(loaded, egui::Button::new("Export XLSX…"))
                .clicked()
            {
                export_dialog(state, ExportFormat::Xlsx);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui.button("Copy filter link").clicked() {
            let link = state.share_link();
            ui.ctx().copy_text(link);
            state.status_message = Some("Filter link copied.".to_string());
        }

        ui.separator();

        if let Some(summary) = state.summary() {
            let total = state.dataset.as_ref().map_or(0, |ds| ds.len());
            ui.label(format!("{} of {} stops", summary.row_count, total));
            if !summary.top_types.is_empty() {
                let caption: Vec<String> = summary
                    .top_types
                    .iter()
                    .map(|(name, count)| format!("{name} ({count})"))
                    .collect();
                ui.label(RichText::new(caption.join(", ")).weak());
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Data table (bottom panel)
// ---------------------------------------------------------------------------

/// Render the filtered view as a table of the visible columns.
pub fn table_panel(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    if dataset.is_empty() {
        ui.label("Dataset is empty.");
        return;
    }

    let columns = export::visible_columns(dataset);
    if columns.is_empty() {
        return;
    }

    let mut table = TableBuilder::new(ui).striped(true);
    for _ in &columns {
        table = table.column(Column::remainder().resizable(true));
    }

    table
        .header(20.0, |mut header| {
            for col in &columns {
                header.col(|ui| {
                    ui.strong(*col);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, state.visible.len(), |mut row| {
                let dataset_row = state.visible[row.index()];
                for col in &columns {
                    row.col(|ui| {
                        let text = dataset
                            .value(dataset_row, col)
                            .map(Value::to_string)
                            .unwrap_or_default();
                        ui.label(text);
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open stop data")
        .add_filter("Supported files", &["xlsx", "xls", "ods", "csv", "json"])
        .add_filter("Workbook", &["xlsx", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_dataset(&path, None);
    }
}

enum ExportFormat {
    Csv,
    Xlsx,
}

fn export_dialog(state: &mut AppState, format: ExportFormat) {
    let Some(dataset) = state.dataset.clone() else {
        return;
    };

    let (extension, default_name) = match format {
        ExportFormat::Csv => ("csv", "pid_stops_filtered.csv"),
        ExportFormat::Xlsx => ("xlsx", "pid_stops_filtered.xlsx"),
    };

    let Some(path) = rfd::FileDialog::new()
        .set_title("Export filtered stops")
        .set_file_name(default_name)
        .add_filter(extension.to_uppercase(), &[extension])
        .save_file()
    else {
        return;
    };

    let bytes = match format {
        ExportFormat::Csv => export::to_csv(&dataset, &state.visible),
        ExportFormat::Xlsx => export::to_xlsx(&dataset, &state.visible, export::EXPORT_SHEET),
    };

    let result = bytes.and_then(|bytes| {
        std::fs::write(&path, bytes).map_err(Into::into)
    });

    match result {
        Ok(()) => {
            log::info!(
                "exported {} row(s) to {}",
                state.visible.len(),
                path.display()
            );
            state.status_message = Some(format!("Exported to {}", path.display()));
        }
        Err(e) => {
            log::error!("export failed: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}
