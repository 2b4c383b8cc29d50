use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::CategoryFilter;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – category filter and legend
// ---------------------------------------------------------------------------

/// Render the left panel. Returns the newly selected category, if any.
pub fn side_panel(
    ui: &mut Ui,
    state: &mut AppState,
    filter_ui: bool,
    show_labels: &mut bool,
) -> Option<CategoryFilter> {
    ui.heading("Sentences");
    ui.separator();

    let mut selected = None;

    if filter_ui {
        ui.strong("Show");
        let current = state.category;
        egui::ComboBox::from_id_salt("category")
            .selected_text(current.label())
            .show_ui(ui, |ui: &mut Ui| {
                for category in CategoryFilter::ALL {
                    if ui
                        .selectable_label(current == category, category.label())
                        .clicked()
                        && category != current
                    {
                        selected = Some(category);
                    }
                }
            });
        ui.separator();
    }

    ui.checkbox(show_labels, "Labels");
    ui.checkbox(&mut state.popup_options.show_flags, "Flags in popups");
    ui.separator();

    if state.features.is_none() {
        ui.label("No data loaded.");
        return selected;
    }

    ui.strong("Language");
    ScrollArea::vertical()
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            if let Some(cm) = &state.color_map {
                for (language, color) in cm.legend_entries() {
                    ui.label(RichText::new(format!("● {language}")).color(color));
                }
            }
        });

    selected
}

// ---------------------------------------------------------------------------
// Bottom panel – feature table
// ---------------------------------------------------------------------------

/// Table of the features passing the current category.
pub fn feature_table(ui: &mut Ui, state: &AppState) {
    let Some(features) = &state.features else {
        return;
    };

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(40.0))
        .column(Column::auto().at_least(70.0))
        .column(Column::auto().at_least(140.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("Language");
            });
            header.col(|ui| {
                ui.strong("Position");
            });
            header.col(|ui| {
                ui.strong("Sentence");
            });
        })
        .body(|body| {
            body.rows(18.0, state.visible_indices.len(), |mut row| {
                let idx = state.visible_indices[row.index()];
                let feature = &features.features[idx];
                row.col(|ui| {
                    ui.label(idx.to_string());
                });
                row.col(|ui| {
                    ui.label(feature.language());
                });
                row.col(|ui| {
                    if feature.geometry.is_point() {
                        ui.label(feature.geometry.to_string());
                    } else {
                        ui.label(RichText::new("no coordinates").color(Color32::GRAY));
                    }
                });
                row.col(|ui| {
                    ui.label(feature.sentence());
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar. Returns a file the user picked.
pub fn top_bar(ui: &mut Ui, state: &AppState, style_name: Option<&str>) -> Option<PathBuf> {
    let mut picked = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                picked = open_file_dialog();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(features) = &state.features {
            let counts = ui.label(format!(
                "{} sentences, {} shown, {} on map, {} without coordinates",
                features.len(),
                state.visible_indices.len(),
                state.visible_points(),
                features.absent_count()
            ));
            if let Some(b) = &state.bounds {
                counts.on_hover_text(format!(
                    "Extent: {:.2}° to {:.2}° lon, {:.2}° to {:.2}° lat",
                    b.min_lon, b.max_lon, b.min_lat, b.max_lat
                ));
            }
        }

        if let Some(name) = style_name {
            ui.separator();
            ui.label(format!("Style: {name}"));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    picked
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open sentence data")
        .add_filter("Supported files", &["json", "geojson", "csv", "parquet", "pq"])
        .add_filter("GeoJSON / JSON", &["json", "geojson"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}
