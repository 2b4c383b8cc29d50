use std::path::Path;

use eframe::egui;

use crate::config::MapConfig;
use crate::data::filter::CategoryFilter;
use crate::data::loader::load_file;
use crate::data::model::FeatureCollection;
use crate::state::AppState;
use crate::surface::session::MapSession;
use crate::surface::MapSetup;
use crate::ui::plot::PlotSurface;
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SentenceMapApp {
    pub state: AppState,
    surface: PlotSurface,
    session: MapSession,
    setup: MapSetup,
    filter_ui: bool,
}

impl SentenceMapApp {
    pub fn new(config: &MapConfig) -> Self {
        let mut app = Self {
            state: AppState::new(config.category, config.popup),
            surface: PlotSurface::new(),
            session: MapSession::new(),
            setup: config.setup(),
            filter_ui: config.preset.filter_ui(),
        };
        if let Some(path) = &config.data {
            app.load(path);
        }
        app
    }

    /// Load a file, derive features and hand them to the surface.
    fn load(&mut self, path: &Path) {
        match load_file(path) {
            Ok(records) => {
                log::info!("Loaded {} records from {}", records.len(), path.display());
                self.state.set_records(&records);
                if let Some(features) = &self.state.features {
                    self.session.load_data(&mut self.surface, features);
                }
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn set_category(&mut self, category: CategoryFilter) {
        if self.state.set_category(category) {
            self.session.apply_filter(&mut self.surface, category);
        }
    }
}

impl eframe::App for SentenceMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.session.is_initialized() {
            let empty = FeatureCollection::default();
            let features = self.state.features.as_ref().unwrap_or(&empty);
            self.session
                .initialize(&mut self.surface, &self.setup, features, self.state.category);
        }

        // ---- Top panel: menu bar ----
        let style_name = self.surface.style().map(|s| s.name.clone());
        let picked = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| panels::top_bar(ui, &self.state, style_name.as_deref()))
            .inner;
        if let Some(path) = picked {
            self.load(&path);
        }

        // ---- Left side panel: category + legend ----
        let selected = egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(
                    ui,
                    &mut self.state,
                    self.filter_ui,
                    &mut self.surface.show_labels,
                )
            })
            .inner;
        if let Some(category) = selected {
            self.set_category(category);
        }

        // ---- Bottom panel: feature table ----
        egui::TopBottomPanel::bottom("feature_table")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                panels::feature_table(ui, &self.state);
            });

        // ---- Central panel: map ----
        let events = egui::CentralPanel::default()
            .show(ctx, |ui| self.surface.show(ui))
            .inner;
        if let Some(features) = &self.state.features {
            for event in events {
                self.session.handle_event(
                    &mut self.surface,
                    event,
                    features,
                    self.state.popup_options,
                );
            }
        }
    }
}
