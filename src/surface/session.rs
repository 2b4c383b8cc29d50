use crate::data::bounds::bounding_box;
use crate::data::filter::CategoryFilter;
use crate::data::model::FeatureCollection;

use super::popup::{Popup, PopupOptions};
use super::{CursorStyle, MapSetup, RenderSurface, SurfaceEvent, SOURCE_ID};

// ---------------------------------------------------------------------------
// MapSession – drives a RenderSurface
// ---------------------------------------------------------------------------

/// Owns the once-per-session setup of a surface and routes updates to it.
#[derive(Debug, Default)]
pub struct MapSession {
    initialized: bool,
    layer_ids: Vec<String>,
    fit_padding: Option<f64>,
}

impl MapSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Configure style, viewport, source, layers and filter.
    ///
    /// Runs at most once; later calls touch nothing and return `false`.
    pub fn initialize(
        &mut self,
        surface: &mut dyn RenderSurface,
        setup: &MapSetup,
        data: &FeatureCollection,
        filter: CategoryFilter,
    ) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        self.layer_ids = setup.layers.iter().map(|l| l.id().to_string()).collect();
        self.fit_padding = setup.fit_padding;

        surface.set_style(&setup.style);
        surface.set_viewport(&setup.viewport);
        surface.set_source(SOURCE_ID, data);
        for layer in &setup.layers {
            surface.add_layer(layer);
        }
        self.apply_filter(surface, filter);
        self.fit(surface, data);

        log::info!(
            "Map initialised: style '{}', {} layers, {} features",
            setup.style.name,
            self.layer_ids.len(),
            data.len()
        );
        true
    }

    /// Replace the source data after a new file was loaded.
    pub fn load_data(&mut self, surface: &mut dyn RenderSurface, data: &FeatureCollection) {
        if !self.initialized {
            return;
        }
        surface.set_source(SOURCE_ID, data);
        self.fit(surface, data);
    }

    /// Push the category's filter expression to every layer.
    pub fn apply_filter(&self, surface: &mut dyn RenderSurface, filter: CategoryFilter) {
        let expression = filter.expression();
        for id in &self.layer_ids {
            surface.set_filter(id, expression.as_ref());
        }
        log::debug!("Applied category filter {filter}");
    }

    /// React to pointer interaction on the surface.
    pub fn handle_event(
        &self,
        surface: &mut dyn RenderSurface,
        event: SurfaceEvent,
        data: &FeatureCollection,
        options: PopupOptions,
    ) {
        match event {
            SurfaceEvent::Click { feature, click_lon } => {
                let popup = data
                    .get(feature)
                    .and_then(|f| Popup::for_feature(feature, f, click_lon, options));
                if let Some(popup) = popup {
                    surface.show_popup(popup);
                }
            }
            SurfaceEvent::Enter { feature } => {
                log::trace!("Pointer over feature {feature}");
                surface.set_cursor(CursorStyle::Pointer);
            }
            SurfaceEvent::Leave => surface.set_cursor(CursorStyle::Default),
        }
    }

    fn fit(&self, surface: &mut dyn RenderSurface, data: &FeatureCollection) {
        let Some(padding) = self.fit_padding else {
            return;
        };
        if let Some(bbox) = bounding_box(data) {
            surface.fit_bounds(&bbox, padding);
        }
    }
}
