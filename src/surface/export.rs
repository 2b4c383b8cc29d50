use std::collections::BTreeMap;

use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::color::ColorMap;
use crate::data::bounds::BoundingBox;
use crate::data::filter::{visible_indices, CategoryFilter};
use crate::data::model::{FeatureCollection, LANGUAGE};

use super::popup::{Popup, PopupOptions};
use super::session::MapSession;
use super::style::{LayerDescriptor, MarkerColor, StyleDescriptor, Viewport};
use super::{CursorStyle, MapSetup, RenderSurface, SurfaceEvent};

/// Right-to-left text shaping plugin for MapLibre, loaded lazily.
pub const RTL_TEXT_PLUGIN_URL: &str =
    "https://unpkg.com/@mapbox/mapbox-gl-rtl-text@0.2.3/mapbox-gl-rtl-text.min.js";

// ---------------------------------------------------------------------------
// JsonSurface – writes the map setup as a web-map document
// ---------------------------------------------------------------------------

/// A surface that renders nothing and instead collects a JSON document a
/// MapLibre page can load: style URL, camera, controls, GeoJSON sources,
/// layers with their filters and popups.
#[derive(Debug, Default)]
pub struct JsonSurface {
    style_url: Option<String>,
    viewport: Option<JsonValue>,
    sources: BTreeMap<String, JsonValue>,
    palettes: BTreeMap<String, Vec<(String, String)>>,
    layers: Vec<JsonMap<String, JsonValue>>,
    bounds: Option<JsonValue>,
    popups: Vec<JsonValue>,
}

impl JsonSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected document.
    pub fn document(&self) -> JsonValue {
        let mut doc = json!({
            "style": self.style_url,
            "controls": ["navigation"],
            "rtlTextPlugin": { "url": RTL_TEXT_PLUGIN_URL, "lazy": true },
            "sources": self.sources,
            "layers": self.layers,
        });
        if let Some(viewport) = &self.viewport {
            doc["viewport"] = viewport.clone();
        }
        if let Some(bounds) = &self.bounds {
            doc["fitBounds"] = bounds.clone();
        }
        if !self.popups.is_empty() {
            doc["popups"] = json!(self.popups);
        }
        doc
    }
}

impl RenderSurface for JsonSurface {
    fn set_style(&mut self, style: &StyleDescriptor) {
        self.style_url = Some(style.url());
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.viewport = serde_json::to_value(viewport).ok();
    }

    fn set_source(&mut self, id: &str, data: &FeatureCollection) {
        let geojson = serde_json::to_value(data).unwrap_or(JsonValue::Null);
        self.sources.insert(
            id.to_string(),
            json!({ "type": "geojson", "data": geojson }),
        );
        let colors = ColorMap::new(LANGUAGE, &data.languages());
        self.palettes.insert(id.to_string(), colors.hex_entries());
    }

    fn add_layer(&mut self, layer: &LayerDescriptor) {
        let source = super::SOURCE_ID;
        let empty = Vec::new();
        let palette = match layer {
            LayerDescriptor::Marker(m) if matches!(m.color, MarkerColor::ByProperty { .. }) => {
                self.palettes.get(source).unwrap_or(&empty)
            }
            _ => &empty,
        };
        if let JsonValue::Object(obj) = layer.to_layer_json(source, palette) {
            self.layers.push(obj);
        }
    }

    fn set_filter(&mut self, layer_id: &str, filter: Option<&JsonValue>) {
        let Some(layer) = self
            .layers
            .iter_mut()
            .find(|l| l.get("id").and_then(JsonValue::as_str) == Some(layer_id))
        else {
            log::warn!("Filter for unknown layer '{layer_id}'");
            return;
        };
        match filter {
            Some(expr) => {
                layer.insert("filter".to_string(), expr.clone());
            }
            None => {
                layer.remove("filter");
            }
        }
    }

    fn fit_bounds(&mut self, bounds: &BoundingBox, padding: f64) {
        self.bounds = Some(json!({
            "bounds": bounds.corners(),
            "padding": padding,
        }));
    }

    fn show_popup(&mut self, popup: Popup) {
        self.popups.push(json!({
            "feature": popup.feature,
            "lngLat": [popup.longitude, popup.latitude],
            "html": popup.to_html(),
        }));
    }

    fn set_cursor(&mut self, _cursor: CursorStyle) {}
}

/// Build the full document for `data`: the session setup, then one popup per
/// feature that passes `filter` and has a point, anchored on the point.
pub fn export_document(
    setup: &MapSetup,
    data: &FeatureCollection,
    filter: CategoryFilter,
    options: PopupOptions,
) -> JsonValue {
    let mut surface = JsonSurface::new();
    let mut session = MapSession::new();
    session.initialize(&mut surface, setup, data, filter);

    for feature in visible_indices(data, filter) {
        let Some((click_lon, _)) = data.get(feature).and_then(|f| f.geometry.coordinates()) else {
            continue;
        };
        session.handle_event(
            &mut surface,
            SurfaceEvent::Click { feature, click_lon },
            data,
            options,
        );
    }
    surface.document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::CategoryFilter;
    use crate::data::geometry::derive;
    use crate::data::model::PointRecord;
    use crate::surface::preset::{MapPreset, MARKER_LAYER_ID};
    use crate::surface::session::MapSession;

    fn records() -> Vec<PointRecord> {
        vec![
            [("latitude", "47.3"), ("longitude", "11.4"), ("language", "de"), ("maptiler", "TRUE")]
                .into_iter()
                .collect(),
            [("latitude", "x"), ("longitude", "1"), ("language", "en")]
                .into_iter()
                .collect(),
        ]
    }

    #[test]
    fn exports_full_document() {
        let data = derive(&records());
        let setup = MapPreset::Filtered.setup(StyleDescriptor::new("aquarelle", Some("k".into())));
        let mut surface = JsonSurface::new();
        let mut session = MapSession::new();
        session.initialize(&mut surface, &setup, &data, CategoryFilter::Maptiler);

        let doc = surface.document();
        assert_eq!(
            doc["style"],
            json!("https://api.maptiler.com/maps/aquarelle/style.json?key=k")
        );
        assert_eq!(doc["viewport"]["zoom"], json!(1.0));

        let features = &doc["sources"]["sentences"]["data"]["features"];
        assert_eq!(features[0]["geometry"]["coordinates"], json!([11.4, 47.3]));
        assert_eq!(features[1]["geometry"], JsonValue::Null);

        let layers = doc["layers"].as_array().unwrap();
        assert_eq!(layers.len(), 2);
        for layer in layers {
            assert_eq!(layer["filter"], json!(["==", ["get", "maptiler"], "TRUE"]));
        }
        let markers = layers
            .iter()
            .find(|l| l["id"] == json!(MARKER_LAYER_ID))
            .unwrap();
        let color = markers["paint"]["circle-color"].as_array().unwrap();
        assert_eq!(color[0], json!("match"));
        // match, input, two (value, colour) pairs, fallback
        assert_eq!(color.len(), 7);

        assert_eq!(doc["fitBounds"]["bounds"], json!([[11.4, 47.3], [11.4, 47.3]]));
    }

    #[test]
    fn document_carries_popups_and_controls() {
        let mut recs = records();
        recs.push(
            [("latitude", "-41.3"), ("longitude", "174.8"), ("sentence", "Kia <ora>")]
                .into_iter()
                .collect(),
        );
        let data = derive(&recs);
        let setup = MapPreset::Compact.setup(StyleDescriptor::new("aquarelle", None));

        let doc = export_document(&setup, &data, CategoryFilter::All, PopupOptions::default());
        assert_eq!(doc["controls"], json!(["navigation"]));
        assert_eq!(doc["rtlTextPlugin"]["url"], json!(RTL_TEXT_PLUGIN_URL));

        // the feature without coordinates gets no popup
        let popups = doc["popups"].as_array().unwrap();
        assert_eq!(popups.len(), 2);
        assert_eq!(popups[1]["feature"], json!(2));
        assert_eq!(popups[1]["lngLat"], json!([174.8, -41.3]));
        assert_eq!(
            popups[1]["html"],
            json!("<strong>Sentence:</strong> Kia &lt;ora&gt;<br><strong>Language:</strong> ")
        );

        let filtered =
            export_document(&setup, &data, CategoryFilter::Maptiler, PopupOptions::default());
        let popups = filtered["popups"].as_array().unwrap();
        assert_eq!(popups.len(), 1);
        assert_eq!(popups[0]["feature"], json!(0));
    }

    #[test]
    fn clearing_filter_removes_key() {
        let data = derive(&records());
        let setup = MapPreset::Plain.setup(StyleDescriptor::new("aquarelle", None));
        let mut surface = JsonSurface::new();
        let mut session = MapSession::new();
        session.initialize(&mut surface, &setup, &data, CategoryFilter::Mango);
        session.apply_filter(&mut surface, CategoryFilter::All);

        let doc = surface.document();
        for layer in doc["layers"].as_array().unwrap() {
            assert!(layer.get("filter").is_none());
        }
        assert!(doc.get("fitBounds").is_none());
    }
}
