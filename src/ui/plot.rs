use std::collections::BTreeMap;

use eframe::egui::{self, Align2, Color32, CursorIcon, Pos2, RichText, Ui, Vec2};
use egui_plot::{MarkerShape, Plot, PlotBounds, PlotPoint, PlotUi, Points, Text};
use serde_json::Value as JsonValue;

use crate::color::{to_color32, ColorMap};
use crate::data::bounds::BoundingBox;
use crate::data::model::{FeatureCollection, LANGUAGE};
use crate::surface::expression::evaluate;
use crate::surface::popup::Popup;
use crate::surface::style::{
    LabelLayer, LayerDescriptor, MarkerColor, MarkerLayer, StyleDescriptor, Viewport,
};
use crate::surface::{CursorStyle, RenderSurface, SurfaceEvent};

/// World copies drawn on each side so clusters across ±180° stay visible.
const WORLD_COPIES: [f64; 3] = [-360.0, 0.0, 360.0];

/// Smallest span (degrees) a fit-to-bounds may produce.
const MIN_FIT_SPAN: f64 = 1.0;

// ---------------------------------------------------------------------------
// PlotSurface – egui_plot map backend
// ---------------------------------------------------------------------------

/// Draws the sentence layers on a lon/lat plot. No base map is fetched; the
/// configured style is only reported.
#[derive(Default)]
pub struct PlotSurface {
    style: Option<StyleDescriptor>,
    data: FeatureCollection,
    colors: Option<ColorMap>,
    labels: Option<LabelLayer>,
    markers: Option<MarkerLayer>,
    filters: BTreeMap<String, JsonValue>,
    pending_bounds: Option<PlotBounds>,
    popup: Option<Popup>,
    cursor: CursorStyle,
    hovered: Option<usize>,
    pub show_labels: bool,
}

/// Per-frame result of drawing the plot.
struct FrameHits {
    hovered: Option<usize>,
    pointer_lon: Option<f64>,
    popup_anchor: Option<Pos2>,
}

impl PlotSurface {
    pub fn new() -> Self {
        Self {
            show_labels: true,
            ..Self::default()
        }
    }

    pub fn style(&self) -> Option<&StyleDescriptor> {
        self.style.as_ref()
    }

    /// Indices of features with a point that pass `layer_id`'s filter.
    fn visible_in(&self, layer_id: &str) -> Vec<usize> {
        let filter = self.filters.get(layer_id);
        self.data
            .points()
            .filter(|&(i, _, _)| filter.map_or(true, |expr| evaluate(expr, &self.data.features[i])))
            .map(|(i, _, _)| i)
            .collect()
    }

    fn marker_color(&self, layer: &MarkerLayer, feature: usize) -> Color32 {
        let rgb = match &layer.color {
            MarkerColor::Fixed(c) => *c,
            MarkerColor::ByProperty { property, fallback } => {
                let value = self.data.features[feature].property(property);
                let mapped = self
                    .colors
                    .as_ref()
                    .filter(|cm| cm.property == *property)
                    .zip(value)
                    .and_then(|(cm, v)| cm.color_for(v));
                match mapped {
                    Some(c) => return c.gamma_multiply(layer.opacity),
                    None => *fallback,
                }
            }
        };
        to_color32(rgb, layer.opacity)
    }

    /// Draw the map and report pointer interaction.
    pub fn show(&mut self, ui: &mut Ui) -> Vec<SurfaceEvent> {
        let pending = self.pending_bounds.take();
        let marker_ids = self
            .markers
            .as_ref()
            .map(|m| self.visible_in(&m.id))
            .unwrap_or_default();
        let label_ids = match (&self.labels, self.show_labels) {
            (Some(l), true) => self.visible_in(&l.id),
            _ => Vec::new(),
        };
        let popup_pos = self.popup.as_ref().map(|p| PlotPoint::new(p.longitude, p.latitude));

        let response = Plot::new("sentence_map")
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                if let Some(bounds) = pending {
                    plot_ui.set_plot_bounds(bounds);
                }
                let zoom = Viewport::zoom_for_span(plot_ui.plot_bounds().width());

                let mut hovered = None;
                if let Some(layer) = &self.markers {
                    let radius = layer.radius.at_zoom(zoom);
                    self.draw_markers(plot_ui, layer, &marker_ids, radius);
                    hovered = self.hit_test(plot_ui, &marker_ids, radius + layer.stroke_width / 2.0);
                }
                if let Some(layer) = &self.labels {
                    self.draw_labels(plot_ui, layer, &label_ids);
                }

                FrameHits {
                    hovered,
                    pointer_lon: plot_ui.pointer_coordinate().map(|p| p.x),
                    popup_anchor: popup_pos.map(|p| plot_ui.screen_from_plot(p)),
                }
            });

        let hits = response.inner;
        let mut events = Vec::new();

        if hits.hovered != self.hovered {
            if self.hovered.is_some() {
                events.push(SurfaceEvent::Leave);
            }
            if let Some(feature) = hits.hovered {
                events.push(SurfaceEvent::Enter { feature });
            }
            self.hovered = hits.hovered;
        }

        if response.response.clicked() {
            match (hits.hovered, hits.pointer_lon) {
                (Some(feature), Some(click_lon)) => {
                    events.push(SurfaceEvent::Click { feature, click_lon })
                }
                _ => self.popup = None,
            }
        }

        if self.cursor == CursorStyle::Pointer {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        if let Some(anchor) = hits.popup_anchor {
            self.show_popup_window(ui.ctx(), anchor);
        }

        events
    }

    fn draw_markers(&self, plot_ui: &mut PlotUi, layer: &MarkerLayer, ids: &[usize], radius: f32) {
        let mut by_color: BTreeMap<[u8; 4], (Color32, Vec<[f64; 2]>)> = BTreeMap::new();
        let mut outline: Vec<[f64; 2]> = Vec::new();

        for &i in ids {
            let Some((lon, lat)) = self.data.features[i].geometry.coordinates() else {
                continue;
            };
            let color = self.marker_color(layer, i);
            let entry = by_color
                .entry(color.to_array())
                .or_insert_with(|| (color, Vec::new()));
            for shift in WORLD_COPIES {
                entry.1.push([lon + shift, lat]);
                outline.push([lon + shift, lat]);
            }
        }

        if layer.stroke_width > 0.0 && !outline.is_empty() {
            plot_ui.points(
                Points::new(outline)
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(radius + layer.stroke_width / 2.0)
                    .color(to_color32(layer.stroke_color, layer.stroke_opacity)),
            );
        }

        for (color, points) in by_color.into_values() {
            plot_ui.points(
                Points::new(points)
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(radius)
                    .color(color),
            );
        }
    }

    fn draw_labels(&self, plot_ui: &mut PlotUi, layer: &LabelLayer, ids: &[usize]) {
        let color = to_color32(layer.color, 1.0);
        let halo = to_color32(layer.halo_color, 0.6);
        let offset = Vec2::new(layer.offset[0], layer.offset[1]) * layer.size;

        for &i in ids {
            let feature = &self.data.features[i];
            let Some((lon, lat)) = feature.geometry.coordinates() else {
                continue;
            };
            let text = layer.text_for(feature);
            for shift in WORLD_COPIES {
                let screen = plot_ui.screen_from_plot(PlotPoint::new(lon + shift, lat));
                let anchor = plot_ui.plot_from_screen(screen + offset);
                plot_ui.text(
                    Text::new(
                        anchor,
                        RichText::new(text.as_str())
                            .size(layer.size)
                            .color(color)
                            .background_color(halo),
                    )
                    .anchor(Align2::CENTER_TOP),
                );
            }
        }
    }

    /// Nearest marker (any world copy) within `radius` screen pixels.
    fn hit_test(&self, plot_ui: &PlotUi, ids: &[usize], radius: f32) -> Option<usize> {
        let pointer = plot_ui.pointer_coordinate()?;
        let pointer = plot_ui.screen_from_plot(pointer);

        ids.iter()
            .filter_map(|&i| {
                let (lon, lat) = self.data.features[i].geometry.coordinates()?;
                WORLD_COPIES
                    .iter()
                    .map(|shift| {
                        plot_ui
                            .screen_from_plot(PlotPoint::new(lon + shift, lat))
                            .distance(pointer)
                    })
                    .min_by(f32::total_cmp)
                    .map(|d| (i, d))
            })
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn show_popup_window(&mut self, ctx: &egui::Context, anchor: Pos2) {
        let Some(popup) = &self.popup else {
            return;
        };
        let mut open = true;
        egui::Window::new("Sentence")
            .id(egui::Id::new("feature_popup"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .pivot(Align2::CENTER_BOTTOM)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                ui.label(RichText::new(&popup.sentence).strong());
                ui.label(format!("Language: {}", popup.language));
                for (name, value) in &popup.flags {
                    ui.label(format!("{name}: {value}"));
                }
            });
        if !open {
            self.popup = None;
        }
    }
}

impl RenderSurface for PlotSurface {
    fn set_style(&mut self, style: &StyleDescriptor) {
        self.style = Some(style.clone());
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        let width = Viewport::span_at_zoom(viewport.zoom);
        let [lon, lat] = viewport.center;
        self.pending_bounds = Some(PlotBounds::from_min_max(
            [lon - width / 2.0, lat - width / 4.0],
            [lon + width / 2.0, lat + width / 4.0],
        ));
    }

    fn set_source(&mut self, _id: &str, data: &FeatureCollection) {
        self.data = data.clone();
        self.colors = Some(ColorMap::new(LANGUAGE, &data.languages()));
        self.hovered = None;
        self.popup = None;
    }

    fn add_layer(&mut self, layer: &LayerDescriptor) {
        match layer {
            LayerDescriptor::Label(l) => self.labels = Some(l.clone()),
            LayerDescriptor::Marker(m) => self.markers = Some(m.clone()),
        }
    }

    fn set_filter(&mut self, layer_id: &str, filter: Option<&JsonValue>) {
        match filter {
            Some(expr) => {
                self.filters.insert(layer_id.to_string(), expr.clone());
            }
            None => {
                self.filters.remove(layer_id);
            }
        }
        let hidden = self
            .popup
            .as_ref()
            .is_some_and(|p| !self.visible_in(layer_id).contains(&p.feature));
        if hidden {
            self.popup = None;
        }
    }

    fn fit_bounds(&mut self, bounds: &BoundingBox, padding: f64) {
        let b = bounds.padded(padding);
        let (lon, lat) = b.center();
        let half_w = b.width().max(MIN_FIT_SPAN) / 2.0;
        let half_h = b.height().max(MIN_FIT_SPAN) / 2.0;
        self.pending_bounds = Some(PlotBounds::from_min_max(
            [lon - half_w, lat - half_h],
            [lon + half_w, lat + half_h],
        ));
    }

    fn show_popup(&mut self, popup: Popup) {
        self.popup = Some(popup);
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }
}
