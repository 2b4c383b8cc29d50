/// Rendering surface: the capability interface the map backends implement.
///
/// ```text
///   MapSession ──(style, viewport, source, layers, filter, bounds)──► RenderSurface
///        ▲                                                              │
///        └──────────────────── SurfaceEvent (click / enter / leave) ────┘
/// ```
///
/// The data layer never talks to a backend directly; swapping the egui plot
/// for the JSON exporter (or anything else) leaves derivation and filtering
/// untouched.

pub mod export;
pub mod expression;
pub mod popup;
pub mod preset;
pub mod session;
pub mod style;

use serde_json::Value as JsonValue;

use crate::data::bounds::BoundingBox;
use crate::data::model::FeatureCollection;

use self::popup::Popup;
use self::style::{LayerDescriptor, StyleDescriptor, Viewport};

/// Id of the single data source holding the sentences.
pub const SOURCE_ID: &str = "sentences";

/// Pointer style over the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// Interaction reported back by a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// A marker was clicked; `click_lon` is where the pointer was.
    Click { feature: usize, click_lon: f64 },
    /// Pointer moved onto a marker.
    Enter { feature: usize },
    /// Pointer left the marker it was over.
    Leave,
}

/// What a map backend must accept.
pub trait RenderSurface {
    fn set_style(&mut self, style: &StyleDescriptor);
    fn set_viewport(&mut self, viewport: &Viewport);
    /// Add the source, or replace its data if it already exists.
    fn set_source(&mut self, id: &str, data: &FeatureCollection);
    fn add_layer(&mut self, layer: &LayerDescriptor);
    /// `None` removes the layer's filter.
    fn set_filter(&mut self, layer_id: &str, filter: Option<&JsonValue>);
    fn fit_bounds(&mut self, bounds: &BoundingBox, padding: f64);
    fn show_popup(&mut self, popup: Popup);
    fn set_cursor(&mut self, cursor: CursorStyle);
}

/// Everything needed to set up a surface once.
#[derive(Debug, Clone)]
pub struct MapSetup {
    pub style: StyleDescriptor,
    pub viewport: Viewport,
    pub layers: Vec<LayerDescriptor>,
    /// Padding in degrees when fitting to the data, `None` disables fitting.
    pub fit_padding: Option<f64>,
}
