use crate::color::ColorMap;
use crate::data::bounds::{bounding_box, BoundingBox};
use crate::data::filter::{visible_indices, CategoryFilter};
use crate::data::geometry::derive;
use crate::data::model::{FeatureCollection, PointRecord, LANGUAGE};
use crate::surface::popup::PopupOptions;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Derived features (None until a file is loaded). Never mutated after
    /// derivation; a new load replaces it.
    pub features: Option<FeatureCollection>,

    /// Active category selection.
    pub category: CategoryFilter,

    /// Indices of features passing the current category (cached).
    pub visible_indices: Vec<usize>,

    /// Box around every feature with a point.
    pub bounds: Option<BoundingBox>,

    /// Marker colours per language.
    pub color_map: Option<ColorMap>,

    pub popup_options: PopupOptions,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            features: None,
            category: CategoryFilter::All,
            visible_indices: Vec::new(),
            bounds: None,
            color_map: None,
            popup_options: PopupOptions::default(),
            status_message: None,
        }
    }
}

impl AppState {
    pub fn new(category: CategoryFilter, popup_options: PopupOptions) -> Self {
        Self {
            category,
            popup_options,
            ..Self::default()
        }
    }

    /// Derive features from freshly loaded records.
    pub fn set_records(&mut self, records: &[PointRecord]) {
        let features = derive(records);
        self.bounds = bounding_box(&features);
        self.color_map = Some(ColorMap::new(LANGUAGE, &features.languages()));
        self.visible_indices = visible_indices(&features, self.category);
        self.features = Some(features);
        self.status_message = None;
    }

    /// Change the category; only the visible set is recomputed.
    pub fn set_category(&mut self, category: CategoryFilter) -> bool {
        if category == self.category {
            return false;
        }
        self.category = category;
        self.refilter();
        true
    }

    /// Recompute `visible_indices` after a category change.
    pub fn refilter(&mut self) {
        if let Some(features) = &self.features {
            self.visible_indices = visible_indices(features, self.category);
        }
    }

    /// Number of visible features that can actually be drawn.
    pub fn visible_points(&self) -> usize {
        let Some(features) = &self.features else {
            return 0;
        };
        self.visible_indices
            .iter()
            .filter(|&&i| features.features[i].geometry.is_point())
            .count()
    }
}
