use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use super::model::{Feature, FeatureCollection};

/// Literal marker a flag property must equal to count as set.
pub const TRUTHY_MARKER: &str = "TRUE";

// ---------------------------------------------------------------------------
// CategoryFilter – the user-selected visibility selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Mango,
    Maplibre,
    Maptiler,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected one of: all, mango, maplibre, maptiler)")]
pub struct ParseCategoryError(pub String);

impl CategoryFilter {
    /// Every value, in selection-control order.
    pub const ALL: [CategoryFilter; 4] = [
        CategoryFilter::All,
        CategoryFilter::Mango,
        CategoryFilter::Maplibre,
        CategoryFilter::Maptiler,
    ];

    /// Name of the flag property this category tests, `None` for `All`.
    pub fn flag_property(self) -> Option<&'static str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Mango => Some("mango"),
            CategoryFilter::Maplibre => Some("maplibre"),
            CategoryFilter::Maptiler => Some("maptiler"),
        }
    }

    /// Declarative form for a rendering surface, e.g.
    /// `["==", ["get", "mango"], "TRUE"]`. `None` clears any filter.
    pub fn expression(self) -> Option<JsonValue> {
        self.flag_property()
            .map(|prop| json!(["==", ["get", prop], TRUTHY_MARKER]))
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Mango => "Mango",
            CategoryFilter::Maplibre => "MapLibre",
            CategoryFilter::Maptiler => "MapTiler",
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryFilter {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(CategoryFilter::All),
            "mango" => Ok(CategoryFilter::Mango),
            "maplibre" => Ok(CategoryFilter::Maplibre),
            "maptiler" => Ok(CategoryFilter::Maptiler),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate evaluation
// ---------------------------------------------------------------------------

/// Build the visibility predicate for a category.
///
/// `All` accepts everything, including features without a point; the
/// rendering surface drops those on its own.
pub fn predicate(filter: CategoryFilter) -> impl Fn(&Feature) -> bool {
    let flag = filter.flag_property();
    move |feature: &Feature| match flag {
        None => true,
        Some(prop) => feature.property(prop) == Some(TRUTHY_MARKER),
    }
}

/// Indices of features accepted by `filter`, in collection order.
pub fn visible_indices(collection: &FeatureCollection, filter: CategoryFilter) -> Vec<usize> {
    let accepts = predicate(filter);
    collection
        .features
        .iter()
        .enumerate()
        .filter(|&(_, f)| accepts(f))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::derive;
    use crate::data::model::PointRecord;

    fn sample() -> FeatureCollection {
        let records: Vec<PointRecord> = vec![
            [
                ("latitude", "47.3"),
                ("longitude", "11.4"),
                ("sentence", "Hello"),
                ("mango", "TRUE"),
            ]
            .into_iter()
            .collect(),
            [
                ("latitude", "bad"),
                ("longitude", "11.4"),
                ("sentence", "Oops"),
                ("mango", "FALSE"),
            ]
            .into_iter()
            .collect(),
            [("latitude", "1"), ("longitude", "2"), ("mango", "true"), ("maptiler", "TRUE")]
                .into_iter()
                .collect(),
        ];
        derive(&records)
    }

    #[test]
    fn all_accepts_everything() {
        let fc = sample();
        let accepts = predicate(CategoryFilter::All);
        assert!(fc.features.iter().all(|f| accepts(f)));
        assert_eq!(visible_indices(&fc, CategoryFilter::All), vec![0, 1, 2]);
    }

    #[test]
    fn flag_must_equal_marker_exactly() {
        let fc = sample();
        assert_eq!(visible_indices(&fc, CategoryFilter::Mango), vec![0]);
        assert_eq!(visible_indices(&fc, CategoryFilter::Maptiler), vec![2]);
        assert!(visible_indices(&fc, CategoryFilter::Maplibre).is_empty());
    }

    #[test]
    fn predicate_is_repeatable() {
        let fc = sample();
        let first = visible_indices(&fc, CategoryFilter::Mango);
        let second = visible_indices(&fc, CategoryFilter::Mango);
        assert_eq!(first, second);
    }

    #[test]
    fn expressions() {
        assert_eq!(CategoryFilter::All.expression(), None);
        assert_eq!(
            CategoryFilter::Maplibre.expression(),
            Some(json!(["==", ["get", "maplibre"], "TRUE"]))
        );
    }

    #[test]
    fn parses_names() {
        assert_eq!("MapLibre".parse::<CategoryFilter>(), Ok(CategoryFilter::Maplibre));
        assert_eq!(" mango ".parse::<CategoryFilter>(), Ok(CategoryFilter::Mango));
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert!("papaya".parse::<CategoryFilter>().is_err());
        for c in CategoryFilter::ALL {
            assert_eq!(c.to_string().parse::<CategoryFilter>(), Ok(c));
        }
    }
}
