use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// PointRecord – one row of the input table
// ---------------------------------------------------------------------------

/// Well-known property names.
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const SENTENCE: &str = "sentence";
pub const LANGUAGE: &str = "language";

/// A raw input row: named string properties, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointRecord {
    pub properties: BTreeMap<String, String>,
}

impl PointRecord {
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }

    /// Look up a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for PointRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Derived geometry of a feature. Never hand-authored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Point { longitude: f64, latitude: f64 },
    Absent,
}

impl Geometry {
    /// `(lon, lat)` when the feature has a point.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match *self {
            Geometry::Point {
                longitude,
                latitude,
            } => Some((longitude, latitude)),
            Geometry::Absent => None,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point { .. })
    }
}

/// GeoJSON form: `{"type":"Point","coordinates":[lon,lat]}` or `null`.
impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Geometry::Point {
                longitude,
                latitude,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "Point")?;
                map.serialize_entry("coordinates", &[longitude, latitude])?;
                map.end()
            }
            Geometry::Absent => serializer.serialize_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Feature / FeatureCollection
// ---------------------------------------------------------------------------

/// One record's properties paired with exactly one geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub properties: BTreeMap<String, String>,
    pub geometry: Geometry,
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn sentence(&self) -> &str {
        self.property(SENTENCE).unwrap_or_default()
    }

    pub fn language(&self) -> &str {
        self.property(LANGUAGE).unwrap_or_default()
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Feature", 3)?;
        s.serialize_field("type", "Feature")?;
        s.serialize_field("properties", &self.properties)?;
        s.serialize_field("geometry", &self.geometry)?;
        s.end()
    }
}

/// Ordered features, in input order. Immutable after derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    /// Features that carry a point, with their index.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.geometry.coordinates().map(|(lon, lat)| (i, lon, lat)))
    }

    /// Number of features with `Absent` geometry.
    pub fn absent_count(&self) -> usize {
        self.features
            .iter()
            .filter(|f| !f.geometry.is_point())
            .count()
    }

    /// Sorted distinct `language` values (empty strings skipped).
    pub fn languages(&self) -> BTreeSet<String> {
        self.features
            .iter()
            .map(Feature::language)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FeatureCollection", 2)?;
        s.serialize_field("type", "FeatureCollection")?;
        s.serialize_field("features", &self.features)?;
        s.end()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point {
                longitude,
                latitude,
            } => write!(f, "{longitude:.4}, {latitude:.4}"),
            Geometry::Absent => write!(f, "<none>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(lang: &str, geometry: Geometry) -> Feature {
        Feature {
            properties: [(LANGUAGE.to_string(), lang.to_string())].into(),
            geometry,
        }
    }

    #[test]
    fn serializes_as_geojson() {
        let fc = FeatureCollection {
            features: vec![
                feature(
                    "en",
                    Geometry::Point {
                        longitude: 11.4,
                        latitude: 47.3,
                    },
                ),
                feature("de", Geometry::Absent),
            ],
        };
        let value = serde_json::to_value(&fc).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": { "language": "en" },
                        "geometry": { "type": "Point", "coordinates": [11.4, 47.3] }
                    },
                    {
                        "type": "Feature",
                        "properties": { "language": "de" },
                        "geometry": null
                    }
                ]
            })
        );
    }

    #[test]
    fn languages_are_sorted_and_distinct() {
        let fc = FeatureCollection {
            features: vec![
                feature("fr", Geometry::Absent),
                feature("en", Geometry::Absent),
                feature("fr", Geometry::Absent),
                feature("", Geometry::Absent),
            ],
        };
        let langs: Vec<String> = fc.languages().into_iter().collect();
        assert_eq!(langs, vec!["en", "fr"]);
        assert_eq!(fc.absent_count(), 4);
        assert_eq!(fc.points().count(), 0);
    }
}
