/// Data layer: records, geometry derivation, filtering and bounds.
///
/// Architecture:
/// ```text
///  .json / .geojson / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<PointRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ geometry  │  latitude/longitude strings → FeatureCollection
///   └──────────┘
///        │
///        ├──────────────► bounds   (box over Point features)
///        ▼
///   ┌──────────┐
///   │  filter   │  CategoryFilter → predicate → visible indices
///   └──────────┘
/// ```

pub mod bounds;
pub mod filter;
pub mod geometry;
pub mod loader;
pub mod model;
