use super::model::FeatureCollection;

// ---------------------------------------------------------------------------
// Longitude wrap-around
// ---------------------------------------------------------------------------

/// Shift `lon` by whole turns until it lies within 180° of `reference`.
///
/// Takes the fewest turns, so a value exactly 180° away keeps its side.
/// Used both for bounds and for placing a popup on the copy of a feature
/// nearest to the click.
pub fn normalize_longitude(lon: f64, reference: f64) -> f64 {
    if !lon.is_finite() || !reference.is_finite() || (reference - lon).abs() <= 180.0 {
        return lon;
    }
    // `rem_euclid` is exact, so huge inputs still land within a turn.
    let mut offset = lon.rem_euclid(360.0) - reference.rem_euclid(360.0);
    if offset > 180.0 || (offset == 180.0 && lon < reference) {
        offset -= 360.0;
    } else if offset < -180.0 || (offset == -180.0 && lon > reference) {
        offset += 360.0;
    }
    reference + offset
}

/// `lon` folded into `[-180, 180)`.
fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

// ---------------------------------------------------------------------------
// BoundingBox
// ---------------------------------------------------------------------------

/// Lon/lat-aligned rectangle. A box crossing the antimeridian has `max_lon`
/// above 180.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// `(lon, lat)` of the box centre.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Grow the box by `degrees` on every side, latitude clamped to ±90.
    pub fn padded(&self, degrees: f64) -> Self {
        Self {
            min_lon: self.min_lon - degrees,
            max_lon: self.max_lon + degrees,
            min_lat: (self.min_lat - degrees).max(-90.0),
            max_lat: (self.max_lat + degrees).min(90.0),
        }
    }

    /// `[[min_lon, min_lat], [max_lon, max_lat]]`, the shape map libraries
    /// take for fit-bounds.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.min_lon, self.min_lat], [self.max_lon, self.max_lat]]
    }
}

/// Smallest box around every feature with a point, `None` if there is none.
///
/// Longitudes are folded into `[-180, 180)` and sorted; the box opens at the
/// widest gap between neighbours. When that gap is not the one across ±180°
/// the box crosses the antimeridian and `max_lon` exceeds 180. The result
/// does not depend on input order.
pub fn bounding_box(collection: &FeatureCollection) -> Option<BoundingBox> {
    let mut lons = Vec::new();
    let mut lat_range: Option<(f64, f64)> = None;
    for (_, lon, lat) in collection.points() {
        lons.push(wrap_longitude(lon));
        lat_range = Some(match lat_range {
            Some((lo, hi)) => (lo.min(lat), hi.max(lat)),
            None => (lat, lat),
        });
    }
    let (min_lat, max_lat) = lat_range?;
    lons.sort_by(f64::total_cmp);

    let (first, last) = (lons[0], lons[lons.len() - 1]);
    // Gap across ±180° wins ties, keeping ordinary boxes uncrossed.
    let mut widest = first + 360.0 - last;
    let (mut min_lon, mut max_lon) = (first, last);
    for pair in lons.windows(2) {
        let gap = pair[1] - pair[0];
        if gap > widest {
            widest = gap;
            min_lon = pair[1];
            max_lon = pair[0] + 360.0;
        }
    }

    Some(BoundingBox {
        min_lon,
        min_lat,
        max_lon,
        max_lat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Feature, Geometry};

    fn collection(points: &[Option<(f64, f64)>]) -> FeatureCollection {
        FeatureCollection {
            features: points
                .iter()
                .map(|p| Feature {
                    properties: Default::default(),
                    geometry: match p {
                        Some((longitude, latitude)) => Geometry::Point {
                            longitude: *longitude,
                            latitude: *latitude,
                        },
                        None => Geometry::Absent,
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn normalizes_towards_reference() {
        assert_eq!(normalize_longitude(179.0, -179.0), -181.0);
        assert_eq!(normalize_longitude(-179.0, 179.0), 181.0);
        assert_eq!(normalize_longitude(10.0, 20.0), 10.0);
        assert_eq!(normalize_longitude(730.0, 0.0), 10.0);
        assert_eq!(normalize_longitude(-540.0, 0.0), -180.0);
    }

    #[test]
    fn huge_longitudes_finish_quickly() {
        let lon = normalize_longitude(1e20, 0.0);
        assert!(lon.abs() <= 180.0, "got {lon}");
        let lon = normalize_longitude(-1e300, 10.0);
        assert!((lon - 10.0).abs() <= 180.0, "got {lon}");

        let fc = collection(&[Some((0.0, 10.0)), Some((1e20, 10.0))]);
        let bbox = bounding_box(&fc).unwrap();
        assert!(bbox.width() <= 180.0);
        assert_eq!((bbox.min_lat, bbox.max_lat), (10.0, 10.0));
    }

    #[test]
    fn box_across_antimeridian_stays_narrow() {
        let fc = collection(&[Some((-179.0, 10.0)), Some((179.0, 10.0))]);
        let bbox = bounding_box(&fc).unwrap();
        assert_eq!(bbox.min_lon, 179.0);
        assert_eq!(bbox.max_lon, 181.0);
        assert_eq!(bbox.width(), 2.0);
        assert_eq!((bbox.min_lat, bbox.max_lat), (10.0, 10.0));
    }

    #[test]
    fn box_is_minimal_whatever_the_order() {
        let orders = [
            [0.0, 170.0, -170.0],
            [170.0, -170.0, 0.0],
            [-170.0, 0.0, 170.0],
        ];
        for lons in orders {
            let points: Vec<_> = lons.iter().map(|&lon| Some((lon, 10.0))).collect();
            let bbox = bounding_box(&collection(&points)).unwrap();
            assert_eq!(bbox.width(), 190.0, "order {lons:?}");
            assert_eq!(bbox.corners(), [[0.0, 10.0], [190.0, 10.0]]);
        }
    }

    #[test]
    fn out_of_range_longitudes_are_folded() {
        let fc = collection(&[Some((190.0, 0.0)), Some((-175.0, 5.0))]);
        let bbox = bounding_box(&fc).unwrap();
        assert_eq!(bbox.corners(), [[-175.0, 0.0], [-170.0, 5.0]]);
    }

    #[test]
    fn ordinary_box() {
        let fc = collection(&[Some((11.4, 47.3)), None, Some((-3.7, 40.4)), Some((2.3, 48.9))]);
        let bbox = bounding_box(&fc).unwrap();
        assert_eq!(bbox.corners(), [[-3.7, 40.4], [11.4, 48.9]]);
    }

    #[test]
    fn no_points_no_box() {
        assert_eq!(bounding_box(&collection(&[None, None])), None);
        assert_eq!(bounding_box(&FeatureCollection::default()), None);
    }

    #[test]
    fn padding_clamps_latitude() {
        let bbox = BoundingBox {
            min_lon: 0.0,
            min_lat: 89.0,
            max_lon: 0.0,
            max_lat: 89.0,
        }
        .padded(5.0);
        assert_eq!(bbox.max_lat, 90.0);
        assert_eq!(bbox.min_lat, 84.0);
        assert_eq!(bbox.center(), (0.0, 87.0));
    }
}
