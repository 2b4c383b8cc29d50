use super::model::{Feature, FeatureCollection, Geometry, PointRecord, LATITUDE, LONGITUDE};

// ---------------------------------------------------------------------------
// Geometry derivation: records → features
// ---------------------------------------------------------------------------

/// Parse a string-encoded coordinate from its longest numeric prefix, so
/// `"47.3abc"` reads as 47.3 and `"11.4 E"` as 11.4. Leading whitespace is
/// skipped. `None` when no digits lead the value or it is not finite.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let end = numeric_prefix_len(text.as_bytes());
    if end == 0 {
        return None;
    }
    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Length of the leading `[+-]digits[.digits][(e|E)[+-]digits]` run, or 0
/// when it holds no mantissa digit. An incomplete exponent is left out.
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut i = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(i);
    let mut mantissa_digits = int_end - i;
    i = int_end;
    if bytes.get(i) == Some(&b'.') {
        let frac_end = digits_from(i + 1);
        mantissa_digits += frac_end - (i + 1);
        i = frac_end;
    }
    if mantissa_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    i
}

/// Derive the geometry of a single record.
pub fn derive_one(record: &PointRecord) -> Feature {
    let lat = record.get(LATITUDE).and_then(parse_coordinate);
    let lon = record.get(LONGITUDE).and_then(parse_coordinate);

    let geometry = match (lon, lat) {
        (Some(longitude), Some(latitude)) => Geometry::Point {
            longitude,
            latitude,
        },
        _ => Geometry::Absent,
    };

    Feature {
        properties: record.properties.clone(),
        geometry,
    }
}

/// Turn raw records into a feature collection, preserving input order.
///
/// Records whose coordinates do not parse are kept with [`Geometry::Absent`];
/// they are skipped by point rendering and bounds, nothing else.
pub fn derive(records: &[PointRecord]) -> FeatureCollection {
    FeatureCollection {
        features: records.iter().map(derive_one).collect(),
    }
}
