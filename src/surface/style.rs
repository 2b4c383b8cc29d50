use std::str::FromStr;

use palette::Srgb;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::data::model::Feature;

const STYLE_URL_BASE: &str = "https://api.maptiler.com/maps";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("invalid hex colour '{0}'")]
    InvalidColor(String),
    #[error("{0} may only contain letters, digits, '-', '_', '.' and '~'")]
    UnsafeUrlPart(&'static str),
}

/// Parse `#rrggbb` / `rrggbb` (or the 3-digit short forms).
pub fn parse_hex(value: &str) -> Result<Srgb<u8>, StyleError> {
    Srgb::<u8>::from_str(value.trim()).map_err(|_| StyleError::InvalidColor(value.to_string()))
}

/// Lowercase `#rrggbb`.
pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

// ---------------------------------------------------------------------------
// Style + viewport
// ---------------------------------------------------------------------------

/// Reference to a hosted base-map style and the key needed to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDescriptor {
    pub name: String,
    pub api_key: Option<String>,
}

impl StyleDescriptor {
    pub fn new(name: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            name: name.into(),
            api_key,
        }
    }

    /// Reject a name or key that would need percent-encoding in [`url`].
    ///
    /// [`url`]: StyleDescriptor::url
    pub fn validate(&self) -> Result<(), StyleError> {
        if !is_url_safe(&self.name) {
            return Err(StyleError::UnsafeUrlPart("style name"));
        }
        if !self.api_key.as_deref().map_or(true, is_url_safe) {
            return Err(StyleError::UnsafeUrlPart("API key"));
        }
        Ok(())
    }

    /// Style JSON URL with the key embedded; an absent key leaves it empty.
    pub fn url(&self) -> String {
        format!(
            "{STYLE_URL_BASE}/{}/style.json?key={}",
            self.name,
            self.api_key.as_deref().unwrap_or_default()
        )
    }
}

/// RFC 3986 unreserved characters only.
fn is_url_safe(part: &str) -> bool {
    part.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'))
}

/// Initial camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// `[lon, lat]`
    pub center: [f64; 2],
    pub zoom: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    pub antialias: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            zoom: 0.0,
            pitch: None,
            antialias: false,
        }
    }
}

impl Viewport {
    /// Degrees of longitude visible at `zoom` on a 512px world.
    pub fn span_at_zoom(zoom: f64) -> f64 {
        360.0 / 2f64.powf(zoom)
    }

    /// Inverse of [`Viewport::span_at_zoom`].
    pub fn zoom_for_span(span: f64) -> f64 {
        if span <= 0.0 {
            return 0.0;
        }
        (360.0 / span).log2()
    }
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// One line of a label: an optional caption followed by a property value.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelField {
    pub caption: Option<String>,
    pub property: String,
}

impl LabelField {
    pub fn plain(property: &str) -> Self {
        Self {
            caption: None,
            property: property.to_string(),
        }
    }

    pub fn captioned(caption: &str, property: &str) -> Self {
        Self {
            caption: Some(caption.to_string()),
            property: property.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayer {
    pub id: String,
    pub fields: Vec<LabelField>,
    pub size: f32,
    /// Offset in ems, `[x, y]`.
    pub offset: [f32; 2],
    pub max_width: f32,
    pub color: Srgb<u8>,
    pub halo_color: Srgb<u8>,
    pub halo_width: f32,
}

impl LabelLayer {
    /// Text shown for `feature`, fields separated by newlines.
    pub fn text_for(&self, feature: &Feature) -> String {
        self.fields
            .iter()
            .map(|f| {
                let value = feature.property(&f.property).unwrap_or_default();
                match &f.caption {
                    Some(caption) => format!("{caption}: {value}"),
                    None => value.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn text_field_expression(&self) -> JsonValue {
        let mut parts = vec![json!("concat")];
        for (i, field) in self.fields.iter().enumerate() {
            let sep = if i == 0 { "" } else { "\n" };
            match &field.caption {
                Some(caption) => parts.push(json!(format!("{sep}{caption}: "))),
                None if !sep.is_empty() => parts.push(json!(sep)),
                None => {}
            }
            parts.push(json!(["get", field.property]));
        }
        JsonValue::Array(parts)
    }
}

/// Marker size, fixed or interpolated linearly over zoom stops.
#[derive(Debug, Clone, PartialEq)]
pub enum Radius {
    Fixed(f32),
    /// `(zoom, radius)` stops in ascending zoom order.
    Interpolated(Vec<(f64, f32)>),
}

impl Radius {
    /// Radius at `zoom`, clamped to the first/last stop.
    pub fn at_zoom(&self, zoom: f64) -> f32 {
        let stops = match self {
            Radius::Fixed(r) => return *r,
            Radius::Interpolated(stops) => stops,
        };
        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return 0.0;
        };
        if zoom <= first.0 {
            return first.1;
        }
        if zoom >= last.0 {
            return last.1;
        }
        for pair in stops.windows(2) {
            let ((z0, r0), (z1, r1)) = (pair[0], pair[1]);
            if zoom >= z0 && zoom <= z1 {
                let t = ((zoom - z0) / (z1 - z0)) as f32;
                return r0 + (r1 - r0) * t;
            }
        }
        last.1
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Radius::Fixed(r) => json!(r),
            Radius::Interpolated(stops) => {
                let mut expr = vec![json!("interpolate"), json!(["linear"]), json!(["zoom"])];
                for (z, r) in stops {
                    expr.push(json!(z));
                    expr.push(json!(r));
                }
                JsonValue::Array(expr)
            }
        }
    }
}

/// Marker fill: one colour, or a colour per distinct value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerColor {
    Fixed(Srgb<u8>),
    ByProperty { property: String, fallback: Srgb<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLayer {
    pub id: String,
    pub radius: Radius,
    pub color: MarkerColor,
    pub opacity: f32,
    pub stroke_color: Srgb<u8>,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerDescriptor {
    Label(LabelLayer),
    Marker(MarkerLayer),
}

impl LayerDescriptor {
    pub fn id(&self) -> &str {
        match self {
            LayerDescriptor::Label(l) => &l.id,
            LayerDescriptor::Marker(m) => &m.id,
        }
    }

    /// MapLibre layer object. `palette` supplies the
    /// `value → #hex` pairs for [`MarkerColor::ByProperty`].
    pub fn to_layer_json(&self, source: &str, palette: &[(String, String)]) -> JsonValue {
        match self {
            LayerDescriptor::Label(l) => json!({
                "id": l.id,
                "type": "symbol",
                "source": source,
                "layout": {
                    "text-field": l.text_field_expression(),
                    "text-size": l.size,
                    "text-offset": l.offset,
                    "text-anchor": "top",
                    "text-allow-overlap": true,
                    "text-ignore-placement": false,
                    "text-max-width": l.max_width,
                    "text-keep-upright": false,
                },
                "paint": {
                    "text-color": to_hex(l.color),
                    "text-halo-color": to_hex(l.halo_color),
                    "text-halo-width": l.halo_width,
                },
            }),
            LayerDescriptor::Marker(m) => {
                let color = match &m.color {
                    MarkerColor::Fixed(c) => json!(to_hex(*c)),
                    MarkerColor::ByProperty { .. } if palette.is_empty() => {
                        json!(to_hex(marker_fallback(&m.color)))
                    }
                    MarkerColor::ByProperty { property, fallback } => {
                        let mut expr = vec![json!("match"), json!(["get", property])];
                        for (value, hex) in palette {
                            expr.push(json!(value));
                            expr.push(json!(hex));
                        }
                        expr.push(json!(to_hex(*fallback)));
                        JsonValue::Array(expr)
                    }
                };
                json!({
                    "id": m.id,
                    "type": "circle",
                    "source": source,
                    "paint": {
                        "circle-radius": m.radius.to_json(),
                        "circle-color": color,
                        "circle-opacity": m.opacity,
                        "circle-stroke-color": to_hex(m.stroke_color),
                        "circle-stroke-width": m.stroke_width,
                        "circle-stroke-opacity": m.stroke_opacity,
                        "circle-pitch-scale": "map",
                    },
                })
            }
        }
    }
}

fn marker_fallback(color: &MarkerColor) -> Srgb<u8> {
    match color {
        MarkerColor::Fixed(c) => *c,
        MarkerColor::ByProperty { fallback, .. } => *fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Geometry;

    #[test]
    fn parses_hex_colours() {
        assert_eq!(parse_hex("#2f6690").unwrap(), Srgb::new(0x2f, 0x66, 0x90));
        assert_eq!(to_hex(parse_hex("F5F1ED").unwrap()), "#f5f1ed");
        assert_eq!(
            parse_hex("blue"),
            Err(StyleError::InvalidColor("blue".to_string()))
        );
    }

    #[test]
    fn style_url_embeds_key() {
        let style = StyleDescriptor::new("aquarelle", Some("abc".into()));
        assert_eq!(
            style.url(),
            "https://api.maptiler.com/maps/aquarelle/style.json?key=abc"
        );
        assert!(StyleDescriptor::new("streets", None).url().ends_with("key="));
    }

    #[test]
    fn url_parts_must_not_need_encoding() {
        assert_eq!(StyleDescriptor::new("basic-v2", Some("aB9_.~".into())).validate(), Ok(()));
        assert_eq!(StyleDescriptor::new("streets", None).validate(), Ok(()));
        for key in ["a&b", "a#b", "a b", "ключ"] {
            assert_eq!(
                StyleDescriptor::new("streets", Some(key.into())).validate(),
                Err(StyleError::UnsafeUrlPart("API key")),
                "{key}"
            );
        }
        assert_eq!(
            StyleDescriptor::new("../x?y", None).validate(),
            Err(StyleError::UnsafeUrlPart("style name"))
        );
    }

    #[test]
    fn interpolated_radius() {
        let r = Radius::Interpolated(vec![(0.0, 2.0), (10.0, 12.0)]);
        assert_eq!(r.at_zoom(-1.0), 2.0);
        assert_eq!(r.at_zoom(5.0), 7.0);
        assert_eq!(r.at_zoom(20.0), 12.0);
        assert_eq!(Radius::Fixed(6.0).at_zoom(3.0), 6.0);
        assert_eq!(Radius::Interpolated(Vec::new()).at_zoom(3.0), 0.0);
    }

    #[test]
    fn zoom_span_round_trip() {
        assert_eq!(Viewport::span_at_zoom(0.0), 360.0);
        assert_eq!(Viewport::span_at_zoom(1.0), 180.0);
        assert_eq!(Viewport::zoom_for_span(90.0), 2.0);
    }

    #[test]
    fn label_text_and_expression() {
        let layer = LabelLayer {
            id: "labels".into(),
            fields: vec![
                LabelField::plain("sentence"),
                LabelField::captioned("Language", "language"),
            ],
            size: 11.0,
            offset: [0.0, 1.5],
            max_width: 18.0,
            color: Srgb::new(0, 0, 0),
            halo_color: Srgb::new(255, 255, 255),
            halo_width: 3.0,
        };
        let feature = Feature {
            properties: [
                ("sentence".to_string(), "Hallo".to_string()),
                ("language".to_string(), "de".to_string()),
            ]
            .into(),
            geometry: Geometry::Absent,
        };
        assert_eq!(layer.text_for(&feature), "Hallo\nLanguage: de");

        let json = LayerDescriptor::Label(layer).to_layer_json("sentences", &[]);
        assert_eq!(
            json["layout"]["text-field"],
            json!(["concat", ["get", "sentence"], "\nLanguage: ", ["get", "language"]])
        );
        assert_eq!(json["paint"]["text-color"], json!("#000000"));
        assert_eq!(json["layout"]["text-keep-upright"], json!(false));
        assert_eq!(json["layout"]["text-ignore-placement"], json!(false));
    }

    #[test]
    fn marker_colour_by_property() {
        let layer = LayerDescriptor::Marker(MarkerLayer {
            id: "markers".into(),
            radius: Radius::Interpolated(vec![(0.0, 3.0), (10.0, 8.0)]),
            color: MarkerColor::ByProperty {
                property: "language".into(),
                fallback: Srgb::new(0x2f, 0x66, 0x90),
            },
            opacity: 1.0,
            stroke_color: Srgb::new(0xf5, 0xf1, 0xed),
            stroke_width: 5.0,
            stroke_opacity: 0.5,
        });
        let palette = vec![("en".to_string(), "#ff0000".to_string())];
        let json = layer.to_layer_json("sentences", &palette);
        assert_eq!(
            json["paint"]["circle-color"],
            json!(["match", ["get", "language"], "en", "#ff0000", "#2f6690"])
        );
        assert_eq!(
            json["paint"]["circle-radius"],
            json!(["interpolate", ["linear"], ["zoom"], 0.0, 3.0, 10.0, 8.0])
        );
        let plain = layer.to_layer_json("sentences", &[]);
        assert_eq!(plain["paint"]["circle-color"], json!("#2f6690"));
    }
}
