use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.45);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// `Srgb<u8>` with an opacity in `0..=1` as an egui colour.
pub fn to_color32(color: Srgb<u8>, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.red, color.green, color.blue, alpha)
}

fn hex(c: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r(), c.g(), c.b())
}

// ---------------------------------------------------------------------------
// Color mapping: property value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of one property (e.g. `language`) to colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub property: String,
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new(property: &str, unique_values: &BTreeSet<String>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping = unique_values.iter().cloned().zip(palette).collect();

        ColorMap {
            property: property.to_string(),
            mapping,
        }
    }

    pub fn color_for(&self, value: &str) -> Option<Color32> {
        self.mapping.get(value).copied()
    }

    /// Legend entries (value → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping.iter().map(|(v, c)| (v.clone(), *c)).collect()
    }

    /// `(value, "#rrggbb")` pairs for style expressions.
    pub fn hex_entries(&self) -> Vec<(String, String)> {
        self.mapping.iter().map(|(v, c)| (v.clone(), hex(*c))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        let unique: BTreeSet<[u8; 4]> = colors.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 5);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn maps_each_value() {
        let values: BTreeSet<String> = ["de", "en", "fr"].iter().map(|s| s.to_string()).collect();
        let map = ColorMap::new("language", &values);
        assert!(map.color_for("en").is_some());
        assert!(map.color_for("ja").is_none());
        assert_eq!(map.legend_entries().len(), 3);
        let hexes = map.hex_entries();
        assert_eq!(hexes[0].0, "de");
        assert!(hexes[0].1.starts_with('#') && hexes[0].1.len() == 7);
    }

    #[test]
    fn opacity_becomes_alpha() {
        let c = to_color32(Srgb::new(0x2f, 0x66, 0x90), 0.5);
        assert_eq!(c.a(), 128);
        assert_eq!(to_color32(Srgb::new(1, 2, 3), 1.0), Color32::from_rgb(1, 2, 3));
    }
}
