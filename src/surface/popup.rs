use crate::data::bounds::normalize_longitude;
use crate::data::model::{Feature, LANGUAGE, SENTENCE};

/// Flag properties that may be listed in a popup.
pub const FLAG_PROPERTIES: [&str; 3] = ["mango", "maplibre", "maptiler"];

/// Popup display options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopupOptions {
    /// Also list the `mango` / `maplibre` / `maptiler` flags.
    pub show_flags: bool,
}

/// Content and anchor of a feature popup.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub feature: usize,
    pub longitude: f64,
    pub latitude: f64,
    pub sentence: String,
    pub language: String,
    pub flags: Vec<(String, String)>,
}

impl Popup {
    /// Popup for a clicked feature. The anchor longitude is moved to the
    /// world copy nearest `click_lon`. `None` when the feature has no point.
    pub fn for_feature(
        index: usize,
        feature: &Feature,
        click_lon: f64,
        options: PopupOptions,
    ) -> Option<Self> {
        let (lon, lat) = feature.geometry.coordinates()?;

        let flags = if options.show_flags {
            FLAG_PROPERTIES
                .iter()
                .map(|&name| {
                    (
                        name.to_string(),
                        feature.property(name).unwrap_or_default().to_string(),
                    )
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(Self {
            feature: index,
            longitude: normalize_longitude(lon, click_lon),
            latitude: lat,
            sentence: feature.property(SENTENCE).unwrap_or_default().to_string(),
            language: feature.property(LANGUAGE).unwrap_or_default().to_string(),
            flags,
        })
    }

    /// HTML body for web map backends. Values are escaped.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<strong>Sentence:</strong> {}<br><strong>Language:</strong> {}",
            escape_html(&self.sentence),
            escape_html(&self.language)
        );
        for (name, value) in &self.flags {
            html.push_str(&format!(
                "<br><strong>{}:</strong> {}",
                capitalize(name),
                escape_html(value)
            ));
        }
        html
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
