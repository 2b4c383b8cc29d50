use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use thiserror::Error;

use super::popup::PopupOptions;
use super::style::{
    LabelField, LabelLayer, LayerDescriptor, MarkerColor, MarkerLayer, Radius, StyleDescriptor,
    Viewport,
};
use super::MapSetup;

pub const LABEL_LAYER_ID: &str = "sentence-labels";
pub const MARKER_LAYER_ID: &str = "sentence-markers";

const TEXT_COLOR: Srgb<u8> = Srgb::new(0x25, 0x23, 0x23);
const HALO_COLOR: Srgb<u8> = Srgb::new(0xea, 0xfd, 0xf8);
const MARKER_COLOR: Srgb<u8> = Srgb::new(0x2f, 0x66, 0x90);
const STROKE_COLOR: Srgb<u8> = Srgb::new(0xf5, 0xf1, 0xed);

// ---------------------------------------------------------------------------
// MapPreset – the three variants of the sentence map
// ---------------------------------------------------------------------------

/// Zoom defaults, styling constants and filter UI of one map variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapPreset {
    /// World view, labels list every flag, no filter control.
    Plain,
    /// Slightly zoomed, short labels, small markers.
    Compact,
    /// Filter control, fit to data, zoom-scaled markers coloured by language.
    #[default]
    Filtered,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset '{0}' (expected one of: plain, compact, filtered)")]
pub struct PresetError(pub String);

impl FromStr for MapPreset {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(MapPreset::Plain),
            "compact" => Ok(MapPreset::Compact),
            "filtered" => Ok(MapPreset::Filtered),
            _ => Err(PresetError(s.to_string())),
        }
    }
}

impl fmt::Display for MapPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MapPreset::Plain => "plain",
            MapPreset::Compact => "compact",
            MapPreset::Filtered => "filtered",
        })
    }
}

impl MapPreset {
    pub fn viewport(self) -> Viewport {
        match self {
            MapPreset::Plain => Viewport::default(),
            MapPreset::Compact => Viewport {
                center: [10.0, 20.0],
                zoom: 1.5,
                ..Viewport::default()
            },
            MapPreset::Filtered => Viewport {
                center: [0.0, 20.0],
                zoom: 1.0,
                pitch: Some(0.0),
                antialias: true,
            },
        }
    }

    /// Whether the category selection control is shown.
    pub fn filter_ui(self) -> bool {
        matches!(self, MapPreset::Filtered)
    }

    /// Degrees of padding when fitting to the data, `None` keeps the viewport.
    pub fn fit_padding(self) -> Option<f64> {
        match self {
            MapPreset::Filtered => Some(2.0),
            MapPreset::Plain | MapPreset::Compact => None,
        }
    }

    pub fn popup_options(self) -> PopupOptions {
        PopupOptions {
            show_flags: matches!(self, MapPreset::Plain),
        }
    }

    pub fn layers(self) -> Vec<LayerDescriptor> {
        let mut fields = vec![
            LabelField::plain("sentence"),
            LabelField::captioned("Language", "language"),
        ];
        if self == MapPreset::Plain {
            fields.extend([
                LabelField::captioned("Mango", "mango"),
                LabelField::captioned("Maplibre", "maplibre"),
                LabelField::captioned("Maptiler", "maptiler"),
            ]);
        }

        let labels = LabelLayer {
            id: LABEL_LAYER_ID.to_string(),
            fields,
            size: if self == MapPreset::Compact { 10.0 } else { 11.0 },
            offset: [0.0, 1.5],
            max_width: 18.0,
            color: TEXT_COLOR,
            halo_color: HALO_COLOR,
            halo_width: 3.0,
        };

        let markers = match self {
            MapPreset::Plain => MarkerLayer {
                id: MARKER_LAYER_ID.to_string(),
                radius: Radius::Fixed(6.0),
                color: MarkerColor::Fixed(MARKER_COLOR),
                opacity: 1.0,
                stroke_color: STROKE_COLOR,
                stroke_width: 5.0,
                stroke_opacity: 0.5,
            },
            MapPreset::Compact => MarkerLayer {
                id: MARKER_LAYER_ID.to_string(),
                radius: Radius::Fixed(4.0),
                color: MarkerColor::Fixed(MARKER_COLOR),
                opacity: 0.9,
                stroke_color: STROKE_COLOR,
                stroke_width: 2.0,
                stroke_opacity: 0.5,
            },
            MapPreset::Filtered => MarkerLayer {
                id: MARKER_LAYER_ID.to_string(),
                radius: Radius::Interpolated(vec![(0.0, 3.0), (6.0, 6.0), (12.0, 10.0)]),
                color: MarkerColor::ByProperty {
                    property: "language".to_string(),
                    fallback: MARKER_COLOR,
                },
                opacity: 1.0,
                stroke_color: STROKE_COLOR,
                stroke_width: 3.0,
                stroke_opacity: 0.5,
            },
        };

        vec![LayerDescriptor::Label(labels), LayerDescriptor::Marker(markers)]
    }

    /// Complete surface setup for this preset.
    pub fn setup(self, style: StyleDescriptor) -> MapSetup {
        MapSetup {
            style,
            viewport: self.viewport(),
            layers: self.layers(),
            fit_padding: self.fit_padding(),
        }
    }
}
