use std::env;
use std::path::PathBuf;

use clap::Parser;
use palette::Srgb;

use crate::data::filter::CategoryFilter;
use crate::surface::popup::PopupOptions;
use crate::surface::preset::MapPreset;
use crate::surface::style::{parse_hex, LayerDescriptor, MarkerColor, StyleDescriptor, StyleError};
use crate::surface::MapSetup;

/// Legacy name of the key variable, still honoured.
const LEGACY_KEY_VAR: &str = "REACT_APP_MAPTILER_API_KEY";

/// Command line. Every option falls back to an environment variable.
#[derive(Debug, Parser)]
#[command(name = "sentence-map", version, about = "Map of geocoded sentences")]
pub struct Cli {
    /// Point records to open on start (.json, .geojson, .csv, .parquet).
    #[arg(long, env = "MAP_DATA")]
    pub data: Option<PathBuf>,

    /// Map variant: plain, compact or filtered.
    #[arg(long, env = "MAP_PRESET", default_value_t = MapPreset::Filtered)]
    pub preset: MapPreset,

    /// Hosted base-map style name.
    #[arg(long, env = "MAP_STYLE", default_value = "aquarelle")]
    pub style: String,

    /// Initial category filter.
    #[arg(long, env = "MAP_CATEGORY", default_value_t = CategoryFilter::All)]
    pub category: CategoryFilter,

    /// Marker colour as `#rrggbb`, replacing the preset's.
    #[arg(long, env = "MAP_MARKER_COLOR")]
    pub marker_color: Option<String>,

    /// API key embedded in the style URL.
    #[arg(long, env = "MAPTILER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// List mango/maplibre/maptiler flags in popups (defaults per preset).
    #[arg(long)]
    pub show_flags: Option<bool>,

    /// Write the map document as JSON to this path and exit.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct MapConfig {
    pub data: Option<PathBuf>,
    pub preset: MapPreset,
    pub style: StyleDescriptor,
    pub category: CategoryFilter,
    pub popup: PopupOptions,
    pub marker_color: Option<Srgb<u8>>,
    pub export: Option<PathBuf>,
}

impl MapConfig {
    /// Resolve the parsed command line, reading the legacy key variable.
    pub fn from_cli(cli: Cli) -> Result<Self, StyleError> {
        Self::resolve(cli, env::var(LEGACY_KEY_VAR).ok())
    }

    /// Resolve without touching the environment. `legacy_key` is the value
    /// of the legacy key variable, used when `cli` carries no key.
    pub fn resolve(cli: Cli, legacy_key: Option<String>) -> Result<Self, StyleError> {
        let api_key = cli
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or(legacy_key)
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            log::warn!("No MAPTILER_API_KEY set; the style URL will carry an empty key");
        }

        let mut popup = cli.preset.popup_options();
        if let Some(show_flags) = cli.show_flags {
            popup.show_flags = show_flags;
        }

        let marker_color = cli.marker_color.as_deref().map(parse_hex).transpose()?;
        let style = StyleDescriptor::new(cli.style, api_key);
        style.validate()?;

        Ok(MapConfig {
            data: cli.data,
            preset: cli.preset,
            style,
            category: cli.category,
            popup,
            marker_color,
            export: cli.export,
        })
    }

    pub fn setup(&self) -> MapSetup {
        let mut setup = self.preset.setup(self.style.clone());
        if let Some(color) = self.marker_color {
            for layer in &mut setup.layers {
                if let LayerDescriptor::Marker(m) = layer {
                    match &mut m.color {
                        MarkerColor::Fixed(c) => *c = color,
                        MarkerColor::ByProperty { fallback, .. } => *fallback = color,
                    }
                }
            }
        }
        setup
    }
}
