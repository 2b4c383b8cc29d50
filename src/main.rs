mod app;
mod color;
mod config;
mod data;
mod state;
mod surface;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use app::SentenceMapApp;
use clap::Parser;
use config::{Cli, MapConfig};
use eframe::egui;

use crate::data::geometry::derive;
use crate::data::loader::load_file;
use crate::surface::export::export_document;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = MapConfig::from_cli(Cli::parse())?;

    if let Some(out) = &config.export {
        return export(&config, out);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        multisampling: if config.setup().viewport.antialias { 4 } else { 0 },
        ..Default::default()
    };

    eframe::run_native(
        "Sentence Map",
        options,
        Box::new(move |_cc| Ok(Box::new(SentenceMapApp::new(&config)))),
    )
    .map_err(|e| anyhow::anyhow!("running the map window: {e}"))
}

/// Write the map document a web page can load, without opening a window.
fn export(config: &MapConfig, out: &Path) -> Result<()> {
    let records = match &config.data {
        Some(path) => load_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Vec::new(),
    };
    let features = derive(&records);

    let document = export_document(&config.setup(), &features, config.category, config.popup);

    let text = serde_json::to_string_pretty(&document).context("serialising map")?;
    std::fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
    log::info!("Exported {} features to {}", features.len(), out.display());
    Ok(())
}
