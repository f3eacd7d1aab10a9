mod app;

use anyhow::{Result, anyhow};
use app::UiApp;
use eframe::{NativeOptions, egui};
use leaf_core::{ClientConfig, HttpInferenceClient, InferenceClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Err(e) = run() {
        eprintln!("Application stopped with error: {e:#}");
    }
}

fn run() -> Result<()> {
    let config = ClientConfig::from_env();
    tracing::info!("inference service at {}", config.base_url);
    let base_url = config.base_url.clone();
    let client: Arc<dyn InferenceClient> = Arc::new(HttpInferenceClient::new(config)?);

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 760.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Leaf Disease Detector",
        options,
        Box::new(move |cc| Ok(Box::new(UiApp::new(cc, client, base_url)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
