mod app;
mod event;
mod preview;
mod theme;
mod worker;

use app::StudioApp;
use eframe::egui;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;
use widget_studio::config::StudioConfig;
use widget_studio::store::WidgetStore;
use worker::StoreWorker;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = StudioConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(widget_studio::config::DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!(
        home = %config.home.display(),
        history = config.history_capacity,
        "starting widget studio v{}",
        env!("CARGO_PKG_VERSION")
    );

    let (tx, rx) = mpsc::channel();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("widget-studio-runtime")
        .build()?;
    let runtime_handle = runtime.handle().clone();
    let store = WidgetStore::new(config.widgets_dir());
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Widget Studio",
        native_options,
        Box::new(move |creation_context| {
            let ctx = creation_context.egui_ctx.clone();
            let worker = StoreWorker::new(store, tx, runtime_handle, ctx.clone());
            Ok(Box::new(StudioApp::new(rx, worker, config, &ctx)))
        }),
    )?;

    Ok(())
}
