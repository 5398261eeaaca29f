use crate::event::StudioEvent;
use eframe::egui;
use std::sync::mpsc;
use tokio::runtime::Handle;
use widget_studio::store::WidgetStore;
use widget_studio::widget::WidgetConfig;

/// Runs store calls on the tokio runtime and posts results to the UI thread.
#[derive(Clone)]
pub struct StoreWorker {
    store: WidgetStore,
    tx: mpsc::Sender<StudioEvent>,
    runtime_handle: Handle,
    repaint: egui::Context,
}

impl StoreWorker {
    pub fn new(
        store: WidgetStore,
        tx: mpsc::Sender<StudioEvent>,
        runtime_handle: Handle,
        repaint: egui::Context,
    ) -> Self {
        Self {
            store,
            tx,
            runtime_handle,
            repaint,
        }
    }

    pub fn load_all(&self) {
        let store = self.store.clone();
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.runtime_handle.spawn(async move {
            let (widgets, warnings) = store.load_all().await;
            let _ = tx.send(StudioEvent::WidgetsLoaded { widgets, warnings });
            repaint.request_repaint();
        });
    }

    pub fn save(&self, config: WidgetConfig) {
        let store = self.store.clone();
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.runtime_handle.spawn(async move {
            let event = match store.save(&config).await {
                Ok(path) => StudioEvent::WidgetSaved {
                    widget_id: config.id.clone(),
                    path,
                },
                Err(err) => StudioEvent::StoreError(format!("failed to save widget: {err}")),
            };
            let _ = tx.send(event);
            repaint.request_repaint();
        });
    }

    pub fn delete(&self, widget_id: String) {
        let store = self.store.clone();
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.runtime_handle.spawn(async move {
            let event = match store.delete(&widget_id).await {
                Ok(_) => StudioEvent::WidgetDeleted { widget_id },
                Err(err) => StudioEvent::StoreError(format!("failed to delete widget: {err}")),
            };
            let _ = tx.send(event);
            repaint.request_repaint();
        });
    }
}
