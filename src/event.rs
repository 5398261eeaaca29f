use std::path::PathBuf;
use widget_studio::widget::WidgetConfig;

/// Results posted back to the UI thread by background store tasks.
#[derive(Debug, Clone)]
pub enum StudioEvent {
    WidgetsLoaded {
        widgets: Vec<WidgetConfig>,
        warnings: Vec<String>,
    },
    WidgetSaved {
        widget_id: String,
        path: PathBuf,
    },
    WidgetDeleted {
        widget_id: String,
    },
    StoreError(String),
}
