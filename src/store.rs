use crate::widget::{WidgetConfig, SCHEMA_VERSION};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode widget {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown schemaVersion in {path}: {version}")]
    UnknownVersion { path: PathBuf, version: u32 },
    #[error("widget file missing for id {id}: {path}")]
    NotFound { id: String, path: PathBuf },
    #[error("invalid widget id `{id}`")]
    InvalidId { id: String },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// JSON files under one directory, one file per widget.
#[derive(Debug, Clone)]
pub struct WidgetStore {
    dir: PathBuf,
}

impl WidgetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn widget_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId { id: id.to_string() });
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(&self.dir))
    }

    /// Writes through a temp file and renames it into place so a crash never
    /// leaves a half-written widget behind.
    pub async fn save(&self, config: &WidgetConfig) -> Result<PathBuf, StoreError> {
        let final_path = self.widget_path(&config.id)?;
        self.ensure_dir().await?;
        let tmp_path = self.dir.join(format!("{}.json.tmp", config.id));
        let bytes = serde_json::to_vec_pretty(config).map_err(|source| StoreError::Encode {
            id: config.id.clone(),
            source,
        })?;

        fs::write(&tmp_path, bytes).await.map_err(io_error(&tmp_path))?;
        if let Err(err) = replace_file(&tmp_path, &final_path).await {
            if let Err(cleanup_err) = fs::remove_file(&tmp_path).await {
                tracing::warn!(
                    path = %tmp_path.display(),
                    error = %cleanup_err,
                    "failed to remove temp file"
                );
            }
            return Err(err);
        }

        tracing::info!(widget_id = %config.id, path = %final_path.display(), "widget saved");
        Ok(final_path)
    }

    pub async fn load(&self, id: &str) -> Result<WidgetConfig, StoreError> {
        let path = self.widget_path(id)?;
        if !fs::try_exists(&path).await.map_err(io_error(&path))? {
            return Err(StoreError::NotFound {
                id: id.to_string(),
                path,
            });
        }
        let config = read_widget_file(&path).await?;
        tracing::info!(widget_id = %config.id, "widget loaded");
        Ok(config)
    }

    /// Loads every widget in the directory sorted by name. Files that cannot
    /// be read are skipped and reported as warnings.
    pub async fn load_all(&self) -> (Vec<WidgetConfig>, Vec<String>) {
        let mut widgets = Vec::new();
        let mut warnings = Vec::new();

        if let Err(err) = self.ensure_dir().await {
            warnings.push(format!("failed to initialize widgets directory: {err}"));
            return (widgets, warnings);
        }

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) => {
                warnings.push(format!("failed to read widgets directory: {err}"));
                return (widgets, warnings);
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    warnings.push(format!("failed to read widgets directory entry: {err}"));
                    break;
                }
            };
            let path = entry.path();
            if path.extension() != Some(OsStr::new("json")) {
                continue;
            }

            match read_widget_file(&path).await {
                Ok(config) => widgets.push(config),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable widget file");
                    warnings.push(err.to_string());
                }
            }
        }

        widgets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        tracing::info!(count = widgets.len(), skipped = warnings.len(), "widgets loaded");
        (widgets, warnings)
    }

    /// Returns false when there was nothing to delete.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.widget_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(widget_id = %id, "widget deleted");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::Io { path, source: err }),
        }
    }
}

async fn replace_file(tmp_path: &Path, final_path: &Path) -> Result<(), StoreError> {
    let Err(rename_err) = fs::rename(tmp_path, final_path).await else {
        return Ok(());
    };
    // Windows refuses to rename over an existing file.
    if !fs::try_exists(final_path).await.unwrap_or(false) {
        return Err(StoreError::Io {
            path: final_path.to_path_buf(),
            source: rename_err,
        });
    }
    fs::remove_file(final_path)
        .await
        .map_err(io_error(final_path))?;
    fs::rename(tmp_path, final_path)
        .await
        .map_err(io_error(final_path))
}

async fn read_widget_file(path: &Path) -> Result<WidgetConfig, StoreError> {
    let data = fs::read(path).await.map_err(io_error(path))?;
    let config: WidgetConfig =
        serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if config.schema_version != SCHEMA_VERSION {
        return Err(StoreError::UnknownVersion {
            path: path.to_path_buf(),
            version: config.schema_version,
        });
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, BlockSpec};
    use crate::tree::add_block;
    use crate::widget::TreeTarget;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, WidgetStore) {
        let dir = TempDir::new().expect("temp dir should be created");
        let store = WidgetStore::new(dir.path().join("widgets"));
        (dir, store)
    }

    #[tokio::test]
    async fn save_then_load_is_lossless() {
        let (_dir, store) = store();
        let mut config = WidgetConfig::new("Support");
        config.launcher_structure = add_block(&[], None, BlockSpec::new(BlockKind::Icon).content("chat"));
        config
            .settings
            .extra
            .insert("workingHours".to_string(), json!({"mon": ["09:00", "17:00"]}));

        let path = store.save(&config).await.expect("save should succeed");
        assert!(path.ends_with(format!("{}.json", config.id)));
        assert!(!store.dir().join(format!("{}.json.tmp", config.id)).exists());

        let loaded = store.load(&config.id).await.expect("load should succeed");
        assert_eq!(loaded, config);
        assert_eq!(loaded.tree(TreeTarget::Launcher).len(), 1);
    }

    #[tokio::test]
    async fn saving_twice_overwrites() {
        let (_dir, store) = store();
        let mut config = WidgetConfig::new("First");
        store.save(&config).await.expect("first save");
        config.name = "Second".to_string();
        store.save(&config).await.expect("second save");
        assert_eq!(
            store.load(&config.id).await.expect("load").name,
            "Second"
        );
    }

    #[tokio::test]
    async fn load_all_reports_bad_files_and_keeps_good_ones() {
        let (_dir, store) = store();
        store.save(&WidgetConfig::new("b")).await.expect("save b");
        store.save(&WidgetConfig::new("a")).await.expect("save a");
        std::fs::write(store.dir().join("broken.json"), b"{not json").expect("write broken");
        std::fs::write(
            store.dir().join("future.json"),
            json!({"schemaVersion": 99, "id": "future"}).to_string(),
        )
        .expect("write future");
        std::fs::write(store.dir().join("notes.txt"), b"ignored").expect("write txt");

        let (widgets, warnings) = store.load_all().await;
        let names: Vec<_> = widgets.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("unknown schemaVersion")));
    }

    #[tokio::test]
    async fn missing_and_invalid_ids() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load("wgt-missing").await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.load("../escape").await,
            Err(StoreError::InvalidId { .. })
        ));
    }

    #[tokio::test]
    async fn failed_replace_leaves_no_temp_file() {
        let (_dir, store) = store();
        let config = WidgetConfig::new("blocked");
        let final_path = store.widget_path(&config.id).expect("valid id");
        std::fs::create_dir_all(final_path.join("occupied")).expect("block the target path");

        assert!(matches!(
            store.save(&config).await,
            Err(StoreError::Io { .. })
        ));
        assert!(!store.dir().join(format!("{}.json.tmp", config.id)).exists());
    }

    #[tokio::test]
    async fn delete_removes_the_file_once() {
        let (_dir, store) = store();
        let config = WidgetConfig::new("gone");
        store.save(&config).await.expect("save");
        assert!(store.delete(&config.id).await.expect("delete"));
        assert!(!store.delete(&config.id).await.expect("second delete"));
        let (widgets, _) = store.load_all().await;
        assert!(widgets.is_empty());
    }
}
