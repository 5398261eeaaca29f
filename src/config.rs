use crate::history::DEFAULT_CAPACITY;
use std::path::PathBuf;
use thiserror::Error;

pub const HOME_VAR: &str = "WIDGET_STUDIO_HOME";
pub const HISTORY_VAR: &str = "WIDGET_STUDIO_HISTORY";
pub const LOG_VAR: &str = "WIDGET_STUDIO_LOG";
pub const NARROW_VAR: &str = "WIDGET_STUDIO_NARROW";

pub const DEFAULT_LOG_FILTER: &str = "widget_studio=info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value `{value}`: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    pub home: PathBuf,
    pub history_capacity: usize,
    pub log_filter: String,
    pub narrow_viewport: bool,
}

impl StudioConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let home = match var(HOME_VAR) {
            Some(home) => PathBuf::from(home),
            None => var("HOME")
                .or_else(|| var("USERPROFILE"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".widget-studio"),
        };

        let history_capacity = match var(HISTORY_VAR) {
            Some(raw) => {
                let capacity: usize = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: HISTORY_VAR,
                    value: raw.clone(),
                    reason: "expected a positive integer",
                })?;
                if capacity == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: HISTORY_VAR,
                        value: raw,
                        reason: "must be at least 1",
                    });
                }
                capacity
            }
            None => DEFAULT_CAPACITY,
        };

        let narrow_viewport = match var(NARROW_VAR) {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                var: NARROW_VAR,
                value: raw.clone(),
                reason: "expected 1, 0, true or false",
            })?,
            None => false,
        };

        Ok(Self {
            home,
            history_capacity,
            log_filter: var(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            narrow_viewport,
        })
    }

    pub fn widgets_dir(&self) -> PathBuf {
        self.home.join("widgets")
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
