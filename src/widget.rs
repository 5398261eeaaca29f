use crate::block::{validate_tree, Block, StatusType, Tree, TreeSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;

/// Which tree an edit or render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeTarget {
    Launcher,
    Chat,
}

impl TreeTarget {
    pub fn schema(&self) -> TreeSchema {
        match self {
            Self::Launcher => TreeSchema::Launcher,
            Self::Chat => TreeSchema::Chat,
        }
    }
}

/// `Simple` renders the fixed layout from settings; `Advanced` renders the
/// authored trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthoringMode {
    #[default]
    Simple,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPosition {
    #[default]
    BottomRight,
    BottomLeft,
}

/// The scalar settings that drive the fallback layout and global defaults.
/// Keys this type does not model are carried through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetSettings {
    pub title: String,
    pub subtitle: Option<String>,
    pub avatar_url: Option<String>,
    pub greeting: String,
    pub input_placeholder: String,
    pub send_label: String,
    pub status: StatusType,
    pub primary_color: String,
    pub header_text_color: String,
    pub background_color: String,
    pub text_color: String,
    pub bot_bubble_color: String,
    pub font_family: String,
    pub font_size: f64,
    pub border_radius: f64,
    pub launcher_icon: String,
    pub launcher_label: Option<String>,
    pub launcher_size: f64,
    pub position: WidgetPosition,
    pub animation_duration_ms: u32,
    pub show_branding: bool,
    pub branding_text: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            title: "Chat with us".to_string(),
            subtitle: Some("We typically reply in a few minutes".to_string()),
            avatar_url: None,
            greeting: "Hi there! How can we help?".to_string(),
            input_placeholder: "Type a message...".to_string(),
            send_label: "Send".to_string(),
            status: StatusType::Online,
            primary_color: "#4f46e5".to_string(),
            header_text_color: "#ffffff".to_string(),
            background_color: "#ffffff".to_string(),
            text_color: "#111827".to_string(),
            bot_bubble_color: "#f3f4f6".to_string(),
            font_family: "Inter, sans-serif".to_string(),
            font_size: 14.0,
            border_radius: 16.0,
            launcher_icon: "chat".to_string(),
            launcher_label: None,
            launcher_size: 56.0,
            position: WidgetPosition::BottomRight,
            animation_duration_ms: 200,
            show_branding: true,
            branding_text: "Powered by Widget Studio".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub authoring_mode: AuthoringMode,
    #[serde(default)]
    pub launcher_structure: Tree,
    #[serde(default)]
    pub chat_structure: Tree,
    #[serde(default)]
    pub settings: WidgetSettings,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl WidgetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: format!("wgt-{}", Uuid::new_v4()),
            name: name.into(),
            authoring_mode: AuthoringMode::Simple,
            launcher_structure: Vec::new(),
            chat_structure: Vec::new(),
            settings: WidgetSettings::default(),
        }
    }

    pub fn tree(&self, target: TreeTarget) -> &[Block] {
        match target {
            TreeTarget::Launcher => &self.launcher_structure,
            TreeTarget::Chat => &self.chat_structure,
        }
    }

    /// Returns a copy with `target` replaced by `tree`.
    pub fn with_tree(&self, target: TreeTarget, tree: Tree) -> Self {
        let mut next = self.clone();
        match target {
            TreeTarget::Launcher => next.launcher_structure = tree,
            TreeTarget::Chat => next.chat_structure = tree,
        }
        next
    }

    /// True when `target` should be drawn from its authored tree rather than
    /// the fallback layout.
    pub fn renders_tree(&self, target: TreeTarget) -> bool {
        self.authoring_mode == AuthoringMode::Advanced && !self.tree(target).is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_tree(TreeSchema::Launcher, &self.launcher_structure)?;
        validate_tree(TreeSchema::Chat, &self.chat_structure)
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::new("Untitled widget")
    }
}
