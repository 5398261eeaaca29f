use crate::style::StyleBag;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod validate;

pub use validate::{
    validate_block, validate_nesting, validate_tree, TreeSchema, ValidationError, MAX_DEPTH,
};

pub const DEFAULT_SPLIT_RATIO: u8 = 50;
pub const MIN_SPLIT_RATIO: u8 = 1;
pub const MAX_SPLIT_RATIO: u8 = 99;

/// An ordered forest of blocks: the launcher layout or the chat window layout.
pub type Tree = Vec<Block>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Container,
    Row,
    Column,
    Split,
    Icon,
    Text,
    Image,
    Status,
    Header,
    Messages,
    Input,
    Button,
    Divider,
    Branding,
}

impl BlockKind {
    pub const ALL: [BlockKind; 14] = [
        Self::Container,
        Self::Row,
        Self::Column,
        Self::Split,
        Self::Icon,
        Self::Text,
        Self::Image,
        Self::Status,
        Self::Header,
        Self::Messages,
        Self::Input,
        Self::Button,
        Self::Divider,
        Self::Branding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Row => "row",
            Self::Column => "column",
            Self::Split => "split",
            Self::Icon => "icon",
            Self::Text => "text",
            Self::Image => "image",
            Self::Status => "status",
            Self::Header => "header",
            Self::Messages => "messages",
            Self::Input => "input",
            Self::Button => "button",
            Self::Divider => "divider",
            Self::Branding => "branding",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Container
                | Self::Row
                | Self::Column
                | Self::Split
                | Self::Header
                | Self::Messages
                | Self::Input
        )
    }

    pub fn accepts_content(&self) -> bool {
        !self.is_container()
    }

    /// Kinds that only exist in the chat window tree.
    pub fn is_chat_only(&self) -> bool {
        matches!(
            self,
            Self::Header
                | Self::Messages
                | Self::Input
                | Self::Button
                | Self::Divider
                | Self::Branding
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_container_kind(kind: BlockKind) -> bool {
    kind.is_container()
}

pub fn accepts_content(kind: BlockKind) -> bool {
    kind.accepts_content()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    ToggleOverlay,
    OpenOverlay,
    OpenLink,
    ComposeEmail,
    DialPhone,
    SendMessage,
    CloseOverlay,
    OpenUrl,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToggleOverlay => "toggle-overlay",
            Self::OpenOverlay => "open-overlay",
            Self::OpenLink => "open-link",
            Self::ComposeEmail => "compose-email",
            Self::DialPhone => "dial-phone",
            Self::SendMessage => "send-message",
            Self::CloseOverlay => "close-overlay",
            Self::OpenUrl => "open-url",
        }
    }

    pub fn requires_target(&self) -> bool {
        matches!(
            self,
            Self::OpenLink | Self::ComposeEmail | Self::DialPhone | Self::OpenUrl
        )
    }

    pub fn is_chat_only(&self) -> bool {
        matches!(self, Self::SendMessage | Self::CloseOverlay | Self::OpenUrl)
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub action: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Interaction {
    pub fn new(action: InteractionKind) -> Self {
        Self {
            action,
            target: None,
        }
    }

    pub fn with_target(action: InteractionKind, target: impl Into<String>) -> Self {
        Self {
            action,
            target: Some(target.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusType {
    #[default]
    Online,
    Away,
    Offline,
}

impl StatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Online => "#22c55e",
            Self::Away => "#f59e0b",
            Self::Offline => "#9ca3af",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "StyleBag::is_empty")]
    pub style: StyleBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_style: Option<StyleBag>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_children"
    )]
    pub children: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide_on_mobile: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_split_ratio"
    )]
    pub split_ratio: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_type: Option<StatusType>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

// An empty list on the wire means the same thing as no list.
fn deserialize_children<'de, D>(deserializer: D) -> Result<Option<Vec<Block>>, D::Error>
where
    D: Deserializer<'de>,
{
    let children = Option::<Vec<Block>>::deserialize(deserializer)?;
    Ok(children.filter(|children| !children.is_empty()))
}

// Stored ratios are clamped into range rather than rejected, whatever number
// the file carries.
fn deserialize_split_ratio<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let ratio = Option::<f64>::deserialize(deserializer)?;
    Ok(ratio
        .filter(|ratio| ratio.is_finite())
        .map(|ratio| clamp_split_ratio(ratio.round() as i64)))
}

impl Block {
    pub fn children(&self) -> &[Block] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn split_ratio(&self) -> u8 {
        self.split_ratio
            .map(|ratio| clamp_split_ratio(i64::from(ratio)))
            .unwrap_or(DEFAULT_SPLIT_RATIO)
    }

    pub fn status(&self) -> StatusType {
        self.status_type.unwrap_or_default()
    }

    pub fn is_interactive(&self) -> bool {
        self.interaction.is_some()
    }

    /// Visits this block and every descendant in depth-first pre-order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Block)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

pub fn clamp_split_ratio(value: i64) -> u8 {
    value.clamp(i64::from(MIN_SPLIT_RATIO), i64::from(MAX_SPLIT_RATIO)) as u8
}

/// The fields a caller supplies for a new block; the id is assigned on insertion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSpec {
    pub kind: Option<BlockKind>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub style: StyleBag,
    #[serde(default)]
    pub hover_style: Option<StyleBag>,
    #[serde(default)]
    pub interaction: Option<Interaction>,
    #[serde(default)]
    pub hide_on_mobile: bool,
    #[serde(default)]
    pub split_ratio: Option<i64>,
    #[serde(default)]
    pub status_type: Option<StatusType>,
}

impl BlockSpec {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn style(mut self, style: StyleBag) -> Self {
        self.style = style;
        self
    }

    pub fn hover_style(mut self, style: StyleBag) -> Self {
        self.hover_style = Some(style);
        self
    }

    pub fn interaction(mut self, interaction: Interaction) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn split_ratio(mut self, ratio: i64) -> Self {
        self.split_ratio = Some(ratio);
        self
    }

    pub fn status_type(mut self, status: StatusType) -> Self {
        self.status_type = Some(status);
        self
    }

    pub fn hide_on_mobile(mut self) -> Self {
        self.hide_on_mobile = true;
        self
    }

    pub fn kind(&self) -> BlockKind {
        self.kind.unwrap_or(BlockKind::Container)
    }

    pub fn into_block(self, id: String) -> Block {
        let kind = self.kind();
        let split_ratio = match kind {
            BlockKind::Split => Some(
                self.split_ratio
                    .map(clamp_split_ratio)
                    .unwrap_or(DEFAULT_SPLIT_RATIO),
            ),
            _ => self.split_ratio.map(clamp_split_ratio),
        };
        let status_type = match kind {
            BlockKind::Status => Some(self.status_type.unwrap_or_default()),
            _ => self.status_type,
        };

        Block {
            id,
            kind,
            content: self.content.filter(|content| !content.is_empty()),
            style: self.style,
            hover_style: self.hover_style,
            children: None,
            interaction: self.interaction,
            hide_on_mobile: self.hide_on_mobile,
            split_ratio,
            status_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn container_predicate_matches_structural_kinds() {
        let containers: Vec<_> = BlockKind::ALL
            .iter()
            .filter(|kind| is_container_kind(**kind))
            .map(|kind| kind.as_str())
            .collect();
        assert_eq!(
            containers,
            vec!["container", "row", "column", "split", "header", "messages", "input"]
        );
        assert!(accepts_content(BlockKind::Icon));
        assert!(accepts_content(BlockKind::Branding));
        assert!(!accepts_content(BlockKind::Split));
    }

    #[test]
    fn empty_children_list_deserializes_as_absent() {
        let block: Block = serde_json::from_value(json!({
            "id": "b1",
            "kind": "container",
            "children": []
        }))
        .expect("block should deserialize");
        assert!(block.children.is_none());

        let value = serde_json::to_value(&block).expect("block should serialize");
        assert!(value.get("children").is_none());
    }

    #[test]
    fn wire_names_are_camel_and_kebab_case() {
        let block = BlockSpec::new(BlockKind::Icon)
            .content("chat")
            .interaction(Interaction::with_target(
                InteractionKind::OpenLink,
                "https://example.com",
            ))
            .hide_on_mobile()
            .into_block("b1".to_string());
        let value = serde_json::to_value(&block).expect("block should serialize");
        assert_eq!(
            value,
            json!({
                "id": "b1",
                "kind": "icon",
                "content": "chat",
                "interaction": {"action": "open-link", "target": "https://example.com"},
                "hideOnMobile": true
            })
        );
    }

    #[test]
    fn split_ratio_is_clamped_on_construction() {
        let low = BlockSpec::new(BlockKind::Split)
            .split_ratio(0)
            .into_block("s1".to_string());
        let high = BlockSpec::new(BlockKind::Split)
            .split_ratio(250)
            .into_block("s2".to_string());
        let default = BlockSpec::new(BlockKind::Split).into_block("s3".to_string());
        assert_eq!(low.split_ratio, Some(1));
        assert_eq!(high.split_ratio, Some(99));
        assert_eq!(default.split_ratio, Some(DEFAULT_SPLIT_RATIO));
    }

    #[test]
    fn stored_out_of_range_ratio_loads_clamped() {
        let cases = [
            (json!(0), 1),
            (json!(300), 99),
            (json!(-5), 1),
            (json!(33.5), 34),
            (json!(42), 42),
        ];
        for (stored, expected) in cases {
            let block: Block = serde_json::from_value(json!({
                "id": "s1",
                "kind": "split",
                "splitRatio": stored
            }))
            .expect("block should deserialize");
            assert_eq!(block.split_ratio, Some(expected), "stored {stored}");
        }
    }

    #[test]
    fn status_blocks_default_to_online() {
        let block = BlockSpec::new(BlockKind::Status).into_block("st".to_string());
        assert_eq!(block.status_type, Some(StatusType::Online));
        assert_eq!(block.status().color(), "#22c55e");
    }
}
