//! Tree interpreter.
//!
//! [`render`] walks a block tree and produces presentation-neutral
//! [`VisualNode`]s. Interactions are carried on the nodes as [`Activation`]s;
//! the presentation layer reports pointer activations back through
//! [`activate`], which resolves the deepest interactive node and dispatches
//! exactly once.

use crate::block::{Block, BlockKind, InteractionKind, StatusType};
use crate::style::{effective_style, StyleBag};
use crate::widget::{TreeTarget, WidgetConfig};
use serde::Serialize;

pub mod dispatch;
pub mod fallback;

pub use dispatch::{Dispatcher, OverlayState, Outbound, WidgetRuntime};
pub use fallback::{fallback_chat, fallback_launcher, starter_tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionRole {
    Container,
    Row,
    Column,
    Split,
    Header,
    Messages,
    Input,
}

impl RegionRole {
    fn for_kind(kind: BlockKind) -> Option<(Self, Layout)> {
        let region = match kind {
            BlockKind::Container => (Self::Container, Layout::Column),
            BlockKind::Row => (Self::Row, Layout::Row),
            BlockKind::Column => (Self::Column, Layout::Column),
            BlockKind::Split => (Self::Split, Layout::Row),
            BlockKind::Header => (Self::Header, Layout::Row),
            BlockKind::Messages => (Self::Messages, Layout::Column),
            BlockKind::Input => (Self::Input, Layout::Row),
            _ => return None,
        };
        Some(region)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum Element {
    Region { role: RegionRole, layout: Layout },
    /// One side of a split; `percent` of the split's main axis.
    Pane { percent: u8 },
    Icon { name: String },
    Text { text: String },
    Image { src: String },
    Status {
        status: StatusType,
        color: String,
        label: Option<String>,
    },
    Button { label: String },
    Divider,
    Branding { text: String },
}

impl Element {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Region { .. } => "region",
            Self::Pane { .. } => "pane",
            Self::Icon { .. } => "icon",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Status { .. } => "status",
            Self::Button { .. } => "button",
            Self::Divider => "divider",
            Self::Branding { .. } => "branding",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub action: InteractionKind,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualNode {
    /// The source block id, or a synthetic key for fallback and split panes.
    pub key: String,
    pub element: Element,
    pub style: StyleBag,
    pub activation: Option<Activation>,
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn leaf(key: impl Into<String>, element: Element, style: StyleBag) -> Self {
        Self {
            key: key.into(),
            element,
            style,
            activation: None,
            children: Vec::new(),
        }
    }

    pub fn region(
        key: impl Into<String>,
        role: RegionRole,
        layout: Layout,
        style: StyleBag,
        children: Vec<VisualNode>,
    ) -> Self {
        Self {
            key: key.into(),
            element: Element::Region { role, layout },
            style,
            activation: None,
            children,
        }
    }

    pub fn with_activation(mut self, action: InteractionKind, target: Option<String>) -> Self {
        self.activation = Some(Activation { action, target });
        self
    }

    pub fn find(&self, key: &str) -> Option<&VisualNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub overlay_open: bool,
    /// Id of the block under the pointer, if any.
    pub hovered: Option<String>,
    pub narrow_viewport: bool,
}

impl RenderContext {
    pub fn new(overlay_open: bool) -> Self {
        Self {
            overlay_open,
            ..Self::default()
        }
    }

    fn is_hovered(&self, id: &str) -> bool {
        self.hovered.as_deref() == Some(id)
    }
}

pub fn render(tree: &[Block], ctx: &RenderContext) -> Vec<VisualNode> {
    tree.iter()
        .filter(|block| !(block.hide_on_mobile && ctx.narrow_viewport))
        .map(|block| render_block(block, ctx))
        .collect()
}

fn render_block(block: &Block, ctx: &RenderContext) -> VisualNode {
    let style = effective_style(block, ctx.is_hovered(&block.id)).into_owned();
    let content = block.content.clone().unwrap_or_default();

    let (element, children) = match block.kind {
        BlockKind::Icon => (Element::Icon { name: content }, Vec::new()),
        BlockKind::Text => (Element::Text { text: content }, Vec::new()),
        BlockKind::Image => (Element::Image { src: content }, Vec::new()),
        BlockKind::Status => {
            let status = block.status();
            (
                Element::Status {
                    status,
                    color: status.color().to_string(),
                    label: block.content.clone(),
                },
                Vec::new(),
            )
        }
        BlockKind::Button => (Element::Button { label: content }, Vec::new()),
        BlockKind::Divider => (Element::Divider, Vec::new()),
        BlockKind::Branding => (Element::Branding { text: content }, Vec::new()),
        BlockKind::Split => (
            Element::Region {
                role: RegionRole::Split,
                layout: Layout::Row,
            },
            render_split(block, ctx),
        ),
        kind => {
            let (role, layout) = RegionRole::for_kind(kind).unwrap_or((RegionRole::Container, Layout::Column));
            (Element::Region { role, layout }, render(block.children(), ctx))
        }
    };

    VisualNode {
        key: block.id.clone(),
        element,
        style,
        activation: block.interaction.as_ref().map(|interaction| Activation {
            action: interaction.action,
            target: interaction.target.clone(),
        }),
        children,
    }
}

// Always two panes; missing children leave a pane empty and extras are ignored.
fn render_split(block: &Block, ctx: &RenderContext) -> Vec<VisualNode> {
    let ratio = block.split_ratio();
    let children = block.children();
    [ratio, 100 - ratio]
        .into_iter()
        .enumerate()
        .map(|(index, percent)| VisualNode {
            key: format!("{}#{index}", block.id),
            element: Element::Pane { percent },
            style: StyleBag::new(),
            activation: None,
            children: render(children.get(index..=index).unwrap_or(&[]), ctx),
        })
        .collect()
}

/// Resolves a pointer activation on the node `key`. Only the deepest
/// interactive node on the path from the root receives the dispatch; enclosing
/// interactive nodes do not. Returns whether anything was dispatched.
pub fn activate(nodes: &[VisualNode], key: &str, dispatcher: &mut dyn Dispatcher) -> bool {
    match nodes.iter().find_map(|node| deepest_activation(node, key)) {
        Some(Some(activation)) => {
            dispatcher.dispatch(activation.action, activation.target.as_deref());
            true
        }
        _ => false,
    }
}

fn deepest_activation<'a>(node: &'a VisualNode, key: &str) -> Option<Option<&'a Activation>> {
    if node.key == key {
        return Some(node.activation.as_ref());
    }
    node.children
        .iter()
        .find_map(|child| deepest_activation(child, key))
        .map(|inner| inner.or(node.activation.as_ref()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Launcher,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetFrame {
    pub surface: Surface,
    /// False when the surface was drawn from the fallback layout.
    pub from_tree: bool,
    pub nodes: Vec<VisualNode>,
}

/// Renders whichever surface is visible: the launcher while the overlay is
/// closed, the chat window while it is open.
pub fn render_widget(config: &WidgetConfig, ctx: &RenderContext) -> WidgetFrame {
    let (surface, target) = if ctx.overlay_open {
        (Surface::Chat, TreeTarget::Chat)
    } else {
        (Surface::Launcher, TreeTarget::Launcher)
    };

    if config.renders_tree(target) {
        return WidgetFrame {
            surface,
            from_tree: true,
            nodes: render(config.tree(target), ctx),
        };
    }

    let nodes = match surface {
        Surface::Launcher => fallback_launcher(&config.settings, ctx),
        Surface::Chat => fallback_chat(&config.settings, ctx),
    };
    WidgetFrame {
        surface,
        from_tree: false,
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::AuthoringMode;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Vec<Block> {
        serde_json::from_value(value).expect("tree should deserialize")
    }

    #[derive(Default)]
    struct Recorder(Vec<(InteractionKind, Option<String>)>);

    impl Dispatcher for Recorder {
        fn dispatch(&mut self, action: InteractionKind, target: Option<&str>) {
            self.0.push((action, target.map(str::to_string)));
        }
    }

    #[test]
    fn leaves_render_their_content() {
        let nodes = render(
            &tree(json!([
                {"id": "i", "kind": "icon", "content": "chat"},
                {"id": "s", "kind": "status", "statusType": "away", "content": "Back soon"},
                {"id": "d", "kind": "divider"}
            ])),
            &RenderContext::default(),
        );
        assert_eq!(nodes[0].element, Element::Icon { name: "chat".to_string() });
        assert_eq!(
            nodes[1].element,
            Element::Status {
                status: StatusType::Away,
                color: "#f59e0b".to_string(),
                label: Some("Back soon".to_string()),
            }
        );
        assert_eq!(nodes[2].element, Element::Divider);
        assert!(nodes.iter().all(|node| node.children.is_empty()));
    }

    #[test]
    fn structural_kinds_recurse_with_layout() {
        let nodes = render(
            &tree(json!([{"id": "r", "kind": "row", "children": [
                {"id": "c", "kind": "column", "children": [{"id": "t", "kind": "text", "content": "hi"}]}
            ]}])),
            &RenderContext::default(),
        );
        assert_eq!(
            nodes[0].element,
            Element::Region { role: RegionRole::Row, layout: Layout::Row }
        );
        assert_eq!(
            nodes[0].children[0].element,
            Element::Region { role: RegionRole::Column, layout: Layout::Column }
        );
        assert_eq!(nodes[0].children[0].children[0].key, "t");
    }

    #[test]
    fn split_always_yields_two_sized_panes() {
        let nodes = render(
            &tree(json!([{"id": "sp", "kind": "split", "splitRatio": 30, "children": [
                {"id": "a", "kind": "text"},
                {"id": "b", "kind": "text"},
                {"id": "c", "kind": "text"}
            ]}])),
            &RenderContext::default(),
        );
        let panes = &nodes[0].children;
        assert_eq!(panes.len(), 2);
        assert_eq!(panes[0].element, Element::Pane { percent: 30 });
        assert_eq!(panes[1].element, Element::Pane { percent: 70 });
        assert_eq!(panes[0].children[0].key, "a");
        assert_eq!(panes[1].children[0].key, "b");

        let lonely = render(
            &tree(json!([{"id": "sp", "kind": "split", "children": [{"id": "a", "kind": "text"}]}])),
            &RenderContext::default(),
        );
        assert_eq!(lonely[0].children.len(), 2);
        assert_eq!(lonely[0].children[0].element, Element::Pane { percent: 50 });
        assert!(lonely[0].children[1].children.is_empty());
    }

    #[test]
    fn hover_style_applies_only_to_hovered_block() {
        let blocks = tree(json!([{
            "id": "btn", "kind": "button", "content": "Go",
            "style": {"color": "#ffffff", "padding": 8},
            "hoverStyle": {"color": "#000000"}
        }]));
        let resting = render(&blocks, &RenderContext::default());
        assert_eq!(resting[0].style.get_str("color"), Some("#ffffff"));

        let ctx = RenderContext {
            hovered: Some("btn".to_string()),
            ..RenderContext::default()
        };
        let hovered = render(&blocks, &ctx);
        assert_eq!(hovered[0].style.get_str("color"), Some("#000000"));
        assert!(hovered[0].style.contains("padding"));
    }

    #[test]
    fn narrow_viewport_drops_hidden_blocks() {
        let blocks = tree(json!([
            {"id": "a", "kind": "text", "hideOnMobile": true},
            {"id": "b", "kind": "row", "children": [{"id": "c", "kind": "icon", "hideOnMobile": true}]}
        ]));
        let ctx = RenderContext {
            narrow_viewport: true,
            ..RenderContext::default()
        };
        let nodes = render(&blocks, &ctx);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].children.is_empty());
        assert_eq!(render(&blocks, &RenderContext::default()).len(), 2);
    }

    #[test]
    fn activation_is_captured_by_deepest_interactive_block() {
        let nodes = render(
            &tree(json!([{
                "id": "outer", "kind": "container",
                "interaction": {"action": "toggle-overlay"},
                "children": [
                    {"id": "link", "kind": "text", "content": "Docs",
                     "interaction": {"action": "open-link", "target": "https://docs.example.com"}},
                    {"id": "plain", "kind": "icon", "content": "chat"}
                ]
            }])),
            &RenderContext::default(),
        );

        let mut recorder = Recorder::default();
        assert!(activate(&nodes, "link", &mut recorder));
        assert!(activate(&nodes, "plain", &mut recorder));
        assert!(!activate(&nodes, "missing", &mut recorder));
        assert_eq!(
            recorder.0,
            vec![
                (
                    InteractionKind::OpenLink,
                    Some("https://docs.example.com".to_string())
                ),
                (InteractionKind::ToggleOverlay, None),
            ]
        );
    }

    #[test]
    fn widget_shows_one_surface_and_falls_back_without_tree() {
        let mut config = WidgetConfig::new("w");
        let closed = render_widget(&config, &RenderContext::new(false));
        assert_eq!(closed.surface, Surface::Launcher);
        assert!(!closed.from_tree);

        config.authoring_mode = AuthoringMode::Advanced;
        config.launcher_structure = tree(json!([{"id": "l", "kind": "icon", "content": "bolt"}]));
        let closed = render_widget(&config, &RenderContext::new(false));
        assert!(closed.from_tree);
        assert_eq!(closed.nodes[0].key, "l");

        let open = render_widget(&config, &RenderContext::new(true));
        assert_eq!(open.surface, Surface::Chat);
        assert!(!open.from_tree, "empty chat tree uses the fallback");
    }

    #[test]
    fn simple_mode_fallback_ignores_authored_trees() {
        let plain = WidgetConfig::new("w");
        let mut authored = plain.clone();
        authored.chat_structure = tree(json!([{"id": "h", "kind": "header", "children": [
            {"id": "t", "kind": "text", "content": "Authored"}
        ]}]));

        let ctx = RenderContext::new(true);
        let expected = render_widget(&plain, &ctx);
        let actual = render_widget(&authored, &ctx);
        assert!(!actual.from_tree);
        assert_eq!(actual.nodes, expected.nodes);
    }
}
