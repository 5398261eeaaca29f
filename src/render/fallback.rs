//! Fixed layouts drawn from scalar settings when a surface has no authored
//! tree. The authored trees are never read here: the layout depends on
//! [`WidgetSettings`] alone. It is still assembled as a private block tree
//! with fixed `fallback-*` ids, so it renders through the same path as
//! authored content and matches the equivalent minimal tree node for node.
//! The same tree, with fresh ids, seeds a surface when an author switches to
//! advanced mode.

use super::{render, RenderContext, VisualNode};
use crate::block::{Block, BlockKind, BlockSpec, Interaction, InteractionKind, Tree};
use crate::style::StyleBag;
use crate::tree::clone_with_fresh_ids;
use crate::widget::{TreeTarget, WidgetSettings};

const KEY_PREFIX: &str = "fallback";

fn node(name: &str, spec: BlockSpec, children: Vec<Block>) -> Block {
    let mut block = spec.into_block(format!("{KEY_PREFIX}-{name}"));
    if !children.is_empty() {
        block.children = Some(children);
    }
    block
}

pub fn launcher_tree(settings: &WidgetSettings) -> Tree {
    let mut children = vec![node(
        "launcher-icon",
        BlockSpec::new(BlockKind::Icon)
            .content(settings.launcher_icon.as_str())
            .style(StyleBag::new().with("color", settings.header_text_color.as_str())),
        Vec::new(),
    )];
    if let Some(label) = settings.launcher_label.as_deref().filter(|l| !l.is_empty()) {
        children.push(node(
            "launcher-label",
            BlockSpec::new(BlockKind::Text)
                .content(label)
                .style(StyleBag::new().with("color", settings.header_text_color.as_str())),
            Vec::new(),
        ));
    }

    let style = StyleBag::new()
        .with("backgroundColor", settings.primary_color.as_str())
        .with("width", settings.launcher_size)
        .with("height", settings.launcher_size)
        .with("borderRadius", settings.launcher_size / 2.0)
        .with("alignItems", "center")
        .with("justifyContent", "center");

    vec![node(
        "launcher",
        BlockSpec::new(BlockKind::Container)
            .style(style)
            .interaction(Interaction::new(InteractionKind::ToggleOverlay)),
        children,
    )]
}

pub fn chat_tree(settings: &WidgetSettings) -> Tree {
    let on_primary = StyleBag::new().with("color", settings.header_text_color.as_str());

    let mut titles = vec![node(
        "title",
        BlockSpec::new(BlockKind::Text)
            .content(settings.title.as_str())
            .style(on_primary.clone().with("fontWeight", 600)),
        Vec::new(),
    )];
    if let Some(subtitle) = settings.subtitle.as_deref().filter(|s| !s.is_empty()) {
        titles.push(node(
            "subtitle",
            BlockSpec::new(BlockKind::Text)
                .content(subtitle)
                .style(on_primary.clone().with("fontSize", settings.font_size - 2.0)),
            Vec::new(),
        ));
    }

    let mut header = Vec::new();
    if let Some(avatar) = settings.avatar_url.as_deref().filter(|a| !a.is_empty()) {
        header.push(node(
            "avatar",
            BlockSpec::new(BlockKind::Image)
                .content(avatar)
                .style(StyleBag::new().with("width", 36).with("height", 36).with("borderRadius", 18)),
            Vec::new(),
        ));
    }
    header.push(node("titles", BlockSpec::new(BlockKind::Column), titles));
    header.push(node(
        "status",
        BlockSpec::new(BlockKind::Status).status_type(settings.status),
        Vec::new(),
    ));
    header.push(node(
        "close",
        BlockSpec::new(BlockKind::Icon)
            .content("close")
            .style(on_primary.clone())
            .interaction(Interaction::new(InteractionKind::CloseOverlay)),
        Vec::new(),
    ));

    let greeting = node(
        "greeting",
        BlockSpec::new(BlockKind::Text)
            .content(settings.greeting.as_str())
            .style(
                StyleBag::new()
                    .with("backgroundColor", settings.bot_bubble_color.as_str())
                    .with("color", settings.text_color.as_str())
                    .with("borderRadius", settings.border_radius)
                    .with("padding", 10),
            ),
        Vec::new(),
    );

    let input = vec![
        node(
            "placeholder",
            BlockSpec::new(BlockKind::Text)
                .content(settings.input_placeholder.as_str())
                .style(StyleBag::new().with("color", "#9ca3af")),
            Vec::new(),
        ),
        node(
            "send",
            BlockSpec::new(BlockKind::Button)
                .content(settings.send_label.as_str())
                .style(
                    on_primary
                        .clone()
                        .with("backgroundColor", settings.primary_color.as_str())
                        .with("borderRadius", settings.border_radius / 2.0),
                )
                .interaction(Interaction::new(InteractionKind::SendMessage)),
            Vec::new(),
        ),
    ];

    let mut tree = vec![
        node(
            "header",
            BlockSpec::new(BlockKind::Header).style(
                StyleBag::new()
                    .with("backgroundColor", settings.primary_color.as_str())
                    .with("padding", 12),
            ),
            header,
        ),
        node(
            "messages",
            BlockSpec::new(BlockKind::Messages).style(
                StyleBag::new()
                    .with("backgroundColor", settings.background_color.as_str())
                    .with("fontFamily", settings.font_family.as_str())
                    .with("fontSize", settings.font_size),
            ),
            vec![greeting],
        ),
        node("input", BlockSpec::new(BlockKind::Input), input),
    ];
    if settings.show_branding {
        tree.push(node(
            "branding",
            BlockSpec::new(BlockKind::Branding).content(settings.branding_text.as_str()),
            Vec::new(),
        ));
    }
    tree
}

pub fn fallback_launcher(settings: &WidgetSettings, ctx: &RenderContext) -> Vec<VisualNode> {
    render(&launcher_tree(settings), ctx)
}

pub fn fallback_chat(settings: &WidgetSettings, ctx: &RenderContext) -> Vec<VisualNode> {
    render(&chat_tree(settings), ctx)
}

/// The fallback layout for `target` as an editable tree with fresh ids.
pub fn starter_tree(target: TreeTarget, settings: &WidgetSettings) -> Tree {
    let tree = match target {
        TreeTarget::Launcher => launcher_tree(settings),
        TreeTarget::Chat => chat_tree(settings),
    };
    tree.iter().map(clone_with_fresh_ids).collect()
}
