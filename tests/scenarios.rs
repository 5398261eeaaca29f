use serde_json::json;
use widget_studio::block::{BlockKind, BlockSpec};
use widget_studio::editor::WidgetEditor;
use widget_studio::history::HistoryStack;
use widget_studio::render::{activate, render_widget, Outbound, RenderContext, Surface, WidgetRuntime};
use widget_studio::style::{apply_background, detect_background_mode, parse_background, Background, BackgroundMode, StyleBag};
use widget_studio::tree::{
    add_block, collect_ids, delete_block, duplicate_block, find_block, move_block, try_add_block,
    update_block, BlockPatch,
};
use widget_studio::widget::{AuthoringMode, TreeTarget, WidgetConfig};

#[test]
fn launcher_build_delete_duplicate_walkthrough() {
    let (tree, b1) = try_add_block(&[], None, BlockSpec::new(BlockKind::Container)).expect("root add");
    assert_eq!(tree.len(), 1);
    assert!(tree[0].children.is_none());

    let (tree, b2) = try_add_block(&tree, Some(b1.as_str()), BlockSpec::new(BlockKind::Icon).content("chat"))
        .expect("child add");
    assert_eq!(tree[0].children().len(), 1);
    assert_eq!(tree[0].children()[0].id, b2);

    let tree = delete_block(&tree, &b2);
    assert!(tree[0].children.is_none(), "children must be absent, not empty");
    let wire = serde_json::to_value(&tree).expect("tree serializes");
    assert!(wire[0].get("children").is_none());

    let tree = duplicate_block(&tree, &b1);
    assert_eq!(tree.len(), 2);
    let first: Vec<_> = collect_ids(&tree[..1]);
    let second: Vec<_> = collect_ids(&tree[1..]);
    assert!(first.iter().all(|id| !second.contains(id)));
    assert_eq!(tree[0].style, tree[1].style);
}

#[test]
fn gradient_detection_then_switch_to_solid() {
    let bag = StyleBag::new().with("background", "linear-gradient(135deg, #ff0000, #0000ff)");
    assert_eq!(detect_background_mode(&bag), BackgroundMode::Linear);
    assert_eq!(
        parse_background(&bag),
        Background::Linear {
            angle: 135.0,
            from: "#ff0000".to_string(),
            to: "#0000ff".to_string(),
        }
    );

    let solid = apply_background(
        &bag,
        &Background::Solid {
            color: "#00ff00".to_string(),
        },
    );
    assert_eq!(solid, StyleBag::new().with("backgroundColor", "#00ff00"));
}

#[test]
fn ids_stay_unique_across_adds_and_duplicates() {
    let mut tree = add_block(&[], None, BlockSpec::new(BlockKind::Row));
    for round in 0..6 {
        let root = tree[0].id.clone();
        tree = add_block(&tree, Some(root.as_str()), BlockSpec::new(BlockKind::Text).content(format!("t{round}")));
        tree = duplicate_block(&tree, &root);
    }
    let mut ids = collect_ids(&tree);
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn duplicate_is_independent_of_original() {
    let tree: Vec<widget_studio::block::Block> = serde_json::from_value(json!([
        {"id": "card", "kind": "column", "children": [{"id": "label", "kind": "text", "content": "Hi"}]}
    ]))
    .expect("tree");
    let tree = duplicate_block(&tree, "card");
    let clone_label = tree[1].children()[0].id.clone();

    let tree = update_block(&tree, &clone_label, &BlockPatch::content("Changed"));
    assert_eq!(
        find_block(&tree, "label").and_then(|b| b.content.as_deref()),
        Some("Hi")
    );
    assert_eq!(
        find_block(&tree, &clone_label).and_then(|b| b.content.as_deref()),
        Some("Changed")
    );
}

#[test]
fn moving_onto_self_is_identity() {
    let tree = add_block(&[], None, BlockSpec::new(BlockKind::Icon));
    let id = tree[0].id.clone();
    assert_eq!(move_block(&tree, &id, &id), tree);
}

#[test]
fn history_holds_fifty_snapshots() {
    let mut history = HistoryStack::new(0usize);
    for value in 1..=51 {
        history.push(value);
    }
    assert_eq!(history.len(), 50);
    while history.can_undo() {
        history.undo();
    }
    assert_eq!(*history.current(), 2);
}

#[test]
fn editor_undo_redo_is_inverse() {
    let config = WidgetConfig::new("Scenario");
    let mut editor = WidgetEditor::new(config.clone());
    editor
        .add_block(None, BlockSpec::new(BlockKind::Container))
        .expect("container is valid");
    let after = editor.config().clone();

    assert_eq!(editor.undo(), &config);
    assert_eq!(editor.redo(), &after);
}

#[test]
fn authored_launcher_opens_the_chat_and_links_leave_the_widget() {
    let mut config = WidgetConfig::new("Live");
    config.authoring_mode = AuthoringMode::Advanced;
    let launcher = serde_json::from_value(json!([{
        "id": "launch", "kind": "container",
        "interaction": {"action": "toggle-overlay"},
        "children": [
            {"id": "icon", "kind": "icon", "content": "chat"},
            {"id": "docs", "kind": "text", "content": "Docs",
             "interaction": {"action": "open-link", "target": "https://example.com/docs"}}
        ]
    }]))
    .expect("launcher tree");
    let config = config.with_tree(TreeTarget::Launcher, launcher);
    assert!(config.validate().is_ok());

    let mut runtime = WidgetRuntime::new();
    let frame = render_widget(&config, &RenderContext::new(runtime.overlay_open()));
    assert_eq!(frame.surface, Surface::Launcher);

    assert!(activate(&frame.nodes, "docs", &mut runtime));
    assert!(!runtime.overlay_open(), "the link must not bubble to the launcher");
    assert_eq!(
        runtime.drain(),
        vec![Outbound::OpenUrl {
            url: "https://example.com/docs".to_string()
        }]
    );

    assert!(activate(&frame.nodes, "icon", &mut runtime));
    assert!(runtime.overlay_open());
    let frame = render_widget(&config, &RenderContext::new(runtime.overlay_open()));
    assert_eq!(frame.surface, Surface::Chat);
    assert!(!frame.from_tree);
}
