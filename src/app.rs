use crate::event::StudioEvent;
use crate::preview::NodePainter;
use crate::theme::Theme;
use crate::worker::StoreWorker;
use eframe::egui::{self, Key, KeyboardShortcut, Modifiers, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{SystemTime, UNIX_EPOCH};
use widget_studio::block::{Block, BlockKind, BlockSpec};
use widget_studio::config::StudioConfig;
use widget_studio::editor::WidgetEditor;
use widget_studio::render::{activate, render_widget, Outbound, RenderContext, WidgetRuntime};
use widget_studio::tree::{find_block, find_parent_id, BlockPatch};
use widget_studio::widget::{AuthoringMode, TreeTarget, WidgetConfig};

const UNDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
const REDO: KeyboardShortcut =
    KeyboardShortcut::new(Modifiers::COMMAND.plus(Modifiers::SHIFT), Key::Z);

enum OutlineAction {
    Select(String),
    Duplicate(String),
    Delete(String),
    MoveUp(String),
}

pub struct StudioApp {
    rx: Receiver<StudioEvent>,
    worker: StoreWorker,
    theme: Theme,
    settings: StudioConfig,
    editor: WidgetEditor,
    runtime: WidgetRuntime,
    widgets: Vec<WidgetConfig>,
    hovered: Option<String>,
    narrow_viewport: bool,
    add_kind: BlockKind,
    content_buffer: String,
    diagnostics_log: Vec<String>,
}

impl StudioApp {
    pub fn new(
        rx: Receiver<StudioEvent>,
        worker: StoreWorker,
        settings: StudioConfig,
        ctx: &egui::Context,
    ) -> Self {
        let theme = Theme::default();
        theme.apply_visuals(ctx);
        worker.load_all();

        Self {
            rx,
            worker,
            theme,
            narrow_viewport: settings.narrow_viewport,
            editor: WidgetEditor::with_capacity(WidgetConfig::default(), settings.history_capacity),
            settings,
            runtime: WidgetRuntime::new(),
            widgets: Vec::new(),
            hovered: None,
            add_kind: BlockKind::Container,
            content_buffer: String::new(),
            diagnostics_log: Vec::new(),
        }
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "studio diagnostic");
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message));
    }

    fn open_widget(&mut self, config: WidgetConfig) {
        let target = self.editor.target();
        let previous = std::mem::replace(
            &mut self.editor,
            WidgetEditor::with_capacity(config, self.settings.history_capacity),
        );
        previous.discard();
        self.editor.set_target(target);
        self.runtime = WidgetRuntime::new();
        self.hovered = None;
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("store channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: StudioEvent) {
        match event {
            StudioEvent::WidgetsLoaded { widgets, warnings } => {
                self.widgets = widgets;
                for warning in warnings {
                    self.log_diagnostic(format!("widget load warning: {warning}"));
                }
            }
            StudioEvent::WidgetSaved { widget_id, path } => {
                self.log_diagnostic(format!("saved {widget_id} to {}", path.display()));
                self.worker.load_all();
            }
            StudioEvent::WidgetDeleted { widget_id } => {
                self.log_diagnostic(format!("deleted {widget_id}"));
                self.worker.load_all();
            }
            StudioEvent::StoreError(message) => self.log_diagnostic(message),
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // Redo first: Ctrl+Shift+Z would otherwise also match Ctrl+Z.
        if ctx.input_mut(|input| input.consume_shortcut(&REDO)) {
            self.editor.redo();
        }
        if ctx.input_mut(|input| input.consume_shortcut(&UNDO)) {
            self.editor.undo();
        }
    }

    fn flush_outbound(&mut self) {
        for request in self.runtime.drain() {
            match request.uri() {
                Some(uri) => {
                    if let Err(err) = open::that(uri) {
                        self.log_diagnostic(format!("failed to open {uri}: {err}"));
                    } else {
                        self.log_diagnostic(request.to_log_line());
                    }
                }
                None if request == Outbound::SendMessage => {
                    self.log_diagnostic("preview message sent");
                }
                None => {}
            }
        }
    }

    fn save(&mut self) {
        self.worker.save(self.editor.config().clone());
        self.editor.mark_saved();
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Widget Studio");
                ui.separator();
                let name = if self.editor.is_dirty() {
                    format!("{} *", self.editor.config().name)
                } else {
                    self.editor.config().name.clone()
                };
                ui.label(name);
                ui.separator();

                let mut mode = self.editor.config().authoring_mode;
                ui.selectable_value(&mut mode, AuthoringMode::Simple, "Simple");
                ui.selectable_value(&mut mode, AuthoringMode::Advanced, "Advanced");
                if mode != self.editor.config().authoring_mode {
                    self.editor.set_authoring_mode(mode);
                }
                ui.separator();

                let mut target = self.editor.target();
                ui.selectable_value(&mut target, TreeTarget::Launcher, "Launcher");
                ui.selectable_value(&mut target, TreeTarget::Chat, "Chat");
                if target != self.editor.target() {
                    self.editor.set_target(target);
                    self.editor.set_selected_block(None);
                    self.runtime.set_overlay_open(target == TreeTarget::Chat);
                }
                ui.separator();

                if ui
                    .add_enabled(self.editor.can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    self.editor.undo();
                }
                if ui
                    .add_enabled(self.editor.can_redo(), egui::Button::new("Redo"))
                    .clicked()
                {
                    self.editor.redo();
                }
                if ui.button("Save").clicked() {
                    self.save();
                }
                ui.checkbox(&mut self.narrow_viewport, "Narrow");
            });
        });
    }

    fn render_left_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("widgets_panel")
            .resizable(true)
            .show(ctx, |ui| {
                ui.heading("Widgets");
                ui.label(
                    RichText::new(self.settings.widgets_dir().display().to_string())
                        .color(self.theme.text_muted)
                        .size(11.0),
                );
                if ui.button("New widget").clicked() {
                    self.open_widget(WidgetConfig::default());
                }
                ui.separator();

                let current_id = self.editor.config().id.clone();
                let mut clicked: Option<WidgetConfig> = None;
                let mut deleted: Option<String> = None;
                for widget in &self.widgets {
                    ui.horizontal(|ui| {
                        let label = if widget.name.is_empty() {
                            widget.id.clone()
                        } else {
                            widget.name.clone()
                        };
                        if ui.selectable_label(widget.id == current_id, label).clicked() {
                            clicked = Some(widget.clone());
                        }
                        if ui.small_button("x").clicked() {
                            deleted = Some(widget.id.clone());
                        }
                    });
                }

                if let Some(widget) = clicked {
                    self.open_widget(widget);
                }
                if let Some(widget_id) = deleted {
                    self.worker.delete(widget_id);
                }

                ui.separator();
                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(160.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in &self.diagnostics_log {
                                    ui.label(RichText::new(entry).size(11.0));
                                }
                            });
                    });
            });
    }

    fn render_right_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("structure_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Structure");
                if self.editor.config().authoring_mode == AuthoringMode::Simple {
                    ui.label(
                        RichText::new("Simple mode draws the layout from settings.")
                            .color(self.theme.text_muted),
                    );
                    self.render_settings(ui);
                    return;
                }

                if self.editor.tree().is_empty() && ui.button("Start from current layout").clicked() {
                    self.editor.insert_starter_tree();
                }
                self.render_add_controls(ui);
                ui.separator();

                let mut action = None;
                ScrollArea::vertical()
                    .id_salt("outline")
                    .max_height(ui.available_height() * 0.5)
                    .show(ui, |ui| {
                        let selected = self.editor.preferences().selected_block.clone();
                        for block in self.editor.tree() {
                            outline_row(ui, block, 0, selected.as_deref(), &mut action);
                        }
                    });
                if let Some(action) = action {
                    self.apply_outline_action(action);
                }

                ui.separator();
                self.render_block_inspector(ui);
            });
    }

    fn render_add_controls(&mut self, ui: &mut egui::Ui) {
        let allowed = self.editor.target().schema().allowed_kinds();
        if !allowed.contains(&self.add_kind) {
            self.add_kind = BlockKind::Container;
        }
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("add_kind")
                .selected_text(self.add_kind.as_str())
                .show_ui(ui, |ui| {
                    for kind in allowed {
                        ui.selectable_value(&mut self.add_kind, kind, kind.as_str());
                    }
                });
            if ui.button("Add").clicked() {
                // Into the selected container, otherwise at the root.
                let parent = self
                    .editor
                    .preferences()
                    .selected_block
                    .clone()
                    .filter(|id| {
                        find_block(self.editor.tree(), id).is_some_and(|b| b.kind.is_container())
                    });
                match self
                    .editor
                    .add_block(parent.as_deref(), BlockSpec::new(self.add_kind))
                {
                    Ok(Some(id)) => self.editor.set_selected_block(Some(id)),
                    Ok(None) => {}
                    Err(err) => self.log_diagnostic(format!("cannot add block: {err}")),
                }
            }
        });
    }

    fn apply_outline_action(&mut self, action: OutlineAction) {
        match action {
            OutlineAction::Select(id) => {
                self.content_buffer = find_block(self.editor.tree(), &id)
                    .and_then(|block| block.content.clone())
                    .unwrap_or_default();
                self.editor.set_selected_block(Some(id));
            }
            OutlineAction::Duplicate(id) => {
                if let Some(clone_id) = self.editor.duplicate_block(&id) {
                    self.editor.set_selected_block(Some(clone_id));
                }
            }
            OutlineAction::Delete(id) => {
                self.editor.delete_block(&id);
            }
            OutlineAction::MoveUp(id) => {
                if let Some(previous) = previous_sibling_id(self.editor.tree(), &id) {
                    if let Err(err) = self.editor.move_block(&id, &previous) {
                        self.log_diagnostic(format!("cannot move block: {err}"));
                    }
                }
            }
        }
    }

    fn render_block_inspector(&mut self, ui: &mut egui::Ui) {
        let Some(id) = self.editor.preferences().selected_block.clone() else {
            ui.label(RichText::new("Select a block to edit it.").color(self.theme.text_muted));
            return;
        };
        let Some(block) = find_block(self.editor.tree(), &id).cloned() else {
            return;
        };

        self.theme.card_frame().show(ui, |ui| {
            ui.label(RichText::new(format!("{} {}", block.kind, block.id)).size(12.0));
            if block.kind.accepts_content() {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.content_buffer)
                        .desired_width(f32::INFINITY)
                        .hint_text("content"),
                );
                if response.lost_focus() && block.content.as_deref().unwrap_or("") != self.content_buffer {
                    let patch = BlockPatch::content(self.content_buffer.clone());
                    if let Err(err) = self.editor.update_block(&id, &patch) {
                        self.log_diagnostic(format!("cannot update block: {err}"));
                    }
                }
            }
            if block.kind == BlockKind::Split {
                let mut ratio = i64::from(block.split_ratio());
                if ui
                    .add(egui::Slider::new(&mut ratio, 1..=99).text("split"))
                    .drag_stopped()
                {
                    let patch = BlockPatch::split_ratio(ratio);
                    if let Err(err) = self.editor.update_block(&id, &patch) {
                        self.log_diagnostic(format!("cannot update block: {err}"));
                    }
                }
            }
            let mut hidden = block.hide_on_mobile;
            if ui.checkbox(&mut hidden, "Hide on narrow screens").changed() {
                let patch = BlockPatch {
                    hide_on_mobile: Some(hidden),
                    ..BlockPatch::default()
                };
                if let Err(err) = self.editor.update_block(&id, &patch) {
                    self.log_diagnostic(format!("cannot update block: {err}"));
                }
            }
            ui.label(
                RichText::new(widget_studio::style::to_css_declarations(&block.style))
                    .monospace()
                    .size(11.0),
            );
        });
    }

    fn render_settings(&mut self, ui: &mut egui::Ui) {
        let mut title = self.editor.config().settings.title.clone();
        let mut primary = self.editor.config().settings.primary_color.clone();
        let mut greeting = self.editor.config().settings.greeting.clone();
        let mut committed = false;
        self.theme.card_frame().show(ui, |ui| {
            ui.label("Title");
            committed |= ui.text_edit_singleline(&mut title).lost_focus();
            ui.label("Greeting");
            committed |= ui.text_edit_singleline(&mut greeting).lost_focus();
            ui.label("Primary color");
            committed |= ui.text_edit_singleline(&mut primary).lost_focus();
        });
        if committed {
            self.editor.update_settings(|settings| {
                settings.title = title;
                settings.greeting = greeting;
                settings.primary_color = primary;
            });
        }
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Preview");
                let label = if self.runtime.overlay_open() { "Close chat" } else { "Open chat" };
                if ui.button(label).clicked() {
                    let open = !self.runtime.overlay_open();
                    self.runtime.set_overlay_open(open);
                }
            });
            ui.separator();

            let render_ctx = RenderContext {
                overlay_open: self.runtime.overlay_open(),
                hovered: self.hovered.clone(),
                narrow_viewport: self.narrow_viewport,
            };
            let frame = render_widget(self.editor.config(), &render_ctx);
            let selected = self.editor.preferences().selected_block.clone();

            let stage_width = if self.narrow_viewport { 320.0 } else { 420.0 };
            let outcome = self
                .theme
                .stage_frame()
                .show(ui, |ui| {
                    ui.set_max_width(stage_width);
                    ScrollArea::vertical()
                        .id_salt("stage")
                        .show(ui, |ui| {
                            NodePainter::new(ui, &self.theme, selected.as_deref())
                                .paint(ui, &frame.nodes)
                        })
                        .inner
                })
                .inner;

            if outcome.hovered != self.hovered {
                self.hovered = outcome.hovered;
                ctx.request_repaint();
            }
            if let Some(key) = outcome.clicked {
                activate(&frame.nodes, &key, &mut self.runtime);
                if frame.from_tree && find_block(self.editor.tree(), &key).is_some() {
                    self.editor.set_selected_block(Some(key));
                }
            }
        });
    }
}

fn outline_row(
    ui: &mut egui::Ui,
    block: &Block,
    depth: usize,
    selected: Option<&str>,
    action: &mut Option<OutlineAction>,
) {
    ui.horizontal(|ui| {
        ui.add_space(depth as f32 * 12.0);
        let label = match &block.content {
            Some(content) => format!("{} \u{00B7} {content}", block.kind),
            None => block.kind.to_string(),
        };
        if ui.selectable_label(selected == Some(block.id.as_str()), label).clicked() {
            *action = Some(OutlineAction::Select(block.id.clone()));
        }
        if ui.small_button("\u{2191}").on_hover_text("Move up").clicked() {
            *action = Some(OutlineAction::MoveUp(block.id.clone()));
        }
        if ui.small_button("\u{29C9}").on_hover_text("Duplicate").clicked() {
            *action = Some(OutlineAction::Duplicate(block.id.clone()));
        }
        if ui.small_button("\u{2715}").on_hover_text("Delete").clicked() {
            *action = Some(OutlineAction::Delete(block.id.clone()));
        }
    });
    for child in block.children() {
        outline_row(ui, child, depth + 1, selected, action);
    }
}

fn previous_sibling_id(tree: &[Block], id: &str) -> Option<String> {
    let siblings = match find_parent_id(tree, id) {
        Some(parent_id) => find_block(tree, parent_id)?.children(),
        None => tree,
    };
    let index = siblings.iter().position(|block| block.id == id)?;
    index
        .checked_sub(1)
        .map(|previous| siblings[previous].id.clone())
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.handle_shortcuts(ctx);
        self.render_top_bar(ctx);
        self.render_left_panel(ctx);
        self.render_right_panel(ctx);
        self.render_center_panel(ctx);
        self.flush_outbound();
    }
}

#[cfg(test)]
mod tests {
    use super::previous_sibling_id;
    use serde_json::json;
    use widget_studio::block::Block;

    #[test]
    fn previous_sibling_stays_in_the_same_list() {
        let tree: Vec<Block> = serde_json::from_value(json!([
            {"id": "a", "kind": "icon"},
            {"id": "row", "kind": "row", "children": [
                {"id": "b", "kind": "text"},
                {"id": "c", "kind": "text"}
            ]}
        ]))
        .expect("tree");
        assert_eq!(previous_sibling_id(&tree, "row").as_deref(), Some("a"));
        assert_eq!(previous_sibling_id(&tree, "c").as_deref(), Some("b"));
        assert_eq!(previous_sibling_id(&tree, "b"), None);
        assert_eq!(previous_sibling_id(&tree, "a"), None);
    }
}
