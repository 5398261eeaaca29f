//! Editing session over one widget.
//!
//! Structural edits go through the pure tree mutations and land in the
//! history as whole-config snapshots. Preferences such as the open tab or the
//! selected block are plain fields and are never undone.

use crate::block::{validate_block, validate_nesting, Block, BlockSpec, Tree, ValidationError};
use crate::history::{HistoryStack, DEFAULT_CAPACITY};
use crate::render::starter_tree;
use crate::style::{apply_background, Background};
use crate::tree::{
    find_block, try_add_block, try_delete_block, try_duplicate_block, try_move_block,
    try_update_block, BlockPatch, MutationError,
};
use crate::widget::{AuthoringMode, TreeTarget, WidgetConfig, WidgetSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsTab {
    #[default]
    General,
    Appearance,
    Messages,
    Structure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorPreferences {
    pub active_tab: SettingsTab,
    pub selected_block: Option<String>,
}

pub struct WidgetEditor {
    initial: WidgetConfig,
    history: HistoryStack<WidgetConfig>,
    target: TreeTarget,
    preferences: EditorPreferences,
}

impl WidgetEditor {
    pub fn new(config: WidgetConfig) -> Self {
        Self::with_capacity(config, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(config: WidgetConfig, capacity: usize) -> Self {
        Self {
            history: HistoryStack::with_capacity(config.clone(), capacity),
            initial: config,
            target: TreeTarget::Launcher,
            preferences: EditorPreferences::default(),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        self.history.current()
    }

    pub fn target(&self) -> TreeTarget {
        self.target
    }

    pub fn set_target(&mut self, target: TreeTarget) {
        self.target = target;
    }

    pub fn tree(&self) -> &[Block] {
        self.config().tree(self.target)
    }

    pub fn preferences(&self) -> &EditorPreferences {
        &self.preferences
    }

    pub fn set_active_tab(&mut self, tab: SettingsTab) {
        self.preferences.active_tab = tab;
    }

    pub fn set_selected_block(&mut self, id: Option<String>) {
        self.preferences.selected_block = id;
    }

    /// Adds a block under `parent_id` in the selected tree. The block is
    /// checked against the tree's schema and its nesting depth before it
    /// lands. Returns `Ok(None)` when the parent no longer exists.
    pub fn add_block(
        &mut self,
        parent_id: Option<&str>,
        spec: BlockSpec,
    ) -> Result<Option<String>, ValidationError> {
        let schema = self.target.schema();
        validate_block(schema, &spec.clone().into_block(String::from("pending")))?;
        if let Some(parent) = parent_id.and_then(|id| find_block(self.tree(), id)) {
            if !parent.kind.is_container() {
                return Err(ValidationError::ChildrenOnLeaf {
                    block_id: parent.id.clone(),
                    kind: parent.kind,
                });
            }
        }

        match try_add_block(self.tree(), parent_id, spec) {
            Ok((tree, id)) => {
                validate_nesting(&tree, &id)?;
                self.commit_tree(tree);
                Ok(Some(id))
            }
            Err(err) => {
                skipped("add_block", &err);
                Ok(None)
            }
        }
    }

    /// Applies `patch` to a block in the selected tree. A patch that would
    /// leave the block invalid for the tree is rejected without change.
    pub fn update_block(&mut self, id: &str, patch: &BlockPatch) -> Result<bool, ValidationError> {
        let tree = match try_update_block(self.tree(), id, patch) {
            Ok(tree) => tree,
            Err(err) => {
                skipped("update_block", &err);
                return Ok(false);
            }
        };
        if let Some(updated) = find_block(&tree, id) {
            validate_block(self.target.schema(), updated)?;
        }
        self.commit_tree(tree);
        Ok(true)
    }

    /// Replaces the background keys of a block's style.
    pub fn set_block_background(&mut self, id: &str, background: &Background) -> bool {
        let Some(block) = find_block(self.tree(), id) else {
            return false;
        };
        let patch = BlockPatch::style(apply_background(&block.style, background));
        matches!(self.update_block(id, &patch), Ok(true))
    }

    pub fn delete_block(&mut self, id: &str) -> bool {
        let result = try_delete_block(self.tree(), id);
        if self.preferences.selected_block.as_deref() == Some(id) && result.is_ok() {
            self.preferences.selected_block = None;
        }
        self.commit_result("delete_block", result)
    }

    pub fn duplicate_block(&mut self, id: &str) -> Option<String> {
        match try_duplicate_block(self.tree(), id) {
            Ok((tree, clone_id)) => {
                self.commit_tree(tree);
                Some(clone_id)
            }
            Err(err) => {
                skipped("duplicate_block", &err);
                None
            }
        }
    }

    /// Moves a block next to `over_id`. A move that would nest the block's
    /// subtree too deep is rejected without change.
    pub fn move_block(&mut self, active_id: &str, over_id: &str) -> Result<bool, ValidationError> {
        if active_id == over_id {
            return Ok(false);
        }
        let tree = match try_move_block(self.tree(), active_id, over_id) {
            Ok(tree) => tree,
            Err(err) => {
                skipped("move_block", &err);
                return Ok(false);
            }
        };
        validate_nesting(&tree, active_id)?;
        self.commit_tree(tree);
        Ok(true)
    }

    pub fn begin_drag(&self, active_id: impl Into<String>) -> DragGesture {
        DragGesture {
            active_id: active_id.into(),
            over_id: None,
        }
    }

    pub fn update_settings(&mut self, edit: impl FnOnce(&mut WidgetSettings)) -> bool {
        let mut next = self.config().clone();
        edit(&mut next.settings);
        if next.settings == self.config().settings {
            return false;
        }
        self.history.push(next);
        true
    }

    pub fn set_authoring_mode(&mut self, mode: AuthoringMode) -> bool {
        if self.config().authoring_mode == mode {
            return false;
        }
        let mut next = self.config().clone();
        next.authoring_mode = mode;
        self.history.push(next);
        true
    }

    /// Seeds the selected tree from the fallback layout when it is empty, so
    /// an author switching to advanced mode starts from what was on screen.
    pub fn insert_starter_tree(&mut self) -> bool {
        if !self.tree().is_empty() {
            return false;
        }
        let tree = starter_tree(self.target, &self.config().settings);
        self.commit_tree(tree);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> &WidgetConfig {
        self.history.undo()
    }

    pub fn redo(&mut self) -> &WidgetConfig {
        self.history.redo()
    }

    /// Makes the current config the new baseline, e.g. after a save. Undo
    /// history is kept.
    pub fn mark_saved(&mut self) {
        self.initial = self.config().clone();
    }

    pub fn is_dirty(&self) -> bool {
        *self.config() != self.initial
    }

    /// Ends the session without keeping any edits.
    pub fn discard(self) -> WidgetConfig {
        tracing::debug!(
            snapshots = self.history.len(),
            "editor session discarded"
        );
        self.initial
    }

    fn commit_tree(&mut self, tree: Tree) {
        let next = self.config().with_tree(self.target, tree);
        self.history.push(next);
    }

    fn commit_result(&mut self, operation: &str, result: Result<Tree, MutationError>) -> bool {
        match result {
            Ok(tree) => {
                self.commit_tree(tree);
                true
            }
            Err(err) => {
                skipped(operation, &err);
                false
            }
        }
    }
}

fn skipped(operation: &str, err: &MutationError) {
    tracing::debug!(operation, error = %err, "editor mutation skipped");
}

/// An in-flight drag. Nothing changes until [`DragGesture::complete`];
/// dropping or aborting the gesture leaves the tree as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGesture {
    active_id: String,
    over_id: Option<String>,
}

impl DragGesture {
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn over_id(&self) -> Option<&str> {
        self.over_id.as_deref()
    }

    pub fn hover(&mut self, over_id: Option<String>) {
        self.over_id = over_id;
    }

    /// Performs the single move for this gesture.
    pub fn complete(self, editor: &mut WidgetEditor) -> Result<bool, ValidationError> {
        match self.over_id {
            Some(over_id) => editor.move_block(&self.active_id, &over_id),
            None => Ok(false),
        }
    }

    pub fn abort(self) {
        tracing::debug!(active_id = %self.active_id, "drag aborted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, Interaction, InteractionKind, MAX_DEPTH};
    use crate::tree::collect_ids;

    fn editor_with_row() -> (WidgetEditor, String) {
        let mut editor = WidgetEditor::new(WidgetConfig::new("test"));
        let row = editor
            .add_block(None, BlockSpec::new(BlockKind::Row))
            .expect("row is valid")
            .expect("root insert");
        (editor, row)
    }

    #[test]
    fn edits_are_undoable_one_step_at_a_time() {
        let (mut editor, row) = editor_with_row();
        let icon = editor
            .add_block(Some(&row), BlockSpec::new(BlockKind::Icon).content("chat"))
            .expect("icon is valid")
            .expect("row exists");
        assert_eq!(collect_ids(editor.tree()), vec![row.clone(), icon.clone()]);

        editor.undo();
        assert_eq!(collect_ids(editor.tree()), vec![row.clone()]);
        editor.undo();
        assert!(editor.tree().is_empty());
        assert!(!editor.can_undo());
        editor.undo();
        assert!(editor.tree().is_empty());

        editor.redo();
        editor.redo();
        assert_eq!(collect_ids(editor.tree()), vec![row, icon]);
        assert!(!editor.can_redo());
    }

    #[test]
    fn schema_is_checked_before_adding() {
        let (mut editor, row) = editor_with_row();
        let err = editor
            .add_block(None, BlockSpec::new(BlockKind::Header))
            .expect_err("headers are chat only");
        assert!(matches!(err, ValidationError::KindNotAllowed { .. }));

        let err = editor
            .add_block(
                Some(&row),
                BlockSpec::new(BlockKind::Text)
                    .interaction(Interaction::new(InteractionKind::OpenLink)),
            )
            .expect_err("open-link needs a target");
        assert!(matches!(err, ValidationError::MissingTarget { .. }));

        let leaf = editor
            .add_block(Some(&row), BlockSpec::new(BlockKind::Text))
            .expect("text is valid")
            .expect("row exists");
        assert!(matches!(
            editor.add_block(Some(&leaf), BlockSpec::new(BlockKind::Icon)),
            Err(ValidationError::ChildrenOnLeaf { .. })
        ));

        editor.set_target(TreeTarget::Chat);
        assert!(editor
            .add_block(None, BlockSpec::new(BlockKind::Header))
            .expect("chat accepts headers")
            .is_some());
    }

    #[test]
    fn stale_ids_do_not_grow_history() {
        let (mut editor, _) = editor_with_row();
        let before = editor.config().clone();
        assert_eq!(editor.add_block(Some("gone"), BlockSpec::new(BlockKind::Icon)), Ok(None));
        assert!(!editor.delete_block("gone"));
        assert_eq!(editor.duplicate_block("gone"), None);
        assert_eq!(editor.update_block("gone", &BlockPatch::content("x")), Ok(false));
        assert_eq!(editor.config(), &before);
        editor.undo();
        assert!(editor.tree().is_empty(), "one undo reaches the empty tree");
    }

    #[test]
    fn preferences_bypass_history() {
        let (mut editor, row) = editor_with_row();
        editor.set_active_tab(SettingsTab::Appearance);
        editor.set_selected_block(Some(row.clone()));
        editor.undo();
        assert_eq!(editor.preferences().active_tab, SettingsTab::Appearance);
        assert_eq!(editor.preferences().selected_block.as_deref(), Some(row.as_str()));
    }

    #[test]
    fn settings_and_mode_are_snapshotted() {
        let mut editor = WidgetEditor::new(WidgetConfig::new("test"));
        assert!(editor.update_settings(|settings| settings.title = "Support".to_string()));
        assert!(!editor.update_settings(|settings| settings.title = "Support".to_string()));
        assert!(editor.set_authoring_mode(AuthoringMode::Advanced));
        assert!(!editor.set_authoring_mode(AuthoringMode::Advanced));

        editor.undo();
        assert_eq!(editor.config().authoring_mode, AuthoringMode::Simple);
        assert_eq!(editor.config().settings.title, "Support");
        editor.undo();
        assert_eq!(editor.config().settings.title, WidgetSettings::default().title);
    }

    #[test]
    fn drag_moves_only_on_completion() {
        let mut editor = WidgetEditor::new(WidgetConfig::new("test"));
        let a = editor.add_block(None, BlockSpec::new(BlockKind::Icon)).ok().flatten().expect("a");
        let b = editor.add_block(None, BlockSpec::new(BlockKind::Text)).ok().flatten().expect("b");
        let before = editor.config().clone();

        let mut gesture = editor.begin_drag(a.clone());
        gesture.hover(Some(b.clone()));
        gesture.abort();
        assert_eq!(editor.config(), &before);

        let mut gesture = editor.begin_drag(a.clone());
        gesture.hover(Some(b.clone()));
        drop(gesture);
        assert_eq!(editor.config(), &before);

        let mut gesture = editor.begin_drag(a.clone());
        gesture.hover(Some(b.clone()));
        assert_eq!(gesture.complete(&mut editor), Ok(true));
        assert_eq!(collect_ids(editor.tree()), vec![b, a]);
    }

    fn nested_containers(editor: &mut WidgetEditor, levels: usize) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for _ in 0..levels {
            let parent = ids.last().map(String::as_str);
            let id = editor
                .add_block(parent, BlockSpec::new(BlockKind::Container))
                .expect("within depth")
                .expect("parent exists");
            ids.push(id);
        }
        ids
    }

    #[test]
    fn adding_past_max_depth_is_rejected() {
        let mut editor = WidgetEditor::new(WidgetConfig::new("test"));
        let chain = nested_containers(&mut editor, MAX_DEPTH);
        let before = editor.config().clone();

        let deepest = chain.last().map(String::as_str);
        assert!(matches!(
            editor.add_block(deepest, BlockSpec::new(BlockKind::Icon)),
            Err(ValidationError::NestingTooDeep { actual, .. }) if actual == MAX_DEPTH + 1
        ));
        assert_eq!(editor.config(), &before);
        assert!(editor.config().validate().is_ok());
    }

    #[test]
    fn moving_a_subtree_too_deep_is_rejected() {
        let mut editor = WidgetEditor::new(WidgetConfig::new("test"));
        let chain = nested_containers(&mut editor, MAX_DEPTH - 1);
        let deepest = chain.last().map(String::as_str);
        let anchor = editor
            .add_block(deepest, BlockSpec::new(BlockKind::Icon))
            .expect("depth twelve is allowed")
            .expect("parent exists");
        let row = editor
            .add_block(None, BlockSpec::new(BlockKind::Row))
            .expect("row is valid")
            .expect("root insert");
        editor
            .add_block(Some(&row), BlockSpec::new(BlockKind::Text))
            .expect("text is valid");
        let before = editor.config().clone();

        assert!(matches!(
            editor.move_block(&row, &anchor),
            Err(ValidationError::NestingTooDeep { .. })
        ));
        assert_eq!(editor.config(), &before);
        assert!(editor.config().validate().is_ok());
    }

    #[test]
    fn editing_a_split_with_a_stale_ratio_succeeds() {
        let mut editor = WidgetEditor::new(WidgetConfig::new("test"));
        let split = editor
            .add_block(None, BlockSpec::new(BlockKind::Split))
            .expect("split is valid")
            .expect("root insert");
        let mut tree = editor.tree().to_vec();
        tree[0].split_ratio = Some(0);
        let mut editor = WidgetEditor::new(editor.config().with_tree(TreeTarget::Launcher, tree));

        let patch = BlockPatch {
            hide_on_mobile: Some(true),
            ..BlockPatch::default()
        };
        assert_eq!(editor.update_block(&split, &patch), Ok(true));
        let block = find_block(editor.tree(), &split).expect("split");
        assert!(block.hide_on_mobile);
        assert_eq!(block.split_ratio, Some(1));
    }

    #[test]
    fn discard_returns_the_initial_config() {
        let initial = WidgetConfig::new("test");
        let mut editor = WidgetEditor::new(initial.clone());
        editor
            .add_block(None, BlockSpec::new(BlockKind::Icon))
            .expect("icon is valid");
        assert!(editor.is_dirty());
        assert_eq!(editor.discard(), initial);
    }

    #[test]
    fn background_edits_go_through_history() {
        let (mut editor, row) = editor_with_row();
        assert!(editor.set_block_background(
            &row,
            &Background::Solid {
                color: "#112233".to_string()
            }
        ));
        let block = find_block(editor.tree(), &row).expect("row");
        assert_eq!(block.style.get_str("backgroundColor"), Some("#112233"));
        editor.undo();
        let block = find_block(editor.tree(), &row).expect("row");
        assert!(block.style.is_empty());
    }

    #[test]
    fn starter_tree_only_fills_empty_trees() {
        let mut editor = WidgetEditor::new(WidgetConfig::new("test"));
        editor.set_target(TreeTarget::Chat);
        assert!(editor.insert_starter_tree());
        assert!(!editor.tree().is_empty());
        assert!(!editor.insert_starter_tree());
        assert!(editor.config().validate().is_ok());
    }
}
