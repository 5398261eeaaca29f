//! Pure mutations over block trees.
//!
//! Every operation takes the current tree by reference and returns a new one.
//! The `try_*` forms report a missing target; the plain forms treat that as a
//! no-op and return the input unchanged, since stale ids are routine while the
//! editor races its own deletions.

use crate::block::{clamp_split_ratio, Block, BlockKind, BlockSpec, Interaction, StatusType, Tree};
use crate::style::StyleBag;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod query;

pub use query::{collect_ids, contains_id, count_blocks, find_block, find_parent_id, is_descendant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("block `{id}` not found")]
    TargetNotFound { id: String },
    #[error("cannot move block `{active_id}` into its own subtree at `{over_id}`")]
    CycleRejected { active_id: String, over_id: String },
}

pub fn new_block_id() -> String {
    format!("blk-{}", Uuid::new_v4())
}

/// Field-wise update for [`update_block`]. Outer `None` leaves the field
/// alone; for optional fields `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    #[serde(default)]
    pub kind: Option<BlockKind>,
    #[serde(default)]
    pub content: Option<Option<String>>,
    #[serde(default)]
    pub style: Option<StyleBag>,
    #[serde(default)]
    pub hover_style: Option<Option<StyleBag>>,
    #[serde(default)]
    pub interaction: Option<Option<Interaction>>,
    #[serde(default)]
    pub hide_on_mobile: Option<bool>,
    #[serde(default)]
    pub split_ratio: Option<i64>,
    #[serde(default)]
    pub status_type: Option<StatusType>,
}

impl BlockPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(Some(content.into())),
            ..Self::default()
        }
    }

    pub fn style(style: StyleBag) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn hover_style(style: Option<StyleBag>) -> Self {
        Self {
            hover_style: Some(style),
            ..Self::default()
        }
    }

    pub fn interaction(interaction: Option<Interaction>) -> Self {
        Self {
            interaction: Some(interaction),
            ..Self::default()
        }
    }

    pub fn split_ratio(ratio: i64) -> Self {
        Self {
            split_ratio: Some(ratio),
            ..Self::default()
        }
    }

    fn apply(&self, block: &mut Block) {
        if let Some(kind) = self.kind {
            block.kind = kind;
        }
        if let Some(content) = &self.content {
            block.content = content.clone().filter(|content| !content.is_empty());
        }
        if let Some(style) = &self.style {
            block.style = style.clone();
        }
        if let Some(hover_style) = &self.hover_style {
            block.hover_style = hover_style.clone();
        }
        if let Some(interaction) = &self.interaction {
            block.interaction = interaction.clone();
        }
        if let Some(hide_on_mobile) = self.hide_on_mobile {
            block.hide_on_mobile = hide_on_mobile;
        }
        // Any stored ratio is brought back into range, not only a patched one.
        block.split_ratio = self
            .split_ratio
            .or(block.split_ratio.map(i64::from))
            .map(clamp_split_ratio);
        if let Some(status) = self.status_type {
            block.status_type = Some(status);
        }
    }
}

/// Appends a new block under `parent_id`, or at the root when `None`.
/// Returns the new tree and the id assigned to the block.
pub fn try_add_block(
    tree: &[Block],
    parent_id: Option<&str>,
    spec: BlockSpec,
) -> Result<(Tree, String), MutationError> {
    let id = new_block_id();
    let block = spec.into_block(id.clone());

    let Some(parent_id) = parent_id else {
        let mut next = tree.to_vec();
        next.push(block);
        return Ok((next, id));
    };

    let mut next = tree.to_vec();
    let parent = find_block_mut(&mut next, parent_id).ok_or_else(|| {
        MutationError::TargetNotFound {
            id: parent_id.to_string(),
        }
    })?;
    parent.children.get_or_insert_with(Vec::new).push(block);
    Ok((next, id))
}

pub fn add_block(tree: &[Block], parent_id: Option<&str>, spec: BlockSpec) -> Tree {
    match try_add_block(tree, parent_id, spec) {
        Ok((next, _)) => next,
        Err(err) => no_op(tree, "add_block", &err),
    }
}

pub fn try_update_block(
    tree: &[Block],
    id: &str,
    patch: &BlockPatch,
) -> Result<Tree, MutationError> {
    let mut next = tree.to_vec();
    let block = find_block_mut(&mut next, id).ok_or_else(|| MutationError::TargetNotFound {
        id: id.to_string(),
    })?;
    patch.apply(block);
    Ok(next)
}

pub fn update_block(tree: &[Block], id: &str, patch: &BlockPatch) -> Tree {
    try_update_block(tree, id, patch).unwrap_or_else(|err| no_op(tree, "update_block", &err))
}

pub fn try_delete_block(tree: &[Block], id: &str) -> Result<Tree, MutationError> {
    let mut next = tree.to_vec();
    remove_block(&mut next, id).ok_or_else(|| MutationError::TargetNotFound { id: id.to_string() })?;
    Ok(next)
}

pub fn delete_block(tree: &[Block], id: &str) -> Tree {
    try_delete_block(tree, id).unwrap_or_else(|err| no_op(tree, "delete_block", &err))
}

/// Clones the subtree at `id` with fresh ids throughout and inserts the clone
/// right after the original. Returns the new tree and the clone's root id.
pub fn try_duplicate_block(tree: &[Block], id: &str) -> Result<(Tree, String), MutationError> {
    let mut next = tree.to_vec();
    let clone_id = insert_duplicate(&mut next, id)
        .ok_or_else(|| MutationError::TargetNotFound { id: id.to_string() })?;
    Ok((next, clone_id))
}

pub fn duplicate_block(tree: &[Block], id: &str) -> Tree {
    match try_duplicate_block(tree, id) {
        Ok((next, _)) => next,
        Err(err) => no_op(tree, "duplicate_block", &err),
    }
}

/// Moves `active_id` to the position currently held by `over_id`, which may
/// be in a different sibling list. Moving a block into its own subtree is
/// rejected.
pub fn try_move_block(tree: &[Block], active_id: &str, over_id: &str) -> Result<Tree, MutationError> {
    let active = find_block(tree, active_id).ok_or_else(|| MutationError::TargetNotFound {
        id: active_id.to_string(),
    })?;
    let over_index = sibling_index(tree, over_id).ok_or_else(|| MutationError::TargetNotFound {
        id: over_id.to_string(),
    })?;
    if active_id == over_id {
        return Ok(tree.to_vec());
    }
    if is_descendant(active, over_id) {
        return Err(MutationError::CycleRejected {
            active_id: active_id.to_string(),
            over_id: over_id.to_string(),
        });
    }

    let mut next = tree.to_vec();
    let moved = remove_block(&mut next, active_id).ok_or_else(|| {
        MutationError::TargetNotFound {
            id: active_id.to_string(),
        }
    })?;
    // The destination list still holds `over_id`, so it was not collapsed.
    insert_beside(&mut next, over_id, over_index, moved).map_err(|_| {
        MutationError::TargetNotFound {
            id: over_id.to_string(),
        }
    })?;
    Ok(next)
}

pub fn move_block(tree: &[Block], active_id: &str, over_id: &str) -> Tree {
    try_move_block(tree, active_id, over_id).unwrap_or_else(|err| no_op(tree, "move_block", &err))
}

pub fn clone_with_fresh_ids(block: &Block) -> Block {
    Block {
        id: new_block_id(),
        children: block
            .children
            .as_ref()
            .map(|children| children.iter().map(clone_with_fresh_ids).collect()),
        ..block.clone()
    }
}

fn no_op(tree: &[Block], operation: &str, err: &MutationError) -> Tree {
    tracing::debug!(operation, error = %err, "tree mutation skipped");
    tree.to_vec()
}

fn find_block_mut<'a>(blocks: &'a mut [Block], id: &str) -> Option<&'a mut Block> {
    for block in blocks.iter_mut() {
        if block.id == id {
            return Some(block);
        }
        if let Some(children) = block.children.as_mut() {
            if let Some(found) = find_block_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn sibling_index(blocks: &[Block], id: &str) -> Option<usize> {
    if let Some(index) = blocks.iter().position(|block| block.id == id) {
        return Some(index);
    }
    blocks
        .iter()
        .find_map(|block| sibling_index(block.children(), id))
}

/// Removes the block from whichever list holds it. A parent left without
/// children has its list collapsed back to `None`; ancestors further up are
/// untouched.
fn remove_block(blocks: &mut Vec<Block>, id: &str) -> Option<Block> {
    if let Some(index) = blocks.iter().position(|block| block.id == id) {
        return Some(blocks.remove(index));
    }
    for block in blocks.iter_mut() {
        let Some(children) = block.children.as_mut() else {
            continue;
        };
        if let Some(removed) = remove_block(children, id) {
            if children.is_empty() {
                block.children = None;
            }
            return Some(removed);
        }
    }
    None
}

fn insert_duplicate(blocks: &mut Vec<Block>, id: &str) -> Option<String> {
    if let Some(index) = blocks.iter().position(|block| block.id == id) {
        let clone = clone_with_fresh_ids(&blocks[index]);
        let clone_id = clone.id.clone();
        blocks.insert(index + 1, clone);
        return Some(clone_id);
    }
    blocks
        .iter_mut()
        .filter_map(|block| block.children.as_mut())
        .find_map(|children| insert_duplicate(children, id))
}

/// Inserts `block` at `index` of the list that holds `anchor_id`. Hands the
/// block back if no list holds the anchor.
fn insert_beside(
    blocks: &mut Vec<Block>,
    anchor_id: &str,
    index: usize,
    block: Block,
) -> Result<(), Block> {
    if blocks.iter().any(|candidate| candidate.id == anchor_id) {
        let at = index.min(blocks.len());
        blocks.insert(at, block);
        return Ok(());
    }
    let mut block = block;
    for candidate in blocks.iter_mut() {
        let Some(children) = candidate.children.as_mut() else {
            continue;
        };
        match insert_beside(children, anchor_id, index, block) {
            Ok(()) => return Ok(()),
            Err(returned) => block = returned,
        }
    }
    Err(block)
}
