use crate::block::{Block, BlockKind, InteractionKind, MAX_SPLIT_RATIO, MIN_SPLIT_RATIO};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub const MAX_DEPTH: usize = 12;

/// Which of the two widget trees a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeSchema {
    Launcher,
    Chat,
}

impl TreeSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Launcher => "launcher",
            Self::Chat => "chat",
        }
    }

    pub fn allows_kind(&self, kind: BlockKind) -> bool {
        match self {
            Self::Launcher => !kind.is_chat_only(),
            Self::Chat => true,
        }
    }

    pub fn allows_interaction(&self, action: InteractionKind) -> bool {
        match self {
            Self::Launcher => !action.is_chat_only(),
            Self::Chat => true,
        }
    }

    pub fn allowed_kinds(&self) -> Vec<BlockKind> {
        BlockKind::ALL
            .into_iter()
            .filter(|kind| self.allows_kind(*kind))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block `{block_id}` of kind `{kind}` is not allowed in the {schema} tree")]
    KindNotAllowed {
        block_id: String,
        kind: BlockKind,
        schema: &'static str,
    },
    #[error("block `{block_id}` uses interaction `{action}` which the {schema} tree does not support")]
    InteractionNotAllowed {
        block_id: String,
        action: InteractionKind,
        schema: &'static str,
    },
    #[error("block `{block_id}` interaction `{action}` requires a target")]
    MissingTarget {
        block_id: String,
        action: InteractionKind,
    },
    #[error("duplicate block id `{block_id}`")]
    DuplicateId { block_id: String },
    #[error("leaf block `{block_id}` of kind `{kind}` cannot have children")]
    ChildrenOnLeaf { block_id: String, kind: BlockKind },
    #[error("block `{block_id}` has an empty children list")]
    EmptyChildren { block_id: String },
    #[error("split `{block_id}` ratio {ratio} outside 1..=99")]
    SplitRatioOutOfRange { block_id: String, ratio: u8 },
    #[error("block `{block_id}` nesting depth {actual} exceeds max {max}")]
    NestingTooDeep {
        block_id: String,
        max: usize,
        actual: usize,
    },
}

pub fn validate_tree(schema: TreeSchema, tree: &[Block]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    validate_blocks(schema, tree, 1, &mut seen)
}

/// Checks a single block against the schema, ignoring its position in a tree.
pub fn validate_block(schema: TreeSchema, block: &Block) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    validate_blocks(schema, std::slice::from_ref(block), 1, &mut seen)
}

/// Checks that the subtree rooted at `id` fits under [`MAX_DEPTH`] at the
/// position it occupies in `tree`. An id missing from the tree passes.
pub fn validate_nesting(tree: &[Block], id: &str) -> Result<(), ValidationError> {
    let Some((block, depth)) = locate(tree, id, 1) else {
        return Ok(());
    };
    let actual = depth + height(block) - 1;
    if actual > MAX_DEPTH {
        return Err(ValidationError::NestingTooDeep {
            block_id: id.to_string(),
            max: MAX_DEPTH,
            actual,
        });
    }
    Ok(())
}

fn locate<'a>(blocks: &'a [Block], id: &str, depth: usize) -> Option<(&'a Block, usize)> {
    blocks.iter().find_map(|block| {
        if block.id == id {
            Some((block, depth))
        } else {
            locate(block.children(), id, depth + 1)
        }
    })
}

fn height(block: &Block) -> usize {
    1 + block.children().iter().map(height).max().unwrap_or(0)
}

fn validate_blocks<'a>(
    schema: TreeSchema,
    blocks: &'a [Block],
    depth: usize,
    seen: &mut BTreeSet<&'a str>,
) -> Result<(), ValidationError> {
    for block in blocks {
        if depth > MAX_DEPTH {
            return Err(ValidationError::NestingTooDeep {
                block_id: block.id.clone(),
                max: MAX_DEPTH,
                actual: depth,
            });
        }

        if !seen.insert(block.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                block_id: block.id.clone(),
            });
        }

        if !schema.allows_kind(block.kind) {
            return Err(ValidationError::KindNotAllowed {
                block_id: block.id.clone(),
                kind: block.kind,
                schema: schema.as_str(),
            });
        }

        if let Some(interaction) = &block.interaction {
            if !schema.allows_interaction(interaction.action) {
                return Err(ValidationError::InteractionNotAllowed {
                    block_id: block.id.clone(),
                    action: interaction.action,
                    schema: schema.as_str(),
                });
            }
            let has_target = interaction
                .target
                .as_deref()
                .is_some_and(|target| !target.trim().is_empty());
            if interaction.action.requires_target() && !has_target {
                return Err(ValidationError::MissingTarget {
                    block_id: block.id.clone(),
                    action: interaction.action,
                });
            }
        }

        if let Some(ratio) = block.split_ratio {
            if !(MIN_SPLIT_RATIO..=MAX_SPLIT_RATIO).contains(&ratio) {
                return Err(ValidationError::SplitRatioOutOfRange {
                    block_id: block.id.clone(),
                    ratio,
                });
            }
        }

        match &block.children {
            Some(children) if children.is_empty() => {
                return Err(ValidationError::EmptyChildren {
                    block_id: block.id.clone(),
                });
            }
            Some(_) if !block.kind.is_container() => {
                return Err(ValidationError::ChildrenOnLeaf {
                    block_id: block.id.clone(),
                    kind: block.kind,
                });
            }
            Some(children) => validate_blocks(schema, children, depth + 1, seen)?,
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Vec<Block> {
        serde_json::from_value(value).expect("tree should deserialize")
    }

    #[test]
    fn launcher_tree_with_chat_kind_fails() {
        let blocks = tree(json!([{"id": "h", "kind": "header"}]));
        assert!(matches!(
            validate_tree(TreeSchema::Launcher, &blocks),
            Err(ValidationError::KindNotAllowed { .. })
        ));
        assert!(validate_tree(TreeSchema::Chat, &blocks).is_ok());
    }

    #[test]
    fn launcher_rejects_chat_only_interactions() {
        let blocks = tree(json!([{
            "id": "b",
            "kind": "icon",
            "interaction": {"action": "send-message"}
        }]));
        assert!(matches!(
            validate_tree(TreeSchema::Launcher, &blocks),
            Err(ValidationError::InteractionNotAllowed { .. })
        ));
    }

    #[test]
    fn link_interaction_requires_target() {
        let blocks = tree(json!([{
            "id": "b",
            "kind": "text",
            "content": "Call us",
            "interaction": {"action": "dial-phone", "target": "  "}
        }]));
        assert!(matches!(
            validate_tree(TreeSchema::Launcher, &blocks),
            Err(ValidationError::MissingTarget { .. })
        ));
    }

    #[test]
    fn duplicate_ids_across_levels_fail() {
        let blocks = tree(json!([
            {"id": "a", "kind": "row", "children": [{"id": "b", "kind": "icon"}]},
            {"id": "b", "kind": "text"}
        ]));
        assert_eq!(
            validate_tree(TreeSchema::Launcher, &blocks),
            Err(ValidationError::DuplicateId {
                block_id: "b".to_string()
            })
        );
    }

    #[test]
    fn leaf_with_children_fails() {
        let blocks = tree(json!([{
            "id": "t",
            "kind": "text",
            "children": [{"id": "c", "kind": "icon"}]
        }]));
        assert!(matches!(
            validate_tree(TreeSchema::Chat, &blocks),
            Err(ValidationError::ChildrenOnLeaf { .. })
        ));
    }

    #[test]
    fn nesting_depth_limit_enforced() {
        let mut node = json!({"id": "leaf", "kind": "icon"});
        for level in 0..MAX_DEPTH {
            node = json!({"id": format!("c{level}"), "kind": "container", "children": [node]});
        }
        let blocks = tree(json!([node]));
        assert!(matches!(
            validate_tree(TreeSchema::Launcher, &blocks),
            Err(ValidationError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn nesting_counts_the_whole_subtree() {
        let mut node = json!({"id": "leaf", "kind": "icon"});
        for level in 0..(MAX_DEPTH - 1) {
            node = json!({"id": format!("c{level}"), "kind": "container", "children": [node]});
        }
        let blocks = tree(json!([node]));
        assert!(validate_nesting(&blocks, "leaf").is_ok());
        assert!(validate_nesting(&blocks, "c0").is_ok());
        assert!(validate_nesting(&blocks, "missing").is_ok());

        let wrapped = tree(json!([{"id": "outer", "kind": "row", "children": blocks}]));
        assert_eq!(
            validate_nesting(&wrapped, "c0"),
            Err(ValidationError::NestingTooDeep {
                block_id: "c0".to_string(),
                max: MAX_DEPTH,
                actual: MAX_DEPTH + 1,
            })
        );
    }

    #[test]
    fn empty_children_constructed_in_memory_fail() {
        let mut blocks = tree(json!([{"id": "c", "kind": "container"}]));
        blocks[0].children = Some(Vec::new());
        assert!(matches!(
            validate_tree(TreeSchema::Launcher, &blocks),
            Err(ValidationError::EmptyChildren { .. })
        ));
    }
}
