use crate::block::Block;

pub fn find_block<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
    for block in blocks {
        if block.id == id {
            return Some(block);
        }
        if let Some(found) = find_block(block.children(), id) {
            return Some(found);
        }
    }
    None
}

pub fn contains_id(blocks: &[Block], id: &str) -> bool {
    find_block(blocks, id).is_some()
}

/// `None` when the block is at the root or absent.
pub fn find_parent_id<'a>(blocks: &'a [Block], id: &str) -> Option<&'a str> {
    for block in blocks {
        if block.children().iter().any(|child| child.id == id) {
            return Some(block.id.as_str());
        }
        if let Some(parent) = find_parent_id(block.children(), id) {
            return Some(parent);
        }
    }
    None
}

/// True when `id` names a strict descendant of `ancestor`.
pub fn is_descendant(ancestor: &Block, id: &str) -> bool {
    contains_id(ancestor.children(), id)
}

pub fn collect_ids(blocks: &[Block]) -> Vec<String> {
    let mut ids = Vec::new();
    for block in blocks {
        block.walk(&mut |node| ids.push(node.id.clone()));
    }
    ids
}

pub fn count_blocks(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| 1 + count_blocks(block.children()))
        .sum()
}
