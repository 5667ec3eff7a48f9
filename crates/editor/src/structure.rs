//! Block Restructuring
//!
//! Block-level edits used by the surface: list conversion, block format
//! changes, blockquote wrapping and lifting, and splicing block fragments.
//! Every edit except fragment insertion keeps the sequence of leaves intact,
//! so selections can be carried over by leaf ordinal.

use std::collections::BTreeMap;

use prodoc_core::tree::{
    inlines_text, Block, BlockPath, Container, Inline, LeafLocation, List, ListItem, RichTree,
    TextBlock,
};

use crate::spans::split_inlines;

/// Paragraph-level format applied by `formatBlock`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFormat {
    Paragraph,
    Heading(u8),
    Blockquote,
    Preformatted,
}

impl BlockFormat {
    /// Parse a tag name such as `h2`, `<blockquote>` or `pre`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().trim_start_matches('<').trim_end_matches('>').to_ascii_lowercase();
        match tag.as_str() {
            "p" | "div" => Some(BlockFormat::Paragraph),
            "blockquote" => Some(BlockFormat::Blockquote),
            "pre" => Some(BlockFormat::Preformatted),
            _ => {
                let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
                (1..=6).contains(&level).then_some(BlockFormat::Heading(level))
            }
        }
    }
}

fn block_mut<'a>(tree: &'a mut RichTree, loc: &LeafLocation) -> Option<&'a mut Block> {
    tree.blocks_at_mut(&loc.container)?.get_mut(loc.index)
}

/// Number of caret leaves inside a block slice
pub fn leaf_count(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| match block {
            Block::Blockquote(children) => leaf_count(children),
            Block::List(list) => list.items.len(),
            Block::Table(table) => table
                .rows
                .iter()
                .flat_map(|row| row.cells.iter())
                .map(|cell| leaf_count(&cell.blocks))
                .sum(),
            _ => 1,
        })
        .sum()
}

/// Turn one list item into a paragraph, splitting the list around it.
///
/// Returns the new index of the paragraph inside the container.
pub fn detach_list_item(tree: &mut RichTree, loc: &LeafLocation) -> Option<usize> {
    let item_index = loc.list_item?;
    let blocks = tree.blocks_at_mut(&loc.container)?;
    let Some(Block::List(list)) = blocks.get_mut(loc.index) else {
        return None;
    };
    if item_index >= list.items.len() {
        return None;
    }

    let ordered = list.ordered;
    let mut before = std::mem::take(&mut list.items);
    let after = before.split_off(item_index + 1);
    let item = before.pop()?;

    let mut replacement = Vec::new();
    let before_present = !before.is_empty();
    if before_present {
        replacement.push(Block::List(List { ordered, items: before }));
    }
    replacement.push(Block::paragraph(item.inlines));
    if !after.is_empty() {
        replacement.push(Block::List(List { ordered, items: after }));
    }

    blocks.splice(loc.index..=loc.index, replacement);
    Some(loc.index + before_present as usize)
}

/// Merge neighbouring lists of the same kind, at every nesting level
pub fn merge_adjacent_lists(blocks: &mut Vec<Block>) {
    let taken = std::mem::take(blocks);
    let mut out: Vec<Block> = Vec::with_capacity(taken.len());
    for mut block in taken {
        match &mut block {
            Block::Blockquote(children) => merge_adjacent_lists(children),
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                    merge_adjacent_lists(&mut cell.blocks);
                }
            }
            _ => {}
        }

        if let (Some(Block::List(prev)), Block::List(next)) = (out.last_mut(), &block) {
            if prev.ordered == next.ordered {
                prev.items.extend(next.items.iter().cloned());
                continue;
            }
        }
        out.push(block);
    }
    *blocks = out;
}

/// Toggle list membership of the leaves at `paths`
pub fn toggle_list(tree: &mut RichTree, paths: &[BlockPath], ordered: bool) -> bool {
    let mut changed = false;
    let mut retyped: Vec<Vec<usize>> = Vec::new();

    for path in paths.iter().rev() {
        let Some(loc) = tree.locate(path) else { continue };
        if loc.list_item.is_some() {
            let block_path = loc.block_path();
            let Some(Block::List(list)) = block_mut(tree, &loc) else { continue };
            if list.ordered == ordered {
                changed |= detach_list_item(tree, &loc).is_some();
            } else if !retyped.contains(&block_path) {
                list.ordered = ordered;
                retyped.push(block_path);
                changed = true;
            }
            continue;
        }

        let Some(block) = block_mut(tree, &loc) else { continue };
        if let Some(body) = block.text_block_mut() {
            let inlines = std::mem::take(&mut body.inlines);
            *block = Block::List(List {
                ordered,
                items: vec![ListItem { inlines }],
            });
            changed = true;
        }
    }

    if changed {
        merge_adjacent_lists(&mut tree.blocks);
    }
    changed
}

fn code_to_inlines(code: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for (i, line) in code.split('\n').enumerate() {
        if i > 0 {
            inlines.push(Inline::LineBreak);
        }
        if !line.is_empty() {
            inlines.push(Inline::text(line));
        }
    }
    inlines
}

/// Change a leaf into a paragraph, heading or preformatted block
pub fn set_text_format(tree: &mut RichTree, path: &BlockPath, format: BlockFormat) -> bool {
    let Some(mut loc) = tree.locate(path) else { return false };
    if loc.list_item.is_some() {
        let Some(index) = detach_list_item(tree, &loc) else { return false };
        loc.index = index;
        loc.list_item = None;
    }
    let Some(block) = block_mut(tree, &loc) else { return false };

    let replacement = match (&*block, format) {
        (Block::Paragraph(body) | Block::Heading { body, .. }, BlockFormat::Paragraph) => {
            Block::Paragraph(body.clone())
        }
        (Block::Paragraph(body) | Block::Heading { body, .. }, BlockFormat::Heading(level)) => {
            Block::Heading {
                level: level.clamp(1, 6),
                body: body.clone(),
            }
        }
        (Block::Paragraph(body) | Block::Heading { body, .. }, BlockFormat::Preformatted) => {
            Block::Code(inlines_text(&body.inlines))
        }
        (Block::Code(code), BlockFormat::Paragraph) => Block::paragraph(code_to_inlines(code)),
        (Block::Code(code), BlockFormat::Heading(level)) => Block::heading(level, code_to_inlines(code)),
        _ => return false,
    };

    if *block == replacement {
        return false;
    }
    *block = replacement;
    true
}

/// Wrap the top-level blocks holding `paths` in blockquotes, one per container
pub fn wrap_in_blockquote(tree: &mut RichTree, paths: &[BlockPath]) -> bool {
    let mut groups: BTreeMap<Vec<usize>, (usize, usize)> = BTreeMap::new();
    for path in paths {
        let Some(loc) = tree.locate(path) else { continue };
        if loc.in_blockquote() {
            continue;
        }
        groups
            .entry(loc.container.clone())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(loc.index);
                *hi = (*hi).max(loc.index);
            })
            .or_insert((loc.index, loc.index));
    }

    let mut ordered: Vec<(Vec<usize>, (usize, usize))> = groups.into_iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut changed = false;
    for (container, (lo, hi)) in ordered {
        let Some(blocks) = tree.blocks_at_mut(&container) else { continue };
        if hi >= blocks.len() {
            continue;
        }
        let wrapped: Vec<Block> = blocks.drain(lo..=hi).collect();
        blocks.insert(lo, Block::Blockquote(wrapped));
        changed = true;
    }
    changed
}

/// Lift a leaf's block out of its enclosing blockquote, splitting the quote
pub fn lift_from_blockquote(tree: &mut RichTree, loc: &LeafLocation) -> bool {
    if loc.ancestors.last() != Some(&Container::Blockquote) {
        return false;
    }
    let Some((&quote_index, parent_path)) = loc.container.split_last() else {
        return false;
    };
    let Some(parent) = tree.blocks_at_mut(parent_path) else { return false };
    let Some(Block::Blockquote(children)) = parent.get_mut(quote_index) else {
        return false;
    };
    if loc.index >= children.len() {
        return false;
    }

    let mut before = std::mem::take(children);
    let after = before.split_off(loc.index + 1);
    let Some(lifted) = before.pop() else { return false };

    let mut replacement = Vec::new();
    if !before.is_empty() {
        replacement.push(Block::Blockquote(before));
    }
    replacement.push(lifted);
    if !after.is_empty() {
        replacement.push(Block::Blockquote(after));
    }
    parent.splice(quote_index..=quote_index, replacement);
    true
}

/// Outdent the leaves at `paths`: list items become paragraphs, quoted blocks are lifted
pub fn outdent(tree: &mut RichTree, paths: &[BlockPath]) -> bool {
    let mut changed = false;
    for path in paths.iter().rev() {
        let Some(loc) = tree.locate(path) else { continue };
        if loc.list_item.is_some() {
            changed |= detach_list_item(tree, &loc).is_some();
        } else {
            changed |= lift_from_blockquote(tree, &loc);
        }
    }
    changed
}

/// Splice blocks at a caret, splitting the text block it sits in.
///
/// Returns the path of the last inserted block.
pub fn insert_blocks(tree: &mut RichTree, path: &BlockPath, offset: usize, fragment: Vec<Block>) -> Option<Vec<usize>> {
    if fragment.is_empty() {
        return None;
    }
    let loc = tree.locate(path)?;
    let count = fragment.len();
    let blocks = tree.blocks_at_mut(&loc.container)?;

    let at = if loc.list_item.is_some() {
        loc.index + 1
    } else {
        match blocks.get_mut(loc.index)? {
            Block::Paragraph(body) | Block::Heading { body, .. } => {
                let (before, after) = split_inlines(std::mem::take(&mut body.inlines), offset);
                match (before.is_empty(), after.is_empty()) {
                    (true, true) => {
                        blocks.remove(loc.index);
                        loc.index
                    }
                    (false, true) => {
                        body.inlines = before;
                        loc.index + 1
                    }
                    (true, false) => {
                        body.inlines = after;
                        loc.index
                    }
                    (false, false) => {
                        body.inlines = before;
                        let tail = TextBlock {
                            inlines: after,
                            align: body.align,
                        };
                        let tail = match &blocks[loc.index] {
                            Block::Heading { level, .. } => Block::Heading { level: *level, body: tail },
                            _ => Block::Paragraph(tail),
                        };
                        blocks.insert(loc.index + 1, tail);
                        loc.index + 1
                    }
                }
            }
            _ => loc.index + 1,
        }
    };

    let at = at.min(blocks.len());
    blocks.splice(at..at, fragment);

    let mut last = loc.container;
    last.push(at + count - 1);
    Some(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodoc_core::tree::Position;

    fn para(text: &str) -> Block {
        Block::paragraph(vec![Inline::text(text)])
    }

    fn items(ordered: bool, texts: &[&str]) -> Block {
        Block::List(List {
            ordered,
            items: texts
                .iter()
                .map(|t| ListItem {
                    inlines: vec![Inline::text(*t)],
                })
                .collect(),
        })
    }

    #[test]
    fn test_block_format_from_tag() {
        assert_eq!(BlockFormat::from_tag("<h2>"), Some(BlockFormat::Heading(2)));
        assert_eq!(BlockFormat::from_tag("blockquote"), Some(BlockFormat::Blockquote));
        assert_eq!(BlockFormat::from_tag("pre"), Some(BlockFormat::Preformatted));
        assert_eq!(BlockFormat::from_tag("h7"), None);
        assert_eq!(BlockFormat::from_tag("span"), None);
    }

    #[test]
    fn test_toggle_list_on_and_off() {
        let mut tree = RichTree::from_blocks(vec![para("a"), para("b")]);
        let paths = tree.leaf_paths();
        assert!(toggle_list(&mut tree, &paths, false));
        assert_eq!(tree.blocks, vec![items(false, &["a", "b"])]);

        let paths = tree.leaf_paths();
        assert!(toggle_list(&mut tree, &paths, false));
        assert_eq!(tree.blocks, vec![para("a"), para("b")]);
    }

    #[test]
    fn test_toggle_list_switches_kind() {
        let mut tree = RichTree::from_blocks(vec![items(false, &["a", "b"])]);
        let paths = vec![BlockPath::new(vec![0, 1])];
        assert!(toggle_list(&mut tree, &paths, true));
        assert_eq!(tree.blocks, vec![items(true, &["a", "b"])]);
    }

    #[test]
    fn test_detach_middle_item_splits_list() {
        let mut tree = RichTree::from_blocks(vec![items(true, &["a", "b", "c"])]);
        let loc = tree.locate(&BlockPath::new(vec![0, 1])).unwrap();
        assert_eq!(detach_list_item(&mut tree, &loc), Some(1));
        assert_eq!(
            tree.blocks,
            vec![items(true, &["a"]), para("b"), items(true, &["c"])]
        );
    }

    #[test]
    fn test_set_text_format() {
        let mut tree = RichTree::from_blocks(vec![para("title")]);
        let path = BlockPath::root(0);
        assert!(set_text_format(&mut tree, &path, BlockFormat::Heading(2)));
        assert_eq!(tree.blocks[0], Block::heading(2, vec![Inline::text("title")]));
        assert!(set_text_format(&mut tree, &path, BlockFormat::Preformatted));
        assert_eq!(tree.blocks[0], Block::Code("title".into()));
        assert!(!set_text_format(&mut tree, &path, BlockFormat::Preformatted));
    }

    #[test]
    fn test_wrap_and_lift_blockquote() {
        let mut tree = RichTree::from_blocks(vec![para("a"), para("b"), para("c")]);
        let paths = vec![BlockPath::root(1)];
        assert!(wrap_in_blockquote(&mut tree, &paths));
        assert_eq!(
            tree.blocks,
            vec![para("a"), Block::Blockquote(vec![para("b")]), para("c")]
        );

        let loc = tree.locate(&BlockPath::new(vec![1, 0])).unwrap();
        assert!(lift_from_blockquote(&mut tree, &loc));
        assert_eq!(tree.blocks, vec![para("a"), para("b"), para("c")]);
    }

    #[test]
    fn test_lift_middle_splits_quote() {
        let mut tree = RichTree::from_blocks(vec![Block::Blockquote(vec![
            para("a"),
            para("b"),
            para("c"),
        ])]);
        assert!(outdent(&mut tree, &[BlockPath::new(vec![0, 1])]));
        assert_eq!(
            tree.blocks,
            vec![
                Block::Blockquote(vec![para("a")]),
                para("b"),
                Block::Blockquote(vec![para("c")]),
            ]
        );
    }

    #[test]
    fn test_insert_blocks_splits_paragraph() {
        let mut tree = RichTree::from_blocks(vec![para("abcd")]);
        let last = insert_blocks(
            &mut tree,
            &BlockPath::root(0),
            2,
            vec![Block::Code("x".into()), Block::empty_paragraph()],
        );
        assert_eq!(last, Some(vec![2]));
        assert_eq!(
            tree.blocks,
            vec![para("ab"), Block::Code("x".into()), Block::empty_paragraph(), para("cd")]
        );
    }

    #[test]
    fn test_insert_blocks_replaces_empty_paragraph() {
        let mut tree = RichTree::from_blocks(vec![Block::empty_paragraph()]);
        let pos = Position::new(vec![0], 0);
        let last = insert_blocks(&mut tree, &pos.path, pos.offset, vec![para("new")]);
        assert_eq!(last, Some(vec![0]));
        assert_eq!(tree.blocks, vec![para("new")]);
    }

    #[test]
    fn test_insert_blocks_after_list() {
        let mut tree = RichTree::from_blocks(vec![items(false, &["a", "b"])]);
        let last = insert_blocks(&mut tree, &BlockPath::new(vec![0, 0]), 1, vec![para("x")]);
        assert_eq!(last, Some(vec![1]));
        assert_eq!(tree.blocks[1], para("x"));
    }

    #[test]
    fn test_leaf_count() {
        let blocks = vec![para("a"), items(true, &["x", "y"]), Block::Blockquote(vec![para("q")])];
        assert_eq!(leaf_count(&blocks), 4);
    }
}
