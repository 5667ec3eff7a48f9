//! Editing Surface
//!
//! The editable region the executor drives. The [`EditingSurface`] trait
//! exposes the three primitives (apply a named command, read a command's
//! active state, insert content at the selection) plus focus and selection
//! handling. [`RichSurface`] is the owned implementation over a [`RichTree`].

use prodoc_core::tree::{
    inlines_text, Alignment, Block, BlockPath, Container, Inline, InlineStyle, Leaf, LeafMut, Link,
    Position, RichTree, SpanStyle,
};
use tracing::{debug, trace};

use crate::selection::Selection;
use crate::spans;
use crate::structure::{self, BlockFormat};

/// Inline style toggled by the bold/italic/underline/strikethrough commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleStyle {
    Bold,
    Italic,
    Underline,
    Strike,
}

impl ToggleStyle {
    pub fn style(&self) -> InlineStyle {
        match self {
            ToggleStyle::Bold => InlineStyle::Bold,
            ToggleStyle::Italic => InlineStyle::Italic,
            ToggleStyle::Underline => InlineStyle::Underline,
            ToggleStyle::Strike => InlineStyle::Strike,
        }
    }

    fn matches(&self, style: &InlineStyle) -> bool {
        *style == self.style()
    }
}

/// Primitive editing command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    Toggle(ToggleStyle),
    Align(Alignment),
    List { ordered: bool },
    FontName(String),
    /// Ordinal size class, 1 to 7
    FontSize(u8),
    ForeColor(String),
    BackColor(String),
    FormatBlock(BlockFormat),
    Outdent,
}

/// Command whose active state can be queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateQuery {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    OrderedList,
    UnorderedList,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    JustifyFull,
}

/// Content spliced at the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Inline(Vec<Inline>),
    Blocks(Vec<Block>),
}

/// Hyperlink attributes as seen by the link dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub href: String,
    pub text: String,
    pub new_tab: bool,
}

/// What the caret is sitting in, for key handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretContext {
    pub collapsed: bool,
    pub in_blockquote: bool,
    /// Visible text of the current block
    pub block_text: String,
    /// Visible text between the block start and the caret
    pub text_before: String,
}

/// An editable rich-text region
pub trait EditingSurface {
    fn content(&self) -> &RichTree;

    /// Replace the whole content; the live selection is dropped
    fn set_content(&mut self, content: RichTree);

    fn focus(&mut self);
    fn blur(&mut self);
    fn has_focus(&self) -> bool;

    /// Live selection, if the surface has one
    fn selection(&self) -> Option<Selection>;
    fn select(&mut self, selection: Selection);

    /// Apply a primitive to the live selection; `false` when nothing changed
    fn apply(&mut self, command: &SurfaceCommand) -> bool;

    fn query_state(&self, query: StateQuery) -> bool;

    /// Splice content at the live selection, replacing any selected range
    fn insert_fragment(&mut self, fragment: Fragment) -> bool;

    /// Hyperlink the caret sits in
    fn enclosing_link(&self) -> Option<LinkInfo>;

    /// Rewrite the hyperlink the caret sits in
    fn edit_enclosing_link(&mut self, link: &LinkInfo) -> bool;

    fn caret_context(&self) -> Option<CaretContext>;

    /// Turn every size-class marker `class` into an explicit pixel size
    fn replace_size_class(&mut self, class: u8, px: u32) -> usize;

    fn selected_text(&self) -> String;
}

/// Owned editing surface over a rich-text tree
#[derive(Debug, Clone, Default)]
pub struct RichSurface {
    tree: RichTree,
    selection: Option<Selection>,
    focused: bool,
}

impl RichSurface {
    pub fn new(mut tree: RichTree) -> Self {
        tree.ensure_editable();
        Self {
            tree,
            selection: None,
            focused: false,
        }
    }

    /// Leaves touched by the selection with their local ranges
    fn selected_leaves(&self) -> Vec<(BlockPath, usize, usize)> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };
        let (start, end) = selection.normalized();

        self.tree
            .leaf_paths()
            .into_iter()
            .filter(|path| *path >= start.path && *path <= end.path)
            .filter_map(|path| {
                let len = self.tree.leaf(&path)?.len();
                let from = if path == start.path { start.offset.min(len) } else { 0 };
                let to = if path == end.path { end.offset.min(len) } else { len };
                Some((path, from, to))
            })
            .collect()
    }

    fn selected_paths(&self) -> Vec<BlockPath> {
        self.selected_leaves().into_iter().map(|(path, _, _)| path).collect()
    }

    fn ordinal(&self, pos: &Position) -> Option<(usize, usize)> {
        self.tree
            .leaf_paths()
            .iter()
            .position(|path| *path == pos.path)
            .map(|index| (index, pos.offset))
    }

    fn from_ordinal(&self, (index, offset): (usize, usize)) -> Position {
        match self.tree.leaf_paths().get(index) {
            Some(path) => self.tree.clamp(&Position::new(path.clone(), offset)),
            None => self.tree.end_position(),
        }
    }

    /// Run a leaf-preserving restructure and carry the selection across it
    fn restructure(&mut self, edit: impl FnOnce(&mut RichTree, &[BlockPath]) -> bool) -> bool {
        let paths = self.selected_paths();
        if paths.is_empty() {
            return false;
        }
        let marks = self.selection.as_ref().and_then(|sel| {
            Some((self.ordinal(&sel.anchor)?, self.ordinal(&sel.focus)?))
        });

        let changed = edit(&mut self.tree, &paths);
        if changed {
            if let Some((anchor, focus)) = marks {
                self.selection = Some(Selection::new(
                    self.from_ordinal(anchor),
                    self.from_ordinal(focus),
                ));
            }
        }
        changed
    }

    /// Rewrite the selected part of every text leaf
    fn edit_inlines(&mut self, edit: &dyn Fn(Vec<Inline>, usize, usize) -> Vec<Inline>) -> bool {
        let mut changed = false;
        for (path, from, to) in self.selected_leaves() {
            if from == to {
                continue;
            }
            if let Some(LeafMut::Inlines(inlines)) = self.tree.leaf_mut(&path) {
                let edited = edit(std::mem::take(inlines), from, to);
                changed |= *inlines != edited;
                *inlines = edited;
            }
        }
        changed
    }

    fn range_is_styled(&self, pred: &dyn Fn(&InlineStyle) -> bool) -> bool {
        let leaves: Vec<(BlockPath, usize, usize)> = self
            .selected_leaves()
            .into_iter()
            .filter(|(path, _, _)| matches!(self.tree.leaf(path), Some(Leaf::Inlines(_))))
            .collect();
        let collapsed = self.selection.as_ref().map(Selection::is_collapsed).unwrap_or(true);

        let mut considered = 0;
        for (path, from, to) in &leaves {
            let Some(Leaf::Inlines(inlines)) = self.tree.leaf(path) else { continue };
            if !collapsed && from == to {
                continue;
            }
            considered += 1;
            if !spans::range_has_style(inlines, *from, *to, pred) {
                return false;
            }
        }
        considered > 0
    }

    fn toggle(&mut self, toggle: ToggleStyle) -> bool {
        if self.selection.as_ref().map(Selection::is_collapsed).unwrap_or(true) {
            return false;
        }
        let pred = move |style: &InlineStyle| toggle.matches(style);
        if self.range_is_styled(&pred) {
            self.edit_inlines(&|inlines, from, to| spans::unwrap_range(inlines, from, to, &pred))
        } else {
            self.edit_inlines(&|inlines, from, to| {
                let stripped = spans::unwrap_range(inlines, from, to, &pred);
                spans::wrap_range(stripped, from, to, toggle.style())
            })
        }
    }

    fn restyle(&mut self, span: SpanStyle) -> bool {
        self.edit_inlines(&|inlines, from, to| spans::restyle_range(inlines, from, to, span.clone()))
    }

    fn align(&mut self, align: Alignment) -> bool {
        let stored = (align != Alignment::Left).then_some(align);
        let mut changed = false;
        for path in self.selected_paths() {
            let Some(loc) = self.tree.locate(&path) else { continue };
            if loc.list_item.is_some() {
                continue;
            }
            let Some(block) = self
                .tree
                .blocks_at_mut(&loc.container)
                .and_then(|blocks| blocks.get_mut(loc.index))
            else {
                continue;
            };
            let slot = match block {
                Block::Paragraph(body) | Block::Heading { body, .. } => &mut body.align,
                Block::Media(media) => &mut media.align,
                _ => continue,
            };
            if *slot != stored {
                *slot = stored;
                changed = true;
            }
        }
        changed
    }

    fn block_alignment(&self, path: &BlockPath) -> Alignment {
        let Some(loc) = self.tree.locate(path) else {
            return Alignment::Left;
        };
        if loc.list_item.is_some() {
            return Alignment::Left;
        }
        let align = self
            .tree
            .blocks_at(&loc.container)
            .and_then(|blocks| blocks.get(loc.index))
            .and_then(|block| match block {
                Block::Paragraph(body) | Block::Heading { body, .. } => body.align,
                Block::Media(media) => media.align,
                _ => None,
            });
        align.unwrap_or(Alignment::Left)
    }

    /// Delete the selected range, leaving a collapsed caret at its start
    fn delete_selection(&mut self) {
        let Some(selection) = self.selection.clone() else { return };
        if selection.is_collapsed() {
            return;
        }
        for (path, from, to) in self.selected_leaves() {
            match self.tree.leaf_mut(&path) {
                Some(LeafMut::Inlines(inlines)) => {
                    let edited = spans::delete_range(std::mem::take(inlines), from, to);
                    *inlines = edited;
                }
                Some(LeafMut::Code(code)) => {
                    *code = code
                        .chars()
                        .enumerate()
                        .filter(|(i, _)| *i < from || *i >= to)
                        .map(|(_, c)| c)
                        .collect();
                }
                _ => {}
            }
        }
        self.selection = Some(Selection::caret(selection.min()));
    }

    fn caret(&self) -> Option<Position> {
        self.selection
            .as_ref()
            .map(|sel| self.tree.clamp(&sel.focus))
    }

    fn insert_blocks(&mut self, caret: &Position, blocks: Vec<Block>) -> bool {
        let Some(last) = structure::insert_blocks(&mut self.tree, &caret.path, caret.offset, blocks) else {
            return false;
        };
        let end = self
            .tree
            .leaf_paths()
            .into_iter()
            .filter(|path| path.steps().starts_with(&last))
            .last()
            .map(|path| {
                let offset = self.tree.leaf(&path).map(|leaf| leaf.len()).unwrap_or(0);
                Position::new(path, offset)
            })
            .unwrap_or_else(|| self.tree.end_position());
        self.selection = Some(Selection::caret(end));
        true
    }
}

impl EditingSurface for RichSurface {
    fn content(&self) -> &RichTree {
        &self.tree
    }

    fn set_content(&mut self, mut content: RichTree) {
        content.ensure_editable();
        self.tree = content;
        self.selection = None;
    }

    fn focus(&mut self) {
        self.focused = true;
        if self.selection.is_none() {
            self.selection = Some(Selection::caret(self.tree.start_position()));
        }
    }

    fn blur(&mut self) {
        self.focused = false;
        self.selection = None;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn selection(&self) -> Option<Selection> {
        self.selection.clone()
    }

    fn select(&mut self, selection: Selection) {
        self.selection = Some(Selection::new(
            self.tree.clamp(&selection.anchor),
            self.tree.clamp(&selection.focus),
        ));
    }

    fn apply(&mut self, command: &SurfaceCommand) -> bool {
        trace!("Applying {:?}", command);
        let changed = match command {
            SurfaceCommand::Toggle(toggle) => self.toggle(*toggle),
            SurfaceCommand::Align(align) => self.align(*align),
            SurfaceCommand::List { ordered } => {
                let ordered = *ordered;
                self.restructure(|tree, paths| structure::toggle_list(tree, paths, ordered))
            }
            SurfaceCommand::FontName(family) => self.restyle(SpanStyle {
                font_family: Some(family.clone()),
                ..Default::default()
            }),
            SurfaceCommand::FontSize(class) => self.restyle(SpanStyle {
                size_class: Some((*class).clamp(1, 7)),
                ..Default::default()
            }),
            SurfaceCommand::ForeColor(color) => self.restyle(SpanStyle {
                color: Some(color.clone()),
                ..Default::default()
            }),
            SurfaceCommand::BackColor(color) => self.restyle(SpanStyle {
                background: Some(color.clone()),
                ..Default::default()
            }),
            SurfaceCommand::FormatBlock(BlockFormat::Blockquote) => {
                self.restructure(structure::wrap_in_blockquote)
            }
            SurfaceCommand::FormatBlock(format) => {
                let format = *format;
                self.restructure(|tree, paths| {
                    let mut changed = false;
                    for path in paths.iter().rev() {
                        changed |= structure::set_text_format(tree, path, format);
                    }
                    changed
                })
            }
            SurfaceCommand::Outdent => self.restructure(structure::outdent),
        };
        debug!("Surface command {:?} changed content: {}", command, changed);
        changed
    }

    fn query_state(&self, query: StateQuery) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        let caret = self.tree.clamp(&selection.focus);

        match query {
            StateQuery::Bold => self.range_is_styled(&|s| ToggleStyle::Bold.matches(s)),
            StateQuery::Italic => self.range_is_styled(&|s| ToggleStyle::Italic.matches(s)),
            StateQuery::Underline => self.range_is_styled(&|s| ToggleStyle::Underline.matches(s)),
            StateQuery::Strikethrough => self.range_is_styled(&|s| ToggleStyle::Strike.matches(s)),
            StateQuery::OrderedList | StateQuery::UnorderedList => {
                let want = query == StateQuery::OrderedList;
                self.tree
                    .locate(&caret.path)
                    .and_then(|loc| loc.ancestors.last().copied())
                    .map(|container| container == Container::List { ordered: want })
                    .unwrap_or(false)
            }
            StateQuery::JustifyLeft => self.block_alignment(&caret.path) == Alignment::Left,
            StateQuery::JustifyCenter => self.block_alignment(&caret.path) == Alignment::Center,
            StateQuery::JustifyRight => self.block_alignment(&caret.path) == Alignment::Right,
            StateQuery::JustifyFull => self.block_alignment(&caret.path) == Alignment::Justify,
        }
    }

    fn insert_fragment(&mut self, fragment: Fragment) -> bool {
        if self.selection.is_none() {
            self.selection = Some(Selection::caret(self.tree.end_position()));
        }
        self.delete_selection();
        let Some(caret) = self.caret() else { return false };

        match fragment {
            Fragment::Inline(inlines) => {
                let added = prodoc_core::tree::inlines_len(&inlines);
                match self.tree.leaf_mut(&caret.path) {
                    Some(LeafMut::Inlines(existing)) => {
                        let edited = spans::insert_inlines(std::mem::take(existing), caret.offset, inlines);
                        *existing = edited;
                        self.selection = Some(Selection::caret(Position::new(
                            caret.path.clone(),
                            caret.offset + added,
                        )));
                        true
                    }
                    Some(LeafMut::Code(code)) => {
                        let text = inlines_text(&inlines);
                        let byte = code
                            .char_indices()
                            .nth(caret.offset)
                            .map(|(i, _)| i)
                            .unwrap_or(code.len());
                        code.insert_str(byte, &text);
                        self.selection = Some(Selection::caret(Position::new(
                            caret.path.clone(),
                            caret.offset + text.chars().count(),
                        )));
                        true
                    }
                    Some(LeafMut::Opaque) => self.insert_blocks(&caret, vec![Block::paragraph(inlines)]),
                    None => false,
                }
            }
            Fragment::Blocks(blocks) => self.insert_blocks(&caret, blocks),
        }
    }

    fn enclosing_link(&self) -> Option<LinkInfo> {
        let caret = self.caret()?;
        let Leaf::Inlines(inlines) = self.tree.leaf(&caret.path)? else {
            return None;
        };
        spans::link_at(inlines, caret.offset).map(|link| LinkInfo {
            href: link.href.clone(),
            text: inlines_text(&link.children),
            new_tab: link.new_tab,
        })
    }

    fn edit_enclosing_link(&mut self, info: &LinkInfo) -> bool {
        let Some(caret) = self.caret() else { return false };
        let Some(LeafMut::Inlines(inlines)) = self.tree.leaf_mut(&caret.path) else {
            return false;
        };
        let Some(link) = spans::link_at_mut(inlines, caret.offset) else {
            return false;
        };
        *link = Link {
            href: info.href.clone(),
            new_tab: info.new_tab,
            children: vec![Inline::text(info.text.clone())],
        };
        let clamped = self.tree.clamp(&caret);
        self.selection = Some(Selection::caret(clamped));
        true
    }

    fn caret_context(&self) -> Option<CaretContext> {
        let selection = self.selection.as_ref()?;
        let caret = self.tree.clamp(&selection.focus);
        let loc = self.tree.locate(&caret.path)?;
        let leaf = self.tree.leaf(&caret.path)?;
        let text_before = match leaf {
            Leaf::Inlines(inlines) => spans::text_before(inlines, caret.offset),
            Leaf::Code(code) => code.chars().take(caret.offset).collect(),
            Leaf::Opaque => String::new(),
        };
        Some(CaretContext {
            collapsed: selection.is_collapsed(),
            in_blockquote: loc.in_blockquote(),
            block_text: leaf.text(),
            text_before,
        })
    }

    fn replace_size_class(&mut self, class: u8, px: u32) -> usize {
        let mut replaced = 0;
        for path in self.tree.leaf_paths() {
            if let Some(LeafMut::Inlines(inlines)) = self.tree.leaf_mut(&path) {
                replaced += spans::resize_size_class(inlines, class, px);
            }
        }
        replaced
    }

    fn selected_text(&self) -> String {
        let mut parts = Vec::new();
        for (path, from, to) in self.selected_leaves() {
            let Some(leaf) = self.tree.leaf(&path) else { continue };
            let text: String = match leaf {
                Leaf::Inlines(inlines) => {
                    let (_, middle, _) = spans::slice_inlines(inlines.to_vec(), from, to);
                    inlines_text(&middle)
                }
                Leaf::Code(code) => code.chars().skip(from).take(to.saturating_sub(from)).collect(),
                Leaf::Opaque => continue,
            };
            parts.push(text);
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodoc_core::tree::{List, ListItem};

    fn surface(blocks: Vec<Block>) -> RichSurface {
        let mut surface = RichSurface::new(RichTree::from_blocks(blocks));
        surface.focus();
        surface
    }

    fn select(surface: &mut RichSurface, path: Vec<usize>, from: usize, to: usize) {
        surface.select(Selection::new(
            Position::new(path.clone(), from),
            Position::new(path, to),
        ));
    }

    #[test]
    fn test_focus_places_caret_at_start() {
        let surface = surface(vec![Block::paragraph(vec![Inline::text("abc")])]);
        assert_eq!(
            surface.selection(),
            Some(Selection::caret(Position::new(vec![0], 0)))
        );
    }

    #[test]
    fn test_bold_toggles() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::text("Bold text")])]);
        select(&mut surface, vec![0], 0, 4);

        assert!(surface.apply(&SurfaceCommand::Toggle(ToggleStyle::Bold)));
        assert!(surface.query_state(StateQuery::Bold));
        assert_eq!(
            surface.content().blocks[0],
            Block::paragraph(vec![Inline::bold(vec![Inline::text("Bold")]), Inline::text(" text")])
        );

        assert!(surface.apply(&SurfaceCommand::Toggle(ToggleStyle::Bold)));
        assert!(!surface.query_state(StateQuery::Bold));
        assert_eq!(
            surface.content().blocks[0],
            Block::paragraph(vec![Inline::text("Bold text")])
        );
    }

    #[test]
    fn test_partial_bold_extends_without_nesting() {
        let mut surface = surface(vec![Block::paragraph(vec![
            Inline::bold(vec![Inline::text("ab")]),
            Inline::text("cd"),
        ])]);
        select(&mut surface, vec![0], 0, 4);
        assert!(surface.apply(&SurfaceCommand::Toggle(ToggleStyle::Bold)));
        assert_eq!(
            surface.content().blocks[0],
            Block::paragraph(vec![Inline::bold(vec![Inline::text("abcd")])])
        );
    }

    #[test]
    fn test_collapsed_toggle_is_noop() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::text("abc")])]);
        assert!(!surface.apply(&SurfaceCommand::Toggle(ToggleStyle::Italic)));
    }

    #[test]
    fn test_align_and_query() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::text("abc")])]);
        assert!(surface.query_state(StateQuery::JustifyLeft));
        assert!(surface.apply(&SurfaceCommand::Align(Alignment::Center)));
        assert!(surface.query_state(StateQuery::JustifyCenter));
        assert!(!surface.query_state(StateQuery::JustifyLeft));
        assert!(surface.apply(&SurfaceCommand::Align(Alignment::Left)));
        assert_eq!(surface.content().blocks[0].text_block().unwrap().align, None);
    }

    #[test]
    fn test_list_toggle_keeps_selection() {
        let mut surface = surface(vec![
            Block::paragraph(vec![Inline::text("one")]),
            Block::paragraph(vec![Inline::text("two")]),
        ]);
        surface.select(Selection::new(
            Position::new(vec![0], 1),
            Position::new(vec![1], 2),
        ));
        assert!(surface.apply(&SurfaceCommand::List { ordered: true }));
        assert!(surface.query_state(StateQuery::OrderedList));
        assert!(!surface.query_state(StateQuery::UnorderedList));
        assert_eq!(
            surface.selection(),
            Some(Selection::new(
                Position::new(vec![0, 0], 1),
                Position::new(vec![0, 1], 2),
            ))
        );
    }

    #[test]
    fn test_format_block_quote_then_outdent() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::text("quote me")])]);
        assert!(surface.apply(&SurfaceCommand::FormatBlock(BlockFormat::Blockquote)));
        assert!(surface.caret_context().unwrap().in_blockquote);
        assert_eq!(surface.selection().unwrap().focus.path.steps(), &[0, 0]);

        assert!(surface.apply(&SurfaceCommand::Outdent));
        assert!(!surface.caret_context().unwrap().in_blockquote);
        assert_eq!(
            surface.content().blocks,
            vec![Block::paragraph(vec![Inline::text("quote me")])]
        );
    }

    #[test]
    fn test_font_size_class_then_pixels() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::text("big")])]);
        select(&mut surface, vec![0], 0, 3);
        assert!(surface.apply(&SurfaceCommand::FontSize(7)));
        assert_eq!(surface.replace_size_class(7, 32), 1);
        let expected = SpanStyle {
            font_size_px: Some(32),
            ..Default::default()
        };
        assert_eq!(
            surface.content().blocks[0],
            Block::paragraph(vec![Inline::styled(InlineStyle::Span(expected), vec![Inline::text("big")])])
        );
    }

    #[test]
    fn test_insert_inline_replaces_selection() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::text("hello world")])]);
        select(&mut surface, vec![0], 6, 11);
        assert_eq!(surface.selected_text(), "world");
        assert!(surface.insert_fragment(Fragment::Inline(vec![Inline::text("there")])));
        assert_eq!(
            surface.content().blocks[0],
            Block::paragraph(vec![Inline::text("hello there")])
        );
        assert_eq!(
            surface.selection(),
            Some(Selection::caret(Position::new(vec![0], 11)))
        );
    }

    #[test]
    fn test_insert_blocks_moves_caret_to_last_leaf() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::text("text")])]);
        surface.select(Selection::caret(Position::new(vec![0], 4)));
        assert!(surface.insert_fragment(Fragment::Blocks(vec![
            Block::Code("code".into()),
            Block::empty_paragraph(),
        ])));
        assert_eq!(surface.content().blocks.len(), 3);
        assert_eq!(
            surface.selection(),
            Some(Selection::caret(Position::new(vec![2], 0)))
        );
    }

    #[test]
    fn test_enclosing_link_edit() {
        let mut surface = surface(vec![Block::paragraph(vec![Inline::Link(Link {
            href: "https://old.example".into(),
            new_tab: false,
            children: vec![Inline::text("old")],
        })])]);
        surface.select(Selection::caret(Position::new(vec![0], 1)));
        let info = surface.enclosing_link().unwrap();
        assert_eq!(info.text, "old");

        assert!(surface.edit_enclosing_link(&LinkInfo {
            href: "https://new.example".into(),
            text: "fresh".into(),
            new_tab: true,
        }));
        assert_eq!(
            surface.content().blocks[0],
            Block::paragraph(vec![Inline::Link(Link {
                href: "https://new.example".into(),
                new_tab: true,
                children: vec![Inline::text("fresh")],
            })])
        );
    }

    #[test]
    fn test_list_item_caret_context() {
        let surface_tree = vec![Block::Blockquote(vec![Block::List(List {
            ordered: false,
            items: vec![ListItem {
                inlines: vec![Inline::text("item")],
            }],
        })])];
        let mut surface = surface(surface_tree);
        surface.select(Selection::caret(Position::new(vec![0, 0, 0], 2)));
        let ctx = surface.caret_context().unwrap();
        assert!(ctx.in_blockquote);
        assert!(ctx.collapsed);
        assert_eq!(ctx.block_text, "item");
        assert_eq!(ctx.text_before, "it");
        assert!(surface.query_state(StateQuery::UnorderedList));
    }
}
