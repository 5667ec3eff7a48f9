//! Rich Text Tree
//!
//! Typed representation of document content: an ordered forest of block
//! nodes, each text block holding a sequence of inline spans.
//!
//! Text blocks (paragraphs, headings, list items and code blocks) are the
//! *leaves* a caret can sit in. A leaf is addressed by a [`BlockPath`]:
//! - a top-level block index,
//! - then a child index when descending into a blockquote,
//! - an item index when descending into a list,
//! - row, cell and block indices when descending into a table.

use std::fmt;

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// CSS `text-align` keyword
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    /// Parse a CSS `text-align` keyword
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

/// Font styling carried by a span wrapper
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub font_family: Option<String>,
    /// Ordinal size class (1-7), as produced by the size primitive
    pub size_class: Option<u8>,
    /// Explicit pixel size
    pub font_size_px: Option<u32>,
    pub color: Option<String>,
    pub background: Option<String>,
}

impl SpanStyle {
    pub fn is_empty(&self) -> bool {
        self.font_family.is_none()
            && self.size_class.is_none()
            && self.font_size_px.is_none()
            && self.color.is_none()
            && self.background.is_none()
    }
}

/// Inline wrapper semantics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strike,
    Span(SpanStyle),
}

/// Hyperlink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub new_tab: bool,
    pub children: Vec<Inline>,
}

/// Inline image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub src: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rounded: bool,
    pub shadow: bool,
    pub border: bool,
}

/// Inline span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Styled {
        style: InlineStyle,
        children: Vec<Inline>,
    },
    Link(Link),
    Image(Image),
    LineBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(text.into())
    }

    pub fn styled(style: InlineStyle, children: Vec<Inline>) -> Self {
        Inline::Styled { style, children }
    }

    pub fn bold(children: Vec<Inline>) -> Self {
        Inline::styled(InlineStyle::Bold, children)
    }

    pub fn italic(children: Vec<Inline>) -> Self {
        Inline::styled(InlineStyle::Italic, children)
    }

    /// Caret length in characters; line breaks and images count as one
    pub fn len(&self) -> usize {
        match self {
            Inline::Text(text) => text.chars().count(),
            Inline::Styled { children, .. } => inlines_len(children),
            Inline::Link(link) => inlines_len(&link.children),
            Inline::Image(_) | Inline::LineBreak => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children of wrapper spans
    pub fn children(&self) -> Option<&[Inline]> {
        match self {
            Inline::Styled { children, .. } => Some(children),
            Inline::Link(link) => Some(&link.children),
            _ => None,
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(text),
            Inline::Styled { children, .. } => push_inlines_text(children, out),
            Inline::Link(link) => push_inlines_text(&link.children, out),
            Inline::LineBreak => out.push('\n'),
            Inline::Image(_) => {}
        }
    }
}

/// Total caret length of an inline sequence
pub fn inlines_len(inlines: &[Inline]) -> usize {
    inlines.iter().map(Inline::len).sum()
}

/// Visible text of an inline sequence (images contribute nothing)
pub fn inlines_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_inlines_text(inlines, &mut out);
    out
}

fn push_inlines_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        inline.push_text(out);
    }
}

/// Merge adjacent text runs and drop empty text and empty wrappers
pub fn normalize_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        let inline = match inline {
            Inline::Text(text) if text.is_empty() => continue,
            Inline::Styled { style, children } => {
                let children = normalize_inlines(children);
                if children.is_empty() {
                    continue;
                }
                if let InlineStyle::Span(ref span) = style {
                    if span.is_empty() {
                        out.extend(children);
                        continue;
                    }
                }
                Inline::Styled { style, children }
            }
            Inline::Link(mut link) => {
                link.children = normalize_inlines(link.children);
                if link.children.is_empty() {
                    continue;
                }
                Inline::Link(link)
            }
            other => other,
        };

        match (out.last_mut(), &inline) {
            (Some(Inline::Text(prev)), Inline::Text(next)) => {
                prev.push_str(next);
                continue;
            }
            (
                Some(Inline::Styled { style: prev_style, children: prev_children }),
                Inline::Styled { style, children },
            ) if prev_style == style => {
                prev_children.extend(children.iter().cloned());
                let merged = normalize_inlines(std::mem::take(prev_children));
                *prev_children = merged;
                continue;
            }
            _ => {}
        }
        out.push(inline);
    }
    out
}

/// Paragraph-like content with optional alignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub inlines: Vec<Inline>,
    pub align: Option<Alignment>,
}

impl TextBlock {
    pub fn new(inlines: Vec<Inline>) -> Self {
        Self { inlines, align: None }
    }

    pub fn aligned(inlines: Vec<Inline>, align: Alignment) -> Self {
        Self {
            inlines,
            align: Some(align),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inlines.is_empty()
    }
}

/// Ordered or unordered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub inlines: Vec<Inline>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    pub header: bool,
    pub blocks: Vec<Block>,
}

/// Embedded media flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Embedded player frame (video-sharing sites)
    Frame,
    /// Native playback element
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub src: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub align: Option<Alignment>,
}

/// Markup the tree does not model, kept verbatim with its visible text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub html: String,
    pub text: String,
}

/// Block node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(TextBlock),
    Heading { level: u8, body: TextBlock },
    List(List),
    Blockquote(Vec<Block>),
    Table(Table),
    Code(String),
    Media(Media),
    Raw(RawBlock),
}

impl Block {
    pub fn paragraph(inlines: Vec<Inline>) -> Self {
        Block::Paragraph(TextBlock::new(inlines))
    }

    pub fn empty_paragraph() -> Self {
        Block::Paragraph(TextBlock::default())
    }

    pub fn heading(level: u8, inlines: Vec<Inline>) -> Self {
        Block::Heading {
            level: level.clamp(1, 6),
            body: TextBlock::new(inlines),
        }
    }

    /// Text body of paragraphs and headings
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Block::Paragraph(body) | Block::Heading { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn text_block_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Paragraph(body) | Block::Heading { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Address of a leaf block inside the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPath(Vec<usize>);

impl BlockPath {
    pub fn new(steps: Vec<usize>) -> Self {
        Self(steps)
    }

    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }
}

impl From<Vec<usize>> for BlockPath {
    fn from(steps: Vec<usize>) -> Self {
        Self(steps)
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// Caret position: leaf path plus character offset within the leaf
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub path: BlockPath,
    pub offset: usize,
}

impl Position {
    pub fn new(path: impl Into<BlockPath>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// Borrowed view of a leaf block
#[derive(Debug, Clone, Copy)]
pub enum Leaf<'a> {
    Inlines(&'a [Inline]),
    Code(&'a str),
    /// Media and raw blocks: addressable but not editable
    Opaque,
}

impl Leaf<'_> {
    pub fn len(&self) -> usize {
        match self {
            Leaf::Inlines(inlines) => inlines_len(inlines),
            Leaf::Code(code) => code.chars().count(),
            Leaf::Opaque => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> String {
        match self {
            Leaf::Inlines(inlines) => inlines_text(inlines),
            Leaf::Code(code) => code.to_string(),
            Leaf::Opaque => String::new(),
        }
    }
}

/// Mutable view of a leaf block
#[derive(Debug)]
pub enum LeafMut<'a> {
    Inlines(&'a mut Vec<Inline>),
    Code(&'a mut String),
    Opaque,
}

/// Container a leaf is nested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Blockquote,
    List { ordered: bool },
    TableCell { header: bool },
}

/// Where a leaf lives relative to the block vector holding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafLocation {
    /// Path of the block vector (empty for the document root)
    pub container: Vec<usize>,
    /// Index of the leaf's block inside that vector
    pub index: usize,
    /// Item index when the leaf is a list item
    pub list_item: Option<usize>,
    /// Enclosing containers, outermost first
    pub ancestors: Vec<Container>,
}

impl LeafLocation {
    /// Path of the block (the list itself for list items)
    pub fn block_path(&self) -> Vec<usize> {
        let mut path = self.container.clone();
        path.push(self.index);
        path
    }

    pub fn in_blockquote(&self) -> bool {
        self.ancestors.contains(&Container::Blockquote)
    }
}

/// The document content tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichTree {
    pub blocks: Vec<Block>,
}

impl RichTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Make sure a caret has somewhere to go
    pub fn ensure_editable(&mut self) {
        if self.leaf_paths().is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
    }

    pub fn leaf(&self, path: &BlockPath) -> Option<Leaf<'_>> {
        resolve_leaf(&self.blocks, path.steps())
    }

    pub fn leaf_mut(&mut self, path: &BlockPath) -> Option<LeafMut<'_>> {
        resolve_leaf_mut(&mut self.blocks, path.steps())
    }

    /// All leaf paths in document order
    pub fn leaf_paths(&self) -> Vec<BlockPath> {
        let mut out = Vec::new();
        collect_leaves(&self.blocks, &mut Vec::new(), &mut out);
        out
    }

    /// Position after the last character of the document
    pub fn end_position(&self) -> Position {
        match self.leaf_paths().pop() {
            Some(path) => {
                let offset = self.leaf(&path).map(|leaf| leaf.len()).unwrap_or(0);
                Position { path, offset }
            }
            None => Position::new(vec![0], 0),
        }
    }

    /// Position before the first character of the document
    pub fn start_position(&self) -> Position {
        let path = self
            .leaf_paths()
            .into_iter()
            .next()
            .unwrap_or_else(|| BlockPath::root(0));
        Position { path, offset: 0 }
    }

    /// Nearest valid position; stale paths fall back to the document end
    pub fn clamp(&self, position: &Position) -> Position {
        match self.leaf(&position.path) {
            Some(leaf) => Position {
                path: position.path.clone(),
                offset: position.offset.min(leaf.len()),
            },
            None => self.end_position(),
        }
    }

    /// Locate a leaf relative to its containing block vector
    pub fn locate(&self, path: &BlockPath) -> Option<LeafLocation> {
        let steps = path.steps();
        let mut blocks = &self.blocks;
        let mut container = Vec::new();
        let mut ancestors = Vec::new();
        let mut i = 0;

        while i < steps.len() {
            let index = steps[i];
            let block = blocks.get(index)?;
            let rest = &steps[i + 1..];
            match block {
                Block::Blockquote(children) if !rest.is_empty() => {
                    ancestors.push(Container::Blockquote);
                    container.push(index);
                    blocks = children;
                    i += 1;
                }
                Block::List(list) => {
                    let [item] = rest else { return None };
                    list.items.get(*item)?;
                    ancestors.push(Container::List { ordered: list.ordered });
                    return Some(LeafLocation {
                        container,
                        index,
                        list_item: Some(*item),
                        ancestors,
                    });
                }
                Block::Table(table) if rest.len() >= 3 => {
                    let cell = table.rows.get(rest[0])?.cells.get(rest[1])?;
                    ancestors.push(Container::TableCell { header: cell.header });
                    container.extend_from_slice(&steps[i..i + 3]);
                    blocks = &cell.blocks;
                    i += 3;
                }
                Block::Paragraph(_)
                | Block::Heading { .. }
                | Block::Code(_)
                | Block::Media(_)
                | Block::Raw(_)
                    if rest.is_empty() =>
                {
                    return Some(LeafLocation {
                        container,
                        index,
                        list_item: None,
                        ancestors,
                    });
                }
                _ => return None,
            }
        }
        None
    }

    /// Block vector addressed by a container path
    pub fn blocks_at(&self, container: &[usize]) -> Option<&Vec<Block>> {
        let mut blocks = &self.blocks;
        let mut rest = container;
        while let Some((&index, tail)) = rest.split_first() {
            match blocks.get(index)? {
                Block::Blockquote(children) => {
                    blocks = children;
                    rest = tail;
                }
                Block::Table(table) if tail.len() >= 2 => {
                    blocks = &table.rows.get(tail[0])?.cells.get(tail[1])?.blocks;
                    rest = &tail[2..];
                }
                _ => return None,
            }
        }
        Some(blocks)
    }

    pub fn blocks_at_mut(&mut self, container: &[usize]) -> Option<&mut Vec<Block>> {
        let mut blocks = &mut self.blocks;
        let mut rest = container;
        while let Some((&index, tail)) = rest.split_first() {
            match blocks.get_mut(index)? {
                Block::Blockquote(children) => {
                    blocks = children;
                    rest = tail;
                }
                Block::Table(table) if tail.len() >= 2 => {
                    blocks = &mut table.rows.get_mut(tail[0])?.cells.get_mut(tail[1])?.blocks;
                    rest = &tail[2..];
                }
                _ => return None,
            }
        }
        Some(blocks)
    }

    /// Visit every block, depth first, with its nesting depth
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Block, usize)) {
        fn go<'a>(blocks: &'a [Block], depth: usize, visit: &mut dyn FnMut(&'a Block, usize)) {
            for block in blocks {
                visit(block, depth);
                match block {
                    Block::Blockquote(children) => go(children, depth + 1, visit),
                    Block::Table(table) => {
                        for cell in table.rows.iter().flat_map(|row| row.cells.iter()) {
                            go(&cell.blocks, depth + 1, visit);
                        }
                    }
                    _ => {}
                }
            }
        }
        go(&self.blocks, 0, visit);
    }
}

fn resolve_leaf<'a>(blocks: &'a [Block], path: &[usize]) -> Option<Leaf<'a>> {
    let (first, rest) = path.split_first()?;
    match blocks.get(*first)? {
        Block::Paragraph(body) | Block::Heading { body, .. } if rest.is_empty() => {
            Some(Leaf::Inlines(&body.inlines))
        }
        Block::Code(code) if rest.is_empty() => Some(Leaf::Code(code)),
        Block::Media(_) | Block::Raw(_) if rest.is_empty() => Some(Leaf::Opaque),
        Block::Blockquote(children) => resolve_leaf(children, rest),
        Block::List(list) => match rest {
            [item] => list.items.get(*item).map(|item| Leaf::Inlines(&item.inlines)),
            _ => None,
        },
        Block::Table(table) => match rest {
            [row, cell, tail @ ..] => {
                let cell = table.rows.get(*row)?.cells.get(*cell)?;
                resolve_leaf(&cell.blocks, tail)
            }
            _ => None,
        },
        _ => None,
    }
}

fn resolve_leaf_mut<'a>(blocks: &'a mut [Block], path: &[usize]) -> Option<LeafMut<'a>> {
    let (first, rest) = path.split_first()?;
    match blocks.get_mut(*first)? {
        Block::Paragraph(body) | Block::Heading { body, .. } if rest.is_empty() => {
            Some(LeafMut::Inlines(&mut body.inlines))
        }
        Block::Code(code) if rest.is_empty() => Some(LeafMut::Code(code)),
        Block::Media(_) | Block::Raw(_) if rest.is_empty() => Some(LeafMut::Opaque),
        Block::Blockquote(children) => resolve_leaf_mut(children, rest),
        Block::List(list) => match rest {
            [item] => list
                .items
                .get_mut(*item)
                .map(|item| LeafMut::Inlines(&mut item.inlines)),
            _ => None,
        },
        Block::Table(table) => match rest {
            [row, cell, tail @ ..] => {
                let cell = table.rows.get_mut(*row)?.cells.get_mut(*cell)?;
                resolve_leaf_mut(&mut cell.blocks, tail)
            }
            _ => None,
        },
        _ => None,
    }
}

fn collect_leaves(blocks: &[Block], prefix: &mut Vec<usize>, out: &mut Vec<BlockPath>) {
    for (index, block) in blocks.iter().enumerate() {
        prefix.push(index);
        match block {
            Block::Blockquote(children) => collect_leaves(children, prefix, out),
            Block::List(list) => {
                for item in 0..list.items.len() {
                    out.push(BlockPath::new(prefix.clone()).child(item));
                }
            }
            Block::Table(table) => {
                for (r, row) in table.rows.iter().enumerate() {
                    for (c, cell) in row.cells.iter().enumerate() {
                        prefix.push(r);
                        prefix.push(c);
                        collect_leaves(&cell.blocks, prefix, out);
                        prefix.pop();
                        prefix.pop();
                    }
                }
            }
            _ => out.push(BlockPath::new(prefix.clone())),
        }
        prefix.pop();
    }
}
