//! HTML Reader
//!
//! Builds a [`RichTree`] from editor markup. Loose inline content between
//! blocks becomes an implicit paragraph, block markup the tree does not
//! model is kept verbatim as a raw block, and unknown inline wrappers are
//! transparent.

use prodoc_core::tree::{
    normalize_inlines, Alignment, Block, Image, Inline, InlineStyle, Link, List, ListItem,
    Media, MediaKind, RawBlock, RichTree, SpanStyle, Table, TableCell, TableRow, TextBlock,
};
use prodoc_core::Result;
use tracing::debug;

use crate::dom::{self, parse_px, Element, Node};

/// Elements whose content is never shown
const HIDDEN: &[&str] = &["head", "title", "style", "script", "template", "noscript"];

/// Elements that only group blocks
const TRANSPARENT_BLOCKS: &[&str] = &["html", "body", "main", "article", "section", "header", "footer"];

/// Parse editor markup into a content tree
pub fn parse_html(source: &str) -> Result<RichTree> {
    let nodes = dom::parse_fragment(source)?;
    let reader = HtmlReader { source };
    let mut tree = RichTree::from_blocks(reader.blocks(&nodes));
    tree.ensure_editable();
    debug!("Parsed {} top-level blocks from markup", tree.blocks.len());
    Ok(tree)
}

/// Whether an element starts a block of its own
fn is_block(element: &Element) -> bool {
    matches!(
        element.name.as_str(),
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "pre"
            | "table"
            | "div"
            | "hr"
            | "figure"
            | "iframe"
            | "video"
            | "address"
            | "dl"
            | "form"
            | "fieldset"
    ) || HIDDEN.contains(&element.name.as_str())
        || TRANSPARENT_BLOCKS.contains(&element.name.as_str())
}

fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}

fn alignment(element: &Element) -> Option<Alignment> {
    element
        .style("text-align")
        .or_else(|| element.attr("align").map(str::to_string))
        .and_then(|value| Alignment::from_css(&value))
        .filter(|align| *align != Alignment::Left)
}

struct HtmlReader<'a> {
    source: &'a str,
}

impl HtmlReader<'_> {
    fn blocks(&self, nodes: &[Node]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending: Vec<&Node> = Vec::new();

        for node in nodes {
            match node {
                Node::Element(element) if is_block(element) => {
                    self.flush_inline(&mut pending, &mut blocks);
                    self.block(element, &mut blocks);
                }
                _ => pending.push(node),
            }
        }
        self.flush_inline(&mut pending, &mut blocks);
        blocks
    }

    /// Turn a run of loose inline nodes into a paragraph
    fn flush_inline(&self, pending: &mut Vec<&Node>, blocks: &mut Vec<Block>) {
        if pending.iter().all(|node| node.is_blank()) {
            pending.clear();
            return;
        }
        let nodes: Vec<Node> = pending.drain(..).cloned().collect();
        blocks.push(Block::Paragraph(TextBlock::new(inline_content(&nodes))));
    }

    fn block(&self, element: &Element, blocks: &mut Vec<Block>) {
        let name = element.name.as_str();
        if HIDDEN.contains(&name) {
            return;
        }
        if TRANSPARENT_BLOCKS.contains(&name) {
            blocks.extend(self.blocks(&element.children));
            return;
        }
        if let Some(level) = heading_level(name) {
            blocks.push(Block::Heading {
                level,
                body: text_block(element),
            });
            return;
        }

        match name {
            "p" => blocks.push(self.paragraph(element)),
            "ul" | "ol" => blocks.push(Block::List(list(element))),
            "li" => blocks.push(Block::Paragraph(TextBlock::new(list_item(element).inlines))),
            "blockquote" => {
                let mut children = self.blocks(&element.children);
                if children.is_empty() {
                    children.push(Block::empty_paragraph());
                }
                blocks.push(Block::Blockquote(children));
            }
            "pre" => blocks.push(Block::Code(code_text(element))),
            "table" => blocks.push(Block::Table(self.table(element))),
            "iframe" | "video" => match media(element, None) {
                Some(media) => blocks.push(Block::Media(media)),
                None => blocks.push(self.raw(element)),
            },
            _ => blocks.push(self.raw(element)),
        }
    }

    fn paragraph(&self, element: &Element) -> Block {
        let align = alignment(element);
        let mut significant = element.children.iter().filter(|node| !node.is_blank());
        if let (Some(Node::Element(only)), None) = (significant.next(), significant.next()) {
            if only.is("iframe") || only.is("video") {
                if let Some(media) = media(only, align) {
                    return Block::Media(media);
                }
            }
        }
        Block::Paragraph(text_block(element))
    }

    fn table(&self, element: &Element) -> Table {
        let mut rows = Vec::new();
        collect_rows(element, &mut rows);
        Table {
            rows: rows
                .into_iter()
                .map(|row| TableRow {
                    cells: row
                        .elements()
                        .filter(|cell| cell.is("td") || cell.is("th"))
                        .map(|cell| self.cell(cell))
                        .collect(),
                })
                .collect(),
        }
    }

    fn cell(&self, element: &Element) -> TableCell {
        let mut blocks = self.blocks(&element.children);
        if blocks.is_empty() {
            blocks.push(Block::empty_paragraph());
        }
        TableCell {
            header: element.is("th"),
            blocks,
        }
    }

    fn raw(&self, element: &Element) -> Block {
        let html = self
            .source
            .get(element.span.clone())
            .unwrap_or_default()
            .to_string();
        Block::Raw(RawBlock {
            html,
            text: element.text().trim().to_string(),
        })
    }
}

fn collect_rows<'e>(element: &'e Element, rows: &mut Vec<&'e Element>) {
    for child in element.elements() {
        match child.name.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
            _ => {}
        }
    }
}

fn text_block(element: &Element) -> TextBlock {
    let mut inlines = inline_content(&element.children);
    if inlines == [Inline::LineBreak] {
        inlines.clear();
    }
    TextBlock {
        inlines,
        align: alignment(element),
    }
}

fn list(element: &Element) -> List {
    List {
        ordered: element.is("ol"),
        items: element
            .elements()
            .filter(|child| child.is("li"))
            .map(list_item)
            .collect(),
    }
}

/// List items hold a single line; nested blocks are joined with breaks
fn list_item(element: &Element) -> ListItem {
    let mut inlines = Vec::new();
    let mut run: Vec<Node> = Vec::new();
    let push_line = |line: Vec<Inline>, inlines: &mut Vec<Inline>| {
        if line.is_empty() {
            return;
        }
        if !inlines.is_empty() {
            inlines.push(Inline::LineBreak);
        }
        inlines.extend(line);
    };

    for node in &element.children {
        match node {
            Node::Element(child) if is_block(child) => {
                push_line(inline_content(&run), &mut inlines);
                run.clear();
                let line = match child.name.as_str() {
                    "ul" | "ol" => {
                        let nested = list(child);
                        let mut line = Vec::new();
                        for (i, item) in nested.items.into_iter().enumerate() {
                            if i > 0 {
                                line.push(Inline::LineBreak);
                            }
                            line.extend(item.inlines);
                        }
                        line
                    }
                    _ => inline_content(&child.children),
                };
                push_line(line, &mut inlines);
            }
            _ => run.push(node.clone()),
        }
    }
    push_line(inline_content(&run), &mut inlines);

    if inlines == [Inline::LineBreak] {
        inlines.clear();
    }
    ListItem {
        inlines: normalize_inlines(inlines),
    }
}

fn code_text(element: &Element) -> String {
    let text = element.text();
    match text.strip_prefix('\n') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

fn media(element: &Element, align: Option<Alignment>) -> Option<Media> {
    let src = element
        .attr("src")
        .map(str::to_string)
        .or_else(|| {
            element
                .elements()
                .find(|child| child.is("source"))
                .and_then(|source| source.attr("src"))
                .map(str::to_string)
        })?;
    Some(Media {
        kind: if element.is("video") {
            MediaKind::Video
        } else {
            MediaKind::Frame
        },
        src,
        width: element.attr("width").and_then(parse_px),
        height: element.attr("height").and_then(parse_px),
        align,
    })
}

/// Inline content of a block with HTML whitespace collapsing applied
pub(crate) fn inline_content(nodes: &[Node]) -> Vec<Inline> {
    let mut inlines = normalize_inlines(inlines(nodes));
    trim_edges(&mut inlines);
    normalize_inlines(inlines)
}

fn inlines(nodes: &[Node]) -> Vec<Inline> {
    nodes.iter().flat_map(inline).collect()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn inline(node: &Node) -> Vec<Inline> {
    let element = match node {
        Node::Text(text) => return vec![Inline::Text(collapse_whitespace(text))],
        Node::Element(element) => element,
    };
    if HIDDEN.contains(&element.name.as_str()) {
        return Vec::new();
    }

    let children = || inlines(&element.children);
    match element.name.as_str() {
        "br" => vec![Inline::LineBreak],
        "img" => element
            .attr("src")
            .map(|src| vec![Inline::Image(image(element, src))])
            .unwrap_or_default(),
        "b" | "strong" => vec![Inline::styled(InlineStyle::Bold, children())],
        "i" | "em" => vec![Inline::styled(InlineStyle::Italic, children())],
        "u" | "ins" => vec![Inline::styled(InlineStyle::Underline, children())],
        "s" | "strike" | "del" => vec![Inline::styled(InlineStyle::Strike, children())],
        "a" => match element.attr("href") {
            Some(href) => vec![Inline::Link(Link {
                href: href.to_string(),
                new_tab: element.attr("target") == Some("_blank"),
                children: children(),
            })],
            None => children(),
        },
        "span" | "font" => styled_span(element, children()),
        _ => children(),
    }
}

fn image(element: &Element, src: &str) -> Image {
    let width = element
        .style("width")
        .and_then(|w| parse_px(&w))
        .or_else(|| element.attr("width").and_then(parse_px));
    let height = element
        .style("height")
        .and_then(|h| parse_px(&h))
        .or_else(|| element.attr("height").and_then(parse_px));
    Image {
        src: src.to_string(),
        width,
        height,
        rounded: element.style("border-radius").is_some(),
        shadow: element.has_class("image-shadow"),
        border: element.has_class("image-border"),
    }
}

/// Map `span`/`font` styling onto wrappers
fn styled_span(element: &Element, children: Vec<Inline>) -> Vec<Inline> {
    let mut span = SpanStyle {
        font_family: element.attr("face").map(str::to_string),
        size_class: element
            .attr("size")
            .and_then(|size| size.trim().parse::<u8>().ok())
            .filter(|size| (1..=7).contains(size)),
        font_size_px: None,
        color: element.attr("color").map(str::to_string),
        background: None,
    };
    if let Some(family) = element.style("font-family") {
        span.font_family = Some(family);
    }
    if let Some(px) = element.style("font-size").and_then(|size| parse_px(&size)) {
        span.font_size_px = Some(px);
    }
    if let Some(color) = element.style("color") {
        span.color = Some(color);
    }
    if let Some(background) = element
        .style("background-color")
        .or_else(|| element.style("background"))
    {
        span.background = Some(background);
    }

    let mut content = children;
    if let Some(decoration) = element.style("text-decoration") {
        if decoration.contains("line-through") {
            content = vec![Inline::styled(InlineStyle::Strike, content)];
        }
        if decoration.contains("underline") {
            content = vec![Inline::styled(InlineStyle::Underline, content)];
        }
    }
    if element.style("font-style").as_deref() == Some("italic") {
        content = vec![Inline::styled(InlineStyle::Italic, content)];
    }
    if let Some(weight) = element.style("font-weight") {
        let heavy = weight == "bold"
            || weight == "bolder"
            || weight.parse::<u16>().map(|w| w >= 600).unwrap_or(false);
        if heavy {
            content = vec![Inline::styled(InlineStyle::Bold, content)];
        }
    }

    if span.is_empty() {
        content
    } else {
        vec![Inline::styled(InlineStyle::Span(span), content)]
    }
}

/// Strip collapsible whitespace at the start and end of a block
fn trim_edges(inlines: &mut [Inline]) {
    trim_start(inlines);
    trim_end(inlines);
}

fn trim_start(inlines: &mut [Inline]) -> bool {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Text(text) => {
                let trimmed = text.trim_start_matches(' ').to_string();
                let done = !trimmed.is_empty();
                *text = trimmed;
                if done {
                    return true;
                }
            }
            Inline::Styled { children, .. } => {
                if trim_start(children) {
                    return true;
                }
            }
            Inline::Link(link) => {
                if trim_start(&mut link.children) {
                    return true;
                }
            }
            Inline::Image(_) | Inline::LineBreak => return true,
        }
    }
    false
}

fn trim_end(inlines: &mut [Inline]) -> bool {
    for inline in inlines.iter_mut().rev() {
        match inline {
            Inline::Text(text) => {
                let trimmed = text.trim_end_matches(' ').to_string();
                let done = !trimmed.is_empty();
                *text = trimmed;
                if done {
                    return true;
                }
            }
            Inline::Styled { children, .. } => {
                if trim_end(children) {
                    return true;
                }
            }
            Inline::Link(link) => {
                if trim_end(&mut link.children) {
                    return true;
                }
            }
            Inline::Image(_) | Inline::LineBreak => return true,
        }
    }
    false
}
