//! HTML Writer
//!
//! Serializes a [`RichTree`] back into editor markup with quick-xml. The
//! output is what the editing surface itself produces: inline styles for
//! tables, code blocks, images and embeds.

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use prodoc_core::tree::{
    Alignment, Block, Image, Inline, InlineStyle, List, Media, MediaKind, RichTree, SpanStyle,
    Table, TextBlock,
};
use prodoc_core::{ProDocError, Result};

pub const TABLE_STYLE: &str = "width: 100%; border-collapse: collapse;";
pub const CELL_STYLE: &str = "border: 1px solid #dee2e6; padding: 8px; min-width: 50px;";
pub const HEADER_CELL_STYLE: &str = "border: 1px solid #dee2e6; padding: 8px; min-width: 50px; background-color: #f8f9fa; font-weight: 600; text-align: center;";
pub const CODE_STYLE: &str = "background: var(--bg-tertiary); padding: 16px; border-radius: var(--radius); overflow: auto; margin: 16px 0;";
pub const FRAME_STYLE: &str = "border:none; border-radius: var(--radius);";
pub const VIDEO_STYLE: &str = "border-radius: var(--radius);";

/// Serialize a content tree to markup
pub fn to_html(tree: &RichTree) -> Result<String> {
    let mut out = HtmlWriter::new();
    out.blocks(&tree.blocks)?;
    out.finish()
}

/// Serialize an inline sequence to markup
pub fn inlines_to_html(inlines: &[Inline]) -> Result<String> {
    let mut out = HtmlWriter::new();
    out.inlines(inlines)?;
    out.finish()
}

fn markup_error(e: quick_xml::Error) -> ProDocError {
    ProDocError::Markup(e.to_string())
}

/// `style` attribute of an aligned block
fn align_style(align: Option<Alignment>) -> Option<String> {
    align.map(|align| format!("text-align: {};", align.as_css()))
}

/// Inline style of an image element
pub fn image_style(image: &Image) -> String {
    let mut style = String::from("max-width: 100%;");
    if let Some(width) = image.width {
        style.push_str(&format!(" width: {}px;", width));
    }
    match image.height {
        Some(height) => style.push_str(&format!(" height: {}px;", height)),
        None => style.push_str(" height: auto;"),
    }
    if image.rounded {
        style.push_str(" border-radius: var(--radius-lg);");
    }
    style
}

fn span_style(span: &SpanStyle) -> String {
    let mut decls = Vec::new();
    if let Some(family) = &span.font_family {
        decls.push(format!("font-family: {};", family));
    }
    if let Some(px) = span.font_size_px {
        decls.push(format!("font-size: {}px;", px));
    }
    if let Some(color) = &span.color {
        decls.push(format!("color: {};", color));
    }
    if let Some(background) = &span.background {
        decls.push(format!("background-color: {};", background));
    }
    decls.join(" ")
}

struct HtmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    fn finish(self) -> Result<String> {
        let bytes = self.writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| ProDocError::Markup(e.to_string()))
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(markup_error)
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(tag);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.write(Event::Start(elem))
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(tag)))
    }

    fn void(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(tag);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.write(Event::Empty(elem))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.write(Event::Text(BytesText::new(text)))
    }

    fn blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.block(block)?;
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(body) => self.text_block("p", body),
            Block::Heading { level, body } => self.text_block(&format!("h{}", level), body),
            Block::List(list) => self.list(list),
            Block::Blockquote(children) => {
                self.open("blockquote", &[])?;
                self.blocks(children)?;
                self.close("blockquote")
            }
            Block::Table(table) => self.table(table),
            Block::Code(code) => {
                self.open("pre", &[("style", CODE_STYLE)])?;
                self.open("code", &[])?;
                self.text(code)?;
                self.close("code")?;
                self.close("pre")
            }
            Block::Media(media) => self.media(media),
            Block::Raw(raw) => self.write(Event::Text(BytesText::from_escaped(raw.html.as_str()))),
        }
    }

    fn text_block(&mut self, tag: &str, body: &TextBlock) -> Result<()> {
        match align_style(body.align) {
            Some(style) => self.open(tag, &[("style", style.as_str())])?,
            None => self.open(tag, &[])?,
        }
        self.line(&body.inlines)?;
        self.close(tag)
    }

    /// Inline content of an editable line; empty lines hold a break
    fn line(&mut self, inlines: &[Inline]) -> Result<()> {
        if inlines.is_empty() {
            self.void("br", &[])
        } else {
            self.inlines(inlines)
        }
    }

    fn list(&mut self, list: &List) -> Result<()> {
        let tag = if list.ordered { "ol" } else { "ul" };
        self.open(tag, &[])?;
        for item in &list.items {
            self.open("li", &[])?;
            self.line(&item.inlines)?;
            self.close("li")?;
        }
        self.close(tag)
    }

    fn table(&mut self, table: &Table) -> Result<()> {
        self.open("table", &[("style", TABLE_STYLE)])?;
        self.open("tbody", &[])?;
        for row in &table.rows {
            self.open("tr", &[])?;
            for cell in &row.cells {
                let (tag, style) = if cell.header {
                    ("th", HEADER_CELL_STYLE)
                } else {
                    ("td", CELL_STYLE)
                };
                self.open(tag, &[("style", style)])?;
                self.blocks(&cell.blocks)?;
                self.close(tag)?;
            }
            self.close("tr")?;
        }
        self.close("tbody")?;
        self.close("table")
    }

    fn media(&mut self, media: &Media) -> Result<()> {
        match align_style(media.align) {
            Some(style) => self.open("p", &[("style", style.as_str())])?,
            None => self.open("p", &[])?,
        }

        let width = media.width.map(|w| w.to_string());
        let height = media.height.map(|h| h.to_string());
        let mut attrs: Vec<(&str, &str)> = Vec::new();
        if let Some(width) = &width {
            attrs.push(("width", width.as_str()));
        }
        if let Some(height) = &height {
            attrs.push(("height", height.as_str()));
        }
        attrs.push(("src", media.src.as_str()));

        let tag = match media.kind {
            MediaKind::Frame => {
                attrs.push(("style", FRAME_STYLE));
                attrs.push(("allowfullscreen", ""));
                "iframe"
            }
            MediaKind::Video => {
                attrs.push(("controls", ""));
                attrs.push(("style", VIDEO_STYLE));
                "video"
            }
        };
        self.open(tag, &attrs)?;
        self.close(tag)?;
        self.close("p")
    }

    fn inlines(&mut self, inlines: &[Inline]) -> Result<()> {
        for inline in inlines {
            self.inline(inline)?;
        }
        Ok(())
    }

    fn inline(&mut self, inline: &Inline) -> Result<()> {
        match inline {
            Inline::Text(text) => self.text(text),
            Inline::LineBreak => self.void("br", &[]),
            Inline::Image(image) => {
                let style = image_style(image);
                let mut classes = Vec::new();
                if image.shadow {
                    classes.push("image-shadow");
                }
                if image.border {
                    classes.push("image-border");
                }
                let class = classes.join(" ");
                let mut attrs = vec![("src", image.src.as_str()), ("style", style.as_str())];
                if !class.is_empty() {
                    attrs.push(("class", class.as_str()));
                }
                self.void("img", &attrs)
            }
            Inline::Link(link) => {
                let mut attrs = vec![("href", link.href.as_str())];
                if link.new_tab {
                    attrs.push(("target", "_blank"));
                }
                self.open("a", &attrs)?;
                self.inlines(&link.children)?;
                self.close("a")
            }
            Inline::Styled { style, children } => {
                let (tag, size, css) = match style {
                    InlineStyle::Bold => ("b", None, String::new()),
                    InlineStyle::Italic => ("i", None, String::new()),
                    InlineStyle::Underline => ("u", None, String::new()),
                    InlineStyle::Strike => ("strike", None, String::new()),
                    InlineStyle::Span(span) => {
                        let size = span.size_class.map(|class| class.to_string());
                        let tag = if size.is_some() { "font" } else { "span" };
                        (tag, size, span_style(span))
                    }
                };
                let mut attrs: Vec<(&str, &str)> = Vec::new();
                if let Some(size) = &size {
                    attrs.push(("size", size.as_str()));
                }
                if !css.is_empty() {
                    attrs.push(("style", css.as_str()));
                }
                self.open(tag, &attrs)?;
                self.inlines(children)?;
                self.close(tag)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use prodoc_core::tree::{Link, ListItem, RawBlock, TableCell, TableRow};

    #[test]
    fn test_paragraphs() {
        let tree = RichTree::from_blocks(vec![
            Block::heading(2, vec![Inline::text("Title")]),
            Block::Paragraph(TextBlock::aligned(
                vec![Inline::bold(vec![Inline::text("a < b")]), Inline::text(" & c")],
                Alignment::Center,
            )),
            Block::empty_paragraph(),
        ]);
        assert_eq!(
            to_html(&tree).unwrap(),
            "<h2>Title</h2><p style=\"text-align: center;\"><b>a &lt; b</b> &amp; c</p><p><br/></p>"
        );
    }

    #[test]
    fn test_list_and_link() {
        let tree = RichTree::from_blocks(vec![Block::List(List {
            ordered: true,
            items: vec![ListItem {
                inlines: vec![Inline::Link(Link {
                    href: "https://example.com".into(),
                    new_tab: true,
                    children: vec![Inline::text("x")],
                })],
            }],
        })]);
        assert_eq!(
            to_html(&tree).unwrap(),
            "<ol><li><a href=\"https://example.com\" target=\"_blank\">x</a></li></ol>"
        );
    }

    #[test]
    fn test_table_styles() {
        let tree = RichTree::from_blocks(vec![Block::Table(Table {
            rows: vec![TableRow {
                cells: vec![TableCell {
                    header: true,
                    blocks: vec![Block::empty_paragraph()],
                }],
            }],
        })]);
        let html = to_html(&tree).unwrap();
        assert!(html.starts_with("<table style=\"width: 100%; border-collapse: collapse;\"><tbody><tr><th style="));
        assert!(html.contains("background-color: #f8f9fa"));
        assert!(html.ends_with("<p><br/></p></th></tr></tbody></table>"));
    }

    #[test]
    fn test_font_size_markers() {
        let inlines = vec![
            Inline::styled(
                InlineStyle::Span(SpanStyle {
                    size_class: Some(3),
                    ..SpanStyle::default()
                }),
                vec![Inline::text("a")],
            ),
            Inline::styled(
                InlineStyle::Span(SpanStyle {
                    font_size_px: Some(18),
                    color: Some("#ff0000".into()),
                    ..SpanStyle::default()
                }),
                vec![Inline::text("b")],
            ),
        ];
        assert_eq!(
            inlines_to_html(&inlines).unwrap(),
            "<font size=\"3\">a</font><span style=\"font-size: 18px; color: #ff0000;\">b</span>"
        );
    }

    #[test]
    fn test_image_markup() {
        let image = Image {
            src: "a.png".into(),
            width: Some(400),
            height: None,
            rounded: true,
            shadow: true,
            border: true,
        };
        assert_eq!(
            inlines_to_html(&[Inline::Image(image)]).unwrap(),
            "<img src=\"a.png\" style=\"max-width: 100%; width: 400px; height: auto; border-radius: var(--radius-lg);\" class=\"image-shadow image-border\"/>"
        );
    }

    #[test]
    fn test_raw_block_verbatim() {
        let tree = RichTree::from_blocks(vec![Block::Raw(RawBlock {
            html: "<div class=\"note\">x &amp; y</div>".into(),
            text: "x & y".into(),
        })]);
        assert_eq!(to_html(&tree).unwrap(), "<div class=\"note\">x &amp; y</div>");
    }

    #[test]
    fn test_markup_reads_back() {
        let source = "<h1>Doc</h1><blockquote><p>q</p></blockquote><p style=\"text-align: center;\"><iframe width=\"560\" height=\"315\" src=\"https://www.youtube.com/embed/x\" style=\"border:none; border-radius: var(--radius);\" allowfullscreen=\"\"></iframe></p><pre><code>let x = 1;</code></pre>";
        let tree = parse_html(source).unwrap();
        let written = to_html(&tree).unwrap();
        assert_eq!(parse_html(&written).unwrap(), tree);
    }
}
