//! Structured Document Model
//!
//! Word-processor view of a document: a flat list of styled paragraphs made
//! of formatted runs. Each top-level block becomes one paragraph; nested
//! content (list items, table rows, quoted lines) is joined with breaks.

use prodoc_core::tree::{Alignment, Block, Inline, InlineStyle, RichTree, TextBlock};

/// Paragraph style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Title,
    Normal,
    Heading(u8),
    Quote,
    Code,
}

impl ParagraphStyle {
    /// Word style identifier
    pub fn style_id(&self) -> Option<String> {
        match self {
            ParagraphStyle::Title => Some("Title".to_string()),
            ParagraphStyle::Normal => None,
            ParagraphStyle::Heading(level) => Some(format!("Heading{}", level)),
            ParagraphStyle::Quote => Some("IntenseQuote".to_string()),
            ParagraphStyle::Code => Some("Code".to_string()),
        }
    }
}

/// Run of uniformly formatted text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Line break emitted before the text
    pub break_before: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredParagraph {
    pub style: ParagraphStyle,
    /// Explicit alignment; left is the default and never stored
    pub alignment: Option<Alignment>,
    pub runs: Vec<Run>,
}

impl StructuredParagraph {
    pub fn new(style: ParagraphStyle, runs: Vec<Run>) -> Self {
        Self {
            style,
            alignment: None,
            runs,
        }
    }

    /// Concatenated run text, breaks as newlines
    pub fn text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            if run.break_before {
                out.push('\n');
            }
            out.push_str(&run.text);
        }
        out
    }
}

/// A document ready for a word-processor assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredDocument {
    pub title: String,
    pub paragraphs: Vec<StructuredParagraph>,
}

impl StructuredDocument {
    /// Title paragraph, an empty spacer, then one paragraph per block
    pub fn build(title: &str, tree: &RichTree) -> Self {
        let mut paragraphs = vec![
            StructuredParagraph::new(ParagraphStyle::Title, vec![Run::plain(title)]),
            StructuredParagraph::new(ParagraphStyle::Normal, Vec::new()),
        ];
        paragraphs.extend(tree.blocks.iter().filter_map(paragraph));
        Self {
            title: title.to_string(),
            paragraphs,
        }
    }
}

/// Inherited character formatting
#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
}

impl Flags {
    fn with(mut self, style: &InlineStyle) -> Self {
        match style {
            InlineStyle::Bold => self.bold = true,
            InlineStyle::Italic => self.italic = true,
            InlineStyle::Underline => self.underline = true,
            InlineStyle::Strike => self.strike = true,
            InlineStyle::Span(_) => {}
        }
        self
    }
}

/// Collects runs, turning line breaks into the next run's break flag
#[derive(Default)]
struct RunBuilder {
    runs: Vec<Run>,
    pending_break: bool,
}

impl RunBuilder {
    fn push_text(&mut self, text: &str, flags: Flags) {
        if text.is_empty() {
            return;
        }
        self.runs.push(Run {
            text: text.to_string(),
            bold: flags.bold,
            italic: flags.italic,
            underline: flags.underline,
            strike: flags.strike,
            break_before: std::mem::take(&mut self.pending_break),
        });
    }

    fn line_break(&mut self) {
        if self.pending_break {
            self.runs.push(Run {
                break_before: true,
                ..Run::default()
            });
        }
        self.pending_break = true;
    }

    /// Start a new line unless nothing has been written yet
    fn new_line(&mut self) {
        if !self.runs.is_empty() || self.pending_break {
            self.line_break();
        }
    }

    fn inlines(&mut self, inlines: &[Inline], flags: Flags) {
        for inline in inlines {
            match inline {
                Inline::Text(text) => self.push_text(text, flags),
                Inline::LineBreak => self.line_break(),
                Inline::Image(_) => {}
                Inline::Link(link) => self.inlines(&link.children, flags),
                Inline::Styled { style, children } => self.inlines(children, flags.with(style)),
            }
        }
    }

    fn blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            match block {
                Block::Paragraph(body) | Block::Heading { body, .. } => {
                    self.new_line();
                    self.inlines(&body.inlines, Flags::default());
                }
                Block::List(list) => {
                    for item in &list.items {
                        self.new_line();
                        self.inlines(&item.inlines, Flags::default());
                    }
                }
                Block::Blockquote(children) => self.blocks(children),
                Block::Table(table) => {
                    for row in &table.rows {
                        self.new_line();
                        for (c, cell) in row.cells.iter().enumerate() {
                            if c > 0 {
                                self.push_text("\t", Flags::default());
                            }
                            let mut nested = RunBuilder::default();
                            nested.blocks(&cell.blocks);
                            let text = StructuredParagraph::new(ParagraphStyle::Normal, nested.finish())
                                .text()
                                .replace('\n', " ");
                            self.push_text(text.trim(), Flags::default());
                        }
                    }
                }
                Block::Code(code) => {
                    self.new_line();
                    self.code(code);
                }
                Block::Media(_) => {}
                Block::Raw(raw) => {
                    self.new_line();
                    self.push_text(&raw.text, Flags::default());
                }
            }
        }
    }

    fn code(&mut self, code: &str) {
        for (i, line) in code.split('\n').enumerate() {
            if i > 0 {
                self.line_break();
            }
            self.push_text(line, Flags::default());
        }
    }

    fn finish(mut self) -> Vec<Run> {
        if self.pending_break && !self.runs.is_empty() {
            self.runs.push(Run {
                break_before: true,
                ..Run::default()
            });
        }
        self.runs
    }
}

fn text_paragraph(style: ParagraphStyle, body: &TextBlock) -> StructuredParagraph {
    let mut builder = RunBuilder::default();
    builder.inlines(&body.inlines, Flags::default());
    StructuredParagraph {
        style,
        alignment: body.align.filter(|align| *align != Alignment::Left),
        runs: builder.finish(),
    }
}

fn paragraph(block: &Block) -> Option<StructuredParagraph> {
    match block {
        // Empty paragraphs and headings are the empty-line marker
        Block::Paragraph(body) => Some(text_paragraph(ParagraphStyle::Normal, body)),
        Block::Heading { level, body } => Some(text_paragraph(ParagraphStyle::Heading(*level), body)),
        Block::Blockquote(children) => {
            let mut builder = RunBuilder::default();
            builder.blocks(children);
            let runs = builder.finish();
            let alignment = match children.as_slice() {
                [only] => only.text_block().and_then(|body| body.align),
                _ => None,
            };
            non_empty(StructuredParagraph {
                style: ParagraphStyle::Quote,
                alignment: alignment.filter(|align| *align != Alignment::Left),
                runs,
            })
        }
        Block::Code(code) => {
            let mut builder = RunBuilder::default();
            builder.code(code);
            non_empty(StructuredParagraph::new(ParagraphStyle::Code, builder.finish()))
        }
        Block::List(_) | Block::Table(_) | Block::Raw(_) => {
            let mut builder = RunBuilder::default();
            builder.blocks(std::slice::from_ref(block));
            non_empty(StructuredParagraph::new(ParagraphStyle::Normal, builder.finish()))
        }
        Block::Media(_) => None,
    }
}

fn non_empty(paragraph: StructuredParagraph) -> Option<StructuredParagraph> {
    if paragraph.runs.is_empty() {
        None
    } else {
        Some(paragraph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    fn build(html: &str) -> StructuredDocument {
        StructuredDocument::build("Report", &parse_html(html).unwrap())
    }

    #[test]
    fn test_title_and_spacer() {
        let doc = build("<p>body</p>");
        assert_eq!(doc.paragraphs.len(), 3);
        assert_eq!(doc.paragraphs[0].style, ParagraphStyle::Title);
        assert_eq!(doc.paragraphs[0].text(), "Report");
        assert!(doc.paragraphs[1].runs.is_empty());
        assert_eq!(doc.paragraphs[2].text(), "body");
    }

    #[test]
    fn test_inherited_formatting() {
        let doc = build("<p><b>bold <i>both</i></b> <u>under</u></p>");
        let runs = &doc.paragraphs[2].runs;
        assert_eq!(runs.len(), 4);
        assert!(runs[0].bold && !runs[0].italic);
        assert!(runs[1].bold && runs[1].italic);
        assert_eq!(runs[1].text, "both");
        assert!(!runs[2].bold);
        assert!(runs[3].underline);
    }

    #[test]
    fn test_styles_and_alignment() {
        let doc = build(
            "<h1>One</h1><h3 style=\"text-align: right\">Three</h3><blockquote><p style=\"text-align: justify\">q</p></blockquote><p style=\"text-align: center\">c</p>",
        );
        let body = &doc.paragraphs[2..];
        assert_eq!(body[0].style, ParagraphStyle::Heading(1));
        assert_eq!(body[1].style, ParagraphStyle::Heading(3));
        assert_eq!(body[1].alignment, Some(Alignment::Right));
        assert_eq!(body[2].style, ParagraphStyle::Quote);
        assert_eq!(body[2].alignment, Some(Alignment::Justify));
        assert_eq!(body[3].alignment, Some(Alignment::Center));
    }

    #[test]
    fn test_empty_line_kept_media_dropped() {
        let doc = build("<p><br></p><p style=\"text-align: center;\"><video src=\"a.mp4\" controls></video></p>");
        assert_eq!(doc.paragraphs.len(), 3);
        assert!(doc.paragraphs[2].runs.is_empty());
    }

    #[test]
    fn test_breaks_and_lists() {
        let doc = build("<p>a<br>b</p><ul><li>x</li><li>y</li></ul>");
        assert_eq!(doc.paragraphs[2].text(), "a\nb");
        assert!(doc.paragraphs[2].runs[1].break_before);
        assert_eq!(doc.paragraphs[3].text(), "x\ny");
    }

    #[test]
    fn test_table_rows() {
        let doc = build("<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>");
        assert_eq!(doc.paragraphs[2].text(), "A\tB\n1\t2");
    }

    #[test]
    fn test_style_ids() {
        assert_eq!(ParagraphStyle::Quote.style_id().as_deref(), Some("IntenseQuote"));
        assert_eq!(ParagraphStyle::Heading(2).style_id().as_deref(), Some("Heading2"));
        assert_eq!(ParagraphStyle::Normal.style_id(), None);
    }
}
