//! Markdown Export
//!
//! Recursive visitor over the content tree. Headings 1-3, emphasis, lists,
//! quotes, links, images and code blocks have Markdown forms; everything
//! else contributes only its text.

use prodoc_core::tree::{Block, Inline, InlineStyle, List, RichTree, Table};

/// Render a content tree as Markdown
pub fn to_markdown(tree: &RichTree) -> String {
    let mut out = String::new();
    blocks(&tree.blocks, &mut out);
    out
}

fn blocks(blocks: &[Block], out: &mut String) {
    for block in blocks {
        self::block(block, out);
    }
}

fn block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, body } => {
            if *level <= 3 {
                out.push_str(&"#".repeat(*level as usize));
                out.push(' ');
            }
            out.push_str(&inlines(&body.inlines));
            out.push_str("\n\n");
        }
        Block::Paragraph(body) => {
            out.push_str(&inlines(&body.inlines));
            out.push_str("\n\n");
        }
        Block::List(list) => self::list(list, out),
        Block::Blockquote(children) => {
            let mut inner = String::new();
            self::blocks(children, &mut inner);
            for line in inner.trim_end_matches('\n').lines() {
                if line.is_empty() {
                    out.push_str(">\n");
                } else {
                    out.push_str("> ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        Block::Table(table) => self::table(table, out),
        Block::Code(code) => {
            out.push_str("```\n");
            out.push_str(code);
            out.push_str("\n```\n\n");
        }
        Block::Media(_) => {}
        Block::Raw(raw) => {
            if !raw.text.is_empty() {
                out.push_str(&raw.text);
                out.push_str("\n\n");
            }
        }
    }
}

fn list(list: &List, out: &mut String) {
    for (i, item) in list.items.iter().enumerate() {
        if list.ordered {
            out.push_str(&format!("{}. ", i + 1));
        } else {
            out.push_str("- ");
        }
        out.push_str(&inlines(&item.inlines));
        out.push('\n');
    }
    out.push('\n');
}

/// Pipe table; the first row is the header
fn table(table: &Table, out: &mut String) {
    let Some(width) = table.rows.iter().map(|row| row.cells.len()).max() else {
        return;
    };
    if width == 0 {
        return;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let mut cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| {
                let mut text = String::new();
                for block in &cell.blocks {
                    if let Some(body) = block.text_block() {
                        if !text.is_empty() {
                            text.push(' ');
                        }
                        text.push_str(&inlines(&body.inlines));
                    }
                }
                text.replace('\n', " ").replace('|', "\\|").trim().to_string()
            })
            .collect();
        cells.resize(width, String::new());
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
        if r == 0 {
            out.push_str(&format!("|{}\n", " --- |".repeat(width)));
        }
    }
    out.push('\n');
}

fn inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        self::inline(inline, &mut out);
    }
    out
}

fn inline(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) => out.push_str(text),
        Inline::LineBreak => out.push('\n'),
        Inline::Image(image) => out.push_str(&format!("![Image]({})", image.src)),
        Inline::Link(link) => {
            out.push_str(&format!("[{}]({})", inlines(&link.children), link.href));
        }
        Inline::Styled { style, children } => match style {
            InlineStyle::Bold => out.push_str(&format!("**{}**", inlines(children))),
            InlineStyle::Italic => out.push_str(&format!("*{}*", inlines(children))),
            _ => out.push_str(&inlines(children)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    fn md(html: &str) -> String {
        to_markdown(&parse_html(html).unwrap())
    }

    #[test]
    fn test_heading_and_bold() {
        assert_eq!(
            md("<h2>Title</h2><p><strong>Bold</strong> text</p>"),
            "## Title\n\n**Bold** text\n\n"
        );
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(md("<h1>a</h1><h3>c</h3><h5>e</h5>"), "# a\n\n### c\n\ne\n\n");
    }

    #[test]
    fn test_lists_restart_numbering() {
        assert_eq!(
            md("<ol><li>a</li><li>b</li></ol><ul><li><em>x</em></li></ul><ol><li>c</li></ol>"),
            "1. a\n2. b\n\n- *x*\n\n1. c\n\n"
        );
    }

    #[test]
    fn test_blockquote_lines() {
        assert_eq!(
            md("<blockquote><p>one</p><p>two</p></blockquote>"),
            "> one\n>\n> two\n\n"
        );
    }

    #[test]
    fn test_links_images_breaks() {
        assert_eq!(
            md("<p><a href=\"https://example.com\">site</a><br><img src=\"a.png\"></p>"),
            "[site](https://example.com)\n![Image](a.png)\n\n"
        );
    }

    #[test]
    fn test_code_and_other_markup() {
        assert_eq!(
            md("<pre><code>let x = 1;</code></pre><p><u>under</u> <span style=\"color: red\">red</span></p>"),
            "```\nlet x = 1;\n```\n\nunder red\n\n"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            md("<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>x|y</td></tr></table>"),
            "| A | B |\n| --- | --- |\n| 1 | x\\|y |\n\n"
        );
    }
}
