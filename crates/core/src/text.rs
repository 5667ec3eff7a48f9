//! Plain-text flattening of the rich tree

use crate::tree::{inlines_text, Block, RichTree};

/// Visible text of the whole tree, one line per block
pub fn plain_text(tree: &RichTree) -> String {
    let mut lines = Vec::new();
    push_blocks(&tree.blocks, &mut lines);
    lines.join("\n")
}

fn push_blocks(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(body) | Block::Heading { body, .. } => {
                lines.push(inlines_text(&body.inlines));
            }
            Block::List(list) => {
                lines.extend(list.items.iter().map(|item| inlines_text(&item.inlines)));
            }
            Block::Blockquote(children) => push_blocks(children, lines),
            Block::Table(table) => {
                for row in &table.rows {
                    let cells: Vec<String> = row
                        .cells
                        .iter()
                        .map(|cell| {
                            let mut cell_lines = Vec::new();
                            push_blocks(&cell.blocks, &mut cell_lines);
                            cell_lines.join(" ").trim().to_string()
                        })
                        .collect();
                    lines.push(cells.join("\t"));
                }
            }
            Block::Code(code) => lines.push(code.clone()),
            Block::Media(_) => {}
            Block::Raw(raw) => lines.push(raw.text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Inline, List, ListItem};

    #[test]
    fn test_plain_text() {
        let tree = RichTree::from_blocks(vec![
            Block::heading(2, vec![Inline::text("Title")]),
            Block::paragraph(vec![
                Inline::bold(vec![Inline::text("Bold")]),
                Inline::text(" text"),
                Inline::LineBreak,
                Inline::text("next"),
            ]),
            Block::List(List {
                ordered: true,
                items: vec![
                    ListItem { inlines: vec![Inline::text("a")] },
                    ListItem { inlines: vec![Inline::text("b")] },
                ],
            }),
        ]);
        assert_eq!(plain_text(&tree), "Title\nBold text\nnext\na\nb");
    }
}
