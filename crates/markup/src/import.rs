//! Document Import
//!
//! Reads `.json` document records and `.txt`/`.md`/`.html` files. Importing
//! produces a new [`Document`]; the caller's document is only replaced once
//! the import has fully succeeded.

use std::path::Path;

use tracing::{info, warn};

use prodoc_core::tree::{Block, Inline, RichTree};
use prodoc_core::{Document, ProDocError, Result};

use crate::json::DocumentRecord;

/// How an input file is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// A serialized document record
    Record,
    /// Text; blank lines separate paragraphs
    PlainText,
}

impl ImportKind {
    /// Accepted extensions
    pub const EXTENSIONS: [&'static str; 4] = ["json", "txt", "md", "html"];

    pub fn for_file(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(ImportKind::Record),
            Some("txt") | Some("md") | Some("html") => Ok(ImportKind::PlainText),
            _ => Err(ProDocError::validation(format!(
                "Unsupported file type: {} (expected .json, .txt, .md or .html)",
                file_name
            ))),
        }
    }
}

/// Title for a text import: the file name without its last extension
pub fn title_from_file_name(file_name: &str, fallback: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => fallback.to_string(),
    }
}

/// Paragraphs split on blank lines, single newlines kept as line breaks
pub fn text_to_tree(text: &str) -> RichTree {
    let text = text.replace("\r\n", "\n");
    let blocks = text
        .split("\n\n")
        .map(|para| {
            let mut inlines = Vec::new();
            for (i, line) in para.split('\n').enumerate() {
                if i > 0 {
                    inlines.push(Inline::LineBreak);
                }
                if !line.is_empty() {
                    inlines.push(Inline::text(line));
                }
            }
            Block::paragraph(inlines)
        })
        .collect();
    let mut tree = RichTree::from_blocks(blocks);
    tree.ensure_editable();
    tree
}

/// Import file contents on top of the current document
pub fn import_str(
    current: &Document,
    file_name: &str,
    contents: &str,
    fallback_title: &str,
) -> Result<Document> {
    match ImportKind::for_file(file_name)? {
        ImportKind::Record => {
            let record = DocumentRecord::parse(contents)?;
            record.validate()?;
            let document = record.merge_into(current.clone())?;
            info!("Imported document record '{}' from {}", document.title, file_name);
            Ok(document)
        }
        ImportKind::PlainText => {
            let mut document = current.clone();
            document.title = title_from_file_name(file_name, fallback_title);
            document.content = text_to_tree(contents);
            info!("Imported {} as plain text", file_name);
            Ok(document)
        }
    }
}

/// Read and import a file
pub async fn import_file(current: &Document, path: &Path, fallback_title: &str) -> Result<Document> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    // Reject by extension before touching the file system
    ImportKind::for_file(&file_name)?;

    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        warn!("Failed to read {}: {}", path.display(), e);
        ProDocError::parse(format!("Could not read {}: {}", file_name, e))
    })?;
    import_str(current, &file_name, &contents, fallback_title)
}
