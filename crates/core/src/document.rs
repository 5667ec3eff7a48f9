//! Document entity
//!
//! The authoritative in-memory document: title, content tree, timestamps,
//! version and metadata, plus the statistics and outline derived from it.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::text::plain_text;
use crate::tree::{inlines_text, Block, BlockPath, RichTree};

/// Document format version written by this engine
pub const DOCUMENT_VERSION: &str = "1.0.0";

/// Words per minute used for the reading-time estimate
const READING_WPM: usize = 200;

/// Derived document statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub word_count: usize,
    pub char_count: usize,
    pub para_count: usize,
    pub reading_minutes: usize,
}

impl DocumentStats {
    /// Compute statistics for a content tree
    pub fn of(tree: &RichTree) -> Self {
        let text = plain_text(tree);
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();

        let mut para_count = 0;
        tree.walk(&mut |block, _| match block {
            Block::Paragraph(_) | Block::Heading { .. } | Block::Blockquote(_) => para_count += 1,
            Block::List(list) => para_count += list.items.len(),
            _ => {}
        });

        Self {
            word_count,
            char_count,
            para_count: para_count.max(1),
            reading_minutes: word_count.div_ceil(READING_WPM).max(1),
        }
    }
}

/// One heading in the document outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    /// Leaf path of the heading, for scrolling to it
    pub path: BlockPath,
}

/// Headings of level 1-3 with visible text, in document order
pub fn outline(tree: &RichTree) -> Vec<OutlineEntry> {
    tree.leaf_paths()
        .into_iter()
        .filter_map(|path| {
            let loc = tree.locate(&path)?;
            if loc.list_item.is_some() {
                return None;
            }
            match tree.blocks_at(&loc.container)?.get(loc.index)? {
                Block::Heading { level, body } if *level <= 3 => {
                    let text = inlines_text(&body.inlines);
                    if text.trim().is_empty() {
                        return None;
                    }
                    Some(OutlineEntry {
                        level: *level,
                        text,
                        path,
                    })
                }
                _ => None,
            }
        })
        .collect()
}

/// The document entity
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub content: RichTree,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub version: String,
    pub metadata: IndexMap<String, Value>,
}

impl Document {
    /// Create a blank document
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut content = RichTree::new();
        content.ensure_editable();
        Self {
            title: title.into(),
            content,
            created: now,
            modified: now,
            version: DOCUMENT_VERSION.to_string(),
            metadata: IndexMap::new(),
        }
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::of(&self.content)
    }

    pub fn outline(&self) -> Vec<OutlineEntry> {
        outline(&self.content)
    }

    pub fn plain_text(&self) -> String {
        plain_text(&self.content)
    }

    /// Recompute the derived fields written on every save
    pub fn refresh_derived(&mut self, now: DateTime<Utc>) -> DocumentStats {
        let stats = self.stats();
        self.modified = now;
        self.metadata.insert("wordCount".into(), Value::from(stats.word_count));
        self.metadata.insert("charCount".into(), Value::from(stats.char_count));
        self.metadata.insert("paraCount".into(), Value::from(stats.para_count));
        stats
    }
}
