//! JSON Document Record
//!
//! Wire form of a [`Document`]: the content travels as editor markup and
//! timestamps as epoch milliseconds. Used for persistence, JSON export and
//! JSON import.

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use prodoc_core::{Document, ProDocError, Result};

use crate::html::parse_html;
use crate::writer::to_html;

/// Serialized document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(default)]
    pub title: String,
    /// Content markup
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, alias = "modifiedAt", skip_serializing_if = "Option::is_none")]
    pub modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String, Value>>,
}

/// JSON export envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportEnvelope {
    #[serde(flatten)]
    record: DocumentRecord,
    plain_text: String,
    exported_at: i64,
    export_format: &'static str,
}

fn from_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

impl DocumentRecord {
    /// Snapshot a document
    pub fn from_document(document: &Document) -> Result<Self> {
        Ok(Self {
            title: document.title.clone(),
            content: to_html(&document.content)?,
            created: Some(document.created.timestamp_millis()),
            modified: Some(document.modified.timestamp_millis()),
            version: Some(document.version.clone()),
            metadata: Some(document.metadata.clone()),
        })
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Imported records must carry a title and content
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(ProDocError::validation("Invalid document: missing title"));
        }
        if self.content.is_empty() {
            return Err(ProDocError::validation("Invalid document: missing content"));
        }
        Ok(())
    }

    /// Overlay the record on an existing document; fields present in the
    /// record win
    pub fn merge_into(self, mut document: Document) -> Result<Document> {
        document.content = parse_html(&self.content)?;
        if !self.title.is_empty() {
            document.title = self.title;
        }
        if let Some(created) = from_millis(self.created) {
            document.created = created;
        }
        if let Some(modified) = from_millis(self.modified) {
            document.modified = modified;
        }
        if let Some(version) = self.version {
            document.version = version;
        }
        if let Some(metadata) = self.metadata {
            document.metadata = metadata;
        }
        Ok(document)
    }

    /// Rebuild a document, filling gaps with defaults
    pub fn into_document(self, default_title: &str) -> Result<Document> {
        self.merge_into(Document::new(default_title))
    }
}

/// Pretty-printed JSON export payload
pub fn export_json(document: &Document, title: &str, exported_at: DateTime<Utc>) -> Result<String> {
    let mut record = DocumentRecord::from_document(document)?;
    record.title = title.to_string();
    let envelope = ExportEnvelope {
        record,
        plain_text: document.plain_text(),
        exported_at: exported_at.timestamp_millis(),
        export_format: "json",
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    debug!("Serialized JSON export ({} bytes)", json.len());
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodoc_core::document::DOCUMENT_VERSION;
    use prodoc_core::tree::{Block, Inline, RichTree};

    fn document() -> Document {
        let mut doc = Document::new("Notes");
        doc.content = RichTree::from_blocks(vec![
            Block::heading(1, vec![Inline::text("Hello")]),
            Block::paragraph(vec![Inline::text("world")]),
        ]);
        doc.refresh_derived(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        doc
    }

    #[test]
    fn test_record_round_trip() {
        let doc = document();
        let json = DocumentRecord::from_document(&doc).unwrap().to_json().unwrap();
        let restored = DocumentRecord::parse(&json).unwrap().into_document("Untitled").unwrap();
        assert_eq!(restored.title, "Notes");
        assert_eq!(restored.content, doc.content);
        assert_eq!(restored.modified.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(restored.metadata["wordCount"], Value::from(2));
    }

    #[test]
    fn test_aliases_and_defaults() {
        let record = DocumentRecord::parse(
            r#"{"title":"T","content":"<p>x</p>","createdAt":1000,"extra":true}"#,
        )
        .unwrap();
        assert_eq!(record.created, Some(1000));
        let doc = record.into_document("Untitled").unwrap();
        assert_eq!(doc.created.timestamp_millis(), 1000);
        assert_eq!(doc.version, DOCUMENT_VERSION);
    }

    #[test]
    fn test_validate() {
        let missing = DocumentRecord::parse(r#"{"title":"T"}"#).unwrap();
        assert!(matches!(missing.validate(), Err(ProDocError::Validation(_))));
        let empty = DocumentRecord::parse(r#"{"title":"","content":"<p>x</p>"}"#).unwrap();
        assert!(empty.validate().is_err());
        let spaces = DocumentRecord::parse(r#"{"title":" ","content":" "}"#).unwrap();
        assert!(spaces.validate().is_ok());
        let ok = DocumentRecord::parse(r#"{"title":"T","content":"<p>x</p>"}"#).unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_export_envelope() {
        let doc = document();
        let at = Utc.timestamp_millis_opt(1_700_000_100_000).unwrap();
        let json = export_json(&doc, "Exported", at).unwrap();
        assert!(json.starts_with("{\n  \"title\": \"Exported\",\n  \"content\": \"<h1>Hello</h1><p>world</p>\""));

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["plainText"], "Hello\nworld");
        assert_eq!(value["exportedAt"], 1_700_000_100_000_i64);
        assert_eq!(value["exportFormat"], "json");
        assert_eq!(value["metadata"]["paraCount"], 2);
        assert_eq!(value["version"], "1.0.0");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = DocumentRecord::parse("{not json").unwrap_err();
        assert_eq!(err.kind(), prodoc_core::error::ErrorKind::Parse);
    }
}
