//! ProDoc Markup
//! 
//! Translators between the document tree and external formats:
//! - Editor markup (HTML) reading and writing
//! - Markdown, plain text and JSON document records
//! - Structured word-processing documents and the `.docx` package
//! - PDF export through a rasterizer and page assembler
//! - File import

pub mod docx;
pub mod dom;
pub mod export;
pub mod html;
pub mod import;
pub mod json;
pub mod markdown;
pub mod pdf;
pub mod structured;
pub mod writer;

pub use docx::{DocumentAssembler, DocxAssembler};
pub use export::{ExportArtifact, ExportFormat, Exporter};
pub use html::parse_html;
pub use import::{import_file, import_str, ImportKind};
pub use json::DocumentRecord;
pub use markdown::to_markdown;
pub use pdf::{CapturedPage, PageLayout, PdfAssembler, PdfExporter, Rasterizer};
pub use structured::StructuredDocument;
pub use writer::to_html;
