//! Export Artifacts
//!
//! Produces a downloadable payload for each export format from the
//! current document.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use tracing::{info, warn};

use prodoc_core::config::ExportConfig;
use prodoc_core::text::plain_text;
use prodoc_core::{Document, ProDocError, Result, ViewScale};

use crate::docx::{DocumentAssembler, DocxAssembler};
use crate::json::export_json;
use crate::markdown::to_markdown;
use crate::pdf::PdfExporter;
use crate::structured::StructuredDocument;
use crate::writer::to_html;

/// Stylesheet inlined into exported pages
pub const PAGE_STYLESHEET: &str = r#":root{--radius:8px;--radius-lg:12px;--bg-tertiary:#f1f3f5;}
body{margin:0;font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,"Helvetica Neue",Arial,sans-serif;color:#212529;line-height:1.7;}
.page{max-width:210mm;min-height:297mm;margin:0 auto;padding:25mm 20mm;box-sizing:border-box;background:#fff;}
.page h1,.page h2,.page h3{line-height:1.3;margin:1.2em 0 .6em;}
.page p{margin:0 0 .8em;}
.page blockquote{margin:1em 0;padding:.5em 1em;border-left:4px solid #4263eb;background:#f8f9fa;}
.page a{color:#4263eb;}
.page img{display:inline-block;}
.page .image-shadow{box-shadow:0 4px 16px rgba(0,0,0,.15);}
.page .image-border{border:1px solid #dee2e6;padding:4px;}
.page pre{font-family:"SFMono-Regular",Consolas,"Liberation Mono",Menlo,monospace;font-size:14px;}"#;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Text,
    Markdown,
    Html,
    Json,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Docx,
        ExportFormat::Pdf,
        ExportFormat::Html,
        ExportFormat::Text,
        ExportFormat::Markdown,
        ExportFormat::Json,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain;charset=utf-8",
            ExportFormat::Markdown => "text/markdown;charset=utf-8",
            ExportFormat::Html => "text/html",
            ExportFormat::Json => "application/json;charset=utf-8",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == extension)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ProDocError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(ExportFormat::Text),
            "markdown" => Ok(ExportFormat::Markdown),
            "word" => Ok(ExportFormat::Docx),
            other => Self::from_extension(other)
                .ok_or_else(|| ProDocError::validation(format!("Unknown export format: {}", s))),
        }
    }
}

/// File name for an exported document
pub fn artifact_filename(title: &str, format: ExportFormat, fallback: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { fallback } else { title };
    let safe: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}.{}", safe, format.extension())
}

/// A generated export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub payload: Vec<u8>,
    pub filename: String,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Payload as text, for the textual formats
    pub fn as_text(&self) -> Option<&str> {
        match self.format {
            ExportFormat::Docx | ExportFormat::Pdf => None,
            _ => std::str::from_utf8(&self.payload).ok(),
        }
    }

    /// Write the payload into a directory under its file name
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.payload).await?;
        info!("Wrote {} ({} bytes)", path.display(), self.payload.len());
        Ok(path)
    }
}

/// Self-contained HTML page around content markup
pub fn html_page(title: &str, content: &str, stylesheet: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\"><title>{}</title><style>{}</style></head><body style=\"background:#fff;padding:40px;\"><div class=\"page\">{}</div></body></html>",
        escape(title),
        stylesheet,
        content
    )
}

/// Builds export artifacts
pub struct Exporter {
    config: ExportConfig,
    stylesheet: String,
    assembler: Box<dyn DocumentAssembler>,
    pdf: Option<PdfExporter>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            stylesheet: PAGE_STYLESHEET.to_string(),
            assembler: Box::new(DocxAssembler::new()),
            pdf: None,
        }
    }

    pub fn with_assembler(mut self, assembler: Box<dyn DocumentAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_pdf(mut self, pdf: PdfExporter) -> Self {
        self.pdf = Some(pdf.with_pixel_ratio(self.config.pdf_pixel_ratio));
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Append the configured extra stylesheet, if any
    pub async fn load_stylesheet(&mut self) -> Result<()> {
        let Some(path) = self.config.stylesheet.clone() else {
            return Ok(());
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(css) => {
                self.stylesheet.push('\n');
                self.stylesheet.push_str(&css);
                Ok(())
            }
            Err(e) => {
                warn!("Cannot read stylesheet {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }

    /// Title used inside exports and for the file name
    pub fn title_for(&self, document: &Document) -> String {
        let title = document.title.trim();
        if title.is_empty() {
            self.config.fallback_title.clone()
        } else {
            title.to_string()
        }
    }

    /// Full HTML page for a document
    pub fn page(&self, document: &Document) -> Result<String> {
        let content = to_html(&document.content)?;
        Ok(html_page(&self.title_for(document), &content, &self.stylesheet))
    }

    pub async fn export(
        &self,
        document: &Document,
        format: ExportFormat,
        scale: &mut ViewScale,
        now: DateTime<Utc>,
    ) -> Result<ExportArtifact> {
        let title = self.title_for(document);
        let payload = match format {
            ExportFormat::Text => plain_text(&document.content).into_bytes(),
            ExportFormat::Markdown => to_markdown(&document.content).trim().as_bytes().to_vec(),
            ExportFormat::Html => self.page(document)?.into_bytes(),
            ExportFormat::Json => export_json(document, &title, now)?.into_bytes(),
            ExportFormat::Docx => {
                let structured = StructuredDocument::build(&title, &document.content);
                self.assembler.assemble(&structured).await?
            }
            ExportFormat::Pdf => {
                let pdf = self
                    .pdf
                    .as_ref()
                    .ok_or_else(|| ProDocError::external("No PDF renderer is configured"))?;
                pdf.export(&self.page(document)?, scale).await?
            }
        };

        let artifact = ExportArtifact {
            format,
            filename: artifact_filename(&title, format, &self.config.fallback_title),
            payload,
        };
        info!("Exported {} ({} bytes)", artifact.filename, artifact.payload.len());
        Ok(artifact)
    }
}
