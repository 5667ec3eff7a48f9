//! Word Document Assembly
//!
//! Packs a [`StructuredDocument`] into an Office Open XML package. The
//! assembler sits behind [`DocumentAssembler`] so a different backend can
//! be swapped in.

use std::io::{Cursor, Write};

use async_trait::async_trait;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use prodoc_core::tree::Alignment;
use prodoc_core::{ProDocError, Result};

use crate::structured::{Run, StructuredDocument, StructuredParagraph};

/// Turns the structured model into document bytes
#[async_trait]
pub trait DocumentAssembler: Send + Sync {
    async fn assemble(&self, document: &StructuredDocument) -> Result<Vec<u8>>;
}

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Built-in OOXML assembler
#[derive(Debug, Clone, Default)]
pub struct DocxAssembler;

impl DocxAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build the package synchronously
    pub fn package(&self, document: &StructuredDocument) -> Result<Vec<u8>> {
        let body = document_xml(document)?;
        let styles = styles_xml()?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let parts: [(&str, &[u8]); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
            ("word/document.xml", body.as_bytes()),
            ("word/styles.xml", styles.as_bytes()),
        ];
        for (name, bytes) in parts {
            zip.start_file(name, options).map_err(package_error)?;
            zip.write_all(bytes)
                .map_err(|e| ProDocError::external(format!("writing {}: {}", name, e)))?;
            debug!("Packed {} ({} bytes)", name, bytes.len());
        }
        let cursor = zip.finish().map_err(package_error)?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl DocumentAssembler for DocxAssembler {
    async fn assemble(&self, document: &StructuredDocument) -> Result<Vec<u8>> {
        let bytes = self.package(document)?;
        info!(
            "Assembled word document with {} paragraphs ({} bytes)",
            document.paragraphs.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn package_error(e: zip::result::ZipError) -> ProDocError {
    ProDocError::external(format!("document packaging failed: {}", e))
}

fn xml_error(e: quick_xml::Error) -> ProDocError {
    ProDocError::external(format!("document markup failed: {}", e))
}

fn jc_value(align: Alignment) -> Option<&'static str> {
    match align {
        Alignment::Left => None,
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
        Alignment::Justify => Some("both"),
    }
}

struct PartWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl PartWriter {
    fn new() -> Result<Self> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(tag);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.writer.write_event(Event::Start(elem)).map_err(xml_error)
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(xml_error)
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(tag);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.writer.write_event(Event::Empty(elem)).map_err(xml_error)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| ProDocError::external(e.to_string()))
    }

    fn paragraph(&mut self, paragraph: &StructuredParagraph) -> Result<()> {
        self.open("w:p", &[])?;
        let style = paragraph.style.style_id();
        let jc = paragraph.alignment.and_then(jc_value);
        if style.is_some() || jc.is_some() {
            self.open("w:pPr", &[])?;
            if let Some(style) = &style {
                self.empty("w:pStyle", &[("w:val", style.as_str())])?;
            }
            if let Some(jc) = jc {
                self.empty("w:jc", &[("w:val", jc)])?;
            }
            self.close("w:pPr")?;
        }
        for run in &paragraph.runs {
            self.run(run)?;
        }
        self.close("w:p")
    }

    fn run(&mut self, run: &Run) -> Result<()> {
        self.open("w:r", &[])?;
        if run.bold || run.italic || run.underline || run.strike {
            self.open("w:rPr", &[])?;
            if run.bold {
                self.empty("w:b", &[])?;
            }
            if run.italic {
                self.empty("w:i", &[])?;
            }
            if run.strike {
                self.empty("w:strike", &[])?;
            }
            if run.underline {
                self.empty("w:u", &[("w:val", "single")])?;
            }
            self.close("w:rPr")?;
        }
        if run.break_before {
            self.empty("w:br", &[])?;
        }
        if !run.text.is_empty() {
            let mut segments = run.text.split('\t').peekable();
            while let Some(segment) = segments.next() {
                if !segment.is_empty() {
                    self.open("w:t", &[("xml:space", "preserve")])?;
                    self.text(segment)?;
                    self.close("w:t")?;
                }
                if segments.peek().is_some() {
                    self.empty("w:tab", &[])?;
                }
            }
        }
        self.close("w:r")
    }
}

/// `word/document.xml`
fn document_xml(document: &StructuredDocument) -> Result<String> {
    let mut part = PartWriter::new()?;
    part.open("w:document", &[("xmlns:w", WORD_NS)])?;
    part.open("w:body", &[])?;
    for paragraph in &document.paragraphs {
        part.paragraph(paragraph)?;
    }
    part.open("w:sectPr", &[])?;
    // A4 in twentieths of a point
    part.empty("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
    part.empty(
        "w:pgMar",
        &[
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    part.close("w:sectPr")?;
    part.close("w:body")?;
    part.close("w:document")?;
    part.finish()
}

/// Paragraph style definition: id, display name, run size in half-points,
/// bold, italic, font
type StyleDef = (&'static str, &'static str, u32, bool, bool, Option<&'static str>);

const STYLES: &[StyleDef] = &[
    ("Title", "Title", 56, false, false, None),
    ("Heading1", "heading 1", 32, true, false, None),
    ("Heading2", "heading 2", 26, true, false, None),
    ("Heading3", "heading 3", 24, true, false, None),
    ("Heading4", "heading 4", 22, true, true, None),
    ("Heading5", "heading 5", 22, false, false, None),
    ("Heading6", "heading 6", 22, false, true, None),
    ("IntenseQuote", "Intense Quote", 22, false, true, None),
    ("Code", "Code", 20, false, false, Some("Courier New")),
];

/// `word/styles.xml`
fn styles_xml() -> Result<String> {
    let mut part = PartWriter::new()?;
    part.open("w:styles", &[("xmlns:w", WORD_NS)])?;

    part.open("w:style", &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")])?;
    part.empty("w:name", &[("w:val", "Normal")])?;
    part.close("w:style")?;

    for &(id, name, size, bold, italic, font) in STYLES {
        let size = size.to_string();
        part.open("w:style", &[("w:type", "paragraph"), ("w:styleId", id)])?;
        part.empty("w:name", &[("w:val", name)])?;
        part.empty("w:basedOn", &[("w:val", "Normal")])?;
        part.empty("w:next", &[("w:val", "Normal")])?;
        part.empty("w:qFormat", &[])?;
        part.open("w:rPr", &[])?;
        if let Some(font) = font {
            part.empty("w:rFonts", &[("w:ascii", font), ("w:hAnsi", font)])?;
        }
        if bold {
            part.empty("w:b", &[])?;
        }
        if italic {
            part.empty("w:i", &[])?;
        }
        part.empty("w:sz", &[("w:val", size.as_str())])?;
        part.close("w:rPr")?;
        part.close("w:style")?;
    }

    part.close("w:styles")?;
    part.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use std::io::Read;

    fn sample() -> StructuredDocument {
        let tree = parse_html(
            "<h1>Intro</h1><p style=\"text-align: center\"><b>Bold</b> &amp; plain</p><blockquote><p>q</p></blockquote>",
        )
        .unwrap();
        StructuredDocument::build("My <Doc>", &tree)
    }

    #[test]
    fn test_document_xml() {
        let xml = document_xml(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("<w:pStyle w:val=\"Title\"/></w:pPr><w:r><w:t xml:space=\"preserve\">My &lt;Doc&gt;</w:t>"));
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
        assert!(xml.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">Bold</w:t>"));
        assert!(xml.contains("<w:pStyle w:val=\"IntenseQuote\"/>"));
        // Spacer paragraph after the title
        assert!(xml.contains("</w:p><w:p></w:p><w:p>"));
    }

    #[test]
    fn test_breaks_and_tabs() {
        let run = Run {
            text: "a\tb".into(),
            break_before: true,
            ..Run::default()
        };
        let doc = StructuredDocument {
            title: "t".into(),
            paragraphs: vec![StructuredParagraph::new(
                crate::structured::ParagraphStyle::Normal,
                vec![run],
            )],
        };
        let xml = document_xml(&doc).unwrap();
        assert!(xml.contains("<w:r><w:br/><w:t xml:space=\"preserve\">a</w:t><w:tab/><w:t xml:space=\"preserve\">b</w:t></w:r>"));
    }

    #[test]
    fn test_package_parts() {
        let bytes = tokio_test::block_on(DocxAssembler::new().assemble(&sample())).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/styles.xml",
            ]
        );

        let mut styles = String::new();
        archive
            .by_name("word/styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert!(styles.contains("w:styleId=\"IntenseQuote\""));
    }
}
