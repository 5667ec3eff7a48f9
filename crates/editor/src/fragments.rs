//! Insertion Fragments
//!
//! Builders for the content the insertion dialogs splice into the document:
//! hyperlinks, images, video embeds, tables and code blocks. Builders
//! validate their input and never touch the surface.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::Engine as _;
use prodoc_core::tree::{
    Alignment, Block, Image, Inline, Link, Media, MediaKind, Table, TableCell, TableRow, TextBlock,
};
use prodoc_core::{ProDocError, Result};
use regex::Regex;
use tracing::debug;

use crate::surface::Fragment;

/// Upper bound of the table size picker grid
pub const MAX_TABLE_SIZE: usize = 10;

/// Placeholder text of a freshly inserted code block
pub const CODE_PLACEHOLDER: &str = "Enter code here...";

fn link_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(https?|ftp)://").expect("valid link regex"))
}

fn bilibili_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"BV[a-zA-Z0-9]+").expect("valid bvid regex"))
}

fn native_video() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(mp4|webm|ogg)$").expect("valid video regex"))
}

/// Check a hyperlink target
pub fn validate_link_url(url: &str) -> Result<()> {
    if url.is_empty() || !link_scheme().is_match(url) {
        return Err(ProDocError::validation("Please enter a valid link address"));
    }
    Ok(())
}

/// Hyperlink request from the link dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRequest {
    pub url: String,
    /// Display text; empty means "use the URL"
    pub text: String,
    pub new_tab: bool,
}

impl LinkRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn in_new_tab(mut self, new_tab: bool) -> Self {
        self.new_tab = new_tab;
        self
    }

    /// Text shown for the link
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() { &self.url } else { &self.text }
    }

    pub fn to_link(&self) -> Result<Link> {
        validate_link_url(&self.url)?;
        Ok(Link {
            href: self.url.clone(),
            new_tab: self.new_tab,
            children: vec![Inline::text(self.display_text())],
        })
    }
}

/// Build the inline hyperlink fragment
pub fn link_fragment(request: &LinkRequest) -> Result<Fragment> {
    Ok(Fragment::Inline(vec![Inline::Link(request.to_link()?)]))
}

/// Image request from the image dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub url: Option<String>,
    pub file: Option<PathBuf>,
    pub width: u32,
    pub height: Option<u32>,
    pub rounded: bool,
    pub shadow: bool,
    pub border: bool,
}

impl Default for ImageRequest {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            width: 400,
            height: None,
            rounded: false,
            shadow: false,
            border: false,
        }
    }
}

impl ImageRequest {
    /// Remote URL, when it is usable
    fn remote_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|url| url.starts_with("http"))
    }

    /// Resolve the image source: a usable URL wins, otherwise the local
    /// file is embedded as a data URI
    pub async fn resolve_source(&self) -> Result<String> {
        if let Some(url) = self.remote_url() {
            return Ok(url.to_string());
        }
        match &self.file {
            Some(path) => embed_file(path).await,
            None => Err(ProDocError::validation(
                "Please choose an image file or enter a valid image URL",
            )),
        }
    }

    /// Centered paragraph holding the image
    pub fn fragment(&self, src: String) -> Fragment {
        let image = Image {
            src,
            width: Some(self.width),
            height: self.height,
            rounded: self.rounded,
            shadow: self.shadow,
            border: self.border,
        };
        Fragment::Blocks(vec![Block::Paragraph(TextBlock::aligned(
            vec![Inline::Image(image)],
            Alignment::Center,
        ))])
    }
}

/// MIME type guessed from a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Read a local file into a base64 data URI
pub async fn embed_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ProDocError::parse(format!("Failed to read {}: {}", path.display(), e)))?;
    debug!("Embedding {} ({} bytes)", path.display(), bytes.len());
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime_for_path(path), encoded))
}

/// Video request from the video dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl VideoRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: 560,
            height: 315,
        }
    }

    pub fn sized(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Recognise the provider and build the centered embed
    pub fn to_media(&self) -> Result<Media> {
        let (kind, src) = recognize_video(&self.url)?;
        Ok(Media {
            kind,
            src,
            width: Some(self.width),
            height: Some(self.height),
            align: Some(Alignment::Center),
        })
    }

    pub fn fragment(&self) -> Result<Fragment> {
        Ok(Fragment::Blocks(vec![Block::Media(self.to_media()?)]))
    }
}

/// Map a video page URL to its embeddable source
pub fn recognize_video(url: &str) -> Result<(MediaKind, String)> {
    if url.is_empty() || !url.starts_with("http") {
        return Err(ProDocError::validation("Please enter a valid video link"));
    }

    if url.contains("youtube.com/watch?v=") {
        let id = url
            .split("v=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap_or_default();
        return Ok((MediaKind::Frame, format!("https://www.youtube.com/embed/{}", id)));
    }

    if url.contains("bilibili.com/video/") {
        if let Some(id) = bilibili_id().find(url) {
            return Ok((
                MediaKind::Frame,
                format!("//player.bilibili.com/player.html?bvid={}&page=1", id.as_str()),
            ));
        }
    } else if native_video().is_match(url) {
        return Ok((MediaKind::Video, url.to_string()));
    }

    Err(ProDocError::validation("Unsupported video link format"))
}

/// Table with a header row, every cell holding an empty line, then an empty paragraph
pub fn table_fragment(rows: usize, cols: usize) -> Result<Fragment> {
    if rows == 0 || cols == 0 || rows > MAX_TABLE_SIZE || cols > MAX_TABLE_SIZE {
        return Err(ProDocError::validation(format!(
            "Table size must be between 1 and {}",
            MAX_TABLE_SIZE
        )));
    }

    let rows = (0..rows)
        .map(|r| TableRow {
            cells: (0..cols)
                .map(|_| TableCell {
                    header: r == 0,
                    blocks: vec![Block::empty_paragraph()],
                })
                .collect(),
        })
        .collect();

    Ok(Fragment::Blocks(vec![
        Block::Table(Table { rows }),
        Block::empty_paragraph(),
    ]))
}

/// Preformatted block with placeholder text, then an empty paragraph
pub fn code_block_fragment() -> Fragment {
    Fragment::Blocks(vec![
        Block::Code(CODE_PLACEHOLDER.to_string()),
        Block::empty_paragraph(),
    ])
}

/// Hover state of the table size grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSizePicker {
    rows: usize,
    cols: usize,
}

impl Default for TableSizePicker {
    fn default() -> Self {
        Self { rows: 1, cols: 1 }
    }
}

impl TableSizePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer moved over a grid cell (1-based)
    pub fn hover(&mut self, row: usize, col: usize) {
        self.rows = row.clamp(1, MAX_TABLE_SIZE);
        self.cols = col.clamp(1, MAX_TABLE_SIZE);
    }

    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Whether a grid cell falls inside the hovered size
    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        row <= self.rows && col <= self.cols
    }

    pub fn label(&self) -> String {
        format!("{} × {} table", self.rows, self.cols)
    }

    pub fn fragment(&self) -> Result<Fragment> {
        table_fragment(self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodoc_core::error::ErrorKind;

    #[test]
    fn test_link_validation() {
        assert!(validate_link_url("https://example.com").is_ok());
        assert!(validate_link_url("FTP://files.example.com").is_ok());
        let err = validate_link_url("javascript:alert(1)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(validate_link_url("").is_err());
    }

    #[test]
    fn test_link_text_defaults_to_url() {
        let link = LinkRequest::new("https://example.com").to_link().unwrap();
        assert_eq!(link.href, "https://example.com");
        assert_eq!(link.children, vec![Inline::text("https://example.com")]);
        assert!(!link.new_tab);

        let link = LinkRequest::new("https://example.com")
            .with_text("Example")
            .in_new_tab(true)
            .to_link()
            .unwrap();
        assert_eq!(link.children, vec![Inline::text("Example")]);
        assert!(link.new_tab);
    }

    #[test]
    fn test_youtube_embed() {
        let (kind, src) = recognize_video("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").unwrap();
        assert_eq!(kind, MediaKind::Frame);
        assert_eq!(src, "https://www.youtube.com/embed/dQw4w9WgXcQ");
    }

    #[test]
    fn test_bilibili_embed() {
        let (_, src) = recognize_video("https://www.bilibili.com/video/BV1xx411c7mD/?p=1").unwrap();
        assert_eq!(src, "//player.bilibili.com/player.html?bvid=BV1xx411c7mD&page=1");
        assert!(recognize_video("https://www.bilibili.com/video/av170001").is_err());
    }

    #[test]
    fn test_native_video_and_rejections() {
        let (kind, src) = recognize_video("https://cdn.example.com/clip.WEBM").unwrap();
        assert_eq!(kind, MediaKind::Video);
        assert_eq!(src, "https://cdn.example.com/clip.WEBM");

        assert!(recognize_video("https://vimeo.com/12345").is_err());
        assert!(recognize_video("ftp://example.com/a.mp4").is_err());
    }

    #[test]
    fn test_video_request_is_centered() {
        let media = VideoRequest::new("https://a.example/v.mp4").sized(640, 360).to_media().unwrap();
        assert_eq!(media.align, Some(Alignment::Center));
        assert_eq!((media.width, media.height), (Some(640), Some(360)));
    }

    #[test]
    fn test_table_fragment_shape() {
        let Fragment::Blocks(blocks) = table_fragment(3, 2).unwrap() else {
            panic!("expected blocks");
        };
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1], Block::empty_paragraph());
        let Block::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows[0].cells.iter().all(|c| c.header));
        assert_eq!(table.rows[0].cells.len(), 2);
        for row in &table.rows[1..] {
            assert_eq!(row.cells.len(), 2);
            assert!(row.cells.iter().all(|c| !c.header));
            assert!(row.cells.iter().all(|c| c.blocks == vec![Block::empty_paragraph()]));
        }
    }

    #[test]
    fn test_table_bounds() {
        assert!(table_fragment(0, 2).is_err());
        assert!(table_fragment(11, 2).is_err());
        assert!(table_fragment(10, 10).is_ok());
    }

    #[test]
    fn test_table_size_picker() {
        let mut picker = TableSizePicker::new();
        assert_eq!(picker.size(), (1, 1));
        picker.hover(3, 4);
        assert_eq!(picker.label(), "3 × 4 table");
        assert!(picker.is_selected(2, 4));
        assert!(!picker.is_selected(4, 1));
        picker.hover(20, 0);
        assert_eq!(picker.size(), (10, 1));
    }

    #[test]
    fn test_code_block_fragment() {
        assert_eq!(
            code_block_fragment(),
            Fragment::Blocks(vec![
                Block::Code(CODE_PLACEHOLDER.into()),
                Block::empty_paragraph()
            ])
        );
    }

    #[test]
    fn test_image_url_wins_over_file() {
        let request = ImageRequest {
            url: Some("https://img.example/a.png".into()),
            file: Some(PathBuf::from("/does/not/exist.png")),
            ..Default::default()
        };
        let src = tokio_test::block_on(request.resolve_source()).unwrap();
        assert_eq!(src, "https://img.example/a.png");
    }

    #[tokio::test]
    async fn test_image_from_file_is_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        tokio::fs::write(&path, [1u8, 2, 3]).await.unwrap();

        let request = ImageRequest {
            url: Some("not-a-url".into()),
            file: Some(path),
            ..Default::default()
        };
        let src = request.resolve_source().await.unwrap();
        assert_eq!(src, "data:image/png;base64,AQID");
    }

    #[tokio::test]
    async fn test_image_without_source_rejected() {
        let err = ImageRequest::default().resolve_source().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_image_fragment_centered() {
        let request = ImageRequest {
            height: Some(120),
            rounded: true,
            ..Default::default()
        };
        let Fragment::Blocks(blocks) = request.fragment("https://x.example/i.png".into()) else {
            panic!("expected blocks");
        };
        let Block::Paragraph(body) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(body.align, Some(Alignment::Center));
        assert!(matches!(&body.inlines[0], Inline::Image(img) if img.rounded && img.height == Some(120)));
    }
}
