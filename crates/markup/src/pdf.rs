//! PDF Export
//!
//! Rasterizing the page and assembling the PDF are delegated to
//! collaborators. This module resets the view scale for the capture and
//! computes how the captured image is sliced across A4 pages.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use prodoc_core::{ProDocError, Result, ViewScale};

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Leftover image height that does not warrant another page, in mm
const PAGE_EPSILON_MM: f32 = 0.5;

/// A captured page image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPage {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Captures the rendered page as an image
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// `scale` is the view scale in effect; `pixel_ratio` the capture density
    async fn capture(&self, page_html: &str, scale: f32, pixel_ratio: f32) -> Result<CapturedPage>;
}

/// Places the captured image on successive pages
#[async_trait]
pub trait PdfAssembler: Send + Sync {
    async fn assemble(&self, image: &CapturedPage, layout: &PageLayout) -> Result<Vec<u8>>;
}

/// Placement of one tall image across fixed-size pages
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// Image height once scaled to the page width
    pub image_height_mm: f32,
    /// Vertical image offset on each page (0, then negative)
    pub offsets_mm: Vec<f32>,
}

impl PageLayout {
    pub fn page_count(&self) -> usize {
        self.offsets_mm.len()
    }
}

/// Slice an image of the given pixel size across A4 portrait pages
pub fn page_layout(width_px: u32, height_px: u32) -> Result<PageLayout> {
    if width_px == 0 || height_px == 0 {
        return Err(ProDocError::external("captured page is empty"));
    }
    let image_height_mm = A4_WIDTH_MM * height_px as f32 / width_px as f32;

    let mut offsets_mm = vec![0.0];
    let mut height_left = image_height_mm - A4_HEIGHT_MM;
    while height_left > PAGE_EPSILON_MM {
        offsets_mm.push(height_left - image_height_mm);
        height_left -= A4_HEIGHT_MM;
    }

    Ok(PageLayout {
        page_width_mm: A4_WIDTH_MM,
        page_height_mm: A4_HEIGHT_MM,
        image_height_mm,
        offsets_mm,
    })
}

/// Rasterize-then-assemble pipeline
pub struct PdfExporter {
    rasterizer: Box<dyn Rasterizer>,
    assembler: Box<dyn PdfAssembler>,
    pixel_ratio: f32,
}

impl PdfExporter {
    pub fn new(rasterizer: Box<dyn Rasterizer>, assembler: Box<dyn PdfAssembler>) -> Self {
        Self {
            rasterizer,
            assembler,
            pixel_ratio: 2.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Capture at 100% and assemble. The previous view scale is back in
    /// place when this returns, whether or not it succeeded.
    pub async fn export(&self, page_html: &str, scale: &mut ViewScale) -> Result<Vec<u8>> {
        let captured = {
            let guard = scale.reset_scoped();
            debug!("Capturing page at scale {}", guard.factor());
            self.rasterizer
                .capture(page_html, guard.factor(), self.pixel_ratio)
                .await
        };
        let captured = captured.map_err(|e| {
            warn!("Page capture failed: {}", e);
            e
        })?;

        let layout = page_layout(captured.width_px, captured.height_px)?;
        let bytes = self.assembler.assemble(&captured, &layout).await?;
        info!(
            "Assembled PDF: {} page(s), {} bytes",
            layout.page_count(),
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct FixedRasterizer {
        width: u32,
        height: u32,
        seen_scale: Arc<Mutex<Option<f32>>>,
    }

    #[async_trait]
    impl Rasterizer for FixedRasterizer {
        async fn capture(&self, _page: &str, scale: f32, _ratio: f32) -> Result<CapturedPage> {
            *self.seen_scale.lock().unwrap() = Some(scale);
            Ok(CapturedPage {
                png: vec![0x89, b'P', b'N', b'G'],
                width_px: self.width,
                height_px: self.height,
            })
        }
    }

    struct FailingRasterizer;

    #[async_trait]
    impl Rasterizer for FailingRasterizer {
        async fn capture(&self, _page: &str, _scale: f32, _ratio: f32) -> Result<CapturedPage> {
            Err(ProDocError::external("canvas tainted"))
        }
    }

    struct CountingAssembler;

    #[async_trait]
    impl PdfAssembler for CountingAssembler {
        async fn assemble(&self, _image: &CapturedPage, layout: &PageLayout) -> Result<Vec<u8>> {
            Ok(format!("%PDF pages={}", layout.page_count()).into_bytes())
        }
    }

    #[test]
    fn test_single_page() {
        let layout = page_layout(1000, 1000).unwrap();
        assert_eq!(layout.offsets_mm, vec![0.0]);
        assert!((layout.image_height_mm - 210.0).abs() < 1e-3);
    }

    #[test]
    fn test_multi_page_offsets() {
        // Three and a half A4 pages tall
        let height_px = (1000.0 * A4_HEIGHT_MM * 3.5 / A4_WIDTH_MM).round() as u32;
        let layout = page_layout(1000, height_px).unwrap();
        assert_eq!(layout.page_count(), 4);
        for (k, offset) in layout.offsets_mm.iter().enumerate() {
            assert!((offset + k as f32 * A4_HEIGHT_MM).abs() < 0.5, "page {}", k);
        }
    }

    #[test]
    fn test_exact_fit_has_no_trailing_page() {
        let height_px = (1000.0 * A4_HEIGHT_MM * 2.0 / A4_WIDTH_MM).round() as u32;
        let layout = page_layout(1000, height_px).unwrap();
        assert_eq!(layout.page_count(), 2);
    }

    #[test]
    fn test_empty_capture_rejected() {
        assert!(page_layout(0, 100).is_err());
    }

    #[tokio::test]
    async fn test_capture_at_full_scale_then_restore() {
        let seen = Arc::new(Mutex::new(None));
        let exporter = PdfExporter::new(
            Box::new(FixedRasterizer {
                width: 800,
                height: 2400,
                seen_scale: seen.clone(),
            }),
            Box::new(CountingAssembler),
        );
        let mut scale = ViewScale::default();
        scale.set(150);

        let bytes = exporter.export("<div class=\"page\"></div>", &mut scale).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(1.0));
        assert_eq!(scale.percent(), 150);
        assert_eq!(String::from_utf8(bytes).unwrap(), "%PDF pages=3");
    }

    #[tokio::test]
    async fn test_failure_restores_scale() {
        let exporter = PdfExporter::new(Box::new(FailingRasterizer), Box::new(CountingAssembler));
        let mut scale = ViewScale::default();
        scale.set(70);

        let err = exporter.export("<p></p>", &mut scale).await.unwrap_err();
        assert!(matches!(err, ProDocError::ExternalService(_)));
        assert_eq!(scale.percent(), 70);
    }
}
