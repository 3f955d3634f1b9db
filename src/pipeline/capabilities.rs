//! Environment capability flags, resolved once at startup.
//!
//! Some deployment targets lack the PDFium library or the Tesseract native
//! libs; the vision client may be unconfigured. Backends consult injected
//! components rather than probing at call time, and the embedding
//! application uses these flags to present actionable messages up front.

use serde::Serialize;

use crate::config::Settings;
use crate::pipeline::extraction::pdfium::PdfiumRenderer;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capabilities {
    /// PDFium library loadable — scanned PDFs can be rasterized.
    pub pdf_renderer: bool,
    /// OCR engine compiled in and initializable.
    pub ocr_engine: bool,
    /// Vision/structuring client configured with an API key.
    pub vision_client: bool,
}

impl Capabilities {
    pub fn detect(settings: &Settings) -> Self {
        let caps = Self {
            pdf_renderer: PdfiumRenderer::new().is_ok(),
            ocr_engine: ocr_engine_available(settings),
            vision_client: settings.openai_api_key.is_some(),
        };

        tracing::info!(
            pdf_renderer = caps.pdf_renderer,
            ocr_engine = caps.ocr_engine,
            vision_client = caps.vision_client,
            "Environment capabilities resolved"
        );

        caps
    }
}

#[cfg(feature = "ocr")]
fn ocr_engine_available(settings: &Settings) -> bool {
    crate::pipeline::extraction::ocr::TesseractOcr::new(settings.tessdata_dir.as_deref()).is_ok()
}

#[cfg(not(feature = "ocr"))]
fn ocr_engine_available(_settings: &Settings) -> bool {
    false
}
