//! Rasterize-and-OCR extraction for scanned documents.
//!
//! Each PDF page is rendered to a PNG at a fixed DPI inside a per-run
//! scratch subdirectory, OCR'd, and deleted as soon as its text is captured
//! — peak disk usage stays bounded at one page and concurrent runs never
//! collide. Plain images skip rasterization and go straight to OCR.

use std::path::PathBuf;
use std::sync::Arc;

use super::format::{detect_kind, DocumentKind};
use super::types::{
    BackendOutput, ExtractionBackend, ExtractionRequest, OcrEngine, PdfPageRenderer, PAGE_BREAK,
};
use super::BackendFailure;

/// Last-resort gate, looser than full readability: OCR output only has to
/// carry some content to be worth structuring.
const MIN_OCR_TEXT_LEN: usize = 20;

pub struct RasterOcrBackend {
    renderer: Option<Arc<dyn PdfPageRenderer>>,
    ocr: Option<Arc<dyn OcrEngine>>,
    scratch_root: PathBuf,
    dpi: u32,
}

impl RasterOcrBackend {
    pub fn new(
        renderer: Option<Arc<dyn PdfPageRenderer>>,
        ocr: Option<Arc<dyn OcrEngine>>,
        scratch_root: PathBuf,
        dpi: u32,
    ) -> Self {
        Self {
            renderer,
            ocr,
            scratch_root,
            dpi,
        }
    }

    fn ocr_pdf(
        &self,
        ocr: &dyn OcrEngine,
        pdf_bytes: &[u8],
    ) -> Result<String, BackendFailure> {
        let renderer = self.renderer.as_deref().ok_or_else(|| {
            BackendFailure::Unavailable(
                "PDF rasterization unavailable in this environment — upload the scan as an image instead"
                    .into(),
            )
        })?;

        std::fs::create_dir_all(&self.scratch_root)
            .map_err(|e| BackendFailure::Failed(format!("cannot create scratch dir: {e}")))?;

        // Per-run unique subdirectory; removed on drop, success or failure.
        let scratch = tempfile::Builder::new()
            .prefix("raster-")
            .tempdir_in(&self.scratch_root)
            .map_err(|e| BackendFailure::Failed(format!("cannot create scratch dir: {e}")))?;

        let page_count = renderer.page_count(pdf_bytes)?;
        if page_count == 0 {
            return Err(BackendFailure::Failed("PDF has no pages".into()));
        }

        let mut page_texts = Vec::with_capacity(page_count);
        for page in 0..page_count {
            let png = renderer.render_page(pdf_bytes, page, self.dpi)?;
            let page_path = scratch.path().join(format!("page-{:03}.png", page + 1));
            std::fs::write(&page_path, png)
                .map_err(|e| BackendFailure::Failed(format!("cannot write page raster: {e}")))?;

            let result = ocr.ocr_image(&page_path);

            // Delete the raster before inspecting the result so a failed OCR
            // pass still leaves no file behind.
            if let Err(e) = std::fs::remove_file(&page_path) {
                tracing::warn!(path = %page_path.display(), error = %e, "Could not remove page raster");
            }

            page_texts.push(result?);
            tracing::debug!(page = page + 1, of = page_count, "OCR page complete");
        }

        Ok(page_texts.join(PAGE_BREAK))
    }
}

impl ExtractionBackend for RasterOcrBackend {
    fn name(&self) -> &'static str {
        "raster-ocr"
    }

    fn attempt(&self, req: &ExtractionRequest<'_>) -> Result<BackendOutput, BackendFailure> {
        let ocr = self.ocr.as_deref().ok_or_else(|| {
            BackendFailure::Unavailable("OCR engine not available in this environment".into())
        })?;

        let text = match detect_kind(req.document_path)? {
            DocumentKind::Image => ocr.ocr_image(req.document_path)?,
            DocumentKind::Pdf => {
                let pdf_bytes = std::fs::read(req.document_path)
                    .map_err(|e| BackendFailure::Failed(format!("cannot read document: {e}")))?;
                self.ocr_pdf(ocr, &pdf_bytes)?
            }
            DocumentKind::Unsupported => {
                return Err(BackendFailure::Failed(
                    "unsupported file format for OCR".into(),
                ));
            }
        };

        tracing::info!(text_length = text.len(), "Raster OCR extraction complete");

        Ok(BackendOutput::raw_text(text))
    }

    fn accept(&self, output: &BackendOutput) -> Result<(), String> {
        if output.text.trim().len() > MIN_OCR_TEXT_LEN {
            Ok(())
        } else {
            Err(format!(
                "OCR produced only {} characters",
                output.text.trim().len()
            ))
        }
    }
}
