use std::path::Path;

use serde::Serialize;

use super::BackendFailure;
use crate::models::PatientContext;

/// Separator placed between page texts when concatenating multi-page output.
pub const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";

/// Input to one extraction run.
pub struct ExtractionRequest<'a> {
    pub document_path: &'a Path,
    pub patient: &'a PatientContext,
}

/// What a single backend produced.
#[derive(Debug, Clone)]
pub struct BackendOutput {
    pub text: String,
    /// True when `text` is already the final structured analysis (HTML table
    /// plus prose) and the separate structuring step must be skipped.
    pub is_direct_analysis: bool,
}

impl BackendOutput {
    pub fn raw_text(text: String) -> Self {
        Self {
            text,
            is_direct_analysis: false,
        }
    }
}

/// The orchestrator's selected result. Exactly one backend's output is
/// chosen per document; failed attempts are discarded, never merged.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Name of the backend that produced the text.
    pub method: &'static str,
    pub is_direct_analysis: bool,
}

/// One concrete strategy for turning a document into text or a direct
/// analysis. Implementations never panic across this boundary — every
/// internal error is converted into a `BackendFailure`.
pub trait ExtractionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, req: &ExtractionRequest<'_>) -> Result<BackendOutput, BackendFailure>;

    /// Quality gate the orchestrator applies before accepting this
    /// backend's output. `Err` carries the rejection reason.
    fn accept(&self, output: &BackendOutput) -> Result<(), String>;
}

/// OCR engine abstraction (allows mocking for tests). Takes a path to an
/// image file — the raster backend hands it page files from its scratch
/// directory, or the uploaded image itself.
pub trait OcrEngine: Send + Sync {
    fn ocr_image(&self, image_path: &Path) -> Result<String, BackendFailure>;
}

/// PDF page rendering abstraction.
pub trait PdfPageRenderer: Send + Sync {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, BackendFailure>;

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, BackendFailure>;
}
