use super::BackendFailure;

/// Digital-PDF text layer extraction using the pdf-extract crate.
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Extract the embedded text of each page, in page order.
    pub fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, BackendFailure> {
        pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| BackendFailure::Failed(format!("PDF text layer extraction failed: {e}")))
    }
}
