//! Direct text extraction for digital (non-scanned) PDFs.
//!
//! Deterministic and lossless when the document carries a text layer, so the
//! orchestrator prefers it over OCR. Scanned PDFs yield an empty or garbled
//! layer here and fall through to the raster backend.

use super::format::{detect_kind, DocumentKind};
use super::pdf::PdfTextExtractor;
use super::types::{BackendOutput, ExtractionBackend, ExtractionRequest, PAGE_BREAK};
use super::BackendFailure;
use crate::pipeline::readability::is_readable;

pub struct DirectTextBackend {
    pdf: PdfTextExtractor,
}

impl DirectTextBackend {
    pub fn new() -> Self {
        Self {
            pdf: PdfTextExtractor,
        }
    }
}

impl Default for DirectTextBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionBackend for DirectTextBackend {
    fn name(&self) -> &'static str {
        "direct-text"
    }

    fn attempt(&self, req: &ExtractionRequest<'_>) -> Result<BackendOutput, BackendFailure> {
        match detect_kind(req.document_path)? {
            DocumentKind::Pdf => {}
            other => {
                return Err(BackendFailure::Failed(format!(
                    "not a PDF ({}) — no embedded text layer to read",
                    other.as_str()
                )));
            }
        }

        let pdf_bytes = std::fs::read(req.document_path)
            .map_err(|e| BackendFailure::Failed(format!("cannot read document: {e}")))?;

        let pages = self.pdf.extract_pages(&pdf_bytes)?;
        let text = pages.join(PAGE_BREAK);

        if text.trim().is_empty() {
            return Err(BackendFailure::Failed(
                "PDF contains no extractable text layer".into(),
            ));
        }

        tracing::info!(
            pages = pages.len(),
            text_length = text.len(),
            "Direct text extraction complete"
        );

        Ok(BackendOutput::raw_text(text))
    }

    fn accept(&self, output: &BackendOutput) -> Result<(), String> {
        if is_readable(&output.text) {
            Ok(())
        } else {
            Err("extracted text layer below readability threshold".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientContext;
    use crate::pipeline::extraction::pdf::tests::make_test_pdf;
    use std::io::Write;

    fn request_for<'a>(
        path: &'a std::path::Path,
        patient: &'a PatientContext,
    ) -> ExtractionRequest<'a> {
        ExtractionRequest {
            document_path: path,
            patient,
        }
    }

    #[test]
    fn extracts_text_from_digital_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wyniki.pdf");
        std::fs::write(&path, make_test_pdf("Wynik badania: Glukoza 95 mg/dl")).unwrap();

        let patient = PatientContext::default();
        let backend = DirectTextBackend::new();
        let output = backend.attempt(&request_for(&path, &patient)).unwrap();

        assert!(!output.is_direct_analysis);
        assert!(output.text.contains("Glukoza") || output.text.contains("95"));
    }

    #[test]
    fn rejects_image_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
            .unwrap();

        let patient = PatientContext::default();
        let backend = DirectTextBackend::new();
        let err = backend.attempt(&request_for(&path, &patient)).unwrap_err();
        assert!(matches!(err, BackendFailure::Failed(r) if r.contains("not a PDF")));
    }

    #[test]
    fn accept_gate_uses_readability() {
        let backend = DirectTextBackend::new();

        let good = BackendOutput::raw_text(
            "Wynik badania krwi: Hemoglobina 14.2 g/dl, Glukoza 95 mg/dl, CRP 1.2 mg/l".into(),
        );
        assert!(backend.accept(&good).is_ok());

        let bad = BackendOutput::raw_text("zbyt krótki".into());
        assert!(backend.accept(&bad).is_err());
    }
}
