//! Vision-model extraction — the most capable and the most expensive path.
//!
//! Sends the uploaded image, or every rendered page of a PDF, as inline
//! base64 data URIs in a single request and asks for a complete HTML-table
//! analysis. The response is a direct analysis: the orchestrator skips the
//! separate structuring step entirely.

use std::sync::Arc;

use base64::Engine as _;

use super::format::{detect_kind, DocumentKind};
use super::types::{BackendOutput, ExtractionBackend, ExtractionRequest, PdfPageRenderer};
use super::BackendFailure;
use crate::pipeline::structuring::client::ChatClient;
use crate::pipeline::structuring::prompt::build_vision_prompt;

pub struct VisionModelBackend {
    client: Option<Arc<dyn ChatClient>>,
    renderer: Option<Arc<dyn PdfPageRenderer>>,
    dpi: u32,
}

impl VisionModelBackend {
    pub fn new(
        client: Option<Arc<dyn ChatClient>>,
        renderer: Option<Arc<dyn PdfPageRenderer>>,
        dpi: u32,
    ) -> Self {
        Self {
            client,
            renderer,
            dpi,
        }
    }

    fn encode_document(&self, req: &ExtractionRequest<'_>) -> Result<Vec<String>, BackendFailure> {
        match detect_kind(req.document_path)? {
            DocumentKind::Image => {
                let bytes = std::fs::read(req.document_path)
                    .map_err(|e| BackendFailure::Failed(format!("cannot read document: {e}")))?;
                Ok(vec![encode_data_uri(&bytes)])
            }
            DocumentKind::Pdf => {
                let renderer = self.renderer.as_deref().ok_or_else(|| {
                    BackendFailure::Unavailable(
                        "PDF rasterization unavailable — cannot send pages to the vision model"
                            .into(),
                    )
                })?;
                let pdf_bytes = std::fs::read(req.document_path)
                    .map_err(|e| BackendFailure::Failed(format!("cannot read document: {e}")))?;

                let page_count = renderer.page_count(&pdf_bytes)?;
                if page_count == 0 {
                    return Err(BackendFailure::Failed("PDF has no pages".into()));
                }

                let mut uris = Vec::with_capacity(page_count);
                for page in 0..page_count {
                    let png = renderer.render_page(&pdf_bytes, page, self.dpi)?;
                    uris.push(encode_data_uri(&png));
                }
                Ok(uris)
            }
            DocumentKind::Unsupported => Err(BackendFailure::Failed(
                "unsupported file format for vision analysis".into(),
            )),
        }
    }
}

impl ExtractionBackend for VisionModelBackend {
    fn name(&self) -> &'static str {
        "vision-model"
    }

    fn attempt(&self, req: &ExtractionRequest<'_>) -> Result<BackendOutput, BackendFailure> {
        let client = self.client.as_deref().ok_or_else(|| {
            BackendFailure::Unavailable("vision model client not configured".into())
        })?;

        let images = self.encode_document(req)?;
        let prompt = build_vision_prompt(req.patient);

        tracing::info!(images = images.len(), "Sending document to vision model");

        let analysis = client
            .complete_with_images(&prompt, &images)
            .map_err(|e| BackendFailure::Failed(format!("vision model request failed: {e}")))?;

        if analysis.trim().is_empty() {
            return Err(BackendFailure::Failed(
                "vision model returned an empty analysis".into(),
            ));
        }

        Ok(BackendOutput {
            text: analysis,
            is_direct_analysis: true,
        })
    }

    /// The response is a complete semantic analysis, not raw text — no
    /// readability check applies.
    fn accept(&self, _output: &BackendOutput) -> Result<(), String> {
        Ok(())
    }
}

/// Sniff the image MIME type from the base64 prefix rather than trusting
/// the file extension. JPEG defaults cover unknown formats.
pub fn sniff_mime_from_base64(b64: &str) -> &'static str {
    if b64.starts_with("iVBORw0KGgo") {
        "image/png"
    } else if b64.starts_with("R0lGODlh") {
        "image/gif"
    } else {
        // "/9j/" (JPEG) and everything else
        "image/jpeg"
    }
}

/// Encode image bytes as a data URI with a sniffed MIME type.
pub fn encode_data_uri(bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", sniff_mime_from_base64(&b64), b64)
}
