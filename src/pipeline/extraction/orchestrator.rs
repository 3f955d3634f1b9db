//! Cascading extraction over a prioritized backend list.
//!
//! Fixed ordering: vision model (most capable, most expensive — only useful
//! when configured) → direct text (deterministic and lossless for digital
//! PDFs) → raster OCR (last resort for scans). One pass, no retries; a
//! failure or a gate rejection just advances the chain.

use std::sync::Arc;

use super::direct_text::DirectTextBackend;
use super::raster_ocr::RasterOcrBackend;
use super::types::{
    ExtractionBackend, ExtractionRequest, ExtractionResult, OcrEngine, PdfPageRenderer,
};
use super::vision::VisionModelBackend;
use super::{BackendAttempt, ExtractionError};
use crate::config::Settings;
use crate::pipeline::structuring::client::ChatClient;

pub struct ExtractionOrchestrator {
    backends: Vec<Box<dyn ExtractionBackend>>,
}

impl ExtractionOrchestrator {
    pub fn new(backends: Vec<Box<dyn ExtractionBackend>>) -> Self {
        Self { backends }
    }

    /// Assemble the standard chain from injected components. `None`
    /// components leave their backend in the chain so a terminal failure
    /// still reports why that path was unavailable.
    pub fn standard(
        settings: &Settings,
        chat_client: Option<Arc<dyn ChatClient>>,
        renderer: Option<Arc<dyn PdfPageRenderer>>,
        ocr_engine: Option<Arc<dyn OcrEngine>>,
    ) -> Self {
        Self::new(vec![
            Box::new(VisionModelBackend::new(
                chat_client,
                renderer.clone(),
                settings.raster_dpi,
            )),
            Box::new(DirectTextBackend::new()),
            Box::new(RasterOcrBackend::new(
                renderer,
                ocr_engine,
                crate::config::scratch_root(),
                settings.raster_dpi,
            )),
        ])
    }

    /// Run the chain, returning the first backend output whose quality gate
    /// accepts it. Partial attempts are recorded and discarded, never
    /// merged. Fails only when every backend is exhausted.
    pub fn extract(
        &self,
        req: &ExtractionRequest<'_>,
    ) -> Result<ExtractionResult, ExtractionError> {
        let mut attempts = Vec::new();

        for backend in &self.backends {
            tracing::debug!(backend = backend.name(), "Attempting extraction");

            match backend.attempt(req) {
                Ok(output) => match backend.accept(&output) {
                    Ok(()) => {
                        tracing::info!(
                            backend = backend.name(),
                            text_length = output.text.len(),
                            is_direct_analysis = output.is_direct_analysis,
                            "Extraction succeeded"
                        );
                        return Ok(ExtractionResult {
                            text: output.text,
                            method: backend.name(),
                            is_direct_analysis: output.is_direct_analysis,
                        });
                    }
                    Err(reason) => {
                        tracing::warn!(
                            backend = backend.name(),
                            reason = %reason,
                            "Output rejected by quality gate"
                        );
                        attempts.push(BackendAttempt {
                            backend: backend.name(),
                            failure: super::BackendFailure::Failed(reason),
                        });
                    }
                },
                Err(failure) => {
                    tracing::warn!(
                        backend = backend.name(),
                        failure = %failure,
                        "Backend attempt failed"
                    );
                    attempts.push(BackendAttempt {
                        backend: backend.name(),
                        failure,
                    });
                }
            }
        }

        Err(ExtractionError::AllBackendsExhausted { attempts })
    }
}
