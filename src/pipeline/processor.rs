//! Document analysis pipeline.
//!
//! Single entry point that drives extraction → structuring → table parsing
//! → row persistence for one document, run to completion within the
//! triggering request. Trait-based DI throughout (backends, chat client,
//! persistence gateway) keeps the whole flow testable with mocks.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Settings;
use crate::db::{DatabaseError, PersistenceGateway};
use crate::models::Parameter;
use crate::pipeline::extraction::pdfium::PdfiumRenderer;
use crate::pipeline::extraction::types::{OcrEngine, PdfPageRenderer};
use crate::pipeline::extraction::{ExtractionError, ExtractionOrchestrator, ExtractionRequest};
use crate::pipeline::structuring::client::{ChatClient, OpenAiClient};
use crate::pipeline::structuring::parser::{parse_analysis, ParameterCandidate};
use crate::pipeline::structuring::prompt::{
    build_analysis_prompt, ANALYST_SYSTEM_PROMPT, RECENT_HISTORY_WINDOW,
};
use crate::pipeline::structuring::StructuringError;

// ---------------------------------------------------------------------------
// Error and result types
// ---------------------------------------------------------------------------

/// Errors that abort a whole analysis run. Row-level and backend-level
/// problems are absorbed earlier and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("document {0} not found")]
    DocumentNotFound(Uuid),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("analysis failed: {0}")]
    Structuring(#[from] StructuringError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Soft signals attached to an otherwise successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnalysisWarning {
    /// The structuring output carried no parseable table rows. The analysis
    /// text is still stored — the prose interpretation has value on its own.
    NoStructuredRows,
    /// One row could not be persisted; its siblings were unaffected.
    RowPersistenceFailed { parameter: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub document_id: Uuid,
    /// Full analysis text as stored on the document.
    pub analysis: String,
    /// Prose outside the result table, tags stripped.
    pub interpretation: String,
    /// Extraction backend that produced the text; None for cache hits.
    pub method: Option<&'static str>,
    pub from_cache: bool,
    pub rows_inserted: usize,
    pub rows_skipped: usize,
    pub warnings: Vec<AnalysisWarning>,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

pub struct DocumentAnalyzer {
    orchestrator: ExtractionOrchestrator,
    chat: Option<Arc<dyn ChatClient>>,
    gateway: Arc<dyn PersistenceGateway>,
    /// Directory the upload collaborator stores files under; joined with
    /// each document's `filepath`.
    upload_dir: PathBuf,
}

impl DocumentAnalyzer {
    pub fn new(
        orchestrator: ExtractionOrchestrator,
        chat: Option<Arc<dyn ChatClient>>,
        gateway: Arc<dyn PersistenceGateway>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            orchestrator,
            chat,
            gateway,
            upload_dir,
        }
    }

    /// Composition root: build the analyzer with production components,
    /// degrading gracefully where the environment lacks a capability.
    pub fn from_settings(
        settings: &Settings,
        gateway: Arc<dyn PersistenceGateway>,
        upload_dir: PathBuf,
    ) -> Self {
        let chat: Option<Arc<dyn ChatClient>> = OpenAiClient::from_settings(settings)
            .map(|c| Arc::new(c) as Arc<dyn ChatClient>);
        if chat.is_none() {
            tracing::warn!("No API key configured — vision and structuring are disabled");
        }

        let renderer: Option<Arc<dyn PdfPageRenderer>> = match PdfiumRenderer::new() {
            Ok(r) => Some(Arc::new(r)),
            Err(e) => {
                tracing::warn!(error = %e, "PDF rasterization unavailable");
                None
            }
        };

        let orchestrator = ExtractionOrchestrator::standard(
            settings,
            chat.clone(),
            renderer,
            build_ocr_engine(settings),
        );

        Self::new(orchestrator, chat, gateway, upload_dir)
    }

    /// Analyze one document end to end.
    ///
    /// A document whose `analysis` is already set short-circuits before any
    /// extraction or LLM work and returns the stored value unchanged.
    pub fn analyze(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let document = self
            .gateway
            .get_document(document_id, user_id)
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AnalysisError::DocumentNotFound(document_id),
                other => AnalysisError::Database(other),
            })?;

        if let Some(cached) = &document.analysis {
            tracing::info!(document_id = %document_id, "Returning cached analysis");
            let interpretation = parse_analysis(cached).interpretation;
            return Ok(AnalysisOutcome {
                document_id,
                analysis: cached.clone(),
                interpretation,
                method: None,
                from_cache: true,
                rows_inserted: 0,
                rows_skipped: 0,
                warnings: Vec::new(),
            });
        }

        let document_path = self.upload_dir.join(&document.filepath);
        let patient = document.patient_context();

        tracing::info!(
            document_id = %document_id,
            path = %document_path.display(),
            "Starting document analysis"
        );

        let extraction = self.orchestrator.extract(&ExtractionRequest {
            document_path: &document_path,
            patient: &patient,
        })?;

        let (analysis_body, method_note) = if extraction.is_direct_analysis {
            (extraction.text, "Metoda analizy")
        } else {
            let chat = self
                .chat
                .as_deref()
                .ok_or(AnalysisError::Structuring(StructuringError::ClientUnconfigured))?;

            let history = match self.gateway.recent_parameters(user_id, RECENT_HISTORY_WINDOW) {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not load measurement history");
                    Vec::new()
                }
            };

            let prompt = build_analysis_prompt(&extraction.text, &patient, &history);
            let structured = chat.complete(ANALYST_SYSTEM_PROMPT, &prompt)?;
            (structured, "Metoda OCR")
        };

        let parsed = parse_analysis(&analysis_body);

        let mut warnings = Vec::new();
        if parsed.rows.is_empty() {
            tracing::warn!(document_id = %document_id, "No structured rows extracted");
            warnings.push(AnalysisWarning::NoStructuredRows);
        }

        let (rows_inserted, rows_skipped) =
            self.persist_rows(&parsed.rows, user_id, document_id, &mut warnings);

        // Stored even with zero rows — the interpretation alone has value.
        let analysis = format!(
            "{analysis_body}\n\n<p><small><strong>{method_note}:</strong> {}</small></p>",
            extraction.method
        );
        self.gateway.update_document_analysis(document_id, &analysis)?;

        tracing::info!(
            document_id = %document_id,
            method = extraction.method,
            rows_inserted,
            rows_skipped,
            "Document analysis complete"
        );

        Ok(AnalysisOutcome {
            document_id,
            analysis,
            interpretation: parsed.interpretation,
            method: Some(extraction.method),
            from_cache: false,
            rows_inserted,
            rows_skipped,
            warnings,
        })
    }

    /// Insert candidates one by one. A failing row is logged and skipped —
    /// one bad row must not drop the rest of the batch.
    fn persist_rows(
        &self,
        rows: &[ParameterCandidate],
        user_id: Uuid,
        document_id: Uuid,
        warnings: &mut Vec<AnalysisWarning>,
    ) -> (usize, usize) {
        let mut inserted = 0;
        let mut skipped = 0;

        for row in rows {
            let date = match NaiveDate::from_str(&row.date) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(
                        parameter = %row.name,
                        date = %row.date,
                        "Skipping row with unparseable measurement date"
                    );
                    skipped += 1;
                    warnings.push(AnalysisWarning::RowPersistenceFailed {
                        parameter: row.name.clone(),
                        reason: format!("invalid measurement date '{}': {e}", row.date),
                    });
                    continue;
                }
            };

            let param = Parameter {
                id: Uuid::new_v4(),
                user_id,
                document_id,
                name: row.name.clone(),
                value: row.value.clone(),
                comment: row.comment.clone(),
                measurement_date: date,
            };

            match self.gateway.insert_parameter(&param) {
                Ok(()) => inserted += 1,
                Err(e) => {
                    tracing::warn!(
                        parameter = %row.name,
                        error = %e,
                        "Parameter insert failed, continuing with remaining rows"
                    );
                    skipped += 1;
                    warnings.push(AnalysisWarning::RowPersistenceFailed {
                        parameter: row.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        (inserted, skipped)
    }
}

#[cfg(feature = "ocr")]
fn build_ocr_engine(settings: &Settings) -> Option<Arc<dyn OcrEngine>> {
    match crate::pipeline::extraction::ocr::TesseractOcr::new(settings.tessdata_dir.as_deref()) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            tracing::warn!(error = %e, "OCR engine unavailable");
            None
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn build_ocr_engine(_settings: &Settings) -> Option<Arc<dyn OcrEngine>> {
    tracing::debug!("Built without the `ocr` feature — raster OCR disabled");
    None
}
