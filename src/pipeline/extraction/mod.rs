pub mod direct_text;
pub mod format;
pub mod ocr;
pub mod orchestrator;
pub mod pdf;
pub mod pdfium;
pub mod raster_ocr;
pub mod types;
pub mod vision;

pub use format::*;
pub use orchestrator::*;
pub use types::*;

use thiserror::Error;

/// Why a single backend attempt produced nothing usable.
///
/// `Unavailable` means the environment or configuration lacks a required
/// tool (rasterizer missing, vision client unconfigured) — the user can fix
/// the deployment, not the document. `Failed` means the backend ran but the
/// document's content defeated it.
#[derive(Error, Debug, Clone)]
pub enum BackendFailure {
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// Record of one backend attempt within an extraction run.
#[derive(Debug, Clone)]
pub struct BackendAttempt {
    pub backend: &'static str,
    pub failure: BackendFailure,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Terminal: every backend in the chain failed or produced unusable
    /// text. Carries per-backend reasons so the caller can tell the user
    /// what to fix (re-upload as image, configure the vision client, ...).
    #[error("no extraction method produced usable text: {}", attempts_summary(.attempts))]
    AllBackendsExhausted { attempts: Vec<BackendAttempt> },
}

fn attempts_summary(attempts: &[BackendAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.backend, a.failure))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_error_lists_every_backend() {
        let err = ExtractionError::AllBackendsExhausted {
            attempts: vec![
                BackendAttempt {
                    backend: "vision-model",
                    failure: BackendFailure::Unavailable("client not configured".into()),
                },
                BackendAttempt {
                    backend: "direct-text",
                    failure: BackendFailure::Failed("no extractable text layer".into()),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("vision-model: unavailable: client not configured"));
        assert!(msg.contains("direct-text: no extractable text layer"));
    }
}
