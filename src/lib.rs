//! LabTrend extraction core.
//!
//! Turns uploaded lab-result documents (PDF or image) into structured
//! parameter records: a cascading extraction chain (vision model → direct
//! text → raster OCR) produces text, a language model structures it into an
//! HTML result table, and a tolerant parser persists the rows for trend
//! charting. Upload handling, the REST surface, and the UI live in the
//! surrounding application; this crate owns everything between a stored
//! file and its parameter rows.

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the embedding binary. RUST_LOG overrides the
/// default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
