use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "LabTrend";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/LabTrend/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("LabTrend")
}

/// Default SQLite database path.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("labtrend.db")
}

/// Process-wide scratch root for intermediate page rasters. Each analysis
/// run creates its own unique subdirectory under this root and removes it
/// when done, so concurrent runs never collide on filenames.
pub fn scratch_root() -> PathBuf {
    std::env::temp_dir().join("labtrend-scratch")
}

/// Runtime settings resolved once at process start from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    /// API key for the OpenAI-compatible completion endpoint. None means
    /// the vision backend and the structuring step are unconfigured.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub vision_model: String,
    /// Directory holding Tesseract traineddata files.
    pub tessdata_dir: Option<PathBuf>,
    /// DPI used when rasterizing PDF pages for OCR.
    pub raster_dpi: u32,
    /// Timeout applied to every LLM request.
    pub llm_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("LABTREND_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_database_path()),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_base_url: std::env::var("LABTREND_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            chat_model: std::env::var("LABTREND_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4o".into()),
            vision_model: std::env::var("LABTREND_VISION_MODEL")
                .unwrap_or_else(|_| "gpt-4o".into()),
            tessdata_dir: std::env::var("TESSDATA_DIR").ok().map(PathBuf::from),
            raster_dpi: 300,
            llm_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("LabTrend"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = default_database_path();
        assert!(db.starts_with(app_data_dir()));
    }

    #[test]
    fn scratch_root_under_temp() {
        assert!(scratch_root().starts_with(std::env::temp_dir()));
    }

    #[test]
    fn app_name_is_labtrend() {
        assert_eq!(APP_NAME, "LabTrend");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
