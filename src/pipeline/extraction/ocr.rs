use std::path::Path;

use super::types::OcrEngine;
use super::BackendFailure;

/// Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    tessdata_dir: Option<std::path::PathBuf>,
    languages: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// Initialize, picking OCR languages from the available traineddata.
    /// Lab reports in this product are Polish-first; English is kept as a
    /// secondary pass for mixed-language printouts.
    pub fn new(tessdata_dir: Option<&Path>) -> Result<Self, BackendFailure> {
        let languages = match tessdata_dir {
            Some(dir) => {
                if !dir.join("eng.traineddata").exists() && !dir.join("pol.traineddata").exists() {
                    return Err(BackendFailure::Unavailable(format!(
                        "no traineddata found at {}",
                        dir.display()
                    )));
                }
                let has_pol = dir.join("pol.traineddata").exists();
                let has_eng = dir.join("eng.traineddata").exists();
                match (has_pol, has_eng) {
                    (true, true) => {
                        tracing::info!("Polish traineddata found, defaulting to pol+eng");
                        "pol+eng".to_string()
                    }
                    (true, false) => "pol".to_string(),
                    (false, _) => {
                        tracing::warn!(
                            "No Polish traineddata at {}, using English only",
                            dir.display()
                        );
                        "eng".to_string()
                    }
                }
            }
            // System tessdata: assume the standard install carries Polish
            None => "pol+eng".to_string(),
        };

        Ok(Self {
            tessdata_dir: tessdata_dir.map(|p| p.to_path_buf()),
            languages,
        })
    }

    /// Set language(s) for OCR (e.g., "pol", "pol+eng")
    pub fn with_languages(mut self, langs: &str) -> Self {
        self.languages = langs.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn ocr_image(&self, image_path: &Path) -> Result<String, BackendFailure> {
        let tessdata = match self.tessdata_dir.as_ref() {
            Some(dir) => Some(dir.to_str().ok_or_else(|| {
                BackendFailure::Unavailable("invalid tessdata path".to_string())
            })?),
            None => None,
        };

        let path_str = image_path
            .to_str()
            .ok_or_else(|| BackendFailure::Failed("invalid image path".to_string()))?;

        let mut tess = tesseract::Tesseract::new(tessdata, Some(self.languages.as_str()))
            .map_err(|e| BackendFailure::Unavailable(format!("Tesseract init failed: {e:?}")))?
            .set_image(path_str)
            .map_err(|e| BackendFailure::Failed(format!("Tesseract could not read image: {e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| BackendFailure::Failed(format!("OCR failed: {e:?}")))?;

        Ok(text)
    }
}

/// Mock OCR engine for testing — returns a configured text, or fails.
pub struct MockOcrEngine {
    text: String,
    fail_with: Option<String>,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail_with: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            text: String::new(),
            fail_with: Some(reason.to_string()),
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_path: &Path) -> Result<String, BackendFailure> {
        match &self.fail_with {
            Some(reason) => Err(BackendFailure::Failed(reason.clone())),
            None => Ok(self.text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_configured_text() {
        let ocr = MockOcrEngine::new("Glukoza 95 mg/dl");
        let text = ocr.ocr_image(Path::new("whatever.png")).unwrap();
        assert_eq!(text, "Glukoza 95 mg/dl");
    }

    #[test]
    fn mock_failing_variant() {
        let ocr = MockOcrEngine::failing("blurry scan");
        let err = ocr.ocr_image(Path::new("whatever.png")).unwrap_err();
        assert!(matches!(err, BackendFailure::Failed(r) if r == "blurry scan"));
    }

    #[cfg(feature = "ocr")]
    #[test]
    fn tesseract_missing_traineddata_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = TesseractOcr::new(Some(dir.path()));
        assert!(matches!(result, Err(BackendFailure::Unavailable(_))));
    }
}
