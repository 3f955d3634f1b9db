use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patient::PatientContext;

/// One uploaded source file. Created by the upload collaborator; the
/// pipeline only reads it and fills in `analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Original filename as uploaded.
    pub filename: String,
    /// Storage path relative to the upload directory.
    pub filepath: String,
    pub symptoms: String,
    pub chronic_diseases: String,
    pub medications: String,
    /// Raw structuring output, persisted for re-display. Once set it is an
    /// immutable cache: the pipeline returns it without re-extracting.
    pub analysis: Option<String>,
    pub upload_date: NaiveDateTime,
}

impl Document {
    pub fn patient_context(&self) -> PatientContext {
        PatientContext {
            symptoms: self.symptoms.clone(),
            chronic_diseases: self.chronic_diseases.clone(),
            medications: self.medications.clone(),
        }
    }
}
