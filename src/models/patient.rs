use serde::{Deserialize, Serialize};

/// Free-text patient context attached to a document at upload time.
/// Any field may be empty; prompts render empty fields as "brak".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContext {
    pub symptoms: String,
    pub chronic_diseases: String,
    pub medications: String,
}

impl PatientContext {
    pub fn symptoms_or_none(&self) -> &str {
        non_empty_or_brak(&self.symptoms)
    }

    pub fn chronic_diseases_or_none(&self) -> &str {
        non_empty_or_brak(&self.chronic_diseases)
    }

    pub fn medications_or_none(&self) -> &str {
        non_empty_or_brak(&self.medications)
    }
}

fn non_empty_or_brak(s: &str) -> &str {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        "brak"
    } else {
        trimmed
    }
}
