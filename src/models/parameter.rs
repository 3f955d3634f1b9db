use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted lab measurement, tied to the user and the source document.
///
/// `value` keeps the exact string the structuring step produced (units and
/// formatting included) — trend charting downstream parses it as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub name: String,
    pub value: String,
    /// Reference range, abnormality flags, free-text notes. May be empty.
    pub comment: String,
    pub measurement_date: NaiveDate,
}

impl Parameter {
    /// Condensed one-line rendering used when feeding prior measurements
    /// back into a structuring or summary prompt.
    pub fn as_history_line(&self) -> String {
        format!(
            "{}: {} ({}) - data: {}",
            self.name, self.value, self.comment, self.measurement_date
        )
    }
}
