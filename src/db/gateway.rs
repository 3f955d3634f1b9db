//! Persistence seam consumed by the analysis pipeline.
//!
//! The pipeline never touches SQL directly — it talks to this trait, which
//! keeps row-level failure handling (log and continue) testable with mocks
//! and keeps the storage engine swappable.

use std::sync::Mutex;

use rusqlite::Connection;
use uuid::Uuid;

use super::repository;
use super::DatabaseError;
use crate::models::{Document, Parameter};

pub trait PersistenceGateway: Send + Sync {
    fn get_document(&self, document_id: Uuid, user_id: Uuid) -> Result<Document, DatabaseError>;

    fn insert_parameter(&self, param: &Parameter) -> Result<(), DatabaseError>;

    /// Idempotent overwrite of the stored analysis text.
    fn update_document_analysis(
        &self,
        document_id: Uuid,
        analysis: &str,
    ) -> Result<(), DatabaseError>;

    /// Most recent measurements for the user, newest first, bounded.
    fn recent_parameters(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Parameter>, DatabaseError>;
}

/// SQLite-backed gateway over a single connection.
///
/// rusqlite connections are `!Sync`; the mutex serializes access so the
/// gateway can be shared behind `Arc<dyn PersistenceGateway>`.
pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl SqliteGateway {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&conn)
    }
}

impl PersistenceGateway for SqliteGateway {
    fn get_document(&self, document_id: Uuid, user_id: Uuid) -> Result<Document, DatabaseError> {
        self.with_conn(|conn| repository::get_document(conn, document_id, user_id))
    }

    fn insert_parameter(&self, param: &Parameter) -> Result<(), DatabaseError> {
        self.with_conn(|conn| repository::insert_parameter(conn, param))
    }

    fn update_document_analysis(
        &self,
        document_id: Uuid,
        analysis: &str,
    ) -> Result<(), DatabaseError> {
        self.with_conn(|conn| repository::update_document_analysis(conn, document_id, analysis))
    }

    fn recent_parameters(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Parameter>, DatabaseError> {
        self.with_conn(|conn| repository::recent_parameters(conn, user_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveDate;

    #[test]
    fn gateway_roundtrip() {
        let gateway = SqliteGateway::new(open_memory_database().unwrap());
        let user_id = Uuid::new_v4();
        let doc = Document {
            id: Uuid::new_v4(),
            user_id,
            filename: "morfologia.pdf".into(),
            filepath: "morfologia.pdf".into(),
            symptoms: String::new(),
            chronic_diseases: String::new(),
            medications: String::new(),
            analysis: None,
            upload_date: NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        };
        gateway
            .with_conn(|conn| repository::insert_document(conn, &doc))
            .unwrap();

        gateway
            .insert_parameter(&Parameter {
                id: Uuid::new_v4(),
                user_id,
                document_id: doc.id,
                name: "Leukocyty".into(),
                value: "6.1 tys/µl".into(),
                comment: "Norma 4-10".into(),
                measurement_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            })
            .unwrap();

        gateway
            .update_document_analysis(doc.id, "<p>analiza</p>")
            .unwrap();

        let fetched = gateway.get_document(doc.id, user_id).unwrap();
        assert_eq!(fetched.analysis.as_deref(), Some("<p>analiza</p>"));

        let recent = gateway.recent_parameters(user_id, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "Leukocyty");
    }

    #[test]
    fn gateway_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteGateway>();
    }
}
