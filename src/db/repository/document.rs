use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Document;

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, user_id, filename, filepath, symptoms,
         chronic_diseases, medications, analysis, upload_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            doc.id.to_string(),
            doc.user_id.to_string(),
            doc.filename,
            doc.filepath,
            doc.symptoms,
            doc.chronic_diseases,
            doc.medications,
            doc.analysis,
            doc.upload_date.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// Fetch a document scoped to its owner. Other users' documents are
/// indistinguishable from missing ones.
pub fn get_document(
    conn: &Connection,
    document_id: Uuid,
    user_id: Uuid,
) -> Result<Document, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, filename, filepath, symptoms, chronic_diseases,
             medications, analysis, upload_date
             FROM documents WHERE id = ?1 AND user_id = ?2",
            params![document_id.to_string(), user_id.to_string()],
            doc_row_from_rusqlite,
        )
        .optional()?;

    match row {
        Some(r) => doc_from_row(r),
        None => Err(DatabaseError::NotFound {
            entity_type: "document".into(),
            id: document_id.to_string(),
        }),
    }
}

/// Overwrite the stored analysis text. Idempotent: repeated calls with the
/// same text are indistinguishable from a single call.
pub fn update_document_analysis(
    conn: &Connection,
    document_id: Uuid,
    analysis: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE documents SET analysis = ?1 WHERE id = ?2",
        params![analysis, document_id.to_string()],
    )?;
    Ok(())
}

/// Delete a document and its parameters.
pub fn delete_document(conn: &Connection, document_id: Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM parameters WHERE document_id = ?1",
        params![document_id.to_string()],
    )?;
    conn.execute(
        "DELETE FROM documents WHERE id = ?1",
        params![document_id.to_string()],
    )?;
    Ok(())
}

/// Delete every document and parameter belonging to a user.
pub fn delete_user_data(conn: &Connection, user_id: Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM parameters WHERE user_id = ?1",
        params![user_id.to_string()],
    )?;
    conn.execute(
        "DELETE FROM documents WHERE user_id = ?1",
        params![user_id.to_string()],
    )?;
    Ok(())
}

// Internal row type for Document mapping
struct DocRow {
    id: String,
    user_id: String,
    filename: String,
    filepath: String,
    symptoms: String,
    chronic_diseases: String,
    medications: String,
    analysis: Option<String>,
    upload_date: String,
}

fn doc_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DocRow, rusqlite::Error> {
    Ok(DocRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        filename: row.get(2)?,
        filepath: row.get(3)?,
        symptoms: row.get(4)?,
        chronic_diseases: row.get(5)?,
        medications: row.get(6)?,
        analysis: row.get(7)?,
        upload_date: row.get(8)?,
    })
}

fn doc_from_row(row: DocRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        user_id: Uuid::parse_str(&row.user_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        filename: row.filename,
        filepath: row.filepath,
        symptoms: row.symptoms,
        chronic_diseases: row.chronic_diseases,
        medications: row.medications,
        analysis: row.analysis,
        upload_date: NaiveDateTime::parse_from_str(&row.upload_date, DATETIME_FMT)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
    })
}
