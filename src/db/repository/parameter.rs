use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Parameter;

/// Append one measurement row. No dedup/upsert: re-analysis of the same
/// document inserts fresh rows (see DESIGN.md).
pub fn insert_parameter(conn: &Connection, param: &Parameter) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO parameters (id, user_id, document_id, parameter_name,
         parameter_value, parameter_comment, measurement_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            param.id.to_string(),
            param.user_id.to_string(),
            param.document_id.to_string(),
            param.name,
            param.value,
            param.comment,
            param.measurement_date.to_string(),
        ],
    )?;
    Ok(())
}

/// All measurements for a user in chronological order — the trend-chart feed.
pub fn parameters_for_user(
    conn: &Connection,
    user_id: Uuid,
) -> Result<Vec<Parameter>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, document_id, parameter_name, parameter_value,
         parameter_comment, measurement_date
         FROM parameters WHERE user_id = ?1 ORDER BY measurement_date",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok(param_row_from_rusqlite(row))
    })?;

    let mut parameters = Vec::new();
    for row in rows {
        parameters.push(param_from_row(row??)?);
    }
    Ok(parameters)
}

/// The user's most recent measurements, newest first. Feeds longitudinal
/// context back into structuring prompts.
pub fn recent_parameters(
    conn: &Connection,
    user_id: Uuid,
    limit: usize,
) -> Result<Vec<Parameter>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, document_id, parameter_name, parameter_value,
         parameter_comment, measurement_date
         FROM parameters WHERE user_id = ?1
         ORDER BY measurement_date DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![user_id.to_string(), limit as i64], |row| {
        Ok(param_row_from_rusqlite(row))
    })?;

    let mut parameters = Vec::new();
    for row in rows {
        parameters.push(param_from_row(row??)?);
    }
    Ok(parameters)
}

// Internal row type for Parameter mapping
struct ParamRow {
    id: String,
    user_id: String,
    document_id: String,
    name: String,
    value: String,
    comment: String,
    measurement_date: String,
}

fn param_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ParamRow, rusqlite::Error> {
    Ok(ParamRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        document_id: row.get(2)?,
        name: row.get(3)?,
        value: row.get(4)?,
        comment: row.get(5)?,
        measurement_date: row.get(6)?,
    })
}

fn param_from_row(row: ParamRow) -> Result<Parameter, DatabaseError> {
    Ok(Parameter {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        user_id: Uuid::parse_str(&row.user_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        document_id: Uuid::parse_str(&row.document_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        value: row.value,
        comment: row.comment,
        measurement_date: NaiveDate::from_str(&row.measurement_date)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
    })
}
