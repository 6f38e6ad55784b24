//! SQL for the PostgreSQL patient store, organized by operation.

pub mod search;
pub mod upsert;

use medlink_core::{Patient, PatientProfile};
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;

pub use search::{build_identifier_query, build_search_query};
pub use upsert::{ConflictKey, upsert_statement};

/// Column list shared by every statement that returns patients.
pub const PATIENT_COLUMNS: &str = "id, hospital, first_name_th, middle_name_th, last_name_th, \
     first_name_en, middle_name_en, last_name_en, date_of_birth, patient_hn, \
     national_id, passport_id, phone_number, email, gender";

/// A bind parameter of a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Date(chrono::NaiveDate),
}

/// SQL text plus its positional parameters (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Converts a row selected with [`PATIENT_COLUMNS`] to a `Patient`.
pub fn row_to_patient(row: &PgRow) -> Result<Patient, SqlxError> {
    Ok(Patient {
        id: row.try_get("id")?,
        hospital: row.try_get("hospital")?,
        profile: PatientProfile {
            first_name_th: row.try_get("first_name_th")?,
            middle_name_th: row.try_get("middle_name_th")?,
            last_name_th: row.try_get("last_name_th")?,
            first_name_en: row.try_get("first_name_en")?,
            middle_name_en: row.try_get("middle_name_en")?,
            last_name_en: row.try_get("last_name_en")?,
            date_of_birth: row.try_get("date_of_birth")?,
            patient_hn: row.try_get("patient_hn")?,
            national_id: row.try_get("national_id")?,
            passport_id: row.try_get("passport_id")?,
            phone_number: row.try_get("phone_number")?,
            email: row.try_get("email")?,
            gender: row.try_get("gender")?,
        },
    })
}
