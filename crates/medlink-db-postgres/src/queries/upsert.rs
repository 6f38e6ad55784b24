//! Upsert statements keyed on one of the per-hospital unique identifiers.

use super::PATIENT_COLUMNS;

/// Columns written by an upsert, in bind order after `hospital` ($1).
pub const UPSERT_COLUMNS: [&str; 13] = [
    "first_name_th",
    "middle_name_th",
    "last_name_th",
    "first_name_en",
    "middle_name_en",
    "last_name_en",
    "date_of_birth",
    "patient_hn",
    "national_id",
    "passport_id",
    "phone_number",
    "email",
    "gender",
];

/// Which partial unique index an upsert attempt resolves conflicts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKey {
    NationalId,
    PassportId,
}

impl ConflictKey {
    pub fn column(self) -> &'static str {
        match self {
            Self::NationalId => "national_id",
            Self::PassportId => "passport_id",
        }
    }
}

/// Builds `INSERT ... ON CONFLICT (hospital, <key>) WHERE <key> IS NOT NULL
/// DO UPDATE ... RETURNING`.
///
/// Every profile column is overwritten on conflict, including the other
/// identifier, so the stored row mirrors the latest HIS profile.
pub fn upsert_statement(key: ConflictKey) -> String {
    let target = key.column();
    let placeholders: Vec<String> = (1..=UPSERT_COLUMNS.len() + 1)
        .map(|i| format!("${i}"))
        .collect();
    let assignments: Vec<String> = UPSERT_COLUMNS
        .iter()
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();

    format!(
        "INSERT INTO patients (hospital, {columns}) VALUES ({values}) \
         ON CONFLICT (hospital, {target}) WHERE {target} IS NOT NULL \
         DO UPDATE SET {assignments}, updated_at = now() \
         RETURNING {PATIENT_COLUMNS}",
        columns = UPSERT_COLUMNS.join(", "),
        values = placeholders.join(", "),
        assignments = assignments.join(", "),
    )
}
