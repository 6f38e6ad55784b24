//! Search query construction.
//!
//! Criteria become a conjunction of parameterized predicates; user input is
//! only ever passed as bind parameters.

use medlink_core::{SearchCriteria, normalize_str, parse_iso_date};
use medlink_storage::{MAX_SEARCH_RESULTS, StorageError};

use super::{BuiltQuery, PATIENT_COLUMNS, SqlValue};

/// Accumulates `AND`ed predicates and their parameters.
#[derive(Debug)]
struct PredicateBuilder {
    predicates: Vec<String>,
    params: Vec<SqlValue>,
}

impl PredicateBuilder {
    fn for_hospital(hospital: &str) -> Self {
        Self {
            predicates: vec!["hospital = $1".to_string()],
            params: vec![SqlValue::Text(hospital.to_string())],
        }
    }

    /// Adds a parameter and returns its placeholder index.
    fn param(&mut self, value: SqlValue) -> usize {
        self.params.push(value);
        self.params.len()
    }

    fn eq(&mut self, column: &str, value: Option<&str>) {
        if let Some(v) = value {
            let idx = self.param(SqlValue::Text(v.to_string()));
            self.predicates.push(format!("{column} = ${idx}"));
        }
    }

    /// Case-insensitive substring match against any of `columns`.
    fn contains_any(&mut self, columns: &[&str], value: Option<&str>) {
        if let Some(v) = value {
            let idx = self.param(SqlValue::Text(format!("%{}%", escape_like(v))));
            let clauses: Vec<String> = columns
                .iter()
                .map(|c| format!("{c} ILIKE ${idx}"))
                .collect();
            if clauses.len() == 1 {
                self.predicates.push(clauses.join(""));
            } else {
                self.predicates.push(format!("({})", clauses.join(" OR ")));
            }
        }
    }

    fn finish(self, suffix: &str) -> BuiltQuery {
        BuiltQuery {
            sql: format!(
                "SELECT {PATIENT_COLUMNS} FROM patients WHERE {}{suffix}",
                self.predicates.join(" AND ")
            ),
            params: self.params,
        }
    }
}

/// Escapes the LIKE wildcards so `value` matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the tenant search: newest first, at most [`MAX_SEARCH_RESULTS`].
///
/// # Errors
///
/// Returns `StorageError::InvalidCriteria` for a malformed date of birth.
pub fn build_search_query(
    hospital: &str,
    criteria: &SearchCriteria,
) -> Result<BuiltQuery, StorageError> {
    let mut builder = PredicateBuilder::for_hospital(hospital);

    builder.eq("national_id", criteria.national_id());
    builder.eq("passport_id", criteria.passport_id());
    builder.contains_any(&["first_name_th", "first_name_en"], criteria.first_name());
    builder.contains_any(&["middle_name_th", "middle_name_en"], criteria.middle_name());
    builder.contains_any(&["last_name_th", "last_name_en"], criteria.last_name());
    builder.contains_any(&["phone_number"], criteria.phone_number());
    builder.contains_any(&["email"], criteria.email());

    if let Some(raw) = criteria.date_of_birth() {
        let date =
            parse_iso_date(raw).map_err(|e| StorageError::invalid_criteria(e.to_string()))?;
        let idx = builder.param(SqlValue::Date(date));
        builder.predicates.push(format!("date_of_birth = ${idx}"));
    }

    Ok(builder.finish(&format!(" ORDER BY id DESC LIMIT {MAX_SEARCH_RESULTS}")))
}

/// Builds the identifier-only lookup, an OR across whichever identifiers
/// are present. Returns `None` when neither is, meaning "nothing to query".
pub fn build_identifier_query(
    hospital: &str,
    national_id: Option<&str>,
    passport_id: Option<&str>,
) -> Option<BuiltQuery> {
    let national_id = national_id.and_then(normalize_str);
    let passport_id = passport_id.and_then(normalize_str);
    if national_id.is_none() && passport_id.is_none() {
        return None;
    }

    let mut params = vec![SqlValue::Text(hospital.to_string())];
    let mut clauses = Vec::with_capacity(2);
    for (column, value) in [("national_id", national_id), ("passport_id", passport_id)] {
        if let Some(v) = value {
            params.push(SqlValue::Text(v));
            clauses.push(format!("{column} = ${}", params.len()));
        }
    }

    Some(BuiltQuery {
        sql: format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE hospital = $1 AND ({}) LIMIT 1",
            clauses.join(" OR ")
        ),
        params,
    })
}
