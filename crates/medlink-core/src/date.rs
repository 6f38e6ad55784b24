//! Calendar dates in ISO `YYYY-MM-DD` form.

use chrono::NaiveDate;

use crate::error::{CoreError, Result};

const ISO_DATE: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` date. Surrounding whitespace is ignored.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, ISO_DATE).map_err(|_| CoreError::invalid_date(trimmed))
}

/// Parses an optional date, degrading blank or malformed input to `None`.
pub fn parse_iso_date_lenient(value: Option<&str>) -> Option<NaiveDate> {
    value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| parse_iso_date(v).ok())
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}
