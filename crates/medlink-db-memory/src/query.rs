//! Criteria evaluation against in-memory rows.

use chrono::NaiveDate;
use medlink_core::{Patient, SearchCriteria, parse_iso_date};
use medlink_storage::StorageError;

/// A compiled set of criteria, ready to test rows against.
#[derive(Debug, Clone)]
pub struct CriteriaFilter {
    national_id: Option<String>,
    passport_id: Option<String>,
    first_name: Option<String>,
    middle_name: Option<String>,
    last_name: Option<String>,
    date_of_birth: Option<NaiveDate>,
    phone_number: Option<String>,
    email: Option<String>,
}

impl CriteriaFilter {
    /// Compiles `criteria`. Substring needles are lowercased once here.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidCriteria` for a malformed date of birth.
    pub fn compile(criteria: &SearchCriteria) -> Result<Self, StorageError> {
        let date_of_birth = criteria
            .date_of_birth()
            .map(parse_iso_date)
            .transpose()
            .map_err(|e| StorageError::invalid_criteria(e.to_string()))?;

        Ok(Self {
            national_id: criteria.national_id().map(str::to_string),
            passport_id: criteria.passport_id().map(str::to_string),
            first_name: criteria.first_name().map(str::to_lowercase),
            middle_name: criteria.middle_name().map(str::to_lowercase),
            last_name: criteria.last_name().map(str::to_lowercase),
            date_of_birth,
            phone_number: criteria.phone_number().map(str::to_lowercase),
            email: criteria.email().map(str::to_lowercase),
        })
    }

    /// Returns `true` if `patient` satisfies every present criterion.
    pub fn matches(&self, patient: &Patient) -> bool {
        let p = &patient.profile;

        exact(self.national_id.as_deref(), p.national_id.as_deref())
            && exact(self.passport_id.as_deref(), p.passport_id.as_deref())
            && either_script(
                self.first_name.as_deref(),
                p.first_name_th.as_deref(),
                p.first_name_en.as_deref(),
            )
            && either_script(
                self.middle_name.as_deref(),
                p.middle_name_th.as_deref(),
                p.middle_name_en.as_deref(),
            )
            && either_script(
                self.last_name.as_deref(),
                p.last_name_th.as_deref(),
                p.last_name_en.as_deref(),
            )
            && self.date_of_birth.is_none_or(|d| p.date_of_birth == Some(d))
            && contains(self.phone_number.as_deref(), p.phone_number.as_deref())
            && contains(self.email.as_deref(), p.email.as_deref())
    }
}

fn exact(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|w| actual == Some(w))
}

/// `needle` must already be lowercase.
fn contains(needle: Option<&str>, haystack: Option<&str>) -> bool {
    needle.is_none_or(|n| haystack.is_some_and(|h| h.to_lowercase().contains(n)))
}

fn either_script(needle: Option<&str>, thai: Option<&str>, english: Option<&str>) -> bool {
    needle.is_none_or(|_| contains(needle, thai) || contains(needle, english))
}
