//! Blank-as-absent normalization.
//!
//! Every optional text field crossing into the domain goes through here:
//! surrounding whitespace is trimmed, and a value that is empty after
//! trimming becomes `None`.

use crate::criteria::{RawSearchCriteria, SearchCriteria};

/// Trims `value`, returning `None` when nothing is left.
pub fn normalize_str(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes an optional field. Never fails.
pub fn normalize_field(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(normalize_str)
}

/// Returns `true` for `None`, `""` and whitespace-only strings.
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Cleans a raw search request into canonical criteria.
pub fn normalize(raw: RawSearchCriteria) -> SearchCriteria {
    SearchCriteria::default()
        .with_national_id(raw.national_id)
        .with_passport_id(raw.passport_id)
        .with_first_name(raw.first_name)
        .with_middle_name(raw.middle_name)
        .with_last_name(raw.last_name)
        .with_date_of_birth(raw.date_of_birth)
        .with_phone_number(raw.phone_number)
        .with_email(raw.email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_str() {
        assert_eq!(normalize_str("  John "), Some("John".to_string()));
        assert_eq!(normalize_str(""), None);
        assert_eq!(normalize_str(" \t\n "), None);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some(" x ")));
    }

    #[test]
    fn test_normalize_blanks_become_absent() {
        let raw = RawSearchCriteria {
            national_id: Some("   ".into()),
            passport_id: Some("".into()),
            first_name: Some(" Somchai ".into()),
            middle_name: None,
            last_name: Some("\t".into()),
            date_of_birth: Some(" 1990-05-02".into()),
            phone_number: Some("081".into()),
            email: Some(" ".into()),
        };

        let criteria = normalize(raw);

        assert_eq!(criteria.national_id(), None);
        assert_eq!(criteria.passport_id(), None);
        assert_eq!(criteria.first_name(), Some("Somchai"));
        assert_eq!(criteria.middle_name(), None);
        assert_eq!(criteria.last_name(), None);
        assert_eq!(criteria.date_of_birth(), Some("1990-05-02"));
        assert_eq!(criteria.phone_number(), Some("081"));
        assert_eq!(criteria.email(), None);
        assert_eq!(criteria.preferred_identifier(), None);
    }

    #[test]
    fn test_normalize_empty_request() {
        let criteria = normalize(RawSearchCriteria::default());
        assert!(criteria.is_empty());
        assert_eq!(criteria, SearchCriteria::default());
    }
}
