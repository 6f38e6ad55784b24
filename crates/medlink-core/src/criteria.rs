//! Search criteria.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_field;

/// Criteria exactly as a caller sent them. Any field may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSearchCriteria {
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub passport_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Normalized search criteria.
///
/// Each field is either absent or a trimmed, non-blank string. An absent
/// field means "do not filter on this field", never "filter for null".
/// Values can only enter through the `with_*` builders (or
/// [`crate::normalize`]), which apply blank-as-absent normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    national_id: Option<String>,
    passport_id: Option<String>,
    first_name: Option<String>,
    middle_name: Option<String>,
    last_name: Option<String>,
    date_of_birth: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
}

macro_rules! criteria_field {
    ($field:ident, $with:ident) => {
        pub fn $field(&self) -> Option<&str> {
            self.$field.as_deref()
        }

        #[must_use]
        pub fn $with(mut self, value: impl Into<Option<String>>) -> Self {
            self.$field = normalize_field(value.into());
            self
        }
    };
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    criteria_field!(national_id, with_national_id);
    criteria_field!(passport_id, with_passport_id);
    criteria_field!(first_name, with_first_name);
    criteria_field!(middle_name, with_middle_name);
    criteria_field!(last_name, with_last_name);
    criteria_field!(date_of_birth, with_date_of_birth);
    criteria_field!(phone_number, with_phone_number);
    criteria_field!(email, with_email);

    /// The identifier to resolve externally: national ID wins over passport ID.
    pub fn preferred_identifier(&self) -> Option<&str> {
        self.national_id().or_else(|| self.passport_id())
    }

    /// Returns `true` when no field imposes a filter.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
