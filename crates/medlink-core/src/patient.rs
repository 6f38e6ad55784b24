//! Patient records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_field;

/// Demographic fields of a patient, every one of them optional.
///
/// This is both the shape an external HIS returns (after date parsing) and
/// the payload of an upsert. It carries neither the store identity nor the
/// hospital tenant; the tenant is supplied alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name_th: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name_th: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name_th: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name_en: Option<String>,
    /// Date only, no time component. Serialized as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    /// Facility-local hospital number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_hn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passport_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl PatientProfile {
    /// Applies blank-as-absent normalization to every text field.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            first_name_th: normalize_field(self.first_name_th),
            middle_name_th: normalize_field(self.middle_name_th),
            last_name_th: normalize_field(self.last_name_th),
            first_name_en: normalize_field(self.first_name_en),
            middle_name_en: normalize_field(self.middle_name_en),
            last_name_en: normalize_field(self.last_name_en),
            date_of_birth: self.date_of_birth,
            patient_hn: normalize_field(self.patient_hn),
            national_id: normalize_field(self.national_id),
            passport_id: normalize_field(self.passport_id),
            phone_number: normalize_field(self.phone_number),
            email: normalize_field(self.email),
            gender: normalize_field(self.gender),
        }
    }

    /// Returns `true` when the profile carries a national ID or passport ID.
    pub fn has_identifier(&self) -> bool {
        self.national_id.is_some() || self.passport_id.is_some()
    }
}

/// A tenant-scoped patient row.
///
/// Within one hospital at most one row holds a given national ID and at
/// most one holds a given passport ID. The two rules are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Identity assigned by the store. Higher means created later.
    pub id: i64,
    pub hospital: String,
    #[serde(flatten)]
    pub profile: PatientProfile,
}

impl Patient {
    pub fn new(id: i64, hospital: impl Into<String>, profile: PatientProfile) -> Self {
        Self {
            id,
            hospital: hospital.into(),
            profile,
        }
    }

    pub fn national_id(&self) -> Option<&str> {
        self.profile.national_id.as_deref()
    }

    pub fn passport_id(&self) -> Option<&str> {
        self.profile.passport_id.as_deref()
    }
}
