//! The patient store contract.

use async_trait::async_trait;
use medlink_core::{Patient, PatientProfile, SearchCriteria};

use crate::error::StorageError;

/// Upper bound on the rows returned by [`PatientStore::search_by_hospital`].
pub const MAX_SEARCH_RESULTS: usize = 100;

/// Persistent, tenant-scoped patient storage.
///
/// Every operation takes a required hospital tenant and never reads or
/// writes rows of another tenant. Implementations must be thread-safe
/// (`Send + Sync`); the store is the only shared mutable resource, so any
/// conflict between concurrent upserts must be settled inside it.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Searches the tenant's patients.
    ///
    /// Present criteria fields are ANDed together:
    /// - national ID and passport ID match exactly
    /// - first, middle and last name match case-insensitively as a substring
    ///   of either the Thai or the English variant
    /// - phone number and email match case-insensitively as a substring
    /// - date of birth (`YYYY-MM-DD`) matches exactly
    ///
    /// Results are newest first, capped at [`MAX_SEARCH_RESULTS`]. An empty
    /// result is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidCriteria` if the date of birth is not a
    /// valid `YYYY-MM-DD` date, or an infrastructure error.
    async fn search_by_hospital(
        &self,
        hospital: &str,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Patient>, StorageError>;

    /// Finds a patient whose national ID equals `national_id` OR whose
    /// passport ID equals `passport_id`. Absent arguments impose no clause;
    /// when both are absent this returns `Ok(None)` without touching storage.
    ///
    /// If several rows qualify, which one is returned is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, never for a miss.
    async fn find_by_identifier(
        &self,
        hospital: &str,
        national_id: Option<&str>,
        passport_id: Option<&str>,
    ) -> Result<Option<Patient>, StorageError>;

    /// Inserts `profile` for `hospital`, or overwrites the existing row that
    /// holds the same identifier.
    ///
    /// The national ID is tried first as the conflict key; if that attempt
    /// yields no row the passport ID is tried. On conflict every demographic
    /// field (including the other identifier) is replaced by the profile's
    /// value, absent values included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConflictResolutionExhausted` if both attempts
    /// fail on a uniqueness rule, or an infrastructure error.
    async fn upsert_by_national_or_passport(
        &self,
        hospital: &str,
        profile: &PatientProfile,
    ) -> Result<Patient, StorageError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
