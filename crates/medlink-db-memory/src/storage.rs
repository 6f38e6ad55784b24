use std::collections::BTreeMap;

use async_trait::async_trait;
use medlink_core::{Patient, PatientProfile, SearchCriteria, is_blank, normalize_str};
use medlink_storage::{MAX_SEARCH_RESULTS, PatientStore, StorageError};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::query::CriteriaFilter;

/// Which partial unique index an upsert attempt uses as its conflict target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConflictKey {
    NationalId,
    PassportId,
}

impl ConflictKey {
    fn value(self, profile: &PatientProfile) -> Option<&str> {
        match self {
            Self::NationalId => profile.national_id.as_deref(),
            Self::PassportId => profile.passport_id.as_deref(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    /// Rows keyed by identity; iteration order is creation order.
    rows: BTreeMap<i64, Patient>,
    next_id: i64,
}

impl State {
    /// Returns the id of another row in `hospital` holding `value` under `key`.
    fn holder(
        &self,
        hospital: &str,
        key: ConflictKey,
        value: &str,
        except: Option<i64>,
    ) -> Option<i64> {
        self.rows
            .values()
            .filter(|p| p.hospital == hospital && Some(p.id) != except)
            .find(|p| key.value(&p.profile) == Some(value))
            .map(|p| p.id)
    }

    /// Fails like a unique index would if `profile` clashes with any row
    /// other than `except`.
    fn check_unique(
        &self,
        hospital: &str,
        profile: &PatientProfile,
        except: Option<i64>,
    ) -> Result<(), String> {
        for key in [ConflictKey::NationalId, ConflictKey::PassportId] {
            if let Some(value) = key.value(profile)
                && self.holder(hospital, key, value, except).is_some()
            {
                return Err(format!("duplicate {key:?} '{value}' in hospital '{hospital}'"));
            }
        }
        Ok(())
    }

    /// One `INSERT ... ON CONFLICT (hospital, <key>) DO UPDATE` equivalent.
    fn try_upsert(
        &mut self,
        hospital: &str,
        profile: &PatientProfile,
        key: ConflictKey,
    ) -> Result<Patient, String> {
        let existing = key
            .value(profile)
            .and_then(|value| self.holder(hospital, key, value, None));

        self.check_unique(hospital, profile, existing)?;

        let id = match existing {
            Some(id) => id,
            None => {
                self.next_id += 1;
                self.next_id
            }
        };
        let patient = Patient::new(id, hospital, profile.clone());
        self.rows.insert(id, patient.clone());
        Ok(patient)
    }
}

/// In-memory patient store.
///
/// All state sits behind one `RwLock`; an upsert holds the write lock for
/// both of its attempts, which makes it atomic with respect to other calls.
#[derive(Debug, Default)]
pub struct InMemoryPatientStore {
    state: RwLock<State>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all tenants.
    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    #[instrument(skip(self, criteria))]
    async fn search_by_hospital(
        &self,
        hospital: &str,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Patient>, StorageError> {
        let filter = CriteriaFilter::compile(criteria)?;
        let state = self.state.read().await;

        Ok(state
            .rows
            .values()
            .rev()
            .filter(|p| p.hospital == hospital && filter.matches(p))
            .take(MAX_SEARCH_RESULTS)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_by_identifier(
        &self,
        hospital: &str,
        national_id: Option<&str>,
        passport_id: Option<&str>,
    ) -> Result<Option<Patient>, StorageError> {
        let national_id = national_id.and_then(normalize_str);
        let passport_id = passport_id.and_then(normalize_str);
        if national_id.is_none() && passport_id.is_none() {
            return Ok(None);
        }

        let state = self.state.read().await;
        Ok(state
            .rows
            .values()
            .filter(|p| p.hospital == hospital)
            .find(|p| {
                (national_id.is_some() && p.national_id() == national_id.as_deref())
                    || (passport_id.is_some() && p.passport_id() == passport_id.as_deref())
            })
            .cloned())
    }

    #[instrument(
        skip(self, profile),
        fields(national_id = ?profile.national_id, passport_id = ?profile.passport_id)
    )]
    async fn upsert_by_national_or_passport(
        &self,
        hospital: &str,
        profile: &PatientProfile,
    ) -> Result<Patient, StorageError> {
        if is_blank(Some(hospital)) {
            return Err(StorageError::query("hospital must not be blank"));
        }

        let mut state = self.state.write().await;

        let national_err = match state.try_upsert(hospital, profile, ConflictKey::NationalId) {
            Ok(patient) => return Ok(patient),
            Err(e) => e,
        };
        tracing::debug!(
            hospital = %hospital,
            error = %national_err,
            "national_id upsert failed, retrying on passport_id"
        );

        state
            .try_upsert(hospital, profile, ConflictKey::PassportId)
            .map_err(|passport_err| {
                StorageError::conflict_resolution_exhausted(national_err, passport_err)
            })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        national_id: Option<&str>,
        passport_id: Option<&str>,
        first_name: &str,
    ) -> PatientProfile {
        PatientProfile {
            first_name_en: Some(first_name.to_string()),
            national_id: national_id.map(str::to_string),
            passport_id: passport_id.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_overwrites() {
        let store = InMemoryPatientStore::new();

        let first = store
            .upsert_by_national_or_passport(
                "A",
                &PatientProfile {
                    email: Some("old@example.com".into()),
                    ..profile(Some("N1"), None, "John")
                },
            )
            .await
            .unwrap();
        let second = store
            .upsert_by_national_or_passport("A", &profile(Some("N1"), Some("P1"), "Johnny"))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.profile.first_name_en.as_deref(), Some("Johnny"));
        assert_eq!(second.passport_id(), Some("P1"));
        // absent fields overwrite stale values
        assert_eq!(second.profile.email, None);
    }

    #[tokio::test]
    async fn test_upsert_falls_back_to_passport() {
        let store = InMemoryPatientStore::new();
        let original = store
            .upsert_by_national_or_passport("A", &profile(None, Some("P1"), "Jane"))
            .await
            .unwrap();

        // national_id is new, but the passport already belongs to a row
        let merged = store
            .upsert_by_national_or_passport("A", &profile(Some("N9"), Some("P1"), "Janet"))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(merged.id, original.id);
        assert_eq!(merged.national_id(), Some("N9"));
        assert_eq!(merged.profile.first_name_en.as_deref(), Some("Janet"));
    }

    #[tokio::test]
    async fn test_upsert_exhausted_when_identifiers_split_across_rows() {
        let store = InMemoryPatientStore::new();
        store
            .upsert_by_national_or_passport("A", &profile(Some("N1"), None, "One"))
            .await
            .unwrap();
        store
            .upsert_by_national_or_passport("A", &profile(None, Some("P2"), "Two"))
            .await
            .unwrap();

        let err = store
            .upsert_by_national_or_passport("A", &profile(Some("N1"), Some("P2"), "Both"))
            .await
            .unwrap_err();

        assert!(err.is_conflict_resolution_exhausted());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_uniqueness_is_per_hospital() {
        let store = InMemoryPatientStore::new();
        let a = store
            .upsert_by_national_or_passport("A", &profile(Some("N1"), Some("P1"), "A"))
            .await
            .unwrap();
        let b = store
            .upsert_by_national_or_passport("B", &profile(Some("N1"), Some("P1"), "B"))
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_upsert_rejects_blank_hospital() {
        let store = InMemoryPatientStore::new();
        let err = store
            .upsert_by_national_or_passport("  ", &profile(Some("N1"), None, "X"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Query { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_by_identifier_is_an_or() {
        let store = InMemoryPatientStore::new();
        let stored = store
            .upsert_by_national_or_passport("A", &profile(None, Some("P1"), "Jane"))
            .await
            .unwrap();

        let found = store
            .find_by_identifier("A", Some("N-unknown"), Some("P1"))
            .await
            .unwrap();
        assert_eq!(found, Some(stored));

        assert_eq!(store.find_by_identifier("A", None, None).await.unwrap(), None);
        assert_eq!(store.find_by_identifier("A", Some(" "), Some("")).await.unwrap(), None);
        assert_eq!(store.find_by_identifier("B", None, Some("P1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_search_is_newest_first_capped_and_tenant_scoped() {
        let store = InMemoryPatientStore::new();
        for i in 0..105 {
            store
                .upsert_by_national_or_passport("A", &profile(Some(&format!("N{i}")), None, "P"))
                .await
                .unwrap();
        }
        store
            .upsert_by_national_or_passport("B", &profile(Some("N-other"), None, "P"))
            .await
            .unwrap();

        let rows = store
            .search_by_hospital("A", &SearchCriteria::new())
            .await
            .unwrap();

        assert_eq!(rows.len(), MAX_SEARCH_RESULTS);
        assert!(rows.iter().all(|p| p.hospital == "A"));
        assert!(rows.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(rows[0].national_id(), Some("N104"));
    }

    #[tokio::test]
    async fn test_search_rejects_malformed_date() {
        let store = InMemoryPatientStore::new();
        let criteria = SearchCriteria::new().with_date_of_birth("May 2nd".to_string());
        let err = store
            .search_by_hospital("A", &criteria)
            .await
            .unwrap_err();
        assert!(err.is_invalid_criteria());
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_spans_record_identifiers_but_not_names() {
        use tracing_subscriber::fmt::format::FmtSpan;

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_span_events(FmtSpan::NEW)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = InMemoryPatientStore::new();
        store
            .upsert_by_national_or_passport("A", &profile(Some("1100700000001"), None, "Somchai"))
            .await
            .unwrap();
        store
            .find_by_identifier("A", None, Some("AA1234567"))
            .await
            .unwrap();

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("upsert_by_national_or_passport"));
        assert!(output.contains("1100700000001"));
        assert!(output.contains("find_by_identifier"));
        assert!(output.contains("AA1234567"));
        assert!(!output.contains("Somchai"));
    }
}
