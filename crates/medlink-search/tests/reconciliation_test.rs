//! Search orchestration against the in-memory store and scripted resolvers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use medlink_core::{Patient, PatientProfile, SearchCriteria};
use medlink_db_memory::InMemoryPatientStore;
use medlink_his::{IdentityResolver, ResolverError};
use medlink_search::PatientSearchService;
use medlink_storage::{PatientStore, StorageError};

/// Resolver that answers with a fixed profile or a fixed failure and
/// records the identifiers it was asked for.
struct ScriptedResolver {
    profile: Option<PatientProfile>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    fn returning(profile: PatientProfile) -> Arc<Self> {
        Arc::new(Self {
            profile: Some(profile),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            profile: None,
            requested: Mutex::new(Vec::new()),
        })
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityResolver for ScriptedResolver {
    async fn fetch_by_id(&self, id: &str) -> Result<PatientProfile, ResolverError> {
        self.requested.lock().unwrap().push(id.to_string());
        self.profile
            .clone()
            .ok_or_else(|| ResolverError::Transport("connection refused".into()))
    }
}

/// In-memory store that counts calls and can be told to fail.
#[derive(Default)]
struct InstrumentedStore {
    inner: InMemoryPatientStore,
    calls: AtomicUsize,
    fail_find: AtomicBool,
    fail_upsert: AtomicBool,
    fail_search: AtomicBool,
}

#[async_trait]
impl PatientStore for InstrumentedStore {
    async fn search_by_hospital(
        &self,
        hospital: &str,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Patient>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(StorageError::connection("search unavailable"));
        }
        self.inner.search_by_hospital(hospital, criteria).await
    }

    async fn find_by_identifier(
        &self,
        hospital: &str,
        national_id: Option<&str>,
        passport_id: Option<&str>,
    ) -> Result<Option<Patient>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(StorageError::connection("lookup unavailable"));
        }
        self.inner
            .find_by_identifier(hospital, national_id, passport_id)
            .await
    }

    async fn upsert_by_national_or_passport(
        &self,
        hospital: &str,
        profile: &PatientProfile,
    ) -> Result<Patient, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(StorageError::conflict_resolution_exhausted("n", "p"));
        }
        self.inner
            .upsert_by_national_or_passport(hospital, profile)
            .await
    }

    fn backend_name(&self) -> &'static str {
        "instrumented"
    }
}

fn john() -> PatientProfile {
    PatientProfile {
        first_name_en: Some("John".into()),
        national_id: Some("1234567890123".into()),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 2),
        ..Default::default()
    }
}

fn service(
    store: &Arc<InstrumentedStore>,
    resolver: &Arc<ScriptedResolver>,
) -> PatientSearchService {
    PatientSearchService::new(store.clone(), resolver.clone())
}

#[tokio::test]
async fn test_miss_fetches_and_merges_under_tenant() {
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::returning(john());
    let service = service(&store, &resolver);
    let criteria = SearchCriteria::new().with_national_id("1234567890123".to_string());

    let patients = service.search("A", &criteria).await.unwrap();

    assert_eq!(patients.len(), 1);
    let patient = &patients[0];
    assert_eq!(patient.hospital, "A");
    assert_eq!(patient.profile.first_name_en.as_deref(), Some("John"));
    assert_eq!(patient.national_id(), Some("1234567890123"));
    assert_eq!(
        patient.profile.date_of_birth,
        NaiveDate::from_ymd_opt(1990, 5, 2)
    );
    assert_eq!(resolver.requested(), vec!["1234567890123".to_string()]);
}

#[tokio::test]
async fn test_second_search_is_a_local_hit() {
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::returning(john());
    let service = service(&store, &resolver);
    let criteria = SearchCriteria::new().with_national_id("1234567890123".to_string());

    let first = service.search("A", &criteria).await.unwrap();
    let second = service.search("A", &criteria).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(resolver.requested().len(), 1);
    assert_eq!(store.inner.len().await, 1);
}

#[tokio::test]
async fn test_blank_hospital_never_touches_store() {
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::returning(john());
    let service = service(&store, &resolver);

    for hospital in ["", "   "] {
        let patients = service
            .search(hospital, &SearchCriteria::new().with_national_id("1".to_string()))
            .await
            .unwrap();
        assert!(patients.is_empty());
    }

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    assert!(resolver.requested().is_empty());
}

#[tokio::test]
async fn test_resolver_failure_degrades_to_local_results() {
    let store = Arc::new(InstrumentedStore::default());
    store
        .inner
        .upsert_by_national_or_passport(
            "A",
            &PatientProfile {
                first_name_en: Some("Johanna".into()),
                passport_id: Some("X9".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let resolver = ScriptedResolver::failing();
    let service = service(&store, &resolver);
    let criteria = SearchCriteria::new()
        .with_national_id("1234567890123".to_string())
        .with_first_name("joh".to_string());

    let patients = service.search("A", &criteria).await.unwrap();

    // Nothing local carries the national ID; the search still runs.
    assert!(patients.is_empty());
    assert_eq!(resolver.requested().len(), 1);

    let by_name = service
        .search("A", &SearchCriteria::new().with_first_name("joh".to_string()))
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
}

#[tokio::test]
async fn test_passport_record_found_despite_unmatched_national_id() {
    let store = Arc::new(InstrumentedStore::default());
    store
        .inner
        .upsert_by_national_or_passport(
            "A",
            &PatientProfile {
                first_name_en: Some("Jane".into()),
                passport_id: Some("AA123".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let resolver = ScriptedResolver::failing();
    let service = service(&store, &resolver);
    let criteria = SearchCriteria::new()
        .with_national_id("0000000000000".to_string())
        .with_passport_id("AA123".to_string());

    let outcome = service.reconcile("A", &criteria).await.unwrap();

    assert_eq!(outcome, medlink_search::Reconciliation::LocalHit);
    assert!(resolver.requested().is_empty());
}

#[tokio::test]
async fn test_passport_used_when_national_id_absent() {
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::returning(PatientProfile {
        first_name_en: Some("Jane".into()),
        passport_id: Some("AA123".into()),
        ..Default::default()
    });
    let service = service(&store, &resolver);

    let patients = service
        .search("A", &SearchCriteria::new().with_passport_id(" AA123 ".to_string()))
        .await
        .unwrap();

    assert_eq!(resolver.requested(), vec!["AA123".to_string()]);
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].passport_id(), Some("AA123"));
}

#[tokio::test]
async fn test_merge_failure_is_swallowed() {
    let store = Arc::new(InstrumentedStore::default());
    store.fail_upsert.store(true, Ordering::SeqCst);
    let resolver = ScriptedResolver::returning(john());
    let service = service(&store, &resolver);

    let patients = service
        .search("A", &SearchCriteria::new().with_national_id("1234567890123".to_string()))
        .await
        .unwrap();

    assert!(patients.is_empty());
    assert_eq!(resolver.requested().len(), 1);
}

#[tokio::test]
async fn test_lookup_failure_propagates() {
    let store = Arc::new(InstrumentedStore::default());
    store.fail_find.store(true, Ordering::SeqCst);
    let resolver = ScriptedResolver::returning(john());
    let service = service(&store, &resolver);

    let err = service
        .search("A", &SearchCriteria::new().with_national_id("1234567890123".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        medlink_search::SearchError::Persistence(StorageError::Connection { .. })
    ));
    assert!(resolver.requested().is_empty());
}

#[tokio::test]
async fn test_search_failure_propagates() {
    let store = Arc::new(InstrumentedStore::default());
    store.fail_search.store(true, Ordering::SeqCst);
    let resolver = ScriptedResolver::failing();
    let service = service(&store, &resolver);

    let result = service.search("A", &SearchCriteria::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_merged_record_excluded_by_other_criteria() {
    // The merged row is re-evaluated against the full criteria, so a name
    // mismatch hides it even though it was just stored.
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::returning(john());
    let service = service(&store, &resolver);
    let criteria = SearchCriteria::new()
        .with_national_id("1234567890123".to_string())
        .with_first_name("Mary".to_string());

    let patients = service.search("A", &criteria).await.unwrap();

    assert!(patients.is_empty());
    assert_eq!(store.inner.len().await, 1);
}

#[tokio::test]
async fn test_empty_criteria_lists_newest_first_per_tenant() {
    let store = Arc::new(InstrumentedStore::default());
    for i in 0..105 {
        let profile = PatientProfile {
            national_id: Some(format!("N{i}")),
            ..Default::default()
        };
        store
            .inner
            .upsert_by_national_or_passport("A", &profile)
            .await
            .unwrap();
    }
    store
        .inner
        .upsert_by_national_or_passport("B", &john())
        .await
        .unwrap();

    let resolver = ScriptedResolver::failing();
    let service = service(&store, &resolver);

    let patients = service.search("A", &SearchCriteria::new()).await.unwrap();

    assert_eq!(patients.len(), 100);
    assert!(patients.iter().all(|p| p.hospital == "A"));
    assert!(patients.windows(2).all(|w| w[0].id > w[1].id));
    assert_eq!(patients[0].national_id(), Some("N104"));
    assert!(resolver.requested().is_empty());
}

#[tokio::test]
async fn test_invalid_date_criteria_is_reported() {
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::failing();
    let service = service(&store, &resolver);

    let err = service
        .search(
            "A",
            &SearchCriteria::new().with_date_of_birth("02/05/1990".to_string()),
        )
        .await
        .unwrap_err();

    assert!(err.is_invalid_criteria());
}

#[tokio::test]
async fn test_profile_without_identifier_is_not_merged() {
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::returning(PatientProfile {
        first_name_en: Some("John".into()),
        patient_hn: Some("HN1".into()),
        ..Default::default()
    });
    let service = service(&store, &resolver);
    let criteria = SearchCriteria::new().with_national_id("1234567890123".to_string());

    for _ in 0..3 {
        let patients = service.search("A", &criteria).await.unwrap();
        assert!(patients.is_empty());
    }

    // Nothing was stored, so each search asks the HIS again.
    assert!(store.inner.is_empty().await);
    assert_eq!(resolver.requested().len(), 3);
}

#[tokio::test]
async fn test_concurrent_misses_settle_into_one_row() {
    let store = Arc::new(InstrumentedStore::default());
    let resolver = ScriptedResolver::returning(john());
    let service = Arc::new(service(&store, &resolver));
    let criteria = SearchCriteria::new().with_national_id("1234567890123".to_string());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let criteria = criteria.clone();
            tokio::spawn(async move { service.search("A", &criteria).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(store.inner.len().await, 1);
    assert_eq!(results[0].len(), 1);
    assert!(results.iter().all(|r| r == &results[0]));
    assert!(!resolver.requested().is_empty());
}
