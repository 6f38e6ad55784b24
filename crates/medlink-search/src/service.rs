//! Reconciliation orchestrator.

use std::sync::Arc;

use medlink_core::{Patient, SearchCriteria, normalize_str};
use medlink_his::IdentityResolver;
use medlink_storage::PatientStore;
use tracing::{debug, instrument, warn};

use crate::error::SearchError;

/// What the identifier step of a search did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The criteria carry no national ID or passport ID.
    NotAttempted,
    /// The tenant already holds a matching record; the HIS was not asked.
    LocalHit,
    /// The HIS profile was stored under the tenant.
    Merged { patient_id: i64 },
    /// The HIS lookup or the merge failed; the search continues locally.
    Unmerged,
}

/// Tenant-scoped patient search that enriches the local store from the HIS
/// on an identifier miss.
///
/// Holds no state between calls. Concurrent merges of the same patient are
/// settled by the store's upsert.
pub struct PatientSearchService {
    store: Arc<dyn PatientStore>,
    resolver: Arc<dyn IdentityResolver>,
}

impl PatientSearchService {
    #[must_use]
    pub fn new(store: Arc<dyn PatientStore>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { store, resolver }
    }

    /// Searches `hospital`'s patients.
    ///
    /// A blank `hospital` yields an empty list without touching the store.
    /// When `criteria` carries an identifier the tenant does not hold yet,
    /// the HIS profile for it is merged first. The result always comes from
    /// a full search on `criteria`, so a merged record that fails the other
    /// criteria is not returned.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Persistence` if the identifier lookup or the
    /// final search fails. HIS and merge failures are logged and dropped.
    #[instrument(skip(self, criteria))]
    pub async fn search(
        &self,
        hospital: &str,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Patient>, SearchError> {
        let Some(hospital) = normalize_str(hospital) else {
            debug!("blank hospital, returning no patients");
            return Ok(Vec::new());
        };

        let outcome = self.reconcile(&hospital, criteria).await?;
        debug!(?outcome, "reconciliation finished");

        let patients = self.store.search_by_hospital(&hospital, criteria).await?;
        debug!(count = patients.len(), "search finished");
        Ok(patients)
    }

    /// Runs the identifier step for an already normalized `hospital`.
    ///
    /// # Errors
    ///
    /// Only a failed local identifier lookup is returned.
    pub async fn reconcile(
        &self,
        hospital: &str,
        criteria: &SearchCriteria,
    ) -> Result<Reconciliation, SearchError> {
        let Some(identifier) = criteria.preferred_identifier() else {
            return Ok(Reconciliation::NotAttempted);
        };

        let local = self
            .store
            .find_by_identifier(hospital, criteria.national_id(), criteria.passport_id())
            .await?;
        if local.is_some() {
            return Ok(Reconciliation::LocalHit);
        }

        let profile = match self.resolver.fetch_by_id(identifier).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    hospital,
                    identifier,
                    error = %e,
                    remote = e.is_remote(),
                    "HIS lookup failed"
                );
                return Ok(Reconciliation::Unmerged);
            }
        };

        // Neither conflict target would apply, so the upsert would insert a
        // fresh row on every search.
        if !profile.has_identifier() {
            warn!(hospital, identifier, "HIS profile carries no identifier, not merging");
            return Ok(Reconciliation::Unmerged);
        }

        match self
            .store
            .upsert_by_national_or_passport(hospital, &profile)
            .await
        {
            Ok(patient) => {
                debug!(hospital, identifier, patient_id = patient.id, "merged HIS profile");
                Ok(Reconciliation::Merged {
                    patient_id: patient.id,
                })
            }
            Err(e) => {
                warn!(
                    hospital,
                    identifier,
                    error = %e,
                    category = %e.category(),
                    "failed to merge HIS profile"
                );
                Ok(Reconciliation::Unmerged)
            }
        }
    }
}
