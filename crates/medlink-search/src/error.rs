use medlink_storage::{ErrorCategory, StorageError};

/// Errors returned by [`crate::PatientSearchService`].
///
/// HIS failures and failed merges are absorbed by the service and never
/// show up here.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Reading the local store failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

impl SearchError {
    /// Returns `true` if the caller supplied criteria the store cannot run.
    pub fn is_invalid_criteria(&self) -> bool {
        match self {
            Self::Persistence(e) => e.is_invalid_criteria(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Persistence(e) => e.category(),
        }
    }
}
