//! # medlink-storage
//!
//! Storage abstraction layer for Medlink patient records.
//!
//! This crate defines the [`PatientStore`] contract and its error type. It
//! does not contain any implementations - those live in
//! `medlink-db-postgres` and `medlink-db-memory`.
//!
//! ## Example
//!
//! ```ignore
//! use medlink_core::SearchCriteria;
//! use medlink_storage::{PatientStore, StorageError};
//!
//! async fn by_national_id(
//!     store: &dyn PatientStore,
//!     hospital: &str,
//!     national_id: &str,
//! ) -> Result<Vec<Patient>, StorageError> {
//!     let criteria = SearchCriteria::new().with_national_id(national_id.to_string());
//!     store.search_by_hospital(hospital, &criteria).await
//! }
//! ```

mod error;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use traits::{MAX_SEARCH_RESULTS, PatientStore};

/// Type alias for a shared store trait object.
pub type DynPatientStore = std::sync::Arc<dyn PatientStore>;
