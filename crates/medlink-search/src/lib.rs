//! Patient search with transparent HIS reconciliation.
//!
//! [`PatientSearchService`] answers tenant-scoped searches from the local
//! store. When the criteria carry a national ID or passport ID that the
//! tenant does not know yet, it first asks the HIS for that identifier and
//! merges the returned profile into the store.
//!
//! # Usage
//!
//! ```ignore
//! use medlink_search::PatientSearchService;
//!
//! let service = PatientSearchService::new(store, resolver);
//! let patients = service.search("A", &criteria).await?;
//! ```

mod error;
mod service;

pub use error::SearchError;
pub use service::{PatientSearchService, Reconciliation};
