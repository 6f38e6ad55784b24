//! In-memory patient store for Medlink.
//!
//! This crate provides an in-memory implementation of the `PatientStore`
//! trait from `medlink-storage`. It enforces the same two per-tenant
//! uniqueness rules as the PostgreSQL schema (national ID, passport ID) and
//! resolves upserts with the same national-then-passport fallback, so it can
//! stand in for the database in service and HTTP tests or local runs.
//!
//! # Example
//!
//! ```ignore
//! use medlink_db_memory::InMemoryPatientStore;
//! use medlink_storage::PatientStore;
//!
//! let store = InMemoryPatientStore::new();
//! let stored = store.upsert_by_national_or_passport("A", &profile).await?;
//! ```

pub mod query;
pub mod storage;

// Re-export the PatientStore trait for convenience
pub use medlink_storage::{PatientStore, StorageError};

pub use query::CriteriaFilter;
pub use storage::InMemoryPatientStore;

/// Creates a new shareable in-memory store.
pub fn create_patient_store() -> medlink_storage::DynPatientStore {
    std::sync::Arc::new(InMemoryPatientStore::new())
}
