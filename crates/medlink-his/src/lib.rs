//! External Hospital Information System (HIS) resolver for Medlink.
//!
//! The [`IdentityResolver`] trait is the capability the search orchestrator
//! depends on; [`HisClient`] implements it over HTTP:
//!
//! ```text
//! GET {base_url}/patient/search/{identifier}
//! ```
//!
//! A 200 response carries a JSON object of optional string fields which is
//! converted into a normalized [`medlink_core::PatientProfile`].

mod client;
mod config;
mod error;
mod resolver;

pub use client::{ExternalPatientRecord, HisClient};
pub use config::HisConfig;
pub use error::ResolverError;
pub use resolver::{DynIdentityResolver, IdentityResolver};
