use std::sync::Arc;

use async_trait::async_trait;
use medlink_core::PatientProfile;

use crate::error::ResolverError;

/// Looks up a patient profile in an external system by identifier.
///
/// The identifier is either a national ID or a passport ID; the resolver
/// does not need to know which.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Fetches the profile for `id`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `id` is blank
    /// - `Transport` if the call cannot complete
    /// - `UnexpectedStatus` for any non-success response
    /// - `Decode` if the body is not a patient record
    async fn fetch_by_id(&self, id: &str) -> Result<PatientProfile, ResolverError>;
}

/// Type alias for a shareable resolver.
pub type DynIdentityResolver = Arc<dyn IdentityResolver>;
