//! Error types for HIS lookups.

/// Errors that can occur while resolving an identifier against the HIS.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The identifier was blank.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The request could not be sent or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The HIS answered with a non-success status.
    #[error("HIS responded with status {status}")]
    UnexpectedStatus {
        /// HTTP status code returned by the HIS.
        status: u16,
    },

    /// The response body is not a patient record.
    #[error("Failed to decode HIS response: {0}")]
    Decode(String),
}

impl ResolverError {
    /// Returns `true` if the HIS was reached and answered.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { .. } | Self::Decode(_))
    }
}
