//! Storage error types for the patient store abstraction.

use std::fmt;

/// Errors that can occur during patient store operations.
///
/// A miss is never an error: lookups return `Option` and searches return
/// an empty list.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to connect to the storage backend.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// A statement failed to execute or its rows could not be read.
    #[error("Query error: {message}")]
    Query {
        /// Description of the failure.
        message: String,
    },

    /// The search criteria cannot be turned into a query.
    #[error("Invalid criteria: {message}")]
    InvalidCriteria {
        /// Description of the offending criterion.
        message: String,
    },

    /// Both the national-ID-keyed and the passport-ID-keyed upsert failed.
    #[error(
        "Conflict resolution exhausted: national_id attempt: {national_id_attempt}; passport_id attempt: {passport_id_attempt}"
    )]
    ConflictResolutionExhausted {
        /// Why the national-ID-keyed attempt failed.
        national_id_attempt: String,
        /// Why the passport-ID-keyed attempt failed.
        passport_id_attempt: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Query` error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidCriteria` error.
    #[must_use]
    pub fn invalid_criteria(message: impl Into<String>) -> Self {
        Self::InvalidCriteria {
            message: message.into(),
        }
    }

    /// Creates a new `ConflictResolutionExhausted` error.
    #[must_use]
    pub fn conflict_resolution_exhausted(
        national_id_attempt: impl Into<String>,
        passport_id_attempt: impl Into<String>,
    ) -> Self {
        Self::ConflictResolutionExhausted {
            national_id_attempt: national_id_attempt.into(),
            passport_id_attempt: passport_id_attempt.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the criteria were rejected.
    #[must_use]
    pub fn is_invalid_criteria(&self) -> bool {
        matches!(self, Self::InvalidCriteria { .. })
    }

    /// Returns `true` if both upsert attempts failed.
    #[must_use]
    pub fn is_conflict_resolution_exhausted(&self) -> bool {
        matches!(self, Self::ConflictResolutionExhausted { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection { .. } => ErrorCategory::Infrastructure,
            Self::Query { .. } => ErrorCategory::Infrastructure,
            Self::InvalidCriteria { .. } => ErrorCategory::Validation,
            Self::ConflictResolutionExhausted { .. } => ErrorCategory::Conflict,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected input.
    Validation,
    /// Uniqueness conflict that could not be resolved.
    Conflict,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
