//! Error types for the marketplace core.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::id::{EquipmentId, RequestId, UserId};
use crate::domain::request::RequestStatus;

/// Result type alias using the toala error type.
pub type Result<T> = std::result::Result<T, ToalaError>;

/// Main error type for the marketplace core.
///
/// The variants fall into two families: local failures detected before any
/// store write (`Validation`, `Forbidden`, `InvalidTransition`, the not-found
/// lookups) and `Store`, which wraps a failure of the external store itself.
/// Only the latter is a retry candidate; see [`ToalaError::is_retriable`].
#[derive(Error, Debug)]
pub enum ToalaError {
    /// Equipment not found in the catalog
    #[error("equipment not found: {0}")]
    EquipmentNotFound(EquipmentId),

    /// Rental request not found
    #[error("rental request not found: {0}")]
    RequestNotFound(RequestId),

    /// Malformed input to `create` or `post`, rejected before any write
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Actor lacks the rights for the requested operation
    #[error("user {actor} is not allowed to {action}")]
    Forbidden {
        actor: UserId,
        action: &'static str,
    },

    /// Requested status edge is not permitted from the current state
    #[error("invalid status transition: request {0} is '{1}', cannot become '{2}'")]
    InvalidTransition(RequestId, RequestStatus, RequestStatus),

    /// No authenticated session behind the bearer credential
    #[error("no authenticated user")]
    Unauthenticated,

    /// The external store call failed (network, transport, decode)
    #[error("store call failed: {0}")]
    Store(#[source] anyhow::Error),
}

impl ToalaError {
    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Validation, authorization, and transition errors are deterministic and
    /// will fail again on retry. Store failures are environmental; the core
    /// never retries them itself, that decision belongs to the caller.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ToalaError::Store(_))
    }
}

impl From<reqwest::Error> for ToalaError {
    fn from(err: reqwest::Error) -> Self {
        ToalaError::Store(err.into())
    }
}

impl From<serde_json::Error> for ToalaError {
    fn from(err: serde_json::Error) -> Self {
        ToalaError::Store(err.into())
    }
}

/// Validation failures for `create` and `post` input.
///
/// Always detectable locally: when one of these is returned, the external
/// store has received zero calls for the operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// End date is before start date
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Rental span is under the equipment's minimum
    #[error("rental span of {span} days is under the minimum of {min}")]
    SpanTooShort { span: u32, min: u32 },

    /// Rental span exceeds the equipment's maximum
    #[error("rental span of {span} days exceeds the maximum of {max}")]
    SpanTooLong { span: u32, max: u32 },

    /// Requester owns the equipment they are trying to rent
    #[error("cannot request your own equipment")]
    SelfRequest,

    /// Request message is empty
    #[error("request message must not be empty")]
    EmptyMessage,

    /// Chat message content is empty after trimming
    #[error("message content must not be empty")]
    EmptyContent,

    /// Equipment is not listed as available
    #[error("equipment {0} is not available for rental")]
    Unavailable(EquipmentId),
}
