//! Rental request states using the typestate pattern.
//!
//! A rental request progresses through a closed set of statuses. Each status
//! is a distinct type parameter on `RentalRequest<S>`, so the only
//! transitions that compile are the permitted ones:
//!
//! ```text
//! RentalRequest<Pending> ──approve()──> RentalRequest<Approved> ──complete()──> RentalRequest<Completed>
//!          │
//!          └──decline()──> RentalRequest<Declined>
//! ```
//!
//! `Declined` and `Completed` are terminal: no transition methods exist on
//! them. [`AnyRequest`] unifies the four states for storage and listing,
//! where the status is only known at runtime.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::{EquipmentId, RequestId, UserId};

/// Status of a rental request as the store records it.
///
/// This is the runtime view of the typestate: the value stored in the
/// `status` column and carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    Completed,
}

impl RequestStatus {
    /// Whether no further transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Declined | RequestStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Declined => "declined",
            RequestStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "declined" => Ok(RequestStatus::Declined),
            "completed" => Ok(RequestStatus::Completed),
            other => Err(format!("unknown request status '{other}'")),
        }
    }
}

/// Which side of a request a user is on when listing.
///
/// `Owner` selects requests received against the user's equipment, and
/// `Requester` the requests the user sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestRole {
    Owner,
    Requester,
}

/// Marker trait for valid request states.
pub trait RequestState: Send + Sync {}

/// A rental request against an equipment listing.
///
/// Uses the typestate pattern: the generic parameter `S` is the current
/// status, and transition methods are only available on the states they
/// leave from. The shared [`RequestData`] moves unchanged through every
/// transition; in particular the price is fixed at creation and there is no
/// path that edits dates or message afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RentalRequest<S: RequestState> {
    /// The current status of the request.
    pub state: S,
    /// Immutable request data, fixed at creation.
    pub data: RequestData,
}

/// The immutable body of a rental request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    /// Assigned by the store at insert time.
    pub id: RequestId,
    pub equipment_id: EquipmentId,
    pub owner_id: UserId,
    pub requester_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `span_days * price_per_day`, computed at creation and never
    /// recomputed.
    pub total_price: f64,
    /// Free-text message from the requester to the owner.
    pub message: String,
    /// Assigned by the store at insert time.
    pub created_at: DateTime<Utc>,
}

impl RequestData {
    /// Whether `user` is the owner or the requester on this request.
    pub fn is_participant(&self, user: UserId) -> bool {
        user == self.owner_id || user == self.requester_id
    }

    /// The other participant, if `user` is one of the two.
    pub fn counterparty(&self, user: UserId) -> Option<UserId> {
        if user == self.owner_id {
            Some(self.requester_id)
        } else if user == self.requester_id {
            Some(self.owner_id)
        } else {
            None
        }
    }
}

/// A request before the store has assigned its id and creation timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInput {
    pub equipment_id: EquipmentId,
    pub owner_id: UserId,
    pub requester_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: f64,
    pub message: String,
}

// ============================================================================
// Request States
// ============================================================================

/// Waiting for the owner's decision. The only initial state.
#[derive(Debug, Clone, Serialize)]
pub struct Pending {}

impl RequestState for Pending {}

/// Owner accepted; the rental may go ahead. Left only by `complete()`.
#[derive(Debug, Clone, Serialize)]
pub struct Approved {
    pub updated_at: DateTime<Utc>,
}

impl RequestState for Approved {}

/// Owner declined. Terminal.
#[derive(Debug, Clone, Serialize)]
pub struct Declined {
    pub updated_at: DateTime<Utc>,
}

impl RequestState for Declined {}

/// Rental finished, marked by either participant. Terminal.
#[derive(Debug, Clone, Serialize)]
pub struct Completed {
    pub updated_at: DateTime<Utc>,
}

impl RequestState for Completed {}

// ============================================================================
// Unified Request Representation
// ============================================================================

/// Enum that can hold a request in any status.
///
/// Used for storage results and listings, where the status is data rather
/// than a type.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "request")]
#[serde(rename_all = "lowercase")]
pub enum AnyRequest {
    Pending(RentalRequest<Pending>),
    Approved(RentalRequest<Approved>),
    Declined(RentalRequest<Declined>),
    Completed(RentalRequest<Completed>),
}

impl AnyRequest {
    /// Get the request ID regardless of status.
    pub fn id(&self) -> RequestId {
        self.data().id
    }

    /// Get the immutable request body regardless of status.
    pub fn data(&self) -> &RequestData {
        match self {
            AnyRequest::Pending(r) => &r.data,
            AnyRequest::Approved(r) => &r.data,
            AnyRequest::Declined(r) => &r.data,
            AnyRequest::Completed(r) => &r.data,
        }
    }

    /// Get the runtime status of this request.
    pub fn status(&self) -> RequestStatus {
        match self {
            AnyRequest::Pending(_) => RequestStatus::Pending,
            AnyRequest::Approved(_) => RequestStatus::Approved,
            AnyRequest::Declined(_) => RequestStatus::Declined,
            AnyRequest::Completed(_) => RequestStatus::Completed,
        }
    }

    /// Check if this request is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Try to extract as a Pending request.
    pub fn as_pending(&self) -> Option<&RentalRequest<Pending>> {
        match self {
            AnyRequest::Pending(r) => Some(r),
            _ => None,
        }
    }

    /// Try to take as a Pending request, consuming self.
    pub fn into_pending(self) -> Option<RentalRequest<Pending>> {
        match self {
            AnyRequest::Pending(r) => Some(r),
            _ => None,
        }
    }
}

// Conversion traits for going from typed RentalRequest to AnyRequest

impl From<RentalRequest<Pending>> for AnyRequest {
    fn from(r: RentalRequest<Pending>) -> Self {
        AnyRequest::Pending(r)
    }
}

impl From<RentalRequest<Approved>> for AnyRequest {
    fn from(r: RentalRequest<Approved>) -> Self {
        AnyRequest::Approved(r)
    }
}

impl From<RentalRequest<Declined>> for AnyRequest {
    fn from(r: RentalRequest<Declined>) -> Self {
        AnyRequest::Declined(r)
    }
}

impl From<RentalRequest<Completed>> for AnyRequest {
    fn from(r: RentalRequest<Completed>) -> Self {
        AnyRequest::Completed(r)
    }
}
