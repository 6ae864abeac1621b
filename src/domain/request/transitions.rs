//! Status transitions for rental requests using the typestate pattern.
//!
//! Each transition consumes the typed request, checks that the actor is
//! allowed to make the move, persists the status change through the store's
//! compare-and-set, and returns the request in its next state. The immutable
//! [`RequestData`](super::state::RequestData) is moved through unchanged:
//! price, dates, and message cannot drift across transitions.
//!
//! Allowed edges and who may take them:
//!
//! - `pending → approved` / `pending → declined`: equipment owner only
//! - `approved → completed`: either participant
//!
//! The store's `update_request_status` is an atomic compare-and-set on the
//! current status, so two racing transitions from the same source state
//! cannot both succeed; the loser surfaces as
//! [`ToalaError::InvalidTransition`].

use metrics::counter;

use crate::domain::id::UserId;
use crate::error::{Result, ToalaError};
use crate::metrics::REQUEST_TRANSITIONS;
use crate::store::Store;

use super::state::{Approved, Completed, Declined, Pending, RentalRequest, RequestStatus};

impl RentalRequest<Pending> {
    /// Owner accepts the request.
    pub async fn approve<S: Store + ?Sized>(
        self,
        actor: UserId,
        store: &S,
    ) -> Result<RentalRequest<Approved>> {
        if actor != self.data.owner_id {
            return Err(ToalaError::Forbidden {
                actor,
                action: "approve this request",
            });
        }

        let updated_at = store
            .update_request_status(
                self.data.id,
                actor,
                RequestStatus::Pending,
                RequestStatus::Approved,
            )
            .await?;

        counter!(REQUEST_TRANSITIONS, "to" => "approved").increment(1);
        tracing::info!(request_id = %self.data.id, "Rental request approved");

        Ok(RentalRequest {
            data: self.data,
            state: Approved { updated_at },
        })
    }

    /// Owner turns the request down. Terminal.
    pub async fn decline<S: Store + ?Sized>(
        self,
        actor: UserId,
        store: &S,
    ) -> Result<RentalRequest<Declined>> {
        if actor != self.data.owner_id {
            return Err(ToalaError::Forbidden {
                actor,
                action: "decline this request",
            });
        }

        let updated_at = store
            .update_request_status(
                self.data.id,
                actor,
                RequestStatus::Pending,
                RequestStatus::Declined,
            )
            .await?;

        counter!(REQUEST_TRANSITIONS, "to" => "declined").increment(1);
        tracing::info!(request_id = %self.data.id, "Rental request declined");

        Ok(RentalRequest {
            data: self.data,
            state: Declined { updated_at },
        })
    }
}

impl RentalRequest<Approved> {
    /// Either participant marks the rental as finished. Terminal.
    pub async fn complete<S: Store + ?Sized>(
        self,
        actor: UserId,
        store: &S,
    ) -> Result<RentalRequest<Completed>> {
        if !self.data.is_participant(actor) {
            return Err(ToalaError::Forbidden {
                actor,
                action: "complete this request",
            });
        }

        let updated_at = store
            .update_request_status(
                self.data.id,
                actor,
                RequestStatus::Approved,
                RequestStatus::Completed,
            )
            .await?;

        counter!(REQUEST_TRANSITIONS, "to" => "completed").increment(1);
        tracing::info!(request_id = %self.data.id, "Rental request completed");

        Ok(RentalRequest {
            data: self.data,
            state: Completed { updated_at },
        })
    }
}
