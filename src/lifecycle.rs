//! Rental request lifecycle management.
//!
//! [`RequestLifecycleManager`] owns the write path of the request state
//! machine: validated creation with derived pricing, dynamic status
//! transitions dispatched onto the typed edges in
//! [`domain::request::transitions`](crate::domain::request::transitions),
//! and the listing read used by inbox/outbox views.
//!
//! Every mutating operation is a single store write. Validation runs first
//! and a failure returns before the store sees any call.

use std::sync::Arc;

use chrono::NaiveDate;
use metrics::counter;

use crate::domain::equipment::Equipment;
use crate::domain::id::UserId;
use crate::domain::request::{
    AnyRequest, Pending, RentalRequest, RequestInput, RequestRole, RequestStatus,
};
use crate::error::{Result, ToalaError, ValidationError};
use crate::metrics::REQUESTS_CREATED;
use crate::store::Store;

/// Inclusive day count of a rental, both endpoints counted.
///
/// Callers must have checked `start <= end`.
fn span_days(start: NaiveDate, end: NaiveDate) -> u32 {
    (end - start).num_days() as u32 + 1
}

/// Manager for the rental-request state machine.
///
/// Generic over the store so the same logic runs against the REST store in
/// production and the in-memory store in tests.
pub struct RequestLifecycleManager<S: Store + ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> RequestLifecycleManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a rental request for `equipment` on behalf of `requester`.
    ///
    /// Validates availability, self-request, date order, span bounds, and
    /// the message, then computes the total price and performs the single
    /// store write. The result is always `pending`.
    ///
    /// # Errors
    /// `ToalaError::Validation` when any precondition fails; the store
    /// receives zero calls in that case.
    #[tracing::instrument(skip(self, equipment, message), fields(equipment_id = %equipment.id, requester = %requester))]
    pub async fn create(
        &self,
        requester: UserId,
        equipment: &Equipment,
        start_date: NaiveDate,
        end_date: NaiveDate,
        message: &str,
    ) -> Result<RentalRequest<Pending>> {
        if !equipment.is_available {
            return Err(ValidationError::Unavailable(equipment.id).into());
        }
        if requester == equipment.owner_id {
            return Err(ValidationError::SelfRequest.into());
        }
        if end_date < start_date {
            return Err(ValidationError::InvalidDateRange {
                start: start_date,
                end: end_date,
            }
            .into());
        }
        let span = span_days(start_date, end_date);
        if span < equipment.min_rental_days {
            return Err(ValidationError::SpanTooShort {
                span,
                min: equipment.min_rental_days,
            }
            .into());
        }
        if let Some(max) = equipment.max_rental_days {
            if span > max {
                return Err(ValidationError::SpanTooLong { span, max }.into());
            }
        }
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let total_price = span as f64 * equipment.price_per_day;
        let request = self
            .store
            .store_request(RequestInput {
                equipment_id: equipment.id,
                owner_id: equipment.owner_id,
                requester_id: requester,
                start_date,
                end_date,
                total_price,
                message: message.to_string(),
            })
            .await?;

        counter!(REQUESTS_CREATED).increment(1);
        tracing::info!(
            request_id = %request.data.id,
            span_days = span,
            total_price,
            "Rental request created"
        );
        Ok(request)
    }

    /// Move `request` to `target` on behalf of `actor`.
    ///
    /// Dynamic front door over the typed transitions, for callers that only
    /// know the target status at runtime. The actor is authorized for the
    /// target first, then the edge is checked:
    ///
    /// # Errors
    /// - `ToalaError::Forbidden` when the actor may not drive this target
    ///   status, regardless of the current one.
    /// - `ToalaError::InvalidTransition` for any edge other than
    ///   `pending→approved`, `pending→declined`, `approved→completed` —
    ///   including transitions out of a terminal status, and stale requests
    ///   losing the store's compare-and-set.
    pub async fn transition(
        &self,
        request: AnyRequest,
        actor: UserId,
        target: RequestStatus,
    ) -> Result<AnyRequest> {
        // Authorization first: a wrong actor gets Forbidden even when the
        // edge itself would be invalid.
        let data = request.data();
        match target {
            RequestStatus::Approved | RequestStatus::Declined => {
                if actor != data.owner_id {
                    return Err(ToalaError::Forbidden {
                        actor,
                        action: "decide on this request",
                    });
                }
            }
            RequestStatus::Completed => {
                if !data.is_participant(actor) {
                    return Err(ToalaError::Forbidden {
                        actor,
                        action: "complete this request",
                    });
                }
            }
            // Nothing transitions back to pending; fall through to the edge
            // check below.
            RequestStatus::Pending => {}
        }

        let store = self.store.as_ref();
        match (request, target) {
            (AnyRequest::Pending(req), RequestStatus::Approved) => {
                Ok(req.approve(actor, store).await?.into())
            }
            (AnyRequest::Pending(req), RequestStatus::Declined) => {
                Ok(req.decline(actor, store).await?.into())
            }
            (AnyRequest::Approved(req), RequestStatus::Completed) => {
                Ok(req.complete(actor, store).await?.into())
            }
            (request, target) => Err(ToalaError::InvalidTransition(
                request.id(),
                request.status(),
                target,
            )),
        }
    }

    /// Requests where `user` plays `role`, most recent first.
    ///
    /// The descending creation order is a presentation convenience; the sort
    /// is stable, so equal timestamps keep the store's order.
    pub async fn list(&self, user: UserId, role: RequestRole) -> Result<Vec<AnyRequest>> {
        let mut requests = self.store.list_requests(user, role).await?;
        requests.sort_by(|a, b| b.data().created_at.cmp(&a.data().created_at));
        Ok(requests)
    }
}
