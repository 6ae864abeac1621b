//! The external store boundary.
//!
//! This module defines the [`Store`] trait: every collaborator operation the
//! core consumes but never implements itself. Persistence, catalog queries,
//! and session resolution all live behind it. Two implementations ship:
//! [`rest::RestStore`] speaks to the marketplace REST API, and
//! [`memory::InMemoryStore`] is an in-process store for tests and embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::equipment::{Equipment, EquipmentFilter};
use crate::domain::id::{EquipmentId, RequestId, UserId};
use crate::domain::message::{Message, MessageDraft};
use crate::domain::request::{AnyRequest, Pending, RentalRequest, RequestInput, RequestRole, RequestStatus};
use crate::domain::user::User;
use crate::error::Result;

pub mod memory;
pub mod rest;

/// Store trait for the external collaborator.
///
/// Implementations are responsible for atomicity of the individual writes:
/// `store_request` and `store_message` are atomic inserts, and
/// `update_request_status` is an atomic compare-and-set. The core performs
/// no retries and holds no shared mutable state of its own; concurrent
/// callers are serialized only by these contracts.
#[async_trait]
pub trait Store: Send + Sync {
    /// Query the equipment catalog. Read-only; returns available listings
    /// matching the filter.
    async fn get_equipment(&self, filter: EquipmentFilter) -> Result<Vec<Equipment>>;

    /// Fetch a single listing.
    ///
    /// # Errors
    /// `ToalaError::EquipmentNotFound` if no listing has this id.
    async fn get_equipment_by_id(&self, id: EquipmentId) -> Result<Equipment>;

    /// Atomically insert a new rental request.
    ///
    /// The store assigns the id and creation timestamp; the returned request
    /// is always in the `pending` state.
    async fn store_request(&self, input: RequestInput) -> Result<RentalRequest<Pending>>;

    /// Atomically move a request from one status to another.
    ///
    /// This is a compare-and-set: the store must read the current status,
    /// compare it to `from`, and apply `to`, all as one atomic unit. If the
    /// stored status no longer equals `from` (a racing transition won),
    /// nothing changes and `ToalaError::InvalidTransition` is returned.
    ///
    /// Returns the store-assigned update timestamp.
    async fn update_request_status(
        &self,
        id: RequestId,
        actor: UserId,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<DateTime<Utc>>;

    /// List requests where `user` plays `role` (received vs. sent). No
    /// ordering is guaranteed here; callers sort.
    async fn list_requests(&self, user: UserId, role: RequestRole) -> Result<Vec<AnyRequest>>;

    /// Atomically insert a message.
    ///
    /// The store assigns the id and a timestamp that is non-decreasing
    /// within the message's request conversation.
    async fn store_message(&self, draft: MessageDraft) -> Result<Message>;

    /// All messages for a request, ascending by timestamp. Idempotent read.
    async fn list_messages(&self, request_id: RequestId) -> Result<Vec<Message>>;

    /// Resolve the session behind the store's bearer credential.
    ///
    /// # Errors
    /// `ToalaError::Unauthenticated` if the credential does not resolve to a
    /// user.
    async fn current_user(&self) -> Result<User>;
}
