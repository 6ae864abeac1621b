//! Rental-request lifecycle and messaging core for a peer-to-peer equipment
//! marketplace.
//!
//! This crate owns the two pieces of the marketplace with real invariants:
//! the rental-request state machine (creation, pricing, status transitions,
//! who may do what) and the per-request message channel (append-only
//! conversation between the two participants, pull-based freshness).
//! Everything else - persistence, catalog, session issuance - lives behind
//! the [`Store`] trait and is consumed, never implemented, by the core.
//!
//! Status transitions are typestate-checked: `pending → approved|declined`
//! by the owner, `approved → completed` by either participant, and terminal
//! states have no transition methods at all. The store's atomic
//! compare-and-set keeps racing transitions from both succeeding.

pub mod channel;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod store;

// Re-export commonly used types
pub use channel::MessageChannel;
pub use domain::equipment::{Equipment, EquipmentCategory, EquipmentFilter};
pub use domain::id::{EquipmentId, MessageId, RequestId, UserId};
pub use domain::message::{Message, MessageDraft};
pub use domain::request::{
    AnyRequest, Approved, Completed, Declined, Pending, RentalRequest, RequestData, RequestInput,
    RequestRole, RequestState, RequestStatus,
};
pub use domain::user::User;
pub use error::{Result, ToalaError, ValidationError};
pub use lifecycle::RequestLifecycleManager;
pub use store::memory::InMemoryStore;
pub use store::rest::RestStore;
pub use store::Store;
