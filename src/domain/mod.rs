//! Core domain types for the marketplace.
//!
//! This module contains pure domain types with no persistence dependencies:
//! - Identifiers (uuid newtypes)
//! - External entities referenced by the core (users, equipment)
//! - The rental request typestate machine
//! - Messages exchanged over a request's conversation

pub mod equipment;
pub mod id;
pub mod message;
pub mod request;
pub mod user;
