//! Rental request aggregate - domain model and state transitions.
//!
//! This module contains the core domain logic for rental requests:
//! - Request types and statuses (typestate pattern)
//! - Status transition methods
//! - Value objects (RequestData, RequestInput)

pub mod state;
pub mod transitions;

// Re-export commonly used types
pub use state::*;
