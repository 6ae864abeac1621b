//! Metric names for lifecycle and messaging observability.
//!
//! Counters are emitted through the `metrics` facade at the points where
//! state actually changes; whatever recorder the embedding application
//! installs decides where they go. Names are centralized here so dashboards
//! and code cannot drift apart.

use metrics::describe_counter;

/// Rental requests successfully created.
pub const REQUESTS_CREATED: &str = "toala_requests_created_total";

/// Status transitions, labeled by target status (`to`).
pub const REQUEST_TRANSITIONS: &str = "toala_request_transitions_total";

/// Chat messages posted.
pub const MESSAGES_POSTED: &str = "toala_messages_posted_total";

/// Messages delivered to poll subscribers.
pub const POLL_DELIVERIES: &str = "toala_poll_deliveries_total";

/// Register descriptions for every metric the crate emits.
///
/// Optional; call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_CREATED, "Rental requests successfully created");
    describe_counter!(
        REQUEST_TRANSITIONS,
        "Rental request status transitions by target status"
    );
    describe_counter!(MESSAGES_POSTED, "Chat messages posted to a request conversation");
    describe_counter!(
        POLL_DELIVERIES,
        "Messages delivered to polling subscribers"
    );
}
