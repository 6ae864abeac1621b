//! Chat messages tied to a rental request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::{MessageId, RequestId, UserId};

/// A message in a request's conversation.
///
/// Created once, never mutated or deleted. The timestamp is assigned by the
/// store at write time and is non-decreasing within a conversation. Visible
/// only to the request's two participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub request_id: RequestId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Whether the recipient has seen the message. Created `false`; the core
    /// exposes no path that flips it.
    #[serde(default)]
    pub read: bool,
}

/// A message before the store has assigned its id and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct MessageDraft {
    pub request_id: RequestId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
}
