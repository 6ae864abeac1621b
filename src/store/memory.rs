//! In-memory store for tests and embedding.
//!
//! Plays the role a mock collaborator plays in tests: fixtures are seeded up
//! front, every write is counted so tests can assert that validation
//! failures reach the store zero times, and all operations take one lock so
//! the compare-and-set contract holds under concurrent use.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::domain::equipment::{Equipment, EquipmentFilter};
use crate::domain::id::{EquipmentId, MessageId, RequestId, UserId};
use crate::domain::message::{Message, MessageDraft};
use crate::domain::request::{
    AnyRequest, Approved, Completed, Declined, Pending, RentalRequest, RequestData, RequestInput,
    RequestRole, RequestStatus,
};
use crate::domain::user::User;
use crate::error::{Result, ToalaError};
use crate::store::Store;

/// Default page size for catalog queries when the filter sets no limit.
const DEFAULT_CATALOG_LIMIT: usize = 20;

#[derive(Debug, Clone)]
struct RequestRecord {
    data: RequestData,
    status: RequestStatus,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    equipment: HashMap<EquipmentId, Equipment>,
    requests: HashMap<RequestId, RequestRecord>,
    /// Kept in insertion order; timestamps are strictly increasing so this
    /// is also ascending timestamp order.
    messages: Vec<Message>,
    session: Option<UserId>,
    writes: u64,
    clock: Option<DateTime<Utc>>,
}

impl State {
    /// Store-assigned timestamp, strictly greater than any previously
    /// assigned one.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(prev) => std::cmp::max(now, prev + Duration::milliseconds(1)),
            None => now,
        };
        self.clock = Some(next);
        next
    }
}

/// In-process [`Store`] implementation.
///
/// # Example
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// store.add_user(owner.clone());
/// store.add_equipment(drill.clone());
/// store.sign_in(owner.id);
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user into the store.
    pub fn add_user(&self, user: User) {
        self.state.lock().users.insert(user.id, user);
    }

    /// Seed an equipment listing into the store.
    pub fn add_equipment(&self, equipment: Equipment) {
        self.state.lock().equipment.insert(equipment.id, equipment);
    }

    /// Bind the store's session to a seeded user, as a bearer credential
    /// would in the REST store.
    pub fn sign_in(&self, user: UserId) {
        self.state.lock().session = Some(user);
    }

    /// Number of writes (request inserts, status updates, message inserts)
    /// the store has committed.
    pub fn write_count(&self) -> u64 {
        self.state.lock().writes
    }
}

fn materialize(record: &RequestRecord) -> AnyRequest {
    let data = record.data.clone();
    // updated_at is always set once the request has left pending
    let updated_at = record.updated_at.unwrap_or(data.created_at);
    match record.status {
        RequestStatus::Pending => AnyRequest::Pending(RentalRequest {
            data,
            state: Pending {},
        }),
        RequestStatus::Approved => AnyRequest::Approved(RentalRequest {
            data,
            state: Approved { updated_at },
        }),
        RequestStatus::Declined => AnyRequest::Declined(RentalRequest {
            data,
            state: Declined { updated_at },
        }),
        RequestStatus::Completed => AnyRequest::Completed(RentalRequest {
            data,
            state: Completed { updated_at },
        }),
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_equipment(&self, filter: EquipmentFilter) -> Result<Vec<Equipment>> {
        let state = self.state.lock();
        let location = filter.location.as_ref().map(|l| l.to_lowercase());
        let mut listings: Vec<Equipment> = state
            .equipment
            .values()
            .filter(|e| e.is_available)
            .filter(|e| filter.category.map_or(true, |c| e.category == c))
            .filter(|e| {
                location
                    .as_ref()
                    .map_or(true, |l| e.location.to_lowercase().contains(l))
            })
            .filter(|e| filter.max_price.map_or(true, |p| e.price_per_day <= p))
            .cloned()
            .collect();
        listings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(listings
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit.unwrap_or(DEFAULT_CATALOG_LIMIT))
            .collect())
    }

    async fn get_equipment_by_id(&self, id: EquipmentId) -> Result<Equipment> {
        self.state
            .lock()
            .equipment
            .get(&id)
            .cloned()
            .ok_or(ToalaError::EquipmentNotFound(id))
    }

    async fn store_request(&self, input: RequestInput) -> Result<RentalRequest<Pending>> {
        let mut state = self.state.lock();
        let created_at = state.tick();
        let data = RequestData {
            id: RequestId::new(),
            equipment_id: input.equipment_id,
            owner_id: input.owner_id,
            requester_id: input.requester_id,
            start_date: input.start_date,
            end_date: input.end_date,
            total_price: input.total_price,
            message: input.message,
            created_at,
        };
        state.requests.insert(
            data.id,
            RequestRecord {
                data: data.clone(),
                status: RequestStatus::Pending,
                updated_at: None,
            },
        );
        state.writes += 1;
        Ok(RentalRequest {
            data,
            state: Pending {},
        })
    }

    async fn update_request_status(
        &self,
        id: RequestId,
        _actor: UserId,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<DateTime<Utc>> {
        let mut state = self.state.lock();
        let updated_at = state.tick();
        let record = state
            .requests
            .get_mut(&id)
            .ok_or(ToalaError::RequestNotFound(id))?;
        // Compare-and-set under the lock: a stale caller loses.
        if record.status != from {
            return Err(ToalaError::InvalidTransition(id, record.status, to));
        }
        record.status = to;
        record.updated_at = Some(updated_at);
        state.writes += 1;
        Ok(updated_at)
    }

    async fn list_requests(&self, user: UserId, role: RequestRole) -> Result<Vec<AnyRequest>> {
        let state = self.state.lock();
        Ok(state
            .requests
            .values()
            .filter(|r| match role {
                RequestRole::Owner => r.data.owner_id == user,
                RequestRole::Requester => r.data.requester_id == user,
            })
            .map(materialize)
            .collect())
    }

    async fn store_message(&self, draft: MessageDraft) -> Result<Message> {
        let mut state = self.state.lock();
        if !state.requests.contains_key(&draft.request_id) {
            return Err(ToalaError::RequestNotFound(draft.request_id));
        }
        let timestamp = state.tick();
        let message = Message {
            id: MessageId::new(),
            request_id: draft.request_id,
            sender_id: draft.sender_id,
            recipient_id: draft.recipient_id,
            content: draft.content,
            timestamp,
            read: false,
        };
        state.messages.push(message.clone());
        state.writes += 1;
        Ok(message)
    }

    async fn list_messages(&self, request_id: RequestId) -> Result<Vec<Message>> {
        let state = self.state.lock();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn current_user(&self) -> Result<User> {
        let state = self.state.lock();
        state
            .session
            .and_then(|id| state.users.get(&id).cloned())
            .ok_or(ToalaError::Unauthenticated)
    }
}
