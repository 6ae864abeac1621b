//! Per-request message channel.
//!
//! A [`MessageChannel`] binds a conversation to one rental request and its
//! two participants. Posting derives the recipient as "the other
//! participant" - callers never supply it. Fetching is an idempotent
//! ascending read.
//!
//! Freshness is pull-based: there is no push delivery, consumers re-fetch.
//! [`MessageChannel::poll`] packages that loop - a repeating interval tick
//! owned by the caller through a [`CancellationToken`], released
//! deterministically on cancellation or when the receiving side is dropped.
//! The `post`/`fetch` contract would be unchanged by a future push channel.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::id::{RequestId, UserId};
use crate::domain::message::{Message, MessageDraft};
use crate::domain::request::RequestData;
use crate::error::{Result, ToalaError, ValidationError};
use crate::metrics::{MESSAGES_POSTED, POLL_DELIVERIES};
use crate::store::Store;

/// Buffered messages a slow poll consumer can lag behind by.
const POLL_CHANNEL_CAPACITY: usize = 64;

/// Conversation bound to a single rental request.
///
/// Open in every request status: negotiation may continue after a decline,
/// and history stays inspectable after completion.
pub struct MessageChannel<S: Store> {
    store: Arc<S>,
    request_id: RequestId,
    owner_id: UserId,
    requester_id: UserId,
}

// Manual impl: cloning shares the store, S itself need not be Clone.
impl<S: Store> Clone for MessageChannel<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            request_id: self.request_id,
            owner_id: self.owner_id,
            requester_id: self.requester_id,
        }
    }
}

impl<S: Store> MessageChannel<S> {
    /// Bind a channel to the request described by `request`.
    pub fn new(store: Arc<S>, request: &RequestData) -> Self {
        Self {
            store,
            request_id: request.id,
            owner_id: request.owner_id,
            requester_id: request.requester_id,
        }
    }

    fn counterparty(&self, user: UserId) -> Option<UserId> {
        if user == self.owner_id {
            Some(self.requester_id)
        } else if user == self.requester_id {
            Some(self.owner_id)
        } else {
            None
        }
    }

    /// Post a message from `sender` to the other participant.
    ///
    /// # Errors
    /// - `ToalaError::Forbidden` if `sender` is neither participant.
    /// - `ToalaError::Validation` if `content` is empty after trimming.
    ///
    /// Both are checked before the store sees any call.
    #[tracing::instrument(skip(self, content), fields(request_id = %self.request_id, sender = %sender))]
    pub async fn post(&self, sender: UserId, content: &str) -> Result<Message> {
        let Some(recipient) = self.counterparty(sender) else {
            return Err(ToalaError::Forbidden {
                actor: sender,
                action: "message in this conversation",
            });
        };
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }

        let message = self
            .store
            .store_message(MessageDraft {
                request_id: self.request_id,
                sender_id: sender,
                recipient_id: recipient,
                content: content.to_string(),
            })
            .await?;

        counter!(MESSAGES_POSTED).increment(1);
        tracing::debug!(message_id = %message.id, "Message posted");
        Ok(message)
    }

    /// All messages of the conversation, ascending by timestamp.
    ///
    /// Idempotent: with no intervening post, repeated calls return an
    /// identical sequence.
    ///
    /// # Errors
    /// `ToalaError::Forbidden` if `actor` is neither participant.
    pub async fn fetch(&self, actor: UserId) -> Result<Vec<Message>> {
        if self.counterparty(actor).is_none() {
            return Err(ToalaError::Forbidden {
                actor,
                action: "read this conversation",
            });
        }
        self.store.list_messages(self.request_id).await
    }

    /// Start a polling loop that re-fetches every `every` and forwards
    /// messages not yet delivered to the returned receiver.
    ///
    /// The loop runs until one of:
    /// - `token` is cancelled (returns `Ok(())`),
    /// - the receiver is dropped (returns `Ok(())`),
    /// - a fetch fails (returns the error; restarting is the caller's call).
    ///
    /// The interval's lifetime is owned by whoever holds the token; cancel
    /// it on teardown and the task ends on its next wakeup.
    pub fn poll(
        &self,
        actor: UserId,
        every: Duration,
        token: CancellationToken,
    ) -> (JoinHandle<Result<()>>, mpsc::Receiver<Message>)
    where
        S: 'static,
    {
        let (tx, rx) = mpsc::channel(POLL_CHANNEL_CAPACITY);
        let channel = self.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // Delivered ids; grows with the conversation, which is bounded
            // by the rental negotiation it serves.
            let mut delivered: HashSet<_> = HashSet::new();
            tracing::debug!(
                request_id = %channel.request_id,
                interval_ms = every.as_millis() as u64,
                "Message polling started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let messages = channel.fetch(actor).await?;
                        for message in messages {
                            if !delivered.insert(message.id) {
                                continue;
                            }
                            if tx.send(message).await.is_err() {
                                tracing::debug!(
                                    request_id = %channel.request_id,
                                    "Poll receiver dropped, stopping"
                                );
                                return Ok(());
                            }
                            counter!(POLL_DELIVERIES).increment(1);
                        }
                    }
                    _ = token.cancelled() => {
                        tracing::debug!(
                            request_id = %channel.request_id,
                            "Message polling cancelled"
                        );
                        return Ok(());
                    }
                }
            }
        });

        (handle, rx)
    }
}
