//! Chat application layer for `chatkit`.
//!
//! Contains the [`MessageService`] which orchestrates the optimistic send
//! flow (register locally -> transmit -> update status), the inbound
//! registration/acknowledgment flow, read marking with read receipts,
//! and the retry queue for receipts that failed to send.

pub mod conversations;

mod receive;
mod send;

use std::collections::VecDeque;

use tokio::sync::{Mutex, mpsc};

use chatkit_model::message::{Message, MessageId, MessageStatus, UserId};

use crate::config::ServiceConfig;
use crate::transport::{Transport, TransportError};

use conversations::ConversationManager;

/// Errors surfaced by [`MessageService::send_message`].
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The transport rejected the send. The message stays registered
    /// locally with status `failed`; retrying means sending a new message.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Events emitted by the [`MessageService`] for UI notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A message's delivery status changed.
    StatusChanged {
        /// The message whose status changed.
        message_id: MessageId,
        /// The new status.
        status: MessageStatus,
    },
    /// An inbound message was registered.
    MessageReceived {
        /// The registered message, status already `delivered`.
        message: Message,
    },
    /// A conversation's unread counter was reset.
    ConversationRead {
        /// The contact whose conversation was marked read.
        contact: UserId,
    },
}

/// A receipt that failed to send and awaits retry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingReceipt {
    /// Delivery acknowledgment for the given message.
    Delivery(MessageId),
    /// Read acknowledgment for the given message.
    Read(MessageId),
}

/// Orchestrates send/receive/read flows over an injected [`Transport`].
///
/// All conversation state lives behind a single mutex; each operation's
/// registry mutation happens in one lock scope with no await points while
/// held. Transport calls are awaited outside any lock, so unrelated
/// operations never block each other on the network.
pub struct MessageService<T: Transport> {
    /// The transport used for messages and receipts.
    transport: T,
    /// Registry of conversations keyed by the non-local participant.
    conversations: Mutex<ConversationManager>,
    /// Channel for emitting chat events to the UI layer.
    event_tx: mpsc::Sender<ChatEvent>,
    /// Receipts that failed to send, awaiting [`flush_pending_receipts`](Self::flush_pending_receipts).
    pending_receipts: Mutex<VecDeque<PendingReceipt>>,
    /// Service configuration fixed at construction.
    config: ServiceConfig,
}

impl<T: Transport> MessageService<T> {
    /// Creates a new `MessageService` acting on behalf of `local_user`.
    ///
    /// Returns the service and a receiver for [`ChatEvent`]s that the UI
    /// layer should consume. Event emission is best-effort: a full buffer
    /// drops the event rather than blocking an operation.
    pub fn new(
        transport: T,
        local_user: UserId,
        config: ServiceConfig,
    ) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let service = Self {
            transport,
            conversations: Mutex::new(ConversationManager::new(local_user)),
            event_tx,
            pending_receipts: Mutex::new(VecDeque::new()),
            config,
        };
        (service, event_rx)
    }

    /// Current status of a stored message, if present.
    pub async fn message_status(&self, contact: &UserId, id: &MessageId) -> Option<MessageStatus> {
        self.conversations.lock().await.message_status(contact, id)
    }

    /// Unread count for `contact`; zero when no conversation exists.
    pub async fn unread_count(&self, contact: &UserId) -> usize {
        self.conversations.lock().await.unread_count(contact)
    }

    /// All messages filed under `contact`, in arrival order.
    pub async fn messages(&self, contact: &UserId) -> Vec<Message> {
        self.conversations
            .lock()
            .await
            .get(contact)
            .map(|c| c.messages().to_vec())
            .unwrap_or_default()
    }

    /// The most recently appended message for `contact`, if any.
    pub async fn last_message(&self, contact: &UserId) -> Option<Message> {
        self.conversations
            .lock()
            .await
            .get(contact)
            .and_then(|c| c.last_message().cloned())
    }

    /// Text messages for `contact` matching `keyword` case-insensitively.
    pub async fn search_messages(&self, contact: &UserId, keyword: &str) -> Vec<Message> {
        self.conversations
            .lock()
            .await
            .search_messages(contact, keyword)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Revoke a stored message if it is still within its revoke window.
    pub async fn revoke_message(&self, contact: &UserId, id: &MessageId) -> bool {
        self.conversations.lock().await.revoke_message(contact, id)
    }

    /// Number of receipts awaiting retry.
    pub async fn pending_receipt_count(&self) -> usize {
        self.pending_receipts.lock().await.len()
    }

    /// Returns a reference to the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.event_tx.try_send(event);
    }
}
