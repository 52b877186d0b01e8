//! Conversation registry for `chatkit`.
//!
//! A [`Conversation`] is the ordered record of messages exchanged with
//! one contact plus unread bookkeeping; the [`ConversationManager`] owns
//! the map from contact to conversation and is the sole authority for
//! creating and mutating them. Conversations are created lazily on first
//! access and never removed.

use std::collections::HashMap;

use chatkit_model::message::{Message, MessageId, MessageKind, MessageStatus, UserId};

/// The ordered message record for one contact.
///
/// Messages are appended in arrival order (which is not necessarily
/// timestamp order) and live as long as the owning manager. The unread
/// counter increments only for messages addressed to the local user and
/// resets only through [`ConversationManager::mark_read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    contact: UserId,
    messages: Vec<Message>,
    unread: usize,
}

impl Conversation {
    fn new(contact: UserId) -> Self {
        Self {
            contact,
            messages: Vec::new(),
            unread: 0,
        }
    }

    /// The contact this conversation is filed under.
    #[must_use]
    pub const fn contact(&self) -> &UserId {
        &self.contact
    }

    /// All messages, in arrival order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages addressed to the local user not yet marked read.
    #[must_use]
    pub const fn unread_count(&self) -> usize {
        self.unread
    }

    /// The most recently appended message, if any.
    ///
    /// Under append-only insertion this is always the sequence tail, so no
    /// separate cache is kept.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Look up a message by id (linear scan).
    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id() == id)
    }
}

/// Keyed registry of conversations for one local user.
///
/// The local identity is fixed at construction and decides unread-count
/// increments; there is no ambient "current user" state anywhere else.
#[derive(Debug)]
pub struct ConversationManager {
    local_user: UserId,
    conversations: HashMap<UserId, Conversation>,
}

impl ConversationManager {
    /// Create an empty registry acting on behalf of `local_user`.
    #[must_use]
    pub fn new(local_user: UserId) -> Self {
        Self {
            local_user,
            conversations: HashMap::new(),
        }
    }

    /// The local user this registry counts unread messages for.
    #[must_use]
    pub const fn local_user(&self) -> &UserId {
        &self.local_user
    }

    /// Get the conversation for `contact`, creating an empty one first if
    /// none exists. Idempotent.
    pub fn conversation(&mut self, contact: &UserId) -> &mut Conversation {
        self.conversations
            .entry(contact.clone())
            .or_insert_with_key(|key| Conversation::new(key.clone()))
    }

    /// Read-only lookup that never creates.
    #[must_use]
    pub fn get(&self, contact: &UserId) -> Option<&Conversation> {
        self.conversations.get(contact)
    }

    /// Append `message` to the tail of `contact`'s conversation.
    ///
    /// Increments the unread counter iff the message's receiver is the
    /// local user. Returns the conversation.
    pub fn add_message(&mut self, contact: &UserId, message: Message) -> &Conversation {
        let inbound = *message.receiver() == self.local_user;
        let conversation = self.conversation(contact);
        conversation.messages.push(message);
        if inbound {
            conversation.unread += 1;
        }
        conversation
    }

    /// Reset `contact`'s unread counter to zero, creating the
    /// conversation if absent. Returns the conversation.
    pub fn mark_read(&mut self, contact: &UserId) -> &Conversation {
        let conversation = self.conversation(contact);
        conversation.unread = 0;
        conversation
    }

    /// Text messages in `contact`'s conversation whose content contains
    /// `keyword`, matched case-insensitively (Unicode-aware lowercase,
    /// locale-independent). Non-text messages never match. A missing
    /// conversation yields an empty result without being created.
    #[must_use]
    pub fn search_messages(&self, contact: &UserId, keyword: &str) -> Vec<&Message> {
        let Some(conversation) = self.conversations.get(contact) else {
            return Vec::new();
        };
        let needle = keyword.to_lowercase();
        conversation
            .messages
            .iter()
            .filter(|m| m.kind() == MessageKind::Text && m.content().to_lowercase().contains(&needle))
            .collect()
    }

    /// Advance the status of a stored message.
    ///
    /// Returns `true` iff the message was found and the transition was a
    /// legal forward move; otherwise logs at `debug` and returns `false`
    /// leaving the message unchanged.
    pub fn update_status(&mut self, contact: &UserId, id: &MessageId, status: MessageStatus) -> bool {
        let Some(message) = self
            .conversations
            .get_mut(contact)
            .and_then(|c| c.message_mut(id))
        else {
            tracing::debug!(contact = %contact, message_id = %id, "status update for unknown message");
            return false;
        };
        match message.advance_status(status) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(contact = %contact, message_id = %id, error = %err, "rejected status transition");
                false
            }
        }
    }

    /// Revoke a stored message if it is still within its revoke window.
    ///
    /// Returns the revoke outcome; `false` also covers an unknown message.
    pub fn revoke_message(&mut self, contact: &UserId, id: &MessageId) -> bool {
        self.conversations
            .get_mut(contact)
            .and_then(|c| c.message_mut(id))
            .is_some_and(Message::revoke)
    }

    /// Current status of a stored message, if present.
    #[must_use]
    pub fn message_status(&self, contact: &UserId, id: &MessageId) -> Option<MessageStatus> {
        self.get(contact)
            .and_then(|c| c.message(id))
            .map(Message::status)
    }

    /// Unread count for `contact`; zero when no conversation exists.
    #[must_use]
    pub fn unread_count(&self, contact: &UserId) -> usize {
        self.get(contact).map_or(0, Conversation::unread_count)
    }
}
