//! Core message types for the `chatkit` conversation model.
//!
//! All types in this module are plain data: they carry no transport or
//! storage concerns and serialize with serde so the embedding application
//! can move them across its IPC bridge unchanged.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long after creation a message stays eligible for revocation.
pub const DEFAULT_REVOKE_WINDOW: Duration = Duration::from_millis(120_000);

/// Unique identifier for a message, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new time-ordered message identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `MessageId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a chat participant.
///
/// An opaque string assigned by whatever account system the embedding
/// application uses. Also serves as the conversation key: a conversation
/// is filed under the `UserId` of the non-local participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new user identifier from a string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this user ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Millisecond-precision UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Creates a timestamp from milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Payload category of a message.
///
/// The content string is opaque to this crate; its interpretation (plain
/// text, image path, file handle, voice clip reference) follows the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Image payload reference.
    Image,
    /// File payload reference.
    File,
    /// Voice clip reference.
    Voice,
}

/// Tracks the delivery lifecycle of a message.
///
/// Statuses only move forward along the delivery order
/// `Sending < Sent < Delivered < Read`; `Failed` is reachable only from
/// `Sending`, and `Read`/`Failed` are terminal. Forward moves may skip
/// intermediate states (an inbound message jumps straight to `Delivered`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Registered locally, transport outcome unknown.
    Sending,
    /// Accepted by the transport.
    Sent,
    /// Delivery confirmed by the recipient's client.
    Delivered,
    /// Read by the recipient.
    Read,
    /// Transport rejected the send. Terminal; a retry is a new message.
    Failed,
}

impl MessageStatus {
    /// Whether a transition from `self` to `next` is a legal forward move.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Sending, Self::Sent | Self::Delivered | Self::Read | Self::Failed)
                | (Self::Sent, Self::Delivered | Self::Read)
                | (Self::Delivered, Self::Read)
        )
    }

    /// Whether no further transition can leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Read | Self::Failed)
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Error returned when a status transition would move backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal status transition {from} -> {to}")]
pub struct StatusError {
    /// Status the message currently holds.
    pub from: MessageStatus,
    /// Status the caller tried to move to.
    pub to: MessageStatus,
}

/// One chat message and its mutable delivery/revocation state.
///
/// Identity (id, kind, participants, content, timestamp) is fixed at
/// construction; only the status and the revoked flag change afterwards,
/// and both only move forward — see [`advance_status`](Self::advance_status)
/// and [`revoke`](Self::revoke).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    kind: MessageKind,
    content: String,
    sender: UserId,
    receiver: UserId,
    timestamp: Timestamp,
    status: MessageStatus,
    revoked: bool,
    revoke_window: Duration,
}

impl Message {
    /// Create a message expressing local send intent.
    ///
    /// The identifier is generated, the timestamp is the current instant,
    /// the status starts at [`MessageStatus::Sending`], and the revoke
    /// window is [`DEFAULT_REVOKE_WINDOW`].
    pub fn new(
        kind: MessageKind,
        sender: UserId,
        receiver: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            kind,
            content: content.into(),
            sender,
            receiver,
            timestamp: Timestamp::now(),
            status: MessageStatus::Sending,
            revoked: false,
            revoke_window: DEFAULT_REVOKE_WINDOW,
        }
    }

    /// Create a plain text message expressing local send intent.
    pub fn text(sender: UserId, receiver: UserId, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Text, sender, receiver, content)
    }

    /// Reconstruct a message that arrived from a remote sender.
    ///
    /// The id and timestamp come from the wire data; the status starts at
    /// [`MessageStatus::Sent`] — it already left the sender's client and
    /// advances to `Delivered` once registered locally.
    pub fn from_remote(
        id: MessageId,
        kind: MessageKind,
        sender: UserId,
        receiver: UserId,
        content: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
            sender,
            receiver,
            timestamp,
            status: MessageStatus::Sent,
            revoked: false,
            revoke_window: DEFAULT_REVOKE_WINDOW,
        }
    }

    /// Replace the revoke window fixed at construction.
    #[must_use]
    pub const fn with_revoke_window(mut self, window: Duration) -> Self {
        self.revoke_window = window;
        self
    }

    /// Returns the unique message identifier.
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the payload kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the opaque content payload.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the sender's identifier.
    #[must_use]
    pub const fn sender(&self) -> &UserId {
        &self.sender
    }

    /// Returns the receiver's identifier.
    #[must_use]
    pub const fn receiver(&self) -> &UserId {
        &self.receiver
    }

    /// Returns the creation instant.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns the current delivery status.
    #[must_use]
    pub const fn status(&self) -> MessageStatus {
        self.status
    }

    /// Whether this message has been revoked.
    #[must_use]
    pub const fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Returns the revoke window fixed at construction.
    #[must_use]
    pub const fn revoke_window(&self) -> Duration {
        self.revoke_window
    }

    /// Returns the non-local participant of this message.
    ///
    /// For an outbound message (sent by `local`) this is the receiver; for
    /// an inbound one it is the sender. The conversation a message is
    /// filed under is always keyed by its counterpart, regardless of
    /// direction.
    #[must_use]
    pub fn counterpart<'a>(&'a self, local: &UserId) -> &'a UserId {
        if self.receiver == *local {
            &self.sender
        } else {
            &self.receiver
        }
    }

    /// Advance the delivery status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] and leaves the message unchanged if the
    /// move is not a legal forward transition.
    pub fn advance_status(&mut self, next: MessageStatus) -> Result<(), StatusError> {
        if self.status.can_advance_to(next) {
            self.status = next;
            Ok(())
        } else {
            Err(StatusError {
                from: self.status,
                to: next,
            })
        }
    }

    /// Revoke this message if it is still within its revoke window.
    ///
    /// Returns `true` (and sets the revoked flag) iff the time elapsed
    /// since creation is at most the revoke window; otherwise returns
    /// `false` and leaves all state unchanged. Revocation never touches
    /// the delivery status.
    pub fn revoke(&mut self) -> bool {
        self.revoke_at(Timestamp::now())
    }

    /// Revoke relative to an explicit `now`, for deterministic callers.
    ///
    /// Same semantics as [`revoke`](Self::revoke). A `now` earlier than
    /// the creation timestamp counts as zero elapsed time.
    pub fn revoke_at(&mut self, now: Timestamp) -> bool {
        let elapsed = now.as_millis().saturating_sub(self.timestamp.as_millis());
        if u128::from(elapsed) <= self.revoke_window.as_millis() {
            self.revoked = true;
            true
        } else {
            false
        }
    }
}
