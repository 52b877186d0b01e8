//! Transport layer abstraction for `chatkit`.
//!
//! Defines the [`Transport`] trait the embedding application implements
//! to actually deliver messages and receipts over a network. The only
//! in-tree implementation is [`loopback::LoopbackTransport`], an
//! in-process channel-based transport for tests and demos.

pub mod loopback;

use chatkit_model::message::{Message, MessageId};

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection to the server has been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// The operation timed out before completing.
    #[error("transport operation timed out")]
    Timeout,

    /// The server refused the operation.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// An underlying I/O error occurred.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Async transport trait for delivering messages and receipts.
///
/// Implementations carry [`Message`] values and receipt notices to
/// whatever backend the application talks to. The service layer never
/// assumes delivery succeeded from a returned `Ok(())` alone — delivered
/// and read confirmations arrive later as inbound events.
pub trait Transport: Send + Sync {
    /// Send a chat message to the server.
    ///
    /// `Ok(())` means the message was handed off to the backend, not that
    /// it reached the recipient.
    fn send_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Acknowledge delivery of an inbound message.
    fn send_delivery_receipt(
        &self,
        message_id: &MessageId,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Acknowledge that an inbound message has been read.
    fn send_read_receipt(
        &self,
        message_id: &MessageId,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
