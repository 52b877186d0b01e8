//! Loopback transport for tests and demos.
//!
//! Every outbound frame is pushed onto an in-process channel so the far
//! side of the pair can observe exactly what the service sent. A failure
//! toggle makes every operation fail with
//! [`TransportError::ConnectionClosed`] until cleared.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use chatkit_model::message::{Message, MessageId};

use super::{Transport, TransportError};

/// A frame observed on the far side of a [`LoopbackTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// A chat message handed to the transport.
    Message(Message),
    /// A delivery receipt for the given message.
    DeliveryReceipt(MessageId),
    /// A read receipt for the given message.
    ReadReceipt(MessageId),
}

/// In-process transport backed by a `tokio::sync::mpsc` channel.
pub struct LoopbackTransport {
    tx: mpsc::Sender<OutboundFrame>,
    failing: AtomicBool,
}

impl LoopbackTransport {
    /// Create a transport and the receiver observing its outbound frames.
    ///
    /// The `buffer` parameter controls the channel capacity.
    #[must_use]
    pub fn create(buffer: usize) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                tx,
                failing: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// Toggle failure injection: while set, every operation returns
    /// [`TransportError::ConnectionClosed`] without emitting a frame.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    async fn deliver(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }
        self.tx
            .send(frame)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

impl Transport for LoopbackTransport {
    async fn send_message(&self, message: &Message) -> Result<(), TransportError> {
        self.deliver(OutboundFrame::Message(message.clone())).await
    }

    async fn send_delivery_receipt(&self, message_id: &MessageId) -> Result<(), TransportError> {
        self.deliver(OutboundFrame::DeliveryReceipt(message_id.clone()))
            .await
    }

    async fn send_read_receipt(&self, message_id: &MessageId) -> Result<(), TransportError> {
        self.deliver(OutboundFrame::ReadReceipt(message_id.clone()))
            .await
    }
}
