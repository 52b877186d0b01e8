//! Receive and read-receipt methods for [`MessageService`].
//!
//! Receipts are fire-and-forget: a receipt that fails to send is logged,
//! queued, and retried on [`flush_pending_receipts`](MessageService::flush_pending_receipts) —
//! it never surfaces to the caller of the receive or mark-read operation.

use chatkit_model::message::{Message, MessageId, MessageStatus, UserId};

use crate::transport::Transport;

use super::{ChatEvent, MessageService, PendingReceipt};

impl<T: Transport> MessageService<T> {
    /// Register an inbound message and acknowledge its delivery.
    ///
    /// The message is filed under its counterpart (the sender, for
    /// inbound), advanced to `delivered`, and a delivery receipt is sent
    /// through the transport. Returns the registered message.
    pub async fn receive_message(&self, mut message: Message) -> Message {
        if let Err(err) = message.advance_status(MessageStatus::Delivered) {
            tracing::debug!(message_id = %message.id(), error = %err, "inbound message kept its status");
        }
        {
            let mut conversations = self.conversations.lock().await;
            let contact = message.counterpart(conversations.local_user()).clone();
            conversations.add_message(&contact, message.clone());
        }

        if let Err(err) = self.transport.send_delivery_receipt(message.id()).await {
            tracing::warn!(
                message_id = %message.id(),
                error = %err,
                "failed to send delivery receipt, queueing for retry"
            );
            self.queue_receipt(PendingReceipt::Delivery(message.id().clone()))
                .await;
        }

        self.emit(ChatEvent::MessageReceived {
            message: message.clone(),
        });
        message
    }

    /// Mark `sender`'s conversation read and acknowledge the message.
    ///
    /// Resets the unread counter (creating the conversation if absent),
    /// advances the referenced message to `read` when that transition is
    /// legal, and sends a read receipt keyed by the message id.
    pub async fn mark_message_read(&self, message_id: &MessageId, sender: &UserId) {
        let advanced = {
            let mut conversations = self.conversations.lock().await;
            conversations.mark_read(sender);
            conversations.update_status(sender, message_id, MessageStatus::Read)
        };
        if advanced {
            self.emit(ChatEvent::StatusChanged {
                message_id: message_id.clone(),
                status: MessageStatus::Read,
            });
        }
        self.emit(ChatEvent::ConversationRead {
            contact: sender.clone(),
        });

        if let Err(err) = self.transport.send_read_receipt(message_id).await {
            tracing::warn!(
                message_id = %message_id,
                error = %err,
                "failed to send read receipt, queueing for retry"
            );
            self.queue_receipt(PendingReceipt::Read(message_id.clone()))
                .await;
        }
    }

    /// Attempt to resend all queued receipts through the transport.
    ///
    /// Returns the number of receipts successfully sent; the rest are
    /// re-queued for another attempt.
    pub async fn flush_pending_receipts(&self) -> usize {
        let receipts: Vec<PendingReceipt> = {
            let mut pending = self.pending_receipts.lock().await;
            pending.drain(..).collect()
        };

        let total = receipts.len();
        let mut succeeded = 0;

        for receipt in receipts {
            let result = match &receipt {
                PendingReceipt::Delivery(id) => self.transport.send_delivery_receipt(id).await,
                PendingReceipt::Read(id) => self.transport.send_read_receipt(id).await,
            };
            if result.is_ok() {
                succeeded += 1;
            } else {
                self.pending_receipts.lock().await.push_back(receipt);
            }
        }

        if succeeded > 0 {
            tracing::info!(
                succeeded,
                remaining = total - succeeded,
                "flushed pending receipts"
            );
        }
        succeeded
    }

    /// Queue a failed receipt, dropping the oldest entry when full.
    async fn queue_receipt(&self, receipt: PendingReceipt) {
        let mut pending = self.pending_receipts.lock().await;
        if pending.len() >= self.config.max_pending_receipts {
            if let Some(dropped) = pending.pop_front() {
                tracing::warn!(?dropped, "pending receipt queue full, dropping oldest");
            }
        }
        pending.push_back(receipt);
    }
}
