//! Send pipeline methods for [`MessageService`].

use chatkit_model::message::{Message, MessageStatus, UserId};

use crate::transport::Transport;

use super::{ChatEvent, MessageService, SendError};

impl<T: Transport> MessageService<T> {
    /// Send a message through the optimistic pipeline.
    ///
    /// 1. Register the message into the conversation keyed by its
    ///    counterpart (the receiver, for outbound) — the local echo
    ///    appears before the transport confirms anything.
    /// 2. Hand the message to [`Transport::send_message`].
    /// 3. Advance the status to `sent` on success or `failed` on error.
    ///
    /// Returns the mutated message. There is no retry: a failed send is
    /// terminal and a retry means sending a brand-new message.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Transport`] after the status mutation if the
    /// transport rejected the send. Local registration is not rolled
    /// back; the stored copy stays visible with status `failed`.
    pub async fn send_message(&self, mut message: Message) -> Result<Message, SendError> {
        let contact = {
            let mut conversations = self.conversations.lock().await;
            let contact = message.counterpart(conversations.local_user()).clone();
            conversations.add_message(&contact, message.clone());
            contact
        };
        tracing::debug!(message_id = %message.id(), contact = %contact, "registered outbound message");

        match self.transport.send_message(&message).await {
            Ok(()) => {
                self.finish_send(&contact, &mut message, MessageStatus::Sent)
                    .await;
                Ok(message)
            }
            Err(err) => {
                tracing::warn!(message_id = %message.id(), error = %err, "transport send failed");
                self.finish_send(&contact, &mut message, MessageStatus::Failed)
                    .await;
                Err(SendError::Transport(err))
            }
        }
    }

    /// Advance both the stored copy and the caller's copy to `status`,
    /// emitting a status event when the transition took.
    async fn finish_send(&self, contact: &UserId, message: &mut Message, status: MessageStatus) {
        let advanced = self
            .conversations
            .lock()
            .await
            .update_status(contact, message.id(), status);
        let _ = message.advance_status(status);
        if advanced {
            self.emit(ChatEvent::StatusChanged {
                message_id: message.id().clone(),
                status,
            });
        }
    }
}
