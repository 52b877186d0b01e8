//! Integration tests for the send and receive flows.
//!
//! Exercises the full service surface through the loopback transport:
//!
//! 1. Optimistic registration happens before transport confirmation and
//!    survives a transport failure (fail-open).
//! 2. Status ends at `sent` on success and `failed` on error, with the
//!    error surfaced to the caller.
//! 3. Conversations are keyed by the non-local participant for both
//!    directions, and unread counts move only for inbound messages.

use tokio::sync::mpsc;

use chatkit::chat::{ChatEvent, MessageService, SendError};
use chatkit::config::ServiceConfig;
use chatkit::transport::TransportError;
use chatkit::transport::loopback::{LoopbackTransport, OutboundFrame};

use chatkit_model::message::{Message, MessageKind, MessageStatus, UserId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn local() -> UserId {
    UserId::new("alice")
}

fn remote() -> UserId {
    UserId::new("bob")
}

/// Service for the local user "alice", with event and frame receivers.
fn create_service() -> (
    MessageService<LoopbackTransport>,
    mpsc::Receiver<ChatEvent>,
    mpsc::Receiver<OutboundFrame>,
) {
    let (transport, frames) = LoopbackTransport::create(64);
    let (service, events) = MessageService::new(transport, local(), ServiceConfig::default());
    (service, events, frames)
}

// ===========================================================================
// Outbound: optimistic send
// ===========================================================================

#[tokio::test]
async fn successful_send_ends_sent_with_no_unread() {
    let (service, _events, _frames) = create_service();

    let message = service
        .send_message(Message::text(local(), remote(), "hi"))
        .await
        .expect("send should succeed");

    assert_eq!(message.status(), MessageStatus::Sent);
    assert_eq!(service.unread_count(&remote()).await, 0);
}

#[tokio::test]
async fn sent_message_reaches_the_transport_intact() {
    let (service, _events, mut frames) = create_service();

    let message = service
        .send_message(Message::text(local(), remote(), "payload check"))
        .await
        .expect("send should succeed");

    match frames.try_recv().expect("one frame expected") {
        OutboundFrame::Message(sent) => {
            assert_eq!(sent.id(), message.id());
            assert_eq!(sent.content(), "payload check");
            // The transport saw the message before the status advanced.
            assert_eq!(sent.status(), MessageStatus::Sending);
        }
        other => panic!("expected a message frame, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_send_surfaces_error_after_marking_failed() {
    let (service, _events, _frames) = create_service();
    service.transport().set_failing(true);

    let draft = Message::text(local(), remote(), "doomed");
    let id = draft.id().clone();
    let result = service.send_message(draft).await;

    match result {
        Err(SendError::Transport(TransportError::ConnectionClosed)) => {}
        other => panic!("expected a connection-closed transport error, got {other:?}"),
    }
    // Fail-open: the optimistic registration stays, marked failed.
    assert_eq!(
        service.message_status(&remote(), &id).await,
        Some(MessageStatus::Failed)
    );
    assert_eq!(service.messages(&remote()).await.len(), 1);
}

#[tokio::test]
async fn send_emits_terminal_status_event() {
    let (service, mut events, _frames) = create_service();

    let message = service
        .send_message(Message::text(local(), remote(), "ping"))
        .await
        .expect("send should succeed");

    let event = events.try_recv().expect("status event expected");
    assert_eq!(
        event,
        ChatEvent::StatusChanged {
            message_id: message.id().clone(),
            status: MessageStatus::Sent,
        }
    );
}

// ===========================================================================
// Inbound: register and acknowledge
// ===========================================================================

#[tokio::test]
async fn inbound_message_counts_unread_and_acks_delivery() {
    let (service, _events, mut frames) = create_service();

    let message = service
        .receive_message(Message::text(remote(), local(), "hi"))
        .await;

    assert_eq!(message.status(), MessageStatus::Delivered);
    assert_eq!(service.unread_count(&remote()).await, 1);
    let frame = frames.try_recv().expect("receipt frame expected");
    assert_eq!(frame, OutboundFrame::DeliveryReceipt(message.id().clone()));
    assert!(frames.try_recv().is_err(), "exactly one receipt expected");
}

#[tokio::test]
async fn inbound_message_emits_received_event() {
    let (service, mut events, _frames) = create_service();

    let message = service
        .receive_message(Message::text(remote(), local(), "evented"))
        .await;

    let event = events.try_recv().expect("received event expected");
    assert_eq!(event, ChatEvent::MessageReceived { message });
}

// ===========================================================================
// Conversation keying and ordering
// ===========================================================================

#[tokio::test]
async fn both_directions_share_one_conversation_per_contact() {
    let (service, _events, _frames) = create_service();

    service
        .send_message(Message::text(local(), remote(), "out"))
        .await
        .expect("send should succeed");
    service
        .receive_message(Message::text(remote(), local(), "in"))
        .await;

    // Outbound filed under the receiver, inbound under the sender —
    // both land on the conversation with "bob".
    let messages = service.messages(&remote()).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content(), "out");
    assert_eq!(messages[1].content(), "in");
    // Only the inbound one counted as unread.
    assert_eq!(service.unread_count(&remote()).await, 1);
}

#[tokio::test]
async fn messages_preserve_arrival_order_across_contacts() {
    let (service, _events, _frames) = create_service();
    let carol = UserId::new("carol");

    for i in 0..3 {
        service
            .receive_message(Message::text(remote(), local(), format!("bob {i}")))
            .await;
        service
            .receive_message(Message::text(carol.clone(), local(), format!("carol {i}")))
            .await;
    }

    let from_bob: Vec<String> = service
        .messages(&remote())
        .await
        .iter()
        .map(|m| m.content().to_string())
        .collect();
    assert_eq!(from_bob, ["bob 0", "bob 1", "bob 2"]);
    assert_eq!(service.unread_count(&carol).await, 3);
}

#[tokio::test]
async fn search_spans_only_text_messages_of_one_conversation() {
    let (service, _events, _frames) = create_service();

    service
        .receive_message(Message::text(remote(), local(), "Hello World"))
        .await;
    service
        .receive_message(Message::new(MessageKind::Image, remote(), local(), "x"))
        .await;
    service
        .receive_message(Message::text(
            UserId::new("carol"),
            local(),
            "world of her own",
        ))
        .await;

    let hits = service.search_messages(&remote(), "world").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content(), "Hello World");
}
