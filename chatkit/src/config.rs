//! Configuration for the `chatkit` service layer.
//!
//! The library exposes a plain resolved-config struct; how values get
//! here (file, CLI, hard-coded) is the embedding application's concern.

/// Service subsystem configuration (used by `MessageService`).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Capacity of the [`ChatEvent`](crate::chat::ChatEvent) channel.
    pub event_buffer: usize,
    /// Bound on the failed-receipt retry queue; oldest entries are
    /// dropped when the queue is full.
    pub max_pending_receipts: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            event_buffer: 64,
            max_pending_receipts: 1024,
        }
    }
}
