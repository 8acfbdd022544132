//! WebSocket broadcaster.
//!
//! Grounded in the teacher's subscriber-map pattern (`services/manager.rs`
//! guards shared state behind a mutex; broadcast fan-out happens outside any
//! lock). Delivery is best-effort, at-most-once: clients treat every message
//! as a cache invalidation and re-read the persistent store, never as
//! authoritative state.

mod message;
mod session;

pub use message::ServerMessage;
pub use session::{run_session, ClientId, Session};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Idle sessions beyond this window are closed.
pub const HEARTBEAT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Broadcaster {
    clients: Arc<RwLock<HashMap<ClientId, mpsc::UnboundedSender<ServerMessage>>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self { clients: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Registers a new client and returns its id plus a `welcome` message the
    /// caller should send immediately.
    pub fn register(&self) -> (ClientId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = ClientId(Uuid::new_v4());
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister(&self, id: ClientId) {
        self.clients.write().remove(&id);
    }

    /// Fan-out under a read lock; per-client send attempts happen outside any
    /// lock so one slow/dead client never stalls the others. A closed
    /// channel is simply skipped — removal happens when the session task
    /// notices the error and calls `unregister`.
    pub fn broadcast(&self, message: ServerMessage) {
        let senders: Vec<_> = self.clients.read().values().cloned().collect();
        for sender in senders {
            let _ = sender.send(message.clone());
        }
    }

    pub fn send_to(&self, id: ClientId, message: ServerMessage) {
        if let Some(sender) = self.clients.read().get(&id) {
            let _ = sender.send(message);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_every_registered_client() {
        let bus = Broadcaster::new();
        let (id_a, mut rx_a) = bus.register();
        let (id_b, mut rx_b) = bus.register();

        bus.broadcast(ServerMessage::MoviesChanged { ids: vec![Uuid::new_v4()] });

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());

        bus.unregister(id_a);
        bus.unregister(id_b);
        assert_eq!(bus.client_count(), 0);
    }

    #[test]
    fn unregistered_client_does_not_receive_further_broadcasts() {
        let bus = Broadcaster::new();
        let (id, mut rx) = bus.register();
        bus.unregister(id);
        bus.broadcast(ServerMessage::Pong);
        assert!(rx.try_recv().is_err());
    }
}
