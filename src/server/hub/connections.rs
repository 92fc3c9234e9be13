use std::collections::HashMap;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::server::protocol::Envelope;

/// Identity of one live connection (and of the session bound to it).
pub type ConnId = Uuid;

/// The hub's handle on one connection: its identity and the sending side
/// of its bounded outbound queue. Dropping it closes the queue, which stops
/// the connection's writer.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnId,
    pub peer: String,
    outbound: mpsc::Sender<Envelope>,
}

impl Connection {
    pub fn new(id: ConnId, peer: impl Into<String>, outbound: mpsc::Sender<Envelope>) -> Self {
        Self {
            id,
            peer: peer.into(),
            outbound,
        }
    }
}

/// Live connections, owned and mutated only by the hub actor.
#[derive(Debug, Default)]
pub struct ConnectionSet {
    live: HashMap<ConnId, Connection>,
    overflowed: Vec<ConnId>,
}

impl ConnectionSet {
    /// Add a connection. Returns false if the id is already live.
    pub fn insert(&mut self, connection: Connection) -> bool {
        if self.live.contains_key(&connection.id) {
            return false;
        }
        self.live.insert(connection.id, connection);
        true
    }

    pub fn remove(&mut self, id: &ConnId) -> Option<Connection> {
        self.live.remove(id)
    }

    pub fn contains(&self, id: &ConnId) -> bool {
        self.live.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Queue an envelope for a client without waiting.
    ///
    /// A full queue marks the connection for eviction; the hub picks it up
    /// with [`ConnectionSet::take_overflowed`] once the current event is done.
    pub fn send(&mut self, id: ConnId, envelope: Envelope) -> bool {
        let Some(connection) = self.live.get(&id) else {
            debug!("[Hub] Dropping {} for departed connection {}", envelope.kind, id);
            return false;
        };
        match connection.outbound.try_send(envelope) {
            Ok(()) => true,
            Err(TrySendError::Full(envelope)) => {
                warn!("[Hub] Outbound queue full for {} ({}), evicting; dropped {}", id, connection.peer, envelope.kind);
                if !self.overflowed.contains(&id) {
                    self.overflowed.push(id);
                }
                false
            }
            Err(TrySendError::Closed(_)) => {
                // Writer already gone; its reader will unregister shortly.
                debug!("[Hub] Outbound queue closed for {}", id);
                false
            }
        }
    }

    pub fn take_overflowed(&mut self) -> Vec<ConnId> {
        std::mem::take(&mut self.overflowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_queue_marks_for_eviction() {
        let (tx, mut rx) = mpsc::channel(1);
        let id = Uuid::new_v4();
        let mut set = ConnectionSet::default();
        assert!(set.insert(Connection::new(id, "test", tx.clone())));
        assert!(!set.insert(Connection::new(id, "dup", tx)));

        assert!(set.send(id, Envelope::bare("A")));
        assert!(!set.send(id, Envelope::bare("B")));
        assert!(!set.send(id, Envelope::bare("C")));
        assert_eq!(set.take_overflowed(), vec![id]);
        assert!(set.take_overflowed().is_empty());
        assert_eq!(rx.try_recv().unwrap().kind, "A");
    }

    #[test]
    fn test_removing_closes_the_queue() {
        let (tx, mut rx) = mpsc::channel(4);
        let id = Uuid::new_v4();
        let mut set = ConnectionSet::default();
        set.insert(Connection::new(id, "test", tx));
        assert!(set.remove(&id).is_some());
        assert!(set.is_empty());
        assert!(!set.send(id, Envelope::bare("LATE")));
        assert!(rx.try_recv().is_err());
        assert!(rx.is_closed());
    }
}
