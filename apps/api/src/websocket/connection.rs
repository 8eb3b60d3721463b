//! WebSocket connection tracking
//!
//! Tracks every live connection per user so a notification can be pushed
//! to all of a user's open tabs/devices. A user with no connections is
//! simply absent from the registry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::ServerMessage;

/// Handle for one live connection
#[derive(Debug)]
struct ConnectionHandle {
    id: Uuid,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

/// Registry of live websocket connections, keyed by user
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<Uuid, Vec<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for a user
    ///
    /// Returns the connection id (for unregistering) and the receiving
    /// half the socket task drains.
    pub fn register(&self, user_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.connections
            .entry(user_id)
            .or_default()
            .push(ConnectionHandle { id, sender });
        (id, receiver)
    }

    /// Remove a connection when its socket closes
    pub fn unregister(&self, user_id: Uuid, connection_id: Uuid) {
        if let Some(mut entry) = self.connections.get_mut(&user_id) {
            entry.retain(|handle| handle.id != connection_id);
        }
        self.connections.remove_if(&user_id, |_, handles| handles.is_empty());
    }

    /// Push a message to every live connection of a user, best-effort
    ///
    /// Dead connections are pruned as a side effect. Returns the number of
    /// connections the message was handed to; zero when the user has no
    /// live connection, which is not an error.
    pub fn send_to_user(&self, user_id: Uuid, message: &ServerMessage) -> usize {
        let delivered = match self.connections.get_mut(&user_id) {
            Some(mut entry) => {
                entry.retain(|handle| handle.sender.send(message.clone()).is_ok());
                entry.len()
            }
            None => 0,
        };
        self.connections.remove_if(&user_id, |_, handles| handles.is_empty());
        delivered
    }

    /// Whether the user has at least one live connection
    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.connections
            .get(&user_id)
            .map(|handles| !handles.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_reaches_all_connections() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (_, mut rx1) = registry.register(user);
        let (_, mut rx2) = registry.register(user);

        let delivered = registry.send_to_user(user, &ServerMessage::Connected { user_id: user });
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_send_to_absent_user_is_noop() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        assert_eq!(
            registry.send_to_user(user, &ServerMessage::Connected { user_id: user }),
            0
        );
    }

    #[test]
    fn test_unregister_removes_connection() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (conn_id, _rx) = registry.register(user);
        assert!(registry.is_connected(user));

        registry.unregister(user, conn_id);
        assert!(!registry.is_connected(user));
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (_, rx) = registry.register(user);
        drop(rx);

        let delivered = registry.send_to_user(user, &ServerMessage::Connected { user_id: user });
        assert_eq!(delivered, 0);
        assert!(!registry.is_connected(user));
    }
}
