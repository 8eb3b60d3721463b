//! Server-to-client websocket message types

use serde::Serialize;
use uuid::Uuid;

use crate::models::Notification;

/// Messages pushed to connected clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once after a successful upgrade
    Connected { user_id: Uuid },

    /// A freshly persisted notification for this user
    Notification(Notification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_wire_shape() {
        let user_id = Uuid::new_v4();
        let value = serde_json::to_value(ServerMessage::Connected { user_id }).unwrap();
        assert_eq!(value["type"], "connected");
        assert_eq!(value["data"]["user_id"], user_id.to_string());
    }
}
