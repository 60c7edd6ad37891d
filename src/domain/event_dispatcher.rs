//! Serializes hub events and routes them through the registry.
//!
//! [`EventDispatcher`] decouples producers (the lifecycle services) from the
//! connection transport. Publishing is best-effort: a payload that fails to
//! serialize is logged and dropped, and the caller's business outcome is
//! never affected.

use std::sync::Arc;

use serde::Serialize;

use super::{ConnectionRegistry, Frame, HubEvent, RelayedMessage, Selector};

/// Producer-facing handle onto the notification hub.
///
/// Cheap to clone; all clones share one [`ConnectionRegistry`]. Frames
/// published in sequence from one task reach the registry in that
/// sequence.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl EventDispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Publishes a lifecycle event to the connections matched by
    /// `selector`.
    ///
    /// Returns the number of connections the frame was enqueued to.
    pub async fn publish(&self, event: &HubEvent, selector: Selector) -> usize {
        self.send(event.event_type(), event, selector).await
    }

    /// Re-broadcasts a client-originated message.
    ///
    /// Returns the number of connections the frame was enqueued to.
    pub async fn relay(&self, message: &RelayedMessage, selector: Selector) -> usize {
        self.send(message.event_type, message, selector).await
    }

    async fn send<T>(&self, event_type: &str, message: &T, selector: Selector) -> usize
    where
        T: Serialize + ?Sized,
    {
        let frame: Frame = match serde_json::to_string(message) {
            Ok(json) => Frame::from(json),
            Err(err) => {
                tracing::warn!(event_type, error = %err, "dropping unserializable event");
                return 0;
            }
        };
        let report = self.registry.deliver(selector, frame).await;
        tracing::debug!(
            event_type,
            ?selector,
            delivered = report.delivered,
            dropped = report.dropped,
            "event published"
        );
        report.delivered
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Connection, Role, UserId};

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("boom"))
        }
    }

    #[tokio::test]
    async fn publish_without_connections_returns_zero() {
        let dispatcher = EventDispatcher::new(Arc::new(ConnectionRegistry::new()));
        assert_eq!(dispatcher.publish(&HubEvent::Pong, Selector::All).await, 0);
    }

    #[tokio::test]
    async fn publish_serializes_type_and_payload() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (conn, mut queue) = Connection::new(UserId::new(), Role::Operator, 4);
        registry.register(conn).await;
        let dispatcher = EventDispatcher::new(Arc::clone(&registry));

        let count = dispatcher
            .publish(&HubEvent::Pong, Selector::ByRole(Role::Operator))
            .await;
        assert_eq!(count, 1);

        let Ok(frame) = queue.receiver.try_recv() else {
            panic!("expected a frame");
        };
        let Ok(json) = serde_json::from_str::<serde_json::Value>(&frame) else {
            panic!("frame is not JSON");
        };
        assert_eq!(json["type"], "pong");
    }

    #[tokio::test]
    async fn serialization_failure_is_absorbed() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (conn, mut queue) = Connection::new(UserId::new(), Role::Guard, 4);
        registry.register(conn).await;
        let dispatcher = EventDispatcher::new(Arc::clone(&registry));

        let count = dispatcher.send("broken", &Unserializable, Selector::All).await;
        assert_eq!(count, 0);
        assert!(queue.receiver.try_recv().is_err());
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn sequential_publishes_keep_order() {
        let registry = Arc::new(ConnectionRegistry::new());
        let user = UserId::new();
        let (conn, mut queue) = Connection::new(user, Role::Guard, 8);
        registry.register(conn).await;
        let dispatcher = EventDispatcher::new(Arc::clone(&registry));

        for n in 0..3 {
            let msg = RelayedMessage {
                event_type: "alert_acknowledged",
                payload: serde_json::json!({ "n": n }),
                user_id: user,
            };
            dispatcher.relay(&msg, Selector::ByIdentity(user)).await;
        }
        let mut order = Vec::new();
        while let Ok(frame) = queue.receiver.try_recv() {
            let Ok(json) = serde_json::from_str::<serde_json::Value>(&frame) else {
                panic!("frame is not JSON");
            };
            order.push(json["payload"]["n"].as_i64().unwrap_or(-1));
        }
        assert_eq!(order, vec![0, 1, 2]);
    }
}
