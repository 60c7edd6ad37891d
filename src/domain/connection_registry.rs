//! Registry of live client connections.
//!
//! [`ConnectionRegistry`] owns every registered [`Connection`] for its
//! lifetime. Deliveries iterate the set under a shared read lock, so many
//! publishes proceed together; registration and removal take the write
//! lock and never race with an in-flight iteration.
//!
//! Each connection has a bounded outbound queue. Enqueueing never blocks:
//! a full (or already closed) queue marks the consumer as dead, and the
//! connection is torn down before `deliver` returns.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, RwLock, mpsc};

use super::{ConnectionId, Role, Selector, UserId};

/// A serialized, transport-agnostic message shared across recipients.
pub type Frame = Arc<str>;

/// One live client connection, tagged with a verified identity and role.
///
/// The registry holds the only strong sender of the outbound queue, so
/// removing the connection closes the queue.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    role: Role,
    sender: mpsc::Sender<Frame>,
    closed: Arc<Notify>,
}

/// Consumer side of a connection's outbound queue.
#[derive(Debug)]
pub struct OutboundQueue {
    /// Frames in FIFO order of enqueueing.
    pub receiver: mpsc::Receiver<Frame>,
    /// Signalled when the registry tears the connection down.
    pub closed: Arc<Notify>,
}

impl Connection {
    /// Creates a connection with an outbound queue of `capacity` frames.
    #[must_use]
    pub fn new(user_id: UserId, role: Role, capacity: usize) -> (Self, OutboundQueue) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let closed = Arc::new(Notify::new());
        let connection = Self {
            id: ConnectionId::new(),
            user_id,
            role,
            sender,
            closed: Arc::clone(&closed),
        };
        (connection, OutboundQueue { receiver, closed })
    }

    /// Connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Identity the connection was opened with.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Role the connection was opened with.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// A sender that does not keep the queue open.
    ///
    /// Lets the connection's own inbound worker answer pings without
    /// outliving unregistration.
    #[must_use]
    pub fn downgrade(&self) -> mpsc::WeakSender<Frame> {
        self.sender.downgrade()
    }

    fn close(self) {
        self.closed.notify_one();
    }
}

/// Outcome of a single [`ConnectionRegistry::deliver`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the frame was enqueued to.
    pub delivered: usize,
    /// Connections torn down because their queue was full or closed.
    pub dropped: usize,
}

/// Concurrent set of live connections with selector-based delivery.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection and returns its identifier.
    pub async fn register(&self, connection: Connection) -> ConnectionId {
        let id = connection.id;
        tracing::debug!(
            connection_id = %id,
            user_id = %connection.user_id,
            role = %connection.role,
            "connection registered"
        );
        self.connections.write().await.insert(id, connection);
        id
    }

    /// Removes a connection and closes its outbound queue.
    ///
    /// Returns `false` if the connection was already gone; removing twice
    /// is a no-op.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(&id);
        match removed {
            Some(connection) => {
                tracing::debug!(connection_id = %id, "connection unregistered");
                connection.close();
                true
            }
            None => false,
        }
    }

    /// Enqueues `frame` to every connection matched by `selector`.
    ///
    /// Never waits on a consumer. Connections whose queue is full or
    /// closed are removed before this returns, so later deliveries skip
    /// them.
    pub async fn deliver(&self, selector: Selector, frame: Frame) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut dead = Vec::new();
        {
            let map = self.connections.read().await;
            for connection in map
                .values()
                .filter(|c| selector.matches(c.role, c.user_id))
            {
                match connection.sender.try_send(Arc::clone(&frame)) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_) | TrySendError::Closed(_)) => dead.push(connection.id),
                }
            }
        }

        if !dead.is_empty() {
            let mut map = self.connections.write().await;
            for id in dead {
                if let Some(connection) = map.remove(&id) {
                    tracing::warn!(
                        connection_id = %id,
                        user_id = %connection.user_id,
                        "outbound queue full; dropping connection"
                    );
                    connection.close();
                    report.dropped += 1;
                }
            }
        }

        report
    }

    /// Returns `true` if the connection is still registered.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Returns the number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
