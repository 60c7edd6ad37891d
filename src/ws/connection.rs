//! Duplex worker for a single WebSocket connection.
//!
//! Registers the connection, then runs two independent tasks:
//!
//! - the **writer** drains the outbound queue, pings on a fixed interval
//!   and bounds every write by a timeout;
//! - the **reader** applies a read deadline refreshed by any inbound
//!   frame, answers `ping` and relays client messages.
//!
//! Whichever finishes first ends the connection; it is unregistered
//! exactly once either way.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::WeakSender;
use tokio::time::{Instant, interval_at, timeout};

use super::messages::{InboundAction, route_inbound};
use crate::auth::Caller;
use crate::config::HubConfig;
use crate::domain::{Connection, EventDispatcher, Frame, HubEvent, OutboundQueue};

/// Serves one upgraded socket until it closes, errors or misses its
/// keep-alive.
pub async fn run_connection(
    socket: WebSocket,
    caller: Caller,
    dispatcher: EventDispatcher,
    hub: HubConfig,
) {
    let (connection, queue) = Connection::new(caller.user_id, caller.role, hub.queue_capacity);
    let replies = connection.downgrade();
    let registry = Arc::clone(dispatcher.registry());
    let id = registry.register(connection).await;

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, queue, hub));
    let mut reader = tokio::spawn(read_loop(stream, caller, replies, dispatcher, hub));

    tokio::select! {
        _ = &mut reader => {
            // Unregistering closes the queue; the writer then sends a
            // close frame and exits.
            registry.unregister(id).await;
            let _ = writer.await;
        }
        _ = &mut writer => {
            reader.abort();
            registry.unregister(id).await;
        }
    }
    tracing::debug!(connection_id = %id, "ws connection closed");
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: OutboundQueue,
    hub: HubConfig,
) {
    let mut ticker = interval_at(Instant::now() + hub.ping_interval, hub.ping_interval);
    loop {
        let outgoing = tokio::select! {
            biased;
            () = queue.closed.notified() => None,
            frame = queue.receiver.recv() => frame.map(|f| Message::text(String::from(&*f))),
            _ = ticker.tick() => Some(Message::Ping(Bytes::new())),
        };
        let Some(message) = outgoing else {
            let _ = timeout(hub.write_timeout, sink.send(Message::Close(None))).await;
            break;
        };
        match timeout(hub.write_timeout, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "ws write failed");
                break;
            }
            Err(_) => {
                tracing::warn!(timeout = ?hub.write_timeout, "ws write timed out");
                break;
            }
        }
    }
}

async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    caller: Caller,
    replies: WeakSender<Frame>,
    dispatcher: EventDispatcher,
    hub: HubConfig,
) {
    loop {
        let Ok(next) = timeout(hub.pong_wait, stream.next()).await else {
            tracing::debug!(user_id = %caller.user_id, "ws keep-alive missed");
            break;
        };
        let text = match next {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break,
            // Ping, pong and binary frames only refresh the deadline.
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                tracing::debug!(error = %err, "ws read failed");
                break;
            }
        };

        match route_inbound(text.as_str(), caller.user_id) {
            InboundAction::Pong => reply_pong(&replies),
            InboundAction::Relay { message, selector } => {
                dispatcher.relay(&message, selector).await;
            }
            InboundAction::Malformed(reason) => {
                tracing::warn!(user_id = %caller.user_id, %reason, "malformed ws message skipped");
            }
            InboundAction::Unknown => {
                tracing::debug!(user_id = %caller.user_id, "unknown ws message type ignored");
            }
        }
    }
}

fn reply_pong(replies: &WeakSender<Frame>) {
    let Some(sender) = replies.upgrade() else {
        return;
    };
    match serde_json::to_string(&HubEvent::Pong) {
        Ok(json) => {
            if let Err(err) = sender.try_send(Frame::from(json)) {
                tracing::debug!(error = %err, "pong dropped");
            }
        }
        Err(err) => tracing::warn!(error = %err, "pong serialization failed"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Role, UserId};

    #[tokio::test]
    async fn pong_is_queued_for_the_sender() {
        let (connection, mut queue) = Connection::new(UserId::new(), Role::Guard, 4);
        reply_pong(&connection.downgrade());
        let Ok(frame) = queue.receiver.try_recv() else {
            panic!("pong should be queued");
        };
        assert!(frame.contains("pong"));
    }

    #[tokio::test]
    async fn pong_on_full_queue_is_dropped_without_blocking() {
        let (connection, mut queue) = Connection::new(UserId::new(), Role::Guard, 1);
        let replies = connection.downgrade();
        reply_pong(&replies);
        reply_pong(&replies);

        assert!(queue.receiver.try_recv().is_ok());
        assert!(queue.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn pong_after_teardown_is_a_no_op() {
        let (connection, mut queue) = Connection::new(UserId::new(), Role::Guard, 4);
        let replies = connection.downgrade();
        drop(connection);
        reply_pong(&replies);
        assert!(queue.receiver.recv().await.is_none());
    }
}
