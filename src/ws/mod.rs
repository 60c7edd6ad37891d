//! WebSocket layer: upgrade, duplex connection worker, inbound routing.
//!
//! The endpoint at `/ws` streams hub events to an authenticated client
//! and relays a small set of client messages.

pub mod connection;
pub mod handler;
pub mod messages;
