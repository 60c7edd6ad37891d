//! # guardpost
//!
//! Security alert dispatch service with a real-time WebSocket notification
//! hub.
//!
//! Operators at a security control station raise and triage alerts on
//! monitored premises, dispatch field guards to them, and follow the
//! resulting incidents as guards file reports. Every lifecycle transition
//! is pushed to the relevant connected clients.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)      ── Caller (auth/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── AlertService / IncidentService / DirectoryService (service/)
//!     ├── EventDispatcher → ConnectionRegistry (domain/)
//!     │
//!     └── Store: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
