//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::config::HubConfig;
use crate::domain::{ConnectionRegistry, EventDispatcher};
use crate::persistence::Store;
use crate::service::{AlertService, DirectoryService, IncidentService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Alert lifecycle.
    pub alerts: Arc<AlertService>,
    /// Incident lifecycle and field reports.
    pub incidents: Arc<IncidentService>,
    /// Premises, cameras and users.
    pub directory: Arc<DirectoryService>,
    /// Fan-out to live WebSocket connections.
    pub dispatcher: EventDispatcher,
    /// Turns bearer tokens into callers.
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Per-connection WebSocket tuning.
    pub hub: HubConfig,
}

impl AppState {
    /// Wires the services over one store and a fresh connection registry.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, verifier: Arc<dyn IdentityVerifier>, hub: HubConfig) -> Self {
        let dispatcher = EventDispatcher::new(Arc::new(ConnectionRegistry::new()));
        Self {
            alerts: Arc::new(AlertService::new(Arc::clone(&store), dispatcher.clone())),
            incidents: Arc::new(IncidentService::new(Arc::clone(&store), dispatcher.clone())),
            directory: Arc::new(DirectoryService::new(store)),
            dispatcher,
            verifier,
            hub,
        }
    }
}
