//! Service layer: lifecycle orchestration.
//!
//! [`AlertService`] and [`IncidentService`] own the alert → incident state
//! machine: they authorize, call the [`crate::persistence::Store`] and,
//! after commit, publish through the [`crate::domain::EventDispatcher`].
//! [`DirectoryService`] serves the read-only premise, camera and user
//! lookups.

pub mod alert_service;
pub mod directory_service;
pub mod incident_service;

#[cfg(test)]
pub(crate) mod testing;

pub use alert_service::{AlertService, AssignmentOutcome};
pub use directory_service::DirectoryService;
pub use incident_service::IncidentService;
