//! Persistence layer: the store collaborator.
//!
//! [`Store`] is the narrow interface the lifecycle services need from a
//! transactional relational store. Multi-row writes that must be atomic
//! (`assign_alert`, `append_update`) are single trait calls so every
//! implementation commits them as one unit or not at all.
//!
//! Two implementations exist: [`postgres::PgStore`] over `sqlx::PgPool`,
//! and [`memory::MemoryStore`] used when persistence is disabled and in
//! tests.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Alert, AlertFilter, AlertId, AlertStatus, Camera, CameraId, CameraStatus, Incident, IncidentId,
    IncidentStatus, IncidentUpdate, Premise, PremiseId, Scope, User, UserId,
};
use crate::error::ServiceError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

fn status_moved(id: AlertId, current: AlertStatus, expected: AlertStatus) -> ServiceError {
    ServiceError::InvalidInput(format!("alert {id} is {current}, not {expected}"))
}

/// Everything written by one alert assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Incident to insert; its `assigned_guards` are ignored.
    pub incident: Incident,
    /// Guards to link to the incident (already validated).
    pub guard_ids: Vec<UserId>,
    /// Lead guard recorded on the alert.
    pub lead_guard: UserId,
    /// Write timestamp.
    pub at: DateTime<Utc>,
}

/// Transactional CRUD over the entities the core touches.
#[async_trait]
pub trait Store: std::fmt::Debug + Send + Sync {
    // ── Alerts ──────────────────────────────────────────────────────────

    /// Persists a new alert.
    async fn insert_alert(&self, alert: &Alert) -> Result<(), ServiceError>;

    /// Loads one alert.
    async fn find_alert(&self, id: AlertId) -> Result<Option<Alert>, ServiceError>;

    /// Lists alerts matching `filter` within `scope`, newest first.
    ///
    /// A guard sees an alert if it names them as lead guard or its
    /// incident has them on the roster.
    async fn list_alerts(
        &self,
        filter: &AlertFilter,
        scope: Scope,
    ) -> Result<Vec<Alert>, ServiceError>;

    /// Overwrites an alert's status, returning the updated row.
    async fn set_alert_status(
        &self,
        id: AlertId,
        status: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, ServiceError>;

    /// Moves an alert from `from` to `to` only if it is still in `from`.
    ///
    /// Returns `Ok(None)` if the alert does not exist. Fails with
    /// [`ServiceError::InvalidInput`] if its status has already moved on.
    async fn advance_alert_status(
        &self,
        id: AlertId,
        from: AlertStatus,
        to: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, ServiceError>;

    /// Atomically inserts the incident, links every guard, and marks the
    /// alert [`AlertStatus::Assigned`].
    ///
    /// Fails with [`ServiceError::NotFound`] if the alert is gone,
    /// [`ServiceError::Conflict`] if it already has an incident and
    /// [`ServiceError::InvalidInput`] if its status is already past
    /// `assigned`.
    async fn assign_alert(&self, assignment: &Assignment) -> Result<(), ServiceError>;

    // ── Incidents ───────────────────────────────────────────────────────

    /// Loads one incident with its roster and update log.
    async fn find_incident(&self, id: IncidentId) -> Result<Option<Incident>, ServiceError>;

    /// Loads the incident created for `alert_id`.
    async fn find_incident_by_alert(
        &self,
        alert_id: AlertId,
    ) -> Result<Option<Incident>, ServiceError>;

    /// Lists incidents within `scope`, newest first.
    async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
        scope: Scope,
    ) -> Result<Vec<Incident>, ServiceError>;

    /// Returns `true` if `guard_id` is on the incident's roster.
    async fn is_guard_assigned(
        &self,
        incident_id: IncidentId,
        guard_id: UserId,
    ) -> Result<bool, ServiceError>;

    /// Overwrites an incident's status. Returns `false` if it is gone.
    async fn set_incident_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ServiceError>;

    /// Atomically appends `update` and, when `forced_status` is set,
    /// moves the owning incident to it.
    async fn append_update(
        &self,
        update: &IncidentUpdate,
        forced_status: Option<IncidentStatus>,
    ) -> Result<(), ServiceError>;

    // ── Users ───────────────────────────────────────────────────────────

    /// Resolves the ids that name active guard-role users, preserving the
    /// order of `ids`. Unknown and non-guard ids are skipped.
    async fn find_guards(&self, ids: &[UserId]) -> Result<Vec<User>, ServiceError>;

    /// Lists all users.
    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;

    /// Lists the guards on an incident's roster.
    async fn users_by_incident(&self, id: IncidentId) -> Result<Vec<User>, ServiceError>;

    /// Lists the guards assigned to a camera.
    async fn users_by_camera(&self, id: CameraId) -> Result<Vec<User>, ServiceError>;

    // ── Premises and cameras ────────────────────────────────────────────

    /// Lists all premises.
    async fn list_premises(&self) -> Result<Vec<Premise>, ServiceError>;

    /// Loads one premise.
    async fn find_premise(&self, id: PremiseId) -> Result<Option<Premise>, ServiceError>;

    /// Lists cameras installed on a premise.
    async fn cameras_by_premise(&self, id: PremiseId) -> Result<Vec<Camera>, ServiceError>;

    /// Lists all cameras.
    async fn list_cameras(&self) -> Result<Vec<Camera>, ServiceError>;

    /// Loads one camera.
    async fn find_camera(&self, id: CameraId) -> Result<Option<Camera>, ServiceError>;

    /// Lists cameras assigned to a guard.
    async fn cameras_for_guard(&self, guard_id: UserId) -> Result<Vec<Camera>, ServiceError>;

    /// Overwrites a camera's status. Returns `false` if it is gone.
    async fn set_camera_status(
        &self,
        id: CameraId,
        status: CameraStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ServiceError>;
}
