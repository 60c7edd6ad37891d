//! Alert lifecycle: creation, triage, dispatch.
//!
//! Every mutation follows the same pattern: authorize → validate → one
//! store call (a single transaction when several rows change) → publish
//! after commit. A failed publish never fails the operation.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Caller;
use crate::domain::{
    Alert, AlertFilter, AlertId, AlertStatus, EventDispatcher, HubEvent, Incident, NewAlert, Role,
    Selector, UserId,
};
use crate::error::ServiceError;
use crate::persistence::{Assignment, Store};

/// Result of a successful [`AlertService::assign`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AssignmentOutcome {
    /// The alert, now [`AlertStatus::Assigned`].
    pub alert: Alert,
    /// The incident opened for it, with its roster.
    pub incident: Incident,
}

/// Owns alert status transitions and their notification fan-out.
#[derive(Debug, Clone)]
pub struct AlertService {
    store: Arc<dyn Store>,
    dispatcher: EventDispatcher,
}

impl AlertService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, dispatcher: EventDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Raises a new alert in status `pending` and notifies operators.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::PermissionDenied`] unless the caller is an operator.
    /// - [`ServiceError::InvalidInput`] on blank required fields.
    /// - [`ServiceError::NotFound`] if the premise or camera does not exist.
    pub async fn create(&self, caller: &Caller, input: NewAlert) -> Result<Alert, ServiceError> {
        caller.require_operator("creating an alert")?;
        input.validate()?;
        if self.store.find_premise(input.premise_id).await?.is_none() {
            return Err(ServiceError::not_found("premise", input.premise_id));
        }
        if let Some(camera_id) = input.camera_id {
            let camera = self
                .store
                .find_camera(camera_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("camera", camera_id))?;
            if camera.premise_id != input.premise_id {
                return Err(ServiceError::InvalidInput(format!(
                    "camera {camera_id} is not installed on premise {}",
                    input.premise_id
                )));
            }
        }

        let alert = input.into_alert(Utc::now());
        self.store.insert_alert(&alert).await?;
        tracing::info!(alert_id = %alert.id, severity = %alert.severity, "alert created");

        self.dispatcher
            .publish(
                &HubEvent::AlertCreated(alert.clone()),
                Selector::ByRole(Role::Operator),
            )
            .await;
        Ok(alert)
    }

    /// Lists alerts visible to the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::TransientStore`] if the store call fails.
    pub async fn list(
        &self,
        caller: &Caller,
        filter: &AlertFilter,
    ) -> Result<Vec<Alert>, ServiceError> {
        self.store.list_alerts(filter, caller.scope()).await
    }

    /// Loads one alert.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the alert does not exist.
    /// - [`ServiceError::PermissionDenied`] if a guard is not assigned to it.
    pub async fn get(&self, caller: &Caller, id: AlertId) -> Result<Alert, ServiceError> {
        let alert = self.load(id).await?;
        if let Some(guard) = caller.scope().guard() {
            if !self.guard_sees(&alert, guard).await? {
                return Err(ServiceError::PermissionDenied(format!(
                    "alert {id} is not assigned to you"
                )));
            }
        }
        Ok(alert)
    }

    /// Moves a pending alert to `acknowledged` and notifies everyone.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::PermissionDenied`] unless the caller is an operator.
    /// - [`ServiceError::NotFound`] if the alert does not exist.
    /// - [`ServiceError::InvalidInput`] if the alert is no longer pending.
    pub async fn acknowledge(&self, caller: &Caller, id: AlertId) -> Result<Alert, ServiceError> {
        caller.require_operator("acknowledging an alert")?;
        let alert = self
            .store
            .advance_alert_status(
                id,
                AlertStatus::Pending,
                AlertStatus::Acknowledged,
                Utc::now(),
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("alert", id))?;
        tracing::info!(alert_id = %id, by = %caller.user_id, "alert acknowledged");

        self.dispatcher
            .publish(&HubEvent::AlertAcknowledged(alert.clone()), Selector::All)
            .await;
        Ok(alert)
    }

    /// Dispatches guards: opens the alert's incident, links every valid
    /// guard to it and marks the alert `assigned`, all in one unit.
    ///
    /// Ids that do not name an active guard are skipped. Duplicates are
    /// collapsed; the first resolved guard becomes the alert's lead guard.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidInput`] if `guard_ids` is empty.
    /// - [`ServiceError::PermissionDenied`] unless the caller is an operator.
    /// - [`ServiceError::NotFound`] if the alert does not exist or no id
    ///   resolves to a guard.
    /// - [`ServiceError::Conflict`] if the alert already has an incident.
    /// - [`ServiceError::InvalidInput`] if the alert is already resolved or
    ///   closed.
    pub async fn assign(
        &self,
        caller: &Caller,
        id: AlertId,
        guard_ids: &[UserId],
    ) -> Result<AssignmentOutcome, ServiceError> {
        if guard_ids.is_empty() {
            return Err(ServiceError::InvalidInput(
                "at least one guard id is required".to_string(),
            ));
        }
        caller.require_operator("assigning an alert")?;

        let mut wanted: Vec<UserId> = Vec::with_capacity(guard_ids.len());
        for guard in guard_ids {
            if !wanted.contains(guard) {
                wanted.push(*guard);
            }
        }

        let mut alert = self.load(id).await?;
        if self.store.find_incident_by_alert(id).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "alert {id} already has an incident"
            )));
        }
        alert.status.ensure_advance(id, AlertStatus::Assigned)?;
        let guards = self.store.find_guards(&wanted).await?;
        let Some(lead) = guards.first().map(|g| g.id) else {
            return Err(ServiceError::NotFound(
                "none of the supplied ids name an active guard".to_string(),
            ));
        };

        let now = Utc::now();
        let assignment = Assignment {
            incident: Incident::open_for(&alert, now),
            guard_ids: guards.iter().map(|g| g.id).collect(),
            lead_guard: lead,
            at: now,
        };
        self.store.assign_alert(&assignment).await?;

        alert.status = AlertStatus::Assigned;
        alert.assigned_guard_id = Some(lead);
        alert.updated_at = now;
        let mut incident = assignment.incident;
        incident.assigned_guards = guards;
        tracing::info!(
            alert_id = %id,
            incident_id = %incident.id,
            guards = incident.assigned_guards.len(),
            skipped = wanted.len().saturating_sub(incident.assigned_guards.len()),
            "alert assigned"
        );

        for guard in &incident.assigned_guards {
            let dispatch = HubEvent::GuardDispatched {
                alert_id: alert.id,
                incident_id: incident.id,
                title: alert.title.clone(),
                description: alert.description.clone(),
                location: alert.location.clone(),
                severity: alert.severity,
            };
            self.dispatcher
                .publish(&dispatch, Selector::ByIdentity(guard.id))
                .await;
        }
        self.dispatcher
            .publish(
                &HubEvent::AlertAssigned {
                    alert_id: alert.id,
                    incident_id: incident.id,
                    guards: incident.assigned_guards.clone(),
                },
                Selector::ByRole(Role::Operator),
            )
            .await;

        Ok(AssignmentOutcome { alert, incident })
    }

    /// Operator override: sets any status and notifies everyone.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::PermissionDenied`] unless the caller is an operator.
    /// - [`ServiceError::NotFound`] if the alert does not exist.
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: AlertId,
        status: AlertStatus,
    ) -> Result<Alert, ServiceError> {
        caller.require_operator("overwriting an alert status")?;
        let alert = self
            .store
            .set_alert_status(id, status, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::not_found("alert", id))?;
        tracing::info!(alert_id = %id, %status, by = %caller.user_id, "alert status overwritten");

        self.dispatcher
            .publish(&HubEvent::AlertUpdated(alert.clone()), Selector::All)
            .await;
        Ok(alert)
    }

    async fn load(&self, id: AlertId) -> Result<Alert, ServiceError> {
        self.store
            .find_alert(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("alert", id))
    }

    async fn guard_sees(&self, alert: &Alert, guard: UserId) -> Result<bool, ServiceError> {
        if alert.assigned_guard_id == Some(guard) {
            return Ok(true);
        }
        match self.store.find_incident_by_alert(alert.id).await? {
            Some(incident) => Ok(incident.has_guard(guard)),
            None => Ok(false),
        }
    }
}
