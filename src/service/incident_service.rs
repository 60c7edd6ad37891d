//! Incident lifecycle: status changes and the guard field-report log.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::Caller;
use crate::domain::{
    AlertId, EventDispatcher, HubEvent, Incident, IncidentId, IncidentStatus, IncidentUpdate,
    NewIncidentUpdate, Role, Selector,
};
use crate::error::ServiceError;
use crate::persistence::Store;

/// Owns incident transitions, the update log and their fan-out.
#[derive(Debug, Clone)]
pub struct IncidentService {
    store: Arc<dyn Store>,
    dispatcher: EventDispatcher,
}

impl IncidentService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, dispatcher: EventDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Lists incidents visible to the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::TransientStore`] if the store call fails.
    pub async fn list(
        &self,
        caller: &Caller,
        status: Option<IncidentStatus>,
    ) -> Result<Vec<Incident>, ServiceError> {
        self.store.list_incidents(status, caller.scope()).await
    }

    /// Lists the incidents a guard is on the roster of.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for operators.
    pub async fn assigned_to_me(&self, caller: &Caller) -> Result<Vec<Incident>, ServiceError> {
        caller.require_role(Role::Guard, "listing assigned incidents")?;
        self.store.list_incidents(None, caller.scope()).await
    }

    /// Loads one incident with roster and update log.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the incident does not exist.
    /// - [`ServiceError::PermissionDenied`] if a guard is not on its roster.
    pub async fn get(&self, caller: &Caller, id: IncidentId) -> Result<Incident, ServiceError> {
        let incident = self.load(id).await?;
        if let Some(guard) = caller.scope().guard() {
            if !incident.has_guard(guard) {
                return Err(not_assigned(id));
            }
        }
        Ok(incident)
    }

    /// Looks up the incident opened for an alert.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the alert has no incident yet.
    /// - [`ServiceError::PermissionDenied`] if a guard is not on its roster.
    pub async fn get_by_alert(
        &self,
        caller: &Caller,
        alert_id: AlertId,
    ) -> Result<Incident, ServiceError> {
        let incident = self
            .store
            .find_incident_by_alert(alert_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("incident for alert {alert_id}")))?;
        if let Some(guard) = caller.scope().guard() {
            if !incident.has_guard(guard) {
                return Err(not_assigned(incident.id));
            }
        }
        Ok(incident)
    }

    /// Sets an incident's status and notifies everyone.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the incident does not exist.
    /// - [`ServiceError::PermissionDenied`] if a guard is not on its roster.
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Incident, ServiceError> {
        self.authorize_write(caller, id).await?;
        if !self.store.set_incident_status(id, status, Utc::now()).await? {
            return Err(ServiceError::not_found("incident", id));
        }
        let incident = self.load(id).await?;
        tracing::info!(incident_id = %id, %status, by = %caller.user_id, "incident status changed");

        self.dispatcher
            .publish(&HubEvent::IncidentUpdated(incident.clone()), Selector::All)
            .await;
        Ok(incident)
    }

    /// Appends a field report authored by the caller.
    ///
    /// Resolution rule: a report of type `resolution` moves the incident
    /// to `resolved` in the same store transaction, whatever its prior
    /// status.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the incident does not exist.
    /// - [`ServiceError::PermissionDenied`] if a guard is not on its roster.
    /// - [`ServiceError::InvalidInput`] if the message is blank.
    pub async fn add_update(
        &self,
        caller: &Caller,
        id: IncidentId,
        input: NewIncidentUpdate,
    ) -> Result<IncidentUpdate, ServiceError> {
        self.authorize_write(caller, id).await?;
        let update = input.into_update(id, caller.user_id, Utc::now())?;
        let forced = update.update_type.forced_incident_status();
        self.store.append_update(&update, forced).await?;
        tracing::info!(
            incident_id = %id,
            update_type = %update.update_type,
            by = %caller.user_id,
            resolved = forced.is_some(),
            "incident update filed"
        );

        self.dispatcher
            .publish(
                &HubEvent::IncidentUpdateReceived {
                    incident_id: id,
                    update: update.clone(),
                    guard_id: caller.user_id,
                },
                Selector::ByRole(Role::Operator),
            )
            .await;
        Ok(update)
    }

    /// Existence first, then roster membership for guards.
    async fn authorize_write(&self, caller: &Caller, id: IncidentId) -> Result<(), ServiceError> {
        if self.store.find_incident(id).await?.is_none() {
            return Err(ServiceError::not_found("incident", id));
        }
        if let Some(guard) = caller.scope().guard() {
            if !self.store.is_guard_assigned(id, guard).await? {
                return Err(not_assigned(id));
            }
        }
        Ok(())
    }

    async fn load(&self, id: IncidentId) -> Result<Incident, ServiceError> {
        self.store
            .find_incident(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("incident", id))
    }
}

fn not_assigned(id: IncidentId) -> ServiceError {
    ServiceError::PermissionDenied(format!("incident {id} is not assigned to you"))
}
