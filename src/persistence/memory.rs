//! In-memory [`Store`] implementation.
//!
//! All tables live behind one [`tokio::sync::RwLock`]; every trait call
//! holds the lock for its whole read-validate-write, which gives each
//! call the same all-or-nothing behaviour as a database transaction.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Assignment, Store, status_moved};
use crate::domain::{
    Alert, AlertFilter, AlertId, AlertStatus, Camera, CameraId, CameraStatus, Incident, IncidentId,
    IncidentStatus, IncidentUpdate, Premise, PremiseId, Scope, User, UserId,
};
use crate::error::ServiceError;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    premises: HashMap<PremiseId, Premise>,
    cameras: HashMap<CameraId, Camera>,
    camera_guards: BTreeSet<(CameraId, UserId)>,
    alerts: HashMap<AlertId, Alert>,
    /// Incident rows; roster and update log are joined on read.
    incidents: HashMap<IncidentId, Incident>,
    incident_guards: BTreeSet<(IncidentId, UserId)>,
    updates: Vec<IncidentUpdate>,
}

impl Tables {
    fn hydrate(&self, row: &Incident) -> Incident {
        let mut incident = row.clone();
        incident.assigned_guards = self.roster(row.id);
        incident.updates = self
            .updates
            .iter()
            .filter(|u| u.incident_id == row.id)
            .cloned()
            .collect();
        incident.updates.sort_by_key(|u| u.created_at);
        incident
    }

    fn roster(&self, incident_id: IncidentId) -> Vec<User> {
        self.incident_guards
            .iter()
            .filter(|(iid, _)| *iid == incident_id)
            .filter_map(|(_, gid)| self.users.get(gid).cloned())
            .collect()
    }

    fn incident_for_alert(&self, alert_id: AlertId) -> Option<&Incident> {
        self.incidents.values().find(|i| i.alert_id == alert_id)
    }

    fn guard_sees_alert(&self, alert: &Alert, guard: UserId) -> bool {
        alert.assigned_guard_id == Some(guard)
            || self
                .incident_for_alert(alert.id)
                .is_some_and(|i| self.incident_guards.contains(&(i.id, guard)))
    }
}

/// Process-local store with database-like atomicity per call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    /// Inserts or replaces a premise.
    pub async fn insert_premise(&self, premise: Premise) {
        self.tables.write().await.premises.insert(premise.id, premise);
    }

    /// Inserts or replaces a camera.
    pub async fn insert_camera(&self, camera: Camera) {
        self.tables.write().await.cameras.insert(camera.id, camera);
    }

    /// Assigns a guard to watch a camera.
    pub async fn assign_camera_guard(&self, camera_id: CameraId, guard_id: UserId) {
        self.tables
            .write()
            .await
            .camera_guards
            .insert((camera_id, guard_id));
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_alert(&self, alert: &Alert) -> Result<(), ServiceError> {
        let mut t = self.tables.write().await;
        if !t.premises.contains_key(&alert.premise_id) {
            return Err(ServiceError::not_found("premise", alert.premise_id));
        }
        if t.alerts.contains_key(&alert.id) {
            return Err(ServiceError::Conflict(format!("alert {} exists", alert.id)));
        }
        t.alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn find_alert(&self, id: AlertId) -> Result<Option<Alert>, ServiceError> {
        Ok(self.tables.read().await.alerts.get(&id).cloned())
    }

    async fn list_alerts(
        &self,
        filter: &AlertFilter,
        scope: Scope,
    ) -> Result<Vec<Alert>, ServiceError> {
        let t = self.tables.read().await;
        let mut alerts: Vec<Alert> = t
            .alerts
            .values()
            .filter(|a| filter.matches(a))
            .filter(|a| scope.guard().is_none_or(|g| t.guard_sees_alert(a, g)))
            .cloned()
            .collect();
        newest_first(&mut alerts, |a| a.created_at);
        Ok(alerts)
    }

    async fn set_alert_status(
        &self,
        id: AlertId,
        status: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, ServiceError> {
        let mut t = self.tables.write().await;
        Ok(t.alerts.get_mut(&id).map(|alert| {
            alert.status = status;
            alert.updated_at = at;
            alert.clone()
        }))
    }

    async fn advance_alert_status(
        &self,
        id: AlertId,
        from: AlertStatus,
        to: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, ServiceError> {
        let mut t = self.tables.write().await;
        let Some(alert) = t.alerts.get_mut(&id) else {
            return Ok(None);
        };
        if alert.status != from {
            return Err(status_moved(id, alert.status, from));
        }
        alert.status = to;
        alert.updated_at = at;
        Ok(Some(alert.clone()))
    }

    async fn assign_alert(&self, assignment: &Assignment) -> Result<(), ServiceError> {
        let mut t = self.tables.write().await;
        let alert_id = assignment.incident.alert_id;

        // Validate everything before the first write.
        let Some(current) = t.alerts.get(&alert_id).map(|a| a.status) else {
            return Err(ServiceError::not_found("alert", alert_id));
        };
        if t.incident_for_alert(alert_id).is_some() {
            return Err(ServiceError::Conflict(format!(
                "alert {alert_id} already has an incident"
            )));
        }
        current.ensure_advance(alert_id, AlertStatus::Assigned)?;
        if let Some(missing) = assignment
            .guard_ids
            .iter()
            .find(|g| !t.users.contains_key(*g))
        {
            return Err(ServiceError::not_found("user", missing));
        }

        let mut row = assignment.incident.clone();
        row.assigned_guards.clear();
        row.updates.clear();
        let incident_id = row.id;
        t.incidents.insert(incident_id, row);
        for guard in &assignment.guard_ids {
            t.incident_guards.insert((incident_id, *guard));
        }
        if let Some(alert) = t.alerts.get_mut(&alert_id) {
            alert.status = AlertStatus::Assigned;
            alert.assigned_guard_id = Some(assignment.lead_guard);
            alert.updated_at = assignment.at;
        }
        Ok(())
    }

    async fn find_incident(&self, id: IncidentId) -> Result<Option<Incident>, ServiceError> {
        let t = self.tables.read().await;
        Ok(t.incidents.get(&id).map(|row| t.hydrate(row)))
    }

    async fn find_incident_by_alert(
        &self,
        alert_id: AlertId,
    ) -> Result<Option<Incident>, ServiceError> {
        let t = self.tables.read().await;
        Ok(t.incident_for_alert(alert_id).map(|row| t.hydrate(row)))
    }

    async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
        scope: Scope,
    ) -> Result<Vec<Incident>, ServiceError> {
        let t = self.tables.read().await;
        let mut incidents: Vec<Incident> = t
            .incidents
            .values()
            .filter(|i| status.is_none_or(|s| i.status == s))
            .filter(|i| {
                scope
                    .guard()
                    .is_none_or(|g| t.incident_guards.contains(&(i.id, g)))
            })
            .map(|row| t.hydrate(row))
            .collect();
        newest_first(&mut incidents, |i| i.created_at);
        Ok(incidents)
    }

    async fn is_guard_assigned(
        &self,
        incident_id: IncidentId,
        guard_id: UserId,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .tables
            .read()
            .await
            .incident_guards
            .contains(&(incident_id, guard_id)))
    }

    async fn set_incident_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let mut t = self.tables.write().await;
        Ok(t.incidents
            .get_mut(&id)
            .map(|incident| {
                incident.status = status;
                incident.updated_at = at;
            })
            .is_some())
    }

    async fn append_update(
        &self,
        update: &IncidentUpdate,
        forced_status: Option<IncidentStatus>,
    ) -> Result<(), ServiceError> {
        let mut t = self.tables.write().await;
        let Some(incident) = t.incidents.get_mut(&update.incident_id) else {
            return Err(ServiceError::not_found("incident", update.incident_id));
        };
        if let Some(status) = forced_status {
            incident.status = status;
            incident.updated_at = update.created_at;
        }
        t.updates.push(update.clone());
        Ok(())
    }

    async fn find_guards(&self, ids: &[UserId]) -> Result<Vec<User>, ServiceError> {
        let t = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| t.users.get(id))
            .filter(|u| u.is_dispatchable_guard())
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let t = self.tables.read().await;
        let mut users: Vec<User> = t.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn users_by_incident(&self, id: IncidentId) -> Result<Vec<User>, ServiceError> {
        Ok(self.tables.read().await.roster(id))
    }

    async fn users_by_camera(&self, id: CameraId) -> Result<Vec<User>, ServiceError> {
        let t = self.tables.read().await;
        Ok(t.camera_guards
            .iter()
            .filter(|(cid, _)| *cid == id)
            .filter_map(|(_, gid)| t.users.get(gid).cloned())
            .collect())
    }

    async fn list_premises(&self) -> Result<Vec<Premise>, ServiceError> {
        let t = self.tables.read().await;
        let mut premises: Vec<Premise> = t.premises.values().cloned().collect();
        premises.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(premises)
    }

    async fn find_premise(&self, id: PremiseId) -> Result<Option<Premise>, ServiceError> {
        Ok(self.tables.read().await.premises.get(&id).cloned())
    }

    async fn cameras_by_premise(&self, id: PremiseId) -> Result<Vec<Camera>, ServiceError> {
        let t = self.tables.read().await;
        let mut cameras: Vec<Camera> = t
            .cameras
            .values()
            .filter(|c| c.premise_id == id)
            .cloned()
            .collect();
        cameras.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cameras)
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>, ServiceError> {
        let t = self.tables.read().await;
        let mut cameras: Vec<Camera> = t.cameras.values().cloned().collect();
        cameras.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cameras)
    }

    async fn find_camera(&self, id: CameraId) -> Result<Option<Camera>, ServiceError> {
        Ok(self.tables.read().await.cameras.get(&id).cloned())
    }

    async fn cameras_for_guard(&self, guard_id: UserId) -> Result<Vec<Camera>, ServiceError> {
        let t = self.tables.read().await;
        Ok(t.camera_guards
            .iter()
            .filter(|(_, gid)| *gid == guard_id)
            .filter_map(|(cid, _)| t.cameras.get(cid).cloned())
            .collect())
    }

    async fn set_camera_status(
        &self,
        id: CameraId,
        status: CameraStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let mut t = self.tables.write().await;
        Ok(t.cameras
            .get_mut(&id)
            .map(|camera| {
                camera.status = status;
                camera.updated_at = at;
            })
            .is_some())
    }
}
