//! PostgreSQL implementation of the persistence layer.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    AlertRow, CameraRow, IncidentRow, PremiseRow, RosterRow, UpdateRow, UserRow, column,
    convert_all,
};
use super::{Assignment, Store, status_moved};
use crate::domain::{
    Alert, AlertFilter, AlertId, AlertSeverity, AlertStatus, AlertType, Camera, CameraId,
    CameraStatus, Incident, IncidentId, IncidentStatus, IncidentUpdate, Premise, PremiseId, Role,
    Scope, User, UserId,
};
use crate::error::ServiceError;

const ALERT_COLUMNS: &str = "id, type, severity, title, description, location, status, \
     camera_id, premise_id, assigned_guard_id, created_at, updated_at";
const INCIDENT_COLUMNS: &str = "id, alert_id, status, location, description, created_at, updated_at";
const UPDATE_COLUMNS: &str =
    "id, incident_id, guard_id, type, message, media_urls, location, created_at";
const USER_COLUMNS: &str = "u.id, u.username, u.email, u.role, u.first_name, u.last_name, \
     u.phone, u.is_active, u.created_at, u.updated_at";
const PREMISE_COLUMNS: &str =
    "id, name, address, type, floor_plans, description, is_active, created_at, updated_at";
const CAMERA_COLUMNS: &str =
    "c.id, c.name, c.location, c.stream_url, c.status, c.premise_id, c.created_at, c.updated_at";

/// PostgreSQL-backed [`Store`] using `sqlx::PgPool`.
///
/// Multi-row writes run inside one transaction; dropping the future
/// before commit rolls the transaction back.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns the migrator's error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Joins roster and update log onto a batch of incident rows.
    async fn hydrate(&self, rows: Vec<IncidentRow>) -> Result<Vec<Incident>, ServiceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let roster = sqlx::query_as::<_, RosterRow>(&format!(
            "SELECT ig.incident_id, {USER_COLUMNS} FROM incident_guards ig \
             JOIN users u ON u.id = ig.guard_id \
             WHERE ig.incident_id = ANY($1) ORDER BY u.username"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let updates = sqlx::query_as::<_, UpdateRow>(&format!(
            "SELECT {UPDATE_COLUMNS} FROM incident_updates \
             WHERE incident_id = ANY($1) ORDER BY created_at ASC"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut guards_by_incident: HashMap<Uuid, Vec<User>> = HashMap::new();
        for row in roster {
            guards_by_incident
                .entry(row.incident_id)
                .or_default()
                .push(User::try_from(row.user)?);
        }
        let mut updates_by_incident: HashMap<Uuid, Vec<IncidentUpdate>> = HashMap::new();
        for row in updates {
            let incident_id = row.incident_id;
            updates_by_incident
                .entry(incident_id)
                .or_default()
                .push(IncidentUpdate::try_from(row)?);
        }

        rows.into_iter()
            .map(|row| {
                let guards = guards_by_incident.remove(&row.id).unwrap_or_default();
                let log = updates_by_incident.remove(&row.id).unwrap_or_default();
                row.hydrate(guards, log)
            })
            .collect()
    }

    async fn hydrate_one(&self, row: Option<IncidentRow>) -> Result<Option<Incident>, ServiceError> {
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_alert(&self, alert: &Alert) -> Result<(), ServiceError> {
        sqlx::query(&format!(
            "INSERT INTO alerts ({ALERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(Uuid::from(alert.id))
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(&alert.title)
        .bind(&alert.description)
        .bind(&alert.location)
        .bind(alert.status.as_str())
        .bind(alert.camera_id.map(Uuid::from))
        .bind(Uuid::from(alert.premise_id))
        .bind(alert.assigned_guard_id.map(Uuid::from))
        .bind(alert.created_at)
        .bind(alert.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_alert(&self, id: AlertId) -> Result<Option<Alert>, ServiceError> {
        sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?
        .map(Alert::try_from)
        .transpose()
    }

    async fn list_alerts(
        &self,
        filter: &AlertFilter,
        scope: Scope,
    ) -> Result<Vec<Alert>, ServiceError> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts a \
             WHERE ($1::text IS NULL OR a.status = $1) \
               AND ($2::text IS NULL OR a.severity = $2) \
               AND ($3::text IS NULL OR a.type = $3) \
               AND ($4::uuid IS NULL OR a.premise_id = $4) \
               AND ($5::uuid IS NULL OR a.assigned_guard_id = $5 OR EXISTS ( \
                    SELECT 1 FROM incidents i \
                    JOIN incident_guards ig ON ig.incident_id = i.id \
                    WHERE i.alert_id = a.id AND ig.guard_id = $5)) \
             ORDER BY a.created_at DESC"
        ))
        .bind(filter.status.map(AlertStatus::as_str))
        .bind(filter.severity.map(AlertSeverity::as_str))
        .bind(filter.alert_type.map(AlertType::as_str))
        .bind(filter.premise_id.map(Uuid::from))
        .bind(scope.guard().map(Uuid::from))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn set_alert_status(
        &self,
        id: AlertId,
        status: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, ServiceError> {
        sqlx::query_as::<_, AlertRow>(&format!(
            "UPDATE alerts SET status = $2, updated_at = $3 WHERE id = $1 \
             RETURNING {ALERT_COLUMNS}"
        ))
        .bind(Uuid::from(id))
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .map(Alert::try_from)
        .transpose()
    }

    async fn advance_alert_status(
        &self,
        id: AlertId,
        from: AlertStatus,
        to: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, ServiceError> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            "UPDATE alerts SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2 \
             RETURNING {ALERT_COLUMNS}"
        ))
        .bind(Uuid::from(id))
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = row {
            return Alert::try_from(row).map(Some);
        }
        match self.find_alert(id).await? {
            Some(current) => Err(status_moved(id, current.status, from)),
            None => Ok(None),
        }
    }

    async fn assign_alert(&self, assignment: &Assignment) -> Result<(), ServiceError> {
        let incident = &assignment.incident;
        let incident_id = Uuid::from(incident.id);
        let alert_id = Uuid::from(incident.alert_id);
        let guard_ids: Vec<Uuid> = assignment.guard_ids.iter().copied().map(Uuid::from).collect();

        let mut tx = self.pool.begin().await?;

        // The row lock holds off concurrent transitions until commit.
        let current = sqlx::query_scalar::<_, String>(
            "SELECT status FROM alerts WHERE id = $1 FOR UPDATE",
        )
        .bind(alert_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("alert", incident.alert_id))?;
        let already_open = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM incidents WHERE alert_id = $1)",
        )
        .bind(alert_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_open {
            return Err(ServiceError::Conflict(format!(
                "alert {} already has an incident",
                incident.alert_id
            )));
        }
        column::<AlertStatus>("alerts", &current)?
            .ensure_advance(incident.alert_id, AlertStatus::Assigned)?;

        // alert_id is UNIQUE: a concurrent assignment surfaces as Conflict.
        sqlx::query(&format!(
            "INSERT INTO incidents ({INCIDENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(incident_id)
        .bind(alert_id)
        .bind(incident.status.as_str())
        .bind(&incident.location)
        .bind(&incident.description)
        .bind(incident.created_at)
        .bind(incident.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO incident_guards (incident_id, guard_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(incident_id)
        .bind(&guard_ids)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            "UPDATE alerts SET status = $2, assigned_guard_id = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(alert_id)
        .bind(AlertStatus::Assigned.as_str())
        .bind(Uuid::from(assignment.lead_guard))
        .bind(assignment.at)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(ServiceError::not_found("alert", incident.alert_id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_incident(&self, id: IncidentId) -> Result<Option<Incident>, ServiceError> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate_one(row).await
    }

    async fn find_incident_by_alert(
        &self,
        alert_id: AlertId,
    ) -> Result<Option<Incident>, ServiceError> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE alert_id = $1"
        ))
        .bind(Uuid::from(alert_id))
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate_one(row).await
    }

    async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
        scope: Scope,
    ) -> Result<Vec<Incident>, ServiceError> {
        let rows = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents i \
             WHERE ($1::text IS NULL OR i.status = $1) \
               AND ($2::uuid IS NULL OR EXISTS ( \
                    SELECT 1 FROM incident_guards ig \
                    WHERE ig.incident_id = i.id AND ig.guard_id = $2)) \
             ORDER BY i.created_at DESC"
        ))
        .bind(status.map(IncidentStatus::as_str))
        .bind(scope.guard().map(Uuid::from))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn is_guard_assigned(
        &self,
        incident_id: IncidentId,
        guard_id: UserId,
    ) -> Result<bool, ServiceError> {
        let assigned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM incident_guards WHERE incident_id = $1 AND guard_id = $2)",
        )
        .bind(Uuid::from(incident_id))
        .bind(Uuid::from(guard_id))
        .fetch_one(&self.pool)
        .await?;
        Ok(assigned)
    }

    async fn set_incident_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query("UPDATE incidents SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(status.as_str())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_update(
        &self,
        update: &IncidentUpdate,
        forced_status: Option<IncidentStatus>,
    ) -> Result<(), ServiceError> {
        let incident_id = Uuid::from(update.incident_id);
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO incident_updates ({UPDATE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(Uuid::from(update.id))
        .bind(incident_id)
        .bind(Uuid::from(update.guard_id))
        .bind(update.update_type.as_str())
        .bind(&update.message)
        .bind(&update.media_urls)
        .bind(update.location.as_deref())
        .bind(update.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(status) = forced_status {
            sqlx::query("UPDATE incidents SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(incident_id)
                .bind(status.as_str())
                .bind(update.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_guards(&self, ids: &[UserId]) -> Result<Vec<User>, ServiceError> {
        let wanted: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             WHERE u.id = ANY($1) AND u.role = $2 AND u.is_active"
        ))
        .bind(&wanted)
        .bind(Role::Guard.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: HashMap<UserId, User> = HashMap::new();
        for row in rows {
            let user = User::try_from(row)?;
            by_id.insert(user.id, user);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u ORDER BY u.username"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn users_by_incident(&self, id: IncidentId) -> Result<Vec<User>, ServiceError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             JOIN incident_guards ig ON ig.guard_id = u.id \
             WHERE ig.incident_id = $1 ORDER BY u.username"
        ))
        .bind(Uuid::from(id))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn users_by_camera(&self, id: CameraId) -> Result<Vec<User>, ServiceError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             JOIN camera_guards cg ON cg.guard_id = u.id \
             WHERE cg.camera_id = $1 ORDER BY u.username"
        ))
        .bind(Uuid::from(id))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_premises(&self) -> Result<Vec<Premise>, ServiceError> {
        let rows = sqlx::query_as::<_, PremiseRow>(&format!(
            "SELECT {PREMISE_COLUMNS} FROM premises ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn find_premise(&self, id: PremiseId) -> Result<Option<Premise>, ServiceError> {
        sqlx::query_as::<_, PremiseRow>(&format!(
            "SELECT {PREMISE_COLUMNS} FROM premises WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?
        .map(Premise::try_from)
        .transpose()
    }

    async fn cameras_by_premise(&self, id: PremiseId) -> Result<Vec<Camera>, ServiceError> {
        let rows = sqlx::query_as::<_, CameraRow>(&format!(
            "SELECT {CAMERA_COLUMNS} FROM cameras c WHERE c.premise_id = $1 ORDER BY c.name"
        ))
        .bind(Uuid::from(id))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>, ServiceError> {
        let rows = sqlx::query_as::<_, CameraRow>(&format!(
            "SELECT {CAMERA_COLUMNS} FROM cameras c ORDER BY c.name"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn find_camera(&self, id: CameraId) -> Result<Option<Camera>, ServiceError> {
        sqlx::query_as::<_, CameraRow>(&format!(
            "SELECT {CAMERA_COLUMNS} FROM cameras c WHERE c.id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?
        .map(Camera::try_from)
        .transpose()
    }

    async fn cameras_for_guard(&self, guard_id: UserId) -> Result<Vec<Camera>, ServiceError> {
        let rows = sqlx::query_as::<_, CameraRow>(&format!(
            "SELECT {CAMERA_COLUMNS} FROM cameras c \
             JOIN camera_guards cg ON cg.camera_id = c.id \
             WHERE cg.guard_id = $1 ORDER BY c.name"
        ))
        .bind(Uuid::from(guard_id))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn set_camera_status(
        &self,
        id: CameraId,
        status: CameraStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query("UPDATE cameras SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(status.as_str())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
