//! Database row models and their conversion into domain types.
//!
//! Enum columns are stored as their wire strings. A value the domain does
//! not recognise means the database holds data this build cannot read,
//! which surfaces as [`ServiceError::Internal`].

use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Alert, Camera, Incident, IncidentUpdate, Premise, User};
use crate::error::ServiceError;

pub(super) fn column<T: FromStr>(table: &str, value: &str) -> Result<T, ServiceError> {
    value
        .parse()
        .map_err(|_| ServiceError::Internal(format!("unreadable {table} column value {value:?}")))
}

/// A row from the `alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    /// Primary key.
    pub id: Uuid,
    /// Alert type wire string.
    #[sqlx(rename = "type")]
    pub alert_type: String,
    /// Severity wire string.
    pub severity: String,
    /// Headline.
    pub title: String,
    /// Description.
    pub description: String,
    /// Location.
    pub location: String,
    /// Status wire string.
    pub status: String,
    /// Capturing camera.
    pub camera_id: Option<Uuid>,
    /// Owning premise.
    pub premise_id: Uuid,
    /// Lead guard.
    pub assigned_guard_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = ServiceError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            alert_type: column("alerts", &row.alert_type)?,
            severity: column("alerts", &row.severity)?,
            title: row.title,
            description: row.description,
            location: row.location,
            status: column("alerts", &row.status)?,
            camera_id: row.camera_id.map(Into::into),
            premise_id: row.premise_id.into(),
            assigned_guard_id: row.assigned_guard_id.map(Into::into),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `incidents` table, before roster and log are joined.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IncidentRow {
    /// Primary key.
    pub id: Uuid,
    /// Originating alert.
    pub alert_id: Uuid,
    /// Status wire string.
    pub status: String,
    /// Location copied from the alert.
    pub location: String,
    /// Description copied from the alert.
    pub description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl IncidentRow {
    /// Builds the incident with its roster and update log.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] on an unreadable status.
    pub fn hydrate(
        self,
        assigned_guards: Vec<User>,
        updates: Vec<IncidentUpdate>,
    ) -> Result<Incident, ServiceError> {
        Ok(Incident {
            id: self.id.into(),
            alert_id: self.alert_id.into(),
            status: column("incidents", &self.status)?,
            location: self.location,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            assigned_guards,
            updates,
        })
    }
}

/// A row from the `incident_updates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UpdateRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning incident.
    pub incident_id: Uuid,
    /// Author.
    pub guard_id: Uuid,
    /// Update type wire string.
    #[sqlx(rename = "type")]
    pub update_type: String,
    /// Report text.
    pub message: String,
    /// Attached media.
    pub media_urls: Vec<String>,
    /// Where the report was filed.
    pub location: Option<String>,
    /// Filing time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UpdateRow> for IncidentUpdate {
    type Error = ServiceError;

    fn try_from(row: UpdateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            incident_id: row.incident_id.into(),
            guard_id: row.guard_id.into(),
            update_type: column("incident_updates", &row.update_type)?,
            message: row.message,
            media_urls: row.media_urls,
            location: row.location,
            created_at: row.created_at,
        })
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Primary key.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Role wire string.
    pub role: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone.
    pub phone: String,
    /// Whether the account may be dispatched.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = ServiceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            username: row.username,
            email: row.email,
            role: column("users", &row.role)?,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A user joined through `incident_guards`, tagged with the incident.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RosterRow {
    /// Incident the guard is linked to.
    pub incident_id: Uuid,
    /// The guard.
    #[sqlx(flatten)]
    pub user: UserRow,
}

/// A row from the `premises` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PremiseRow {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Premise type wire string.
    #[sqlx(rename = "type")]
    pub premise_type: String,
    /// Floor plan reference.
    pub floor_plans: String,
    /// Description.
    pub description: String,
    /// Whether the premise is monitored.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PremiseRow> for Premise {
    type Error = ServiceError;

    fn try_from(row: PremiseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            address: row.address,
            premise_type: column("premises", &row.premise_type)?,
            floor_plans: row.floor_plans,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `cameras` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CameraRow {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Mounting location.
    pub location: String,
    /// Stream endpoint.
    pub stream_url: String,
    /// Status wire string.
    pub status: String,
    /// Owning premise.
    pub premise_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CameraRow> for Camera {
    type Error = ServiceError;

    fn try_from(row: CameraRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            location: row.location,
            stream_url: row.stream_url,
            status: column("cameras", &row.status)?,
            premise_id: row.premise_id.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Converts a batch of rows, failing on the first unreadable one.
///
/// # Errors
///
/// Propagates the first conversion error.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, ServiceError>
where
    T: TryFrom<R, Error = ServiceError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AlertStatus, Role};

    fn alert_row(status: &str) -> AlertRow {
        let now = Utc::now();
        AlertRow {
            id: Uuid::new_v4(),
            alert_type: "unauthorized_access".to_string(),
            severity: "high".to_string(),
            title: "Door forced".to_string(),
            description: "Rear door".to_string(),
            location: "Dock".to_string(),
            status: status.to_string(),
            camera_id: None,
            premise_id: Uuid::new_v4(),
            assigned_guard_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn alert_row_converts() {
        let Ok(alert) = Alert::try_from(alert_row("acknowledged")) else {
            panic!("conversion failed");
        };
        assert_eq!(alert.status, AlertStatus::Acknowledged);
    }

    #[test]
    fn unknown_enum_value_is_internal() {
        assert!(matches!(
            Alert::try_from(alert_row("escalated")),
            Err(ServiceError::Internal(_))
        ));
    }

    #[test]
    fn user_role_reads_wire_value() {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            username: "op".to_string(),
            email: "op@example.test".to_string(),
            role: "scs_operator".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let Ok(user) = User::try_from(row) else {
            panic!("conversion failed");
        };
        assert_eq!(user.role, Role::Operator);
    }
}
