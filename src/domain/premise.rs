//! Premises and the cameras installed on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CameraId, PremiseId};

wire_enum! {
    /// Kind of monitored site.
    pub enum PremiseType {
        /// Office building.
        Office => "office",
        /// Electrical substation.
        Substation => "substation",
    }
}

wire_enum! {
    /// Operational state of a camera.
    pub enum CameraStatus {
        /// Streaming normally.
        Active => "active",
        /// Switched off.
        Inactive => "inactive",
        /// Temporarily out of service.
        Maintenance => "maintenance",
    }
}

/// A physical site containing cameras and subject to alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Premise {
    /// Premise identifier.
    pub id: PremiseId,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Site kind.
    #[serde(rename = "type")]
    pub premise_type: PremiseType,
    /// Reference to floor plan documents.
    #[serde(default)]
    pub floor_plans: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Whether the site is currently monitored.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A camera installed on a premise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Camera {
    /// Camera identifier.
    pub id: CameraId,
    /// Display name.
    pub name: String,
    /// Mounting location inside the premise.
    pub location: String,
    /// Stream endpoint.
    pub stream_url: String,
    /// Operational state.
    pub status: CameraStatus,
    /// Owning premise.
    pub premise_id: PremiseId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}
