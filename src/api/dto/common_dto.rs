//! Shared DTO types used across multiple endpoints.

use std::str::FromStr;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Request body for the status-overwrite endpoints.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    /// Target status wire value (e.g. `"acknowledged"`, `"in_progress"`).
    pub status: String,
}

impl StatusUpdateRequest {
    /// Parses the status into the entity's enum.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] on an unknown value.
    pub fn parse<T>(&self) -> Result<T, ServiceError>
    where
        T: FromStr<Err = ServiceError>,
    {
        self.status.parse()
    }
}

/// Parses an optional query value, treating an empty string as absent.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidInput`] if a present value is malformed.
pub fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, ServiceError>
where
    T: FromStr<Err = ServiceError>,
{
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .transpose()
}
