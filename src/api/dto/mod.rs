//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers and enum values arrive as strings and are parsed here, so a
//! malformed value surfaces as `InvalidInput` in the standard error body.

pub mod alert_dto;
pub mod common_dto;
pub mod incident_dto;

pub use alert_dto::*;
pub use common_dto::*;
pub use incident_dto::*;
