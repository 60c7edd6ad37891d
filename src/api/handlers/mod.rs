//! REST endpoint handlers organized by resource.

pub mod alerts;
pub mod cameras;
pub mod incidents;
pub mod premises;
pub mod system;
pub mod users;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(alerts::routes())
        .merge(incidents::routes())
        .merge(premises::routes())
        .merge(cameras::routes())
        .merge(users::routes())
}
