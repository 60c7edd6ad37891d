//! OpenAPI document for the REST surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{AssignAlertRequest, StatusUpdateRequest};
use super::handlers::{alerts, cameras, incidents, premises, system, users};
use crate::auth::Caller;
use crate::domain::{
    Alert, AlertSeverity, AlertStatus, AlertType, Camera, CameraStatus, Incident, IncidentStatus,
    IncidentUpdate, NewAlert, NewIncidentUpdate, Premise, PremiseType, Role, UpdateType, User,
};
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::AssignmentOutcome;

/// Generated API description served by Swagger UI.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "guardpost",
        description = "Security alert and incident dispatch with a real-time notification hub."
    ),
    paths(
        system::health_handler,
        system::me_handler,
        alerts::create_alert,
        alerts::list_alerts,
        alerts::get_alert,
        alerts::update_alert,
        alerts::acknowledge_alert,
        alerts::assign_alert,
        incidents::list_incidents,
        incidents::assigned_incidents,
        incidents::get_incident,
        incidents::update_incident,
        incidents::add_incident_update,
        incidents::incident_by_alert,
        premises::list_premises,
        premises::get_premise,
        premises::premise_cameras,
        cameras::list_cameras,
        cameras::cameras_by_premise,
        cameras::assigned_cameras,
        cameras::get_camera,
        cameras::update_camera_status,
        users::list_users,
        users::users_by_camera,
        users::users_by_incident,
    ),
    components(schemas(
        Alert, AlertSeverity, AlertStatus, AlertType, NewAlert,
        Incident, IncidentStatus, IncidentUpdate, NewIncidentUpdate, UpdateType,
        Premise, PremiseType, Camera, CameraStatus, User, Role, Caller,
        AssignAlertRequest, StatusUpdateRequest, AssignmentOutcome,
        ErrorResponse, ErrorBody, system::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Alerts", description = "Alert lifecycle"),
        (name = "Incidents", description = "Incidents and field reports"),
        (name = "Premises", description = "Monitored sites"),
        (name = "Cameras", description = "Site cameras"),
        (name = "Users", description = "Staff directory"),
        (name = "System", description = "Health and identity"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_alert_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/alerts/{id}/assign"));
        assert!(doc.paths.paths.contains_key("/health"));
        let Some(components) = doc.components else {
            panic!("components missing");
        };
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
