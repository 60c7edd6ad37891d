//! REST surface driven through the router with `oneshot` against the
//! in-memory store.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use serde_json::{Value, json};

use common::Seeded;

fn alert_body(seed: &Seeded) -> Value {
    json!({
        "type": "unauthorized_access",
        "severity": "high",
        "title": "Door forced",
        "description": "Rear door contact opened after hours",
        "location": "Rear loading bay",
        "premise_id": seed.premise.id,
        "camera_id": seed.camera.id,
    })
}

async fn create_alert(seed: &Seeded) -> String {
    let (status, body) = seed
        .call("POST", "/api/alerts", Some(&seed.operator), Some(alert_body(seed)))
        .await;
    assert_eq!(status, 201, "{body}");
    let Some(id) = body["id"].as_str() else {
        panic!("alert id missing: {body}");
    };
    id.to_string()
}

#[tokio::test]
async fn health_is_public_and_reports_connections() {
    let seed = Seeded::new().await;
    let (status, body) = seed.call("GET", "/health", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connections"], 0);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let seed = Seeded::new().await;
    let (status, body) = seed.call("GET", "/api/alerts", None, None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], 4001);
}

#[tokio::test]
async fn me_echoes_the_verified_caller() {
    let seed = Seeded::new().await;
    let guard = seed.guard(0);
    let (status, body) = seed.call("GET", "/auth/me", Some(guard), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["user_id"], guard.id.to_string());
    assert_eq!(body["role"], "security_guard");
    assert_eq!(body["username"], "guard1");
}

#[tokio::test]
async fn operator_creates_and_lists_alerts() {
    let seed = Seeded::new().await;
    let id = create_alert(&seed).await;

    let (status, body) = seed.call("GET", "/api/alerts", Some(&seed.operator), None).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], id);
    assert_eq!(body[0]["status"], "pending");

    let (status, body) = seed
        .call("GET", "/api/alerts?severity=low", Some(&seed.operator), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn guard_cannot_create_alerts() {
    let seed = Seeded::new().await;
    let (status, body) = seed
        .call("POST", "/api/alerts", Some(seed.guard(0)), Some(alert_body(&seed)))
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], 4003);
}

#[tokio::test]
async fn unknown_filter_value_is_bad_request() {
    let seed = Seeded::new().await;
    let (status, body) = seed
        .call("GET", "/api/alerts?status=exploded", Some(&seed.operator), None)
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn malformed_path_id_is_bad_request() {
    let seed = Seeded::new().await;
    let (status, _) = seed
        .call("GET", "/api/alerts/not-a-uuid", Some(&seed.operator), None)
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn assign_flow_over_http() {
    let seed = Seeded::new().await;
    let id = create_alert(&seed).await;
    let g1 = seed.guard(0);
    let g2 = seed.guard(1);

    let (status, _) = seed
        .call("POST", &format!("/api/alerts/{id}/acknowledge"), Some(&seed.operator), None)
        .await;
    assert_eq!(status, 200);

    let (status, body) = seed
        .call(
            "POST",
            &format!("/api/alerts/{id}/assign"),
            Some(&seed.operator),
            Some(json!({ "guard_id": [g1.id, g2.id] })),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["alert"]["status"], "assigned");
    assert_eq!(body["alert"]["assigned_guard_id"], g1.id.to_string());
    assert_eq!(body["incident"]["status"], "open");
    assert_eq!(body["incident"]["assigned_guards"].as_array().map(Vec::len), Some(2));

    let (status, body) = seed
        .call(
            "POST",
            &format!("/api/alerts/{id}/assign"),
            Some(&seed.operator),
            Some(json!({ "guard_id": [g1.id] })),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], 2002);

    let (status, body) = seed
        .call("GET", &format!("/api/incidents/by-alert/{id}"), Some(g2), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["alert_id"], id);
}

#[tokio::test]
async fn assign_with_empty_list_is_bad_request() {
    let seed = Seeded::new().await;
    let id = create_alert(&seed).await;
    let (status, _) = seed
        .call(
            "POST",
            &format!("/api/alerts/{id}/assign"),
            Some(&seed.operator),
            Some(json!({ "guard_id": [] })),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = seed
        .call("GET", &format!("/api/incidents/by-alert/{id}"), Some(&seed.operator), None)
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn resolution_report_resolves_incident_over_http() {
    let seed = Seeded::new().await;
    let id = create_alert(&seed).await;
    let g1 = seed.guard(0);
    let (_, body) = seed
        .call(
            "POST",
            &format!("/api/alerts/{id}/assign"),
            Some(&seed.operator),
            Some(json!({ "guard_id": [g1.id] })),
        )
        .await;
    let Some(incident_id) = body["incident"]["id"].as_str().map(str::to_string) else {
        panic!("incident id missing: {body}");
    };

    let (status, body) = seed
        .call(
            "POST",
            &format!("/api/incidents/{incident_id}/updates"),
            Some(g1),
            Some(json!({ "type": "resolution", "message": "Door secured, no intruder" })),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["guard_id"], g1.id.to_string());

    let (status, body) = seed
        .call("GET", &format!("/api/incidents/{incident_id}"), Some(g1), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "resolved");
    assert_eq!(body["updates"].as_array().map(Vec::len), Some(1));

    let (status, _) = seed
        .call(
            "PUT",
            &format!("/api/incidents/{incident_id}"),
            Some(seed.guard(2)),
            Some(json!({ "status": "closed" })),
        )
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn guard_sees_only_own_incidents() {
    let seed = Seeded::new().await;
    let id = create_alert(&seed).await;
    let g1 = seed.guard(0);
    seed.call(
        "POST",
        &format!("/api/alerts/{id}/assign"),
        Some(&seed.operator),
        Some(json!({ "guard_id": [g1.id] })),
    )
    .await;

    let (status, body) = seed.call("GET", "/api/incidents/assigned/me", Some(g1), None).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = seed.call("GET", "/api/incidents", Some(seed.guard(1)), None).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(Vec::len), Some(0));

    let (status, _) = seed
        .call("GET", "/api/incidents/assigned/me", Some(&seed.operator), None)
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn directory_routes_are_role_gated() {
    let seed = Seeded::new().await;
    let g1 = seed.guard(0);
    let premise = seed.premise.id;
    let camera = seed.camera.id;

    let (status, body) = seed.call("GET", "/api/premises", Some(&seed.operator), None).await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["type"], "office");
    let (status, _) = seed.call("GET", "/api/premises", Some(g1), None).await;
    assert_eq!(status, 403);

    let (status, body) = seed
        .call("GET", &format!("/api/premises/{premise}/cameras"), Some(g1), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = seed.call("GET", "/api/cameras/assigned", Some(g1), None).await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["id"], camera.to_string());

    let (status, _) = seed
        .call("GET", &format!("/api/cameras/{camera}"), Some(seed.guard(1)), None)
        .await;
    assert_eq!(status, 403);

    let (status, body) = seed
        .call(
            "PUT",
            &format!("/api/cameras/{camera}/status"),
            Some(&seed.operator),
            Some(json!({ "status": "maintenance" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "maintenance");

    let (status, body) = seed
        .call("GET", &format!("/api/users/assigned/camera/{camera}"), Some(&seed.operator), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["id"], g1.id.to_string());

    let (status, body) = seed.call("GET", "/api/users", Some(&seed.operator), None).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(Vec::len), Some(4));
}
