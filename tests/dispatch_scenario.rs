//! Full alert-to-resolution walk through the services with operators and
//! guards registered on the hub.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use serde_json::Value;

use guardpost::auth::Caller;
use guardpost::domain::{
    AlertSeverity, AlertStatus, AlertType, Connection, IncidentStatus, NewAlert,
    NewIncidentUpdate, OutboundQueue, Role, UpdateType, User,
};
use guardpost::error::ServiceError;

use common::Seeded;

async fn connect(seed: &Seeded, user: &User) -> OutboundQueue {
    let (conn, queue) = Connection::new(user.id, user.role, 32);
    seed.state.dispatcher.registry().register(conn).await;
    queue
}

fn drain(queue: &mut OutboundQueue) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(frame) = queue.receiver.try_recv() {
        match serde_json::from_str(&frame) {
            Ok(value) => out.push(value),
            Err(err) => panic!("frame is not JSON: {err}"),
        }
    }
    out
}

fn types(frames: &[Value]) -> Vec<&str> {
    frames.iter().filter_map(|f| f["type"].as_str()).collect()
}

fn caller(user: &User) -> Caller {
    Caller::new(user.id, user.role)
}

#[tokio::test]
async fn alert_to_resolution_with_hub_fan_out() {
    let seed = Seeded::new().await;
    let (g1, g2, g3) = (seed.guard(0), seed.guard(1), seed.guard(2));
    let operator = caller(&seed.operator);

    let mut op_queue = connect(&seed, &seed.operator).await;
    let mut g1_queue = connect(&seed, g1).await;
    let mut g2_queue = connect(&seed, g2).await;
    let mut g3_queue = connect(&seed, g3).await;

    // Create
    let Ok(alert) = seed
        .state
        .alerts
        .create(
            &operator,
            NewAlert {
                alert_type: AlertType::SuspiciousActivity,
                severity: AlertSeverity::High,
                title: "Loitering".to_string(),
                description: "Person near fence for 20 minutes".to_string(),
                location: "North fence".to_string(),
                premise_id: seed.premise.id,
                camera_id: None,
            },
        )
        .await
    else {
        panic!("create failed");
    };
    assert_eq!(alert.status, AlertStatus::Pending);
    assert_eq!(types(&drain(&mut op_queue)), vec!["alert_created"]);
    assert!(drain(&mut g1_queue).is_empty());

    // Acknowledge reaches everyone
    let Ok(alert) = seed.state.alerts.acknowledge(&operator, alert.id).await else {
        panic!("acknowledge failed");
    };
    assert_eq!(alert.status, AlertStatus::Acknowledged);
    for queue in [&mut op_queue, &mut g1_queue, &mut g2_queue, &mut g3_queue] {
        assert_eq!(types(&drain(queue)), vec!["alert_acknowledged"]);
    }

    // Assign to G1 and G2
    let Ok(outcome) = seed
        .state
        .alerts
        .assign(&operator, alert.id, &[g1.id, g2.id])
        .await
    else {
        panic!("assign failed");
    };
    let incident = outcome.incident;
    assert_eq!(outcome.alert.status, AlertStatus::Assigned);
    assert_eq!(incident.status, IncidentStatus::Open);
    let roster: Vec<_> = incident.assigned_guards.iter().map(|g| g.id).collect();
    assert_eq!(roster, vec![g1.id, g2.id]);

    let g1_frames = drain(&mut g1_queue);
    assert_eq!(types(&g1_frames), vec!["guard_dispatched"]);
    assert_eq!(g1_frames[0]["payload"]["incident_id"], incident.id.to_string());
    assert_eq!(types(&drain(&mut g2_queue)), vec!["guard_dispatched"]);
    assert!(drain(&mut g3_queue).is_empty());
    let op_frames = drain(&mut op_queue);
    assert_eq!(types(&op_frames), vec!["alert_assigned"]);
    assert_eq!(op_frames[0]["payload"]["guards"].as_array().map(Vec::len), Some(2));

    // G1 files a resolution report
    let Ok(update) = seed
        .state
        .incidents
        .add_update(
            &caller(g1),
            incident.id,
            NewIncidentUpdate {
                update_type: UpdateType::Resolution,
                message: "Person left, area clear".to_string(),
                media_urls: Vec::new(),
                location: Some("North fence".to_string()),
            },
        )
        .await
    else {
        panic!("add_update failed");
    };
    assert_eq!(update.guard_id, g1.id);
    let op_frames = drain(&mut op_queue);
    assert_eq!(types(&op_frames), vec!["incident_update_received"]);
    assert_eq!(op_frames[0]["payload"]["guard_id"], g1.id.to_string());
    assert!(drain(&mut g2_queue).is_empty());

    // G2 can still read; status is resolved
    let Ok(seen) = seed.state.incidents.get(&caller(g2), incident.id).await else {
        panic!("assigned guard could not read incident");
    };
    assert_eq!(seen.status, IncidentStatus::Resolved);
    assert_eq!(seen.updates.len(), 1);

    // G3 was never assigned
    assert!(matches!(
        seed.state.incidents.get(&caller(g3), incident.id).await,
        Err(ServiceError::PermissionDenied(_))
    ));
    assert!(matches!(
        seed.state
            .incidents
            .update_status(&caller(g3), incident.id, IncidentStatus::Closed)
            .await,
        Err(ServiceError::PermissionDenied(_))
    ));
    let Ok(after) = seed.state.incidents.get(&operator, incident.id).await else {
        panic!("operator could not read incident");
    };
    assert_eq!(after.status, IncidentStatus::Resolved);
}

#[tokio::test]
async fn unknown_guards_are_excluded_from_roster() {
    let seed = Seeded::new().await;
    let operator = caller(&seed.operator);
    let stranger = common::user(Role::Guard, "stranger");
    let Ok(alert) = seed
        .state
        .alerts
        .create(
            &operator,
            NewAlert {
                alert_type: AlertType::EquipmentDamage,
                severity: AlertSeverity::Low,
                title: "Camera tilted".to_string(),
                description: "Lobby camera knocked off angle".to_string(),
                location: "Lobby".to_string(),
                premise_id: seed.premise.id,
                camera_id: Some(seed.camera.id),
            },
        )
        .await
    else {
        panic!("create failed");
    };

    let Ok(outcome) = seed
        .state
        .alerts
        .assign(&operator, alert.id, &[stranger.id, seed.guard(1).id, seed.operator.id])
        .await
    else {
        panic!("assign failed");
    };
    let roster: Vec<_> = outcome.incident.assigned_guards.iter().map(|g| g.id).collect();
    assert_eq!(roster, vec![seed.guard(1).id]);
    assert_eq!(outcome.alert.assigned_guard_id, Some(seed.guard(1).id));
}

#[tokio::test]
async fn full_queue_drops_connection_without_blocking() {
    let seed = Seeded::new().await;
    let registry = seed.state.dispatcher.registry();
    let (conn, _queue) = Connection::new(seed.operator.id, Role::Operator, 1);
    let id = registry.register(conn).await;

    let operator = caller(&seed.operator);
    for n in 0..3 {
        let result = seed
            .state
            .alerts
            .create(
                &operator,
                NewAlert {
                    alert_type: AlertType::SystemFailure,
                    severity: AlertSeverity::Medium,
                    title: format!("Sensor {n} offline"),
                    description: "No heartbeat".to_string(),
                    location: "Roof".to_string(),
                    premise_id: seed.premise.id,
                    camera_id: None,
                },
            )
            .await;
        assert!(result.is_ok());
    }
    assert!(!registry.contains(id).await);
    assert_eq!(registry.connection_count().await, 0);
}
