//! Shared fixture for service tests: a seeded in-memory store, the hub
//! and all three services wired together.

#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::{AlertService, DirectoryService, IncidentService};
use crate::auth::Caller;
use crate::domain::{
    Camera, CameraId, CameraStatus, Connection, ConnectionRegistry, EventDispatcher, OutboundQueue,
    Premise, PremiseId, PremiseType, Role, User, UserId,
};
use crate::persistence::{MemoryStore, Store};

#[derive(Debug)]
pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub dispatcher: EventDispatcher,
    pub alerts: AlertService,
    pub incidents: IncidentService,
    pub directory: DirectoryService,
    pub premise: Premise,
    pub camera: Camera,
    pub operator: User,
    pub guards: Vec<User>,
}

pub(crate) fn user(role: Role, name: &str) -> User {
    let now = Utc::now();
    User {
        id: UserId::new(),
        username: name.to_string(),
        email: format!("{name}@example.test"),
        role,
        first_name: name.to_string(),
        last_name: "Test".to_string(),
        phone: String::new(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

impl Fixture {
    /// One premise with one camera, one operator and three guards. Guard 0
    /// watches the camera.
    pub async fn new() -> Self {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::new());
        let premise = Premise {
            id: PremiseId::new(),
            name: "Substation 7".to_string(),
            address: "7 Grid Rd".to_string(),
            premise_type: PremiseType::Substation,
            floor_plans: String::new(),
            description: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let camera = Camera {
            id: CameraId::new(),
            name: "Gate cam".to_string(),
            location: "Main gate".to_string(),
            stream_url: "rtsp://cams.example.test/gate".to_string(),
            status: CameraStatus::Active,
            premise_id: premise.id,
            created_at: now,
            updated_at: now,
        };
        let operator = user(Role::Operator, "op");
        let guards: Vec<User> = (0..3)
            .map(|n| user(Role::Guard, &format!("guard{n}")))
            .collect();

        store.insert_premise(premise.clone()).await;
        store.insert_camera(camera.clone()).await;
        store.insert_user(operator.clone()).await;
        for guard in &guards {
            store.insert_user(guard.clone()).await;
        }
        if let Some(first) = guards.first() {
            store.assign_camera_guard(camera.id, first.id).await;
        }

        let dispatcher = EventDispatcher::new(Arc::new(ConnectionRegistry::new()));
        let shared: Arc<dyn Store> = Arc::<MemoryStore>::clone(&store);
        Self {
            alerts: AlertService::new(Arc::clone(&shared), dispatcher.clone()),
            incidents: IncidentService::new(Arc::clone(&shared), dispatcher.clone()),
            directory: DirectoryService::new(shared),
            store,
            dispatcher,
            premise,
            camera,
            operator,
            guards,
        }
    }

    pub fn guard(&self, n: usize) -> &User {
        match self.guards.get(n) {
            Some(guard) => guard,
            None => panic!("fixture has no guard {n}"),
        }
    }

    pub fn operator_caller(&self) -> Caller {
        Caller::new(self.operator.id, Role::Operator)
    }

    pub fn guard_caller(&self, n: usize) -> Caller {
        Caller::new(self.guard(n).id, Role::Guard)
    }

    pub async fn connect_operator(&self) -> OutboundQueue {
        self.connect(self.operator.id, Role::Operator).await
    }

    pub async fn connect_guard(&self, n: usize) -> OutboundQueue {
        self.connect(self.guard(n).id, Role::Guard).await
    }

    async fn connect(&self, user_id: UserId, role: Role) -> OutboundQueue {
        let (conn, queue) = Connection::new(user_id, role, 32);
        self.dispatcher.registry().register(conn).await;
        queue
    }
}

/// Drains every frame currently queued, parsed as JSON.
pub(crate) fn frames(queue: &mut OutboundQueue) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(frame) = queue.receiver.try_recv() {
        match serde_json::from_str(&frame) {
            Ok(value) => out.push(value),
            Err(err) => panic!("frame is not JSON: {err}"),
        }
    }
    out
}
