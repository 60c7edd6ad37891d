//! Shared setup for the integration tests: a seeded in-memory store, a
//! JWT verifier and the assembled router.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use axum::routing::get;
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use guardpost::api;
use guardpost::app_state::AppState;
use guardpost::auth::{IdentityVerifier, JwtVerifier};
use guardpost::config::HubConfig;
use guardpost::domain::{
    Camera, CameraId, CameraStatus, Premise, PremiseId, PremiseType, Role, User, UserId,
};
use guardpost::persistence::{MemoryStore, Store};
use guardpost::ws::handler::ws_handler;

pub const SECRET: &[u8] = b"integration-secret";

#[derive(Debug)]
pub struct Seeded {
    pub state: AppState,
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub jwt: Arc<JwtVerifier>,
    pub premise: Premise,
    pub camera: Camera,
    pub operator: User,
    pub guards: Vec<User>,
}

pub fn user(role: Role, name: &str) -> User {
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

impl Seeded {
    /// One premise with one camera watched by guard 0, one operator and
    /// three guards.
    pub async fn new() -> Self {
        Self::with_hub(HubConfig::default()).await
    }

    pub async fn with_hub(hub: HubConfig) -> Self {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::new());
        let premise = Premise {
            id: PremiseId::new(),
            name: "North Office".to_string(),
            address: "1 Main St".to_string(),
            premise_type: PremiseType::Office,
            floor_plans: String::new(),
            description: "HQ".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let camera = Camera {
            id: CameraId::new(),
            name: "Lobby".to_string(),
            location: "Ground floor lobby".to_string(),
            stream_url: "rtsp://cams.example.test/lobby".to_string(),
            status: CameraStatus::Active,
            premise_id: premise.id,
            created_at: now,
            updated_at: now,
        };
        let operator = user(Role::Operator, "operator");
        let guards: Vec<User> = (1..=3)
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

        let jwt = Arc::new(JwtVerifier::new(SECRET, None));
        let verifier: Arc<dyn IdentityVerifier> = Arc::<JwtVerifier>::clone(&jwt);
        let shared: Arc<dyn Store> = Arc::<MemoryStore>::clone(&store);
        let state = AppState::new(shared, verifier, hub);
        let app = api::build_router()
            .route("/ws", get(ws_handler))
            .with_state(state.clone());

        Self {
            state,
            app,
            store,
            jwt,
            premise,
            camera,
            operator,
            guards,
        }
    }

    pub fn guard(&self, n: usize) -> &User {
        match self.guards.get(n) {
            Some(guard) => guard,
            None => panic!("no guard {n}"),
        }
    }

    pub fn token(&self, user: &User) -> String {
        match self.jwt.issue(user.id, &user.username, user.role, Duration::hours(1)) {
            Ok(token) => token,
            Err(err) => panic!("token signing failed: {err}"),
        }
    }

    /// Sends one request through the router and returns status plus JSON
    /// body (`Null` when empty, a string when not JSON).
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        as_user: Option<&User>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = as_user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            panic!("invalid request {method} {uri}");
        };
        let Ok(response) = self.app.clone().oneshot(request).await else {
            panic!("router failed on {method} {uri}");
        };
        read_json(response).await
    }
}

pub async fn read_json(response: Response<Body>) -> (u16, Value) {
    let status = response.status().as_u16();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("failed to read body");
    };
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    // Extractor rejections answer in plain text.
    let json = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, json)
}
