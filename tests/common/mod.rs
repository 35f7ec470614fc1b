// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    routing::patch,
    Json, Router,
};
use imaginify_api::config::Config;
use imaginify_api::db::{ConnectError, ConnectionCache, FirestoreDb, UserStore, UserStoreHandle};
use imaginify_api::error::AppError;
use imaginify_api::models::{NewUser, User, UserUpdate};
use imaginify_api::routes::create_router;
use imaginify_api::services::{ClerkClient, WebhookVerifier};
use imaginify_api::time_utils::{now_rfc3339, unix_now};
use imaginify_api::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ─── In-memory user store ────────────────────────────────────

/// User store backed by a HashMap, counting every call.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
    calls: AtomicUsize,
    fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl MemoryUserStore {
    /// Number of create/update/delete calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, clerk_id: &str) -> Option<User> {
        self.users.lock().unwrap().get(clerk_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Make every subsequent write fail with a database error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn begin(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        self.begin()?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.clerk_id) {
            return Err(AppError::Conflict(format!("User {}", user.clerk_id)));
        }
        let user = User::from_new(user, &now_rfc3339());
        users.insert(user.clerk_id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, clerk_id: &str, update: UserUpdate) -> Result<User, AppError> {
        self.begin()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(clerk_id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", clerk_id)))?;
        user.apply(update, &now_rfc3339());
        Ok(user.clone())
    }

    async fn delete_user(&self, clerk_id: &str) -> Result<User, AppError> {
        self.begin()?;
        self.users
            .lock()
            .unwrap()
            .remove(clerk_id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", clerk_id)))
    }
}

// ─── Stub Clerk API ──────────────────────────────────────────

/// Metadata update received by the stub Clerk API.
#[derive(Debug, Clone)]
pub struct MetadataCall {
    pub clerk_id: String,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct StubState {
    calls: Arc<Mutex<Vec<MetadataCall>>>,
    status: Arc<AtomicU16>,
}

/// Local stand-in for the Clerk backend API.
pub struct StubClerk {
    pub base_url: String,
    calls: Arc<Mutex<Vec<MetadataCall>>>,
    status: Arc<AtomicU16>,
}

#[allow(dead_code)]
impl StubClerk {
    pub async fn spawn() -> Self {
        let state = StubState {
            calls: Arc::new(Mutex::new(Vec::new())),
            status: Arc::new(AtomicU16::new(200)),
        };

        let app = Router::new()
            .route("/users/{id}/metadata", patch(record_metadata))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub clerk");
        let addr = listener.local_addr().expect("stub clerk addr");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("stub clerk server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            calls: state.calls,
            status: state.status,
        }
    }

    pub fn calls(&self) -> Vec<MetadataCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Respond to metadata updates with `status` from now on.
    pub fn respond_with(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::SeqCst);
    }
}

async fn record_metadata(
    State(state): State<StubState>,
    Path(clerk_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, &'static str) {
    state
        .calls
        .lock()
        .unwrap()
        .push(MetadataCall { clerk_id, body });
    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "{}")
}

// ─── Test app ────────────────────────────────────────────────

/// Router plus handles for inspecting its collaborators.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryUserStore>,
    pub clerk: StubClerk,
    connects: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl TestApp {
    /// Number of database connection attempts made so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Build a POST to the webhook route signed with the app's secret.
    pub fn signed_request(&self, body: &str) -> Request<Body> {
        let msg_id = format!("msg_{}", uuid::Uuid::new_v4().simple());
        let timestamp = unix_now();
        let signature = self
            .state
            .verifier
            .sign(&msg_id, timestamp, body.as_bytes())
            .expect("sign test payload");

        webhook_request()
            .header("svix-id", msg_id)
            .header("svix-timestamp", timestamp.to_string())
            .header("svix-signature", signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

/// Request builder for the webhook route without signing headers.
#[allow(dead_code)]
pub fn webhook_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/api/webhooks/clerk")
        .header("content-type", "application/json")
}

/// Create a test app whose database connects to an in-memory store.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    build_test_app(true).await
}

/// Create a test app whose database connection attempts always fail.
#[allow(dead_code)]
pub async fn create_test_app_without_db() -> TestApp {
    build_test_app(false).await
}

async fn build_test_app(db_reachable: bool) -> TestApp {
    let clerk_stub = StubClerk::spawn().await;
    let config = Config {
        clerk_api_url: clerk_stub.base_url.clone(),
        ..Config::default()
    };

    let store = Arc::new(MemoryUserStore::default());
    let connects = Arc::new(AtomicUsize::new(0));

    let users = {
        let store = store.clone();
        let connects = connects.clone();
        ConnectionCache::new(move || {
            let store = store.clone();
            let connects = connects.clone();
            async move {
                connects.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                if db_reachable {
                    Ok(store as UserStoreHandle)
                } else {
                    Err(ConnectError("connection refused".to_string()))
                }
            }
        })
    };

    let verifier = WebhookVerifier::new(&config.webhook_secret, config.webhook_tolerance_secs)
        .expect("test webhook secret");
    let clerk = ClerkClient::new(config.clerk_api_url.clone(), config.clerk_secret_key.clone());

    let state = Arc::new(AppState {
        config,
        users,
        clerk,
        verifier,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        clerk: clerk_stub,
        connects,
    }
}
