//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use buildgate_api::auth::JwtManager;
use buildgate_api::commands::Commands;
use buildgate_api::dispatch::RecordingDispatcher;
use buildgate_api::features::StaticFeatureFlags;
use buildgate_api::http::{AppState, build_router};
use buildgate_api::storage::{Database, Repository, User};
use buildgate_core::AccessGrant;

pub const OWNER_ID: i64 = 1;
pub const OTHER_ID: i64 = 2;
pub const REPO_ID: i64 = 10;
pub const PRIVATE_REPO_ID: i64 = 20;

pub struct Harness {
    pub db: Database,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub jwt: Arc<JwtManager>,
    pub owner: User,
    pub repo: Repository,
    pub private_repo: Repository,
    flags: Arc<StaticFeatureFlags>,
}

impl Harness {
    /// Owner with push access to one public and one private repository, and
    /// a second user with no grants. Crons are enabled for everyone.
    pub async fn new() -> Self {
        Self::with_flags(StaticFeatureFlags::all_active(&["cron"])).await
    }

    pub async fn with_flags(flags: StaticFeatureFlags) -> Self {
        let db = Database::open_in_memory().await.unwrap();
        let owner = db
            .create_user(OWNER_ID, "svenfuchs", Some("Sven Fuchs"))
            .await
            .unwrap();
        db.create_user(OTHER_ID, "carla", None).await.unwrap();
        let repo = db
            .create_repository(REPO_ID, &owner, "minimal", false)
            .await
            .unwrap();
        let private_repo = db
            .create_repository(PRIVATE_REPO_ID, &owner, "private", true)
            .await
            .unwrap();
        db.grant_access(OWNER_ID, REPO_ID, AccessGrant::push())
            .await
            .unwrap();
        db.grant_access(OWNER_ID, PRIVATE_REPO_ID, AccessGrant::push())
            .await
            .unwrap();

        Self {
            db,
            dispatcher: Arc::new(RecordingDispatcher::new()),
            jwt: Arc::new(JwtManager::new(b"integration-secret", 3600)),
            owner,
            repo,
            private_repo,
            flags: Arc::new(flags),
        }
    }

    fn app(&self) -> axum::Router {
        let commands = Commands::new(
            self.db.clone(),
            self.flags.clone(),
            self.dispatcher.clone(),
            "Travis::Sidekiq",
        );
        build_router(AppState::new(Arc::new(commands), self.jwt.clone()))
    }

    /// `Authorization` header value for a user.
    pub fn auth(&self, user_id: i64, login: &str) -> String {
        let (token, _) = self.jwt.issue_access_token(user_id, login).unwrap();
        format!("token {token}")
    }

    pub fn owner_auth(&self) -> String {
        self.auth(OWNER_ID, "svenfuchs")
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST to `uri` and return (status, JSON body).
    pub async fn post(
        &self,
        uri: &str,
        auth: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let resp = self.app().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
