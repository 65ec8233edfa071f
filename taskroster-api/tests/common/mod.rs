/// Common test utilities for integration tests
///
/// Provides shared infrastructure for driving the full router end-to-end:
/// - Test database setup (migrations + table truncation)
/// - Request helpers that speak the `{success, data, message}` envelope
/// - Flow helpers for registering the admin, creating members, and tasks
///
/// Tests using this module need a running Postgres pointed to by
/// `DATABASE_URL` and must run serially (`cargo test -- --ignored
/// --test-threads=1`): every `TestContext::new()` starts from empty tables.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use taskroster_api::app::{build_router, AppState};
use taskroster_api::config::Config;
use taskroster_shared::db::migrations::run_migrations;
use tower::Service as _;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context with a migrated, empty database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        // Start from a clean slate; the bootstrap-admin gate depends on it
        sqlx::query("TRUNCATE tasks, users CASCADE")
            .execute(&db)
            .await?;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Ok(TestContext { db, app })
    }

    /// Sends a request and returns (status, parsed JSON body)
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Registers the bootstrap admin and returns its access token
    pub async fn register_admin(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register-admin",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "hunter22",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "admin registration: {}", body);
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a second admin directly in the database
    ///
    /// The API only ever allows one admin, so cross-roster tests seed the
    /// second one at the store level, the same way an operator would.
    pub async fn seed_admin(&self, name: &str, email: &str) -> String {
        use taskroster_shared::auth::jwt::{create_token, Claims, TokenType};
        use taskroster_shared::auth::password::hash_password;
        use taskroster_shared::models::user::{CreateUser, User, UserRole};

        let user = User::create(
            &self.db,
            CreateUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password("hunter22").unwrap(),
                role: UserRole::Admin,
                managed_by: None,
            },
        )
        .await
        .unwrap();

        let config = Config::from_env().unwrap();
        let claims = Claims::new(user.id, UserRole::Admin, TokenType::Access);
        create_token(&claims, &config.jwt.secret).unwrap()
    }

    /// Creates a member under the given admin token, returning (id, token)
    pub async fn create_member(&self, admin_token: &str, name: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/create-member",
                Some(admin_token),
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "hunter22",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "member creation: {}", body);
        let member_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "hunter22" })),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "member login: {}", body);
        let token = body["data"]["access_token"].as_str().unwrap().to_string();

        (member_id, token)
    }

    /// Creates a task for a member, returning the task id
    pub async fn create_task(&self, admin_token: &str, member_id: &str, title: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/tasks",
                Some(admin_token),
                Some(json!({
                    "title": title,
                    "assigned_to": member_id,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "task creation: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
