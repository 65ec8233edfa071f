/// Application state and router builder
///
/// # Router Layout
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST   /register-admin  # Bootstrap admin (public, one-shot)
///     │   ├── POST   /login           # Login (public)
///     │   ├── POST   /refresh         # Token refresh (public)
///     │   ├── GET    /me              # Self profile (authenticated)
///     │   ├── POST   /create-member   # Create member (admin)
///     │   ├── GET    /members         # List own members (admin)
///     │   └── DELETE /members/:id     # Delete member + tasks (admin)
///     └── /tasks/
///         ├── POST   /                # Create task (admin)
///         ├── GET    /all             # All roster tasks (admin)
///         ├── GET    /user/:user_id   # One member's tasks (admin)
///         ├── GET    /my              # Own tasks (member)
///         ├── PUT    /:id             # Update task (admin)
///         ├── DELETE /:id             # Delete task (admin)
///         └── PATCH  /:id/complete    # Complete own task (member)
/// ```
///
/// Authentication is a middleware layer on the protected route groups; role
/// and ownership decisions happen per-handler against the resolved
/// [`Principal`](taskroster_shared::auth::middleware::Principal).

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskroster_shared::auth::middleware::require_principal;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = axum::middleware::from_fn_with_state(
        state.jwt_secret().to_string(),
        require_principal,
    );

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let public_auth_routes = Router::new()
        .route("/register-admin", post(routes::auth::register_admin))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Authenticated auth/roster endpoints
    let protected_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/create-member", post(routes::members::create_member))
        .route("/members", get(routes::members::list_members))
        .route("/members/:id", delete(routes::members::delete_member))
        .layer(auth_layer.clone());

    // Task endpoints (all authenticated; role checks are per-handler)
    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/all", get(routes::tasks::get_all_tasks))
        .route("/user/:user_id", get(routes::tasks::get_tasks_by_user))
        .route("/my", get(routes::tasks::get_my_tasks))
        .route(
            "/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/:id/complete", patch(routes::tasks::complete_task))
        .layer(auth_layer);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/auth", public_auth_routes.merge(protected_auth_routes))
        .nest("/api/tasks", task_routes)
        .fallback(route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Fallback for unknown routes
async fn route_not_found() -> crate::error::ApiError {
    crate::error::ApiError::NotFound("Route not found".to_string())
}
