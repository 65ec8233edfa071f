/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register-admin` - One-time bootstrap admin registration
/// - `POST /api/auth/login` - Login and get tokens
/// - `POST /api/auth/refresh` - Refresh access token
/// - `GET  /api/auth/me` - Authenticated self profile
///
/// Registration of the first admin is the only unauthenticated write in the
/// system: it is open exactly until an admin exists, then closed for good.
/// Members are never self-registered; their accounts are created by an admin
/// (see `routes::members`).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ApiSuccess},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskroster_shared::{
    auth::{
        authorization::ensure_first_admin,
        jwt::{create_token, refresh_access_token, Claims, TokenType},
        middleware::Principal,
        password,
    },
    models::user::{CreateUser, User, UserRole, UserView},
};
use validator::Validate;

/// Bootstrap admin registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAdminRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Tokens plus the authenticated user's profile
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The user, credential material stripped
    pub user: UserView,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

fn issue_tokens(user: &User, secret: &str) -> Result<(String, String), ApiError> {
    let access_claims = Claims::new(user.id, user.role, TokenType::Access);
    let refresh_claims = Claims::new(user.id, user.role, TokenType::Refresh);

    let access_token = create_token(&access_claims, secret)?;
    let refresh_token = create_token(&refresh_claims, secret)?;

    Ok((access_token, refresh_token))
}

/// Registers the initial admin
///
/// Allowed only while no admin exists; no principal is required. Later
/// attempts are rejected with "Admin already exists".
///
/// # Errors
///
/// - `422`: Validation failed
/// - `409`: An admin already exists
/// - `500`: Server error
pub async fn register_admin(
    State(state): State<AppState>,
    Json(req): Json<RegisterAdminRequest>,
) -> ApiResult<(StatusCode, Json<ApiSuccess<AuthResponse>>)> {
    req.validate()?;

    let admin_exists = User::admin_exists(&state.db).await?;
    ensure_first_admin(admin_exists)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: UserRole::Admin,
            managed_by: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Bootstrap admin registered");

    let (access_token, refresh_token) = issue_tokens(&user, state.jwt_secret())?;

    let body = ApiSuccess::with_message(
        AuthResponse {
            user: UserView::from(&user),
            access_token,
            refresh_token,
        },
        "Admin registered successfully",
    );

    Ok((StatusCode::CREATED, body))
}

/// Login endpoint
///
/// Authenticates by email and password and returns tokens. The failure
/// message never says which of the two was wrong.
///
/// # Errors
///
/// - `422`: Validation failed
/// - `401`: Invalid credentials
/// - `500`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiSuccess<AuthResponse>>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    let (access_token, refresh_token) = issue_tokens(&user, state.jwt_secret())?;

    Ok(ApiSuccess::with_message(
        AuthResponse {
            user: UserView::from(&user),
            access_token,
            refresh_token,
        },
        "Login successful",
    ))
}

/// Token refresh endpoint
///
/// Exchanges a valid refresh token for a new access token.
///
/// # Errors
///
/// - `401`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<ApiSuccess<RefreshResponse>>> {
    let access_token = refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(ApiSuccess::data(RefreshResponse { access_token }))
}

/// Self profile endpoint
///
/// Any authenticated principal may read its own profile; nobody else's.
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiSuccess<UserView>>> {
    let user = User::find_by_id(&state.db, principal.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiSuccess::data(UserView::from(&user)))
}
