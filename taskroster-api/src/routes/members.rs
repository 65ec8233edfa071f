/// Roster management endpoints (admin only)
///
/// # Endpoints
///
/// - `POST   /api/auth/create-member` - Create a member on the caller's roster
/// - `GET    /api/auth/members` - List the caller's own members
/// - `DELETE /api/auth/members/:id` - Delete a member and its tasks
///
/// A member is owned by the admin that created it, permanently: `managed_by`
/// is stamped at creation and nothing re-parents it. Every operation here is
/// scoped to the calling admin's roster; another admin's members are
/// invisible, including to deletion probes.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ApiSuccess},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskroster_shared::{
    auth::{
        authorization::{ensure_manages_member, require_admin},
        middleware::Principal,
        password,
    },
    models::{
        task::Task,
        user::{CreateUser, User, UserRole, UserView},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create member request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberRequest {
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

/// Member deletion response payload
#[derive(Debug, Serialize)]
pub struct DeleteMemberResponse {
    /// Number of tasks removed by the cascade
    pub deleted_tasks: u64,
}

/// Creates a member on the calling admin's roster
///
/// The new member's `managed_by` is set to the caller's id.
///
/// # Errors
///
/// - `422`: Validation failed
/// - `403`: Caller is not an admin
/// - `409`: Email already in use
/// - `500`: Server error
pub async fn create_member(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateMemberRequest>,
) -> ApiResult<(StatusCode, Json<ApiSuccess<UserView>>)> {
    req.validate()?;

    let admin_id = require_admin(&principal)?;

    // Pre-check for a friendlier message; the unique index still backstops
    // the race window.
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let member = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: UserRole::Member,
            managed_by: Some(admin_id),
        },
    )
    .await?;

    tracing::info!(admin_id = %admin_id, member_id = %member.id, "Member created");

    let body = ApiSuccess::with_message(UserView::from(&member), "Member created successfully");

    Ok((StatusCode::CREATED, body))
}

/// Lists the calling admin's members
///
/// Restricted to members whose `managed_by` equals the caller's id; another
/// admin's roster never appears.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiSuccess<Vec<UserView>>>> {
    let admin_id = require_admin(&principal)?;

    let members = User::find_members_of(&state.db, admin_id).await?;
    let views = members.iter().map(UserView::from).collect();

    Ok(ApiSuccess::data(views))
}

/// Deletes a member and everything assigned to it
///
/// The cascade is two sequential single-record-scoped deletions (all of the
/// member's tasks, then the member) with no multi-record transaction. Both
/// legs are idempotent, so a retry after a partial failure converges.
///
/// # Errors
///
/// - `400`: Malformed member id
/// - `403`: Caller is not an admin
/// - `404`: Member absent or on another admin's roster
/// - `500`: Server error
pub async fn delete_member(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(member_id): Path<String>,
) -> ApiResult<Json<ApiSuccess<DeleteMemberResponse>>> {
    let member_id = Uuid::parse_str(&member_id)
        .map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))?;

    let admin_id = require_admin(&principal)?;

    let member = User::find_by_id(&state.db, member_id).await?;
    ensure_manages_member(admin_id, member.as_ref())?;

    let deleted_tasks = Task::delete_all_assigned_to(&state.db, member_id).await?;
    User::delete(&state.db, member_id).await?;

    tracing::info!(
        admin_id = %admin_id,
        member_id = %member_id,
        deleted_tasks,
        "Member deleted with task cascade"
    );

    Ok(ApiSuccess::with_message(
        DeleteMemberResponse { deleted_tasks },
        "Member deleted successfully",
    ))
}
