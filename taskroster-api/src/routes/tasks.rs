/// Task endpoints
///
/// # Admin endpoints
///
/// - `POST   /api/tasks` - Create a task for an owned member
/// - `GET    /api/tasks/all` - List tasks across the caller's roster
/// - `GET    /api/tasks/user/:user_id` - List one owned member's tasks
/// - `PUT    /api/tasks/:id` - Partially update a task
/// - `DELETE /api/tasks/:id` - Delete a task
///
/// # Member endpoints
///
/// - `GET   /api/tasks/my` - List own assigned tasks
/// - `PATCH /api/tasks/:id/complete` - Complete an own pending task
///
/// Every handler follows the same order: shape validation, then role check,
/// then target fetch, then ownership check, then the mutation. Ownership is
/// re-checked on every operation, not just creation; a guessed task id
/// outside the caller's roster gets a denial, never data.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ApiSuccess},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use taskroster_shared::{
    auth::{
        authorization::{
            ensure_assignable, ensure_manages_member, ensure_own_task, ensure_task_deletable,
            ensure_task_updatable, require_admin, require_member,
        },
        middleware::Principal,
    },
    models::{
        task::{CreateTask, Task, TaskStatus, TaskView, UpdateTask},
        user::{User, UserSummary},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Assignee user id
    #[validate(length(min = 1, message = "assigned_to is required"))]
    pub assigned_to: String,
}

/// Update task request
///
/// All fields optional; only present fields are written. Completion stamps
/// are not accepted here: completion goes through the complete endpoint.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New assignee user id
    pub assigned_to: Option<String>,
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))
}

fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid task ID".to_string()))
}

/// Creates a task assigned to one of the caller's members
///
/// The assignee must resolve to an existing member on the caller's roster;
/// `created_by` is stamped with the caller's id, which keeps the
/// assignee/creator ownership invariant true from birth.
///
/// # Errors
///
/// - `400`: Malformed assignee id
/// - `422`: Validation failed
/// - `403`: Caller is not an admin, or assignee is on another roster
/// - `404`: Assignee absent or not a member account
/// - `500`: Server error
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiSuccess<Task>>)> {
    req.validate()?;
    let assigned_to = parse_user_id(&req.assigned_to)?;

    let admin_id = require_admin(&principal)?;

    let assignee = User::find_by_id(&state.db, assigned_to).await?;
    ensure_assignable(admin_id, assignee.as_ref())?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            assigned_to,
            created_by: admin_id,
        },
    )
    .await?;

    tracing::info!(
        admin_id = %admin_id,
        task_id = %task.id,
        assigned_to = %assigned_to,
        "Task created"
    );

    Ok((StatusCode::CREATED, ApiSuccess::data(task)))
}

/// Lists every task across the caller's roster
///
/// Resolves the caller's member set first, then filters tasks by membership,
/// so tasks owned by other admins never appear. Assignee and creator are
/// expanded to `{id, name, email}` summaries.
pub async fn get_all_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiSuccess<Vec<TaskView>>>> {
    let admin_id = require_admin(&principal)?;

    let admin = User::find_by_id(&state.db, admin_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;
    let admin_summary = UserSummary::from(&admin);

    let members = User::find_members_of(&state.db, admin_id).await?;
    let member_ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
    let summaries: HashMap<Uuid, UserSummary> = members
        .iter()
        .map(|m| (m.id, UserSummary::from(m)))
        .collect();

    let tasks = Task::list_assigned_to_any(&state.db, &member_ids).await?;

    let views = tasks
        .iter()
        .filter_map(|task| {
            summaries
                .get(&task.assigned_to)
                .map(|assignee| TaskView::new(task, assignee.clone(), admin_summary.clone()))
        })
        .collect();

    Ok(ApiSuccess::data(views))
}

/// Lists one owned member's tasks
///
/// # Errors
///
/// - `400`: Malformed member id
/// - `403`: Caller is not an admin
/// - `404`: Member absent or on another admin's roster
pub async fn get_tasks_by_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiSuccess<Vec<Task>>>> {
    let user_id = parse_user_id(&user_id)?;

    let admin_id = require_admin(&principal)?;

    let member = User::find_by_id(&state.db, user_id).await?;
    ensure_manages_member(admin_id, member.as_ref())?;

    let tasks = Task::list_assigned_to(&state.db, user_id).await?;

    Ok(ApiSuccess::data(tasks))
}

/// Partially updates a task
///
/// The task's current assignee must sit on the caller's roster. When the
/// update moves the task to a new assignee, the new assignee is re-validated
/// under the same ownership rule before anything is written, so reassignment
/// can never leak a task across rosters.
///
/// # Errors
///
/// - `400`: Malformed id
/// - `422`: Validation failed
/// - `403`: Caller is not an admin, current or new assignee outside roster
/// - `404`: Task absent, or new assignee absent / not a member
/// - `500`: Server error
pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiSuccess<Task>>> {
    req.validate()?;
    let task_id = parse_task_id(&task_id)?;

    let new_assignee_id = req
        .assigned_to
        .as_deref()
        .map(parse_user_id)
        .transpose()?;

    let admin_id = require_admin(&principal)?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let current_assignee = User::find_by_id(&state.db, task.assigned_to).await?;
    ensure_task_updatable(admin_id, current_assignee.as_ref())?;

    if let Some(new_id) = new_assignee_id {
        let new_assignee = User::find_by_id(&state.db, new_id).await?;
        ensure_assignable(admin_id, new_assignee.as_ref())?;
    }

    let updated = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            assigned_to: new_assignee_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(ApiSuccess::data(updated))
}

/// Deletes a task
///
/// # Errors
///
/// - `400`: Malformed task id
/// - `403`: Caller is not an admin, or task's assignee outside roster
/// - `404`: Task absent
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<ApiSuccess<()>>> {
    let task_id = parse_task_id(&task_id)?;

    let admin_id = require_admin(&principal)?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let current_assignee = User::find_by_id(&state.db, task.assigned_to).await?;
    ensure_task_deletable(admin_id, current_assignee.as_ref())?;

    Task::delete(&state.db, task_id).await?;

    tracing::info!(admin_id = %admin_id, task_id = %task_id, "Task deleted");

    Ok(ApiSuccess::message("Task deleted successfully"))
}

/// Lists the calling member's own tasks
pub async fn get_my_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiSuccess<Vec<Task>>>> {
    let member_id = require_member(&principal)?;

    let tasks = Task::list_assigned_to(&state.db, member_id).await?;

    Ok(ApiSuccess::data(tasks))
}

/// Completes one of the calling member's own pending tasks
///
/// Stamps `completed_at` and `time_taken_ms` exactly once via the guarded
/// store update. Two concurrent completions of the same task resolve to one
/// success and one "Task already completed"; the stamp is never written
/// twice.
///
/// # Errors
///
/// - `400`: Malformed task id
/// - `403`: Task is assigned to someone else
/// - `404`: Task absent
/// - `409`: Task already completed
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<ApiSuccess<Task>>> {
    let task_id = parse_task_id(&task_id)?;

    let member_id = require_member(&principal)?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    ensure_own_task(member_id, &task)?;

    if task.status == TaskStatus::Completed {
        return Err(ApiError::Conflict("Task already completed".to_string()));
    }

    // None here means another completion won the race between our fetch and
    // the guarded update.
    let completed = Task::complete_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Task already completed".to_string()))?;

    tracing::info!(
        member_id = %member_id,
        task_id = %task_id,
        time_taken_ms = completed.time_taken_ms,
        "Task completed"
    );

    Ok(ApiSuccess::data(completed))
}
