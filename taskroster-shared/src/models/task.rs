/// Task model and database operations
///
/// This module provides the Task model: work items an admin assigns to one of
/// their members. A task's `created_by` is the admin that owns both the task
/// and its assignee; `assigned_to` must always resolve to a member whose
/// `managed_by` equals `created_by` (enforced by the service layer at creation
/// and on every reassignment).
///
/// # State Machine
///
/// ```text
/// pending → completed
/// ```
///
/// The only path to `completed` is [`Task::complete_by_id`], which atomically
/// stamps `completed_at` and `time_taken_ms` exactly once. There is no
/// transition back to `pending`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     assigned_to UUID NOT NULL,
///     created_by UUID NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     completed_at TIMESTAMPTZ,
///     time_taken_ms BIGINT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Assigned, not yet done
    Pending,

    /// Done; `completed_at` and `time_taken_ms` are set
    Completed,
}

impl TaskStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    /// Checks if status is terminal
    ///
    /// `completed` is terminal: no operation transitions a task back to
    /// `pending`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title (non-empty)
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// The member this task is assigned to
    pub assigned_to: Uuid,

    /// The admin who created the task
    ///
    /// Always equals the assignee's `managed_by`.
    pub created_by: Uuid,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// When the task was completed (None while pending), set exactly once
    pub completed_at: Option<DateTime<Utc>>,

    /// Milliseconds from creation to completion, set alongside `completed_at`
    pub time_taken_ms: Option<i64>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Assignee (must be a member of the creating admin's roster)
    pub assigned_to: Uuid,

    /// Creating admin
    pub created_by: Uuid,
}

/// Input for partially updating a task
///
/// Only non-None fields are written. `completed_at` and `time_taken_ms` are
/// deliberately absent: they are set exactly once by [`Task::complete_by_id`]
/// and never through generic update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New assignee (ownership is re-checked by the service layer)
    pub assigned_to: Option<Uuid>,
}

/// Task list entry for admin views, with assignee and creator expanded to
/// `{id, name, email}` summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    /// Task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Assignee summary
    pub assigned_to: UserSummary,

    /// Creating admin summary
    pub created_by: UserSummary,

    /// Current status
    pub status: TaskStatus,

    /// Completion timestamp, if completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Creation-to-completion duration in milliseconds, if completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_ms: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    /// Shapes a task for an admin list view
    pub fn new(task: &Task, assigned_to: UserSummary, created_by: UserSummary) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            assigned_to,
            created_by,
            status: task.status,
            completed_at: task.completed_at,
            time_taken_ms: task.time_taken_ms,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl Task {
    /// Creates a new task in pending status
    ///
    /// The service layer has already verified that `assigned_to` resolves to
    /// a member of `created_by`'s roster.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, assigned_to, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, assigned_to, created_by, status,
                      completed_at, time_taken_ms, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, assigned_to, created_by, status,
                   completed_at, time_taken_ms, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks assigned to a single member
    pub async fn list_assigned_to(
        pool: &PgPool,
        member_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, assigned_to, created_by, status,
                   completed_at, time_taken_ms, created_at, updated_at
            FROM tasks
            WHERE assigned_to = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks assigned to any of the given members
    ///
    /// The admin all-tasks view: the caller resolves its member set first and
    /// tasks are filtered by membership, so another admin's tasks never appear
    /// regardless of what ids exist in the table.
    pub async fn list_assigned_to_any(
        pool: &PgPool,
        member_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, assigned_to, created_by, status,
                   completed_at, time_taken_ms, created_at, updated_at
            FROM tasks
            WHERE assigned_to = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(member_ids.to_vec())
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Partially updates a task
    ///
    /// Only the fields present in `data` are written; `updated_at` is always
    /// refreshed. Returns None if the task doesn't exist. Status is written
    /// as-is; the completion stamp fields are only reachable through
    /// [`Task::complete_by_id`].
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, assigned_to, created_by, \
             status, completed_at, time_taken_ms, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Completes a task: the ONLY pending → completed path
    ///
    /// A single guarded UPDATE sets status, `completed_at = NOW()` and
    /// `time_taken_ms = completed_at - created_at` together, so the stamp is
    /// written exactly once. The `status = 'pending'` guard makes two
    /// concurrent completions resolve to exactly one winner; the loser gets
    /// None back (row exists but is no longer pending).
    pub async fn complete_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'completed',
                completed_at = NOW(),
                time_taken_ms = FLOOR(EXTRACT(EPOCH FROM (NOW() - created_at)) * 1000)::BIGINT,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, title, description, assigned_to, created_by, status,
                      completed_at, time_taken_ms, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task assigned to the given member
    ///
    /// First leg of the member-deletion cascade. Idempotent: deleting an
    /// empty set is a no-op, so a retried cascade converges. Returns the
    /// number of tasks removed.
    pub async fn delete_all_assigned_to(
        pool: &PgPool,
        member_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE assigned_to = $1")
            .bind(member_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
