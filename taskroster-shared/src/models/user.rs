/// User model and database operations
///
/// This module provides the User model and CRUD operations for admin and
/// member accounts. Every member is owned by exactly one admin: the admin who
/// created it, recorded in `managed_by` at creation time and never changed
/// afterwards. Admins have `managed_by = NULL`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     managed_by UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
///
/// CREATE UNIQUE INDEX users_email_lower_idx ON users (LOWER(email));
/// ```
///
/// # Example
///
/// ```no_run
/// use taskroster_shared::models::user::{CreateUser, User, UserRole};
/// use taskroster_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let admin = User::create(&pool, CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Admin,
///     managed_by: None,
/// }).await?;
///
/// let roster = User::find_members_of(&pool, admin.id).await?;
/// assert!(roster.is_empty());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Manages a roster of members and their tasks
    Admin,

    /// Works the tasks assigned by their managing admin
    Member,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }
}

/// User model representing an admin or member account
///
/// `password_hash` is write-only outside credential verification: response
/// shaping goes through [`UserView`] / [`UserSummary`], which carry no
/// credential material.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name (non-empty)
    pub name: String,

    /// Email address, stored normalized (trimmed, lower-cased)
    ///
    /// Unique across all users, case-insensitively
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never serialized to clients; see [`UserView`]
    pub password_hash: String,

    /// Account role
    pub role: UserRole,

    /// The admin who created this member (None for admins)
    ///
    /// Set once at creation and never changed: a member is never re-parented.
    pub managed_by: Option<Uuid>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (normalized before storage)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Account role
    pub role: UserRole,

    /// Managing admin id; required for members, None for admins
    pub managed_by: Option<Uuid>,
}

/// Client-facing view of a user
///
/// The explicit shaping step that strips credential material before
/// serialization. Everything that leaves the API goes through this or
/// [`UserSummary`], never through [`User`] itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Account role
    pub role: UserRole,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Compact user reference embedded in task list views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Normalizes an email address for storage and comparison
///
/// Trims surrounding whitespace and lower-cases, so that `" A@X.com "` and
/// `"a@x.com"` refer to the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// The email is normalized before storage. Uniqueness is enforced by the
    /// `users_email_lower_idx` index; a clash surfaces as a database error
    /// with that constraint name.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role, managed_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, role, managed_by,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.name)
        .bind(normalize_email(&data.email))
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.managed_by)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, managed_by,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Lookup is case-insensitive: the argument is normalized and compared
    /// against the normalized stored value. The returned model includes the
    /// password hash for credential verification; strip it with [`UserView`]
    /// before the result leaves the service.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, managed_by,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists the members managed by the given admin
    ///
    /// Never returns members of another admin: the `managed_by` filter is the
    /// roster boundary for every member-scoped read.
    pub async fn find_members_of(pool: &PgPool, admin_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, managed_by,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE role = 'member' AND managed_by = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(admin_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Checks whether any admin account exists
    ///
    /// Gates the one-time bootstrap registration: the first admin self-registers,
    /// every later attempt is rejected.
    pub async fn admin_exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(pool)
                .await?;

        Ok(count > 0)
    }

    /// Updates the last login timestamp for a user
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    ///
    /// Returns true if a row was deleted. Deleting an already-deleted user is
    /// a no-op, which keeps the member-deletion cascade retry-safe.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Member.as_str(), "member");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("A@X.com"), "a@x.com");
        assert_eq!(normalize_email("  bob@example.com  "), "bob@example.com");
        assert_eq!(normalize_email("MiXeD@CaSe.Org"), "mixed@case.org");
    }

    #[test]
    fn test_normalized_emails_collide_case_insensitively() {
        assert_eq!(normalize_email("A@x.com"), normalize_email("a@X.COM"));
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::Member,
            managed_by: Some(Uuid::new_v4()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_user_view_strips_password_hash() {
        let user = sample_user();
        let view = UserView::from(&user);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["role"], "member");
    }

    #[test]
    fn test_user_summary_strips_role_and_hash() {
        let user = sample_user();
        let summary = UserSummary::from(&user);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("role").is_none());
        assert_eq!(json["name"], "Test User");
    }
}
