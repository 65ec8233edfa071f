/// Database models for TaskRoster
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Admin and member accounts, roster ownership
/// - `task`: Tasks assigned to members, with completion tracking

pub mod task;
pub mod user;
