/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, refresh, and self profile
/// - `members`: Roster management (admin only)
/// - `tasks`: Task lifecycle for admins and members

pub mod auth;
pub mod health;
pub mod members;
pub mod tasks;
