/// Roster-ownership authorization
///
/// Pure decision functions: every check takes the [`Principal`] plus whatever
/// target records the handler already fetched, and returns allow or a typed
/// denial. No I/O happens in here, which is what makes the whole permission
/// model unit-testable without a database.
///
/// # Permission Model
///
/// - The first admin self-registers; after that, admin registration is closed.
/// - An admin owns the members it created (`managed_by`) and, through them,
///   their tasks. Every read and write an admin performs is checked against
///   that roster boundary, not just creation; a guessed id outside the
///   roster is denied like it doesn't exist.
/// - A member owns exactly its own assigned tasks; completion requires being
///   the current assignee.
///
/// Denials against resources outside the caller's roster are not-found-shaped
/// rather than forbidden-shaped, so an admin cannot probe for the existence
/// of another admin's members.
///
/// # Example
///
/// ```
/// use taskroster_shared::auth::authorization::require_admin;
/// use taskroster_shared::auth::middleware::Principal;
/// use uuid::Uuid;
///
/// let principal = Principal::Admin { id: Uuid::new_v4() };
/// let admin_id = require_admin(&principal).unwrap();
/// assert_eq!(admin_id, principal.id());
/// ```

use uuid::Uuid;

use super::middleware::Principal;
use crate::models::task::Task;
use crate::models::user::{User, UserRole};

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Operation is admin-only
    #[error("Admin access required")]
    AdminRequired,

    /// Operation is member-only
    #[error("Member access required")]
    MemberRequired,

    /// Bootstrap registration after an admin already exists
    #[error("Admin already exists")]
    AdminAlreadyExists,

    /// Target member is absent or belongs to another admin's roster
    ///
    /// Deliberately indistinguishable from a missing record.
    #[error("Member not found under your account")]
    MemberNotInRoster,

    /// Assignment target is absent or not a member account
    #[error("Assigned user must be a valid member")]
    AssigneeNotMember,

    /// Assignment target belongs to another admin's roster
    #[error("You can only assign tasks to your own members")]
    AssigneeOutsideRoster,

    /// Task's current assignee belongs to another admin's roster
    #[error("You can only update tasks of your own members")]
    UpdateOutsideRoster,

    /// Task's current assignee belongs to another admin's roster
    #[error("You can only delete tasks of your own members")]
    DeleteOutsideRoster,

    /// Member tried to complete a task assigned to someone else
    #[error("You can only complete your own tasks")]
    NotTaskAssignee,
}

impl AccessError {
    /// Whether this denial should surface as not-found rather than forbidden
    ///
    /// Not-found semantics avoid confirming that a resource exists outside
    /// the caller's roster.
    pub fn is_not_found_shaped(&self) -> bool {
        matches!(
            self,
            AccessError::MemberNotInRoster | AccessError::AssigneeNotMember
        )
    }
}

/// True when `user` is a member on `admin_id`'s roster
fn on_roster(admin_id: Uuid, user: &User) -> bool {
    user.role == UserRole::Member && user.managed_by == Some(admin_id)
}

/// Requires the principal to be an admin, returning its id
pub fn require_admin(principal: &Principal) -> Result<Uuid, AccessError> {
    match principal {
        Principal::Admin { id } => Ok(*id),
        Principal::Member { .. } => Err(AccessError::AdminRequired),
    }
}

/// Requires the principal to be a member, returning its id
pub fn require_member(principal: &Principal) -> Result<Uuid, AccessError> {
    match principal {
        Principal::Member { id } => Ok(*id),
        Principal::Admin { .. } => Err(AccessError::MemberRequired),
    }
}

/// Gates the one-time bootstrap admin registration
///
/// The first admin registers without a principal; once any admin exists the
/// door is closed.
pub fn ensure_first_admin(admin_exists: bool) -> Result<(), AccessError> {
    if admin_exists {
        return Err(AccessError::AdminAlreadyExists);
    }

    Ok(())
}

/// Checks that `target` is a member on the admin's own roster
///
/// Used for member deletion and the tasks-by-member listing. A missing
/// record, a non-member account, and another admin's member all fail the
/// same way.
pub fn ensure_manages_member(admin_id: Uuid, target: Option<&User>) -> Result<(), AccessError> {
    match target {
        Some(user) if on_roster(admin_id, user) => Ok(()),
        _ => Err(AccessError::MemberNotInRoster),
    }
}

/// Checks that a task may be assigned to `assignee`
///
/// The assignee must exist, be a member account, and sit on the calling
/// admin's roster. Applied at task creation and re-applied whenever an
/// update changes the assignee, so the assignee/creator ownership invariant
/// survives reassignment.
pub fn ensure_assignable(admin_id: Uuid, assignee: Option<&User>) -> Result<(), AccessError> {
    let user = match assignee {
        Some(user) if user.role == UserRole::Member => user,
        _ => return Err(AccessError::AssigneeNotMember),
    };

    if user.managed_by != Some(admin_id) {
        return Err(AccessError::AssigneeOutsideRoster);
    }

    Ok(())
}

/// Checks that the admin may update a task, given its current assignee
pub fn ensure_task_updatable(
    admin_id: Uuid,
    current_assignee: Option<&User>,
) -> Result<(), AccessError> {
    match current_assignee {
        Some(user) if on_roster(admin_id, user) => Ok(()),
        _ => Err(AccessError::UpdateOutsideRoster),
    }
}

/// Checks that the admin may delete a task, given its current assignee
pub fn ensure_task_deletable(
    admin_id: Uuid,
    current_assignee: Option<&User>,
) -> Result<(), AccessError> {
    match current_assignee {
        Some(user) if on_roster(admin_id, user) => Ok(()),
        _ => Err(AccessError::DeleteOutsideRoster),
    }
}

/// Checks that the member is the task's current assignee
///
/// Completion ownership is self, not delegated: not even the managing admin
/// passes this check.
pub fn ensure_own_task(member_id: Uuid, task: &Task) -> Result<(), AccessError> {
    if task.assigned_to != member_id {
        return Err(AccessError::NotTaskAssignee);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use chrono::Utc;

    fn admin(id: Uuid) -> User {
        User {
            id,
            name: "Admin".to_string(),
            email: format!("{}@example.com", id),
            password_hash: "hash".to_string(),
            role: UserRole::Admin,
            managed_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn member_of(admin_id: Uuid) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Member".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "hash".to_string(),
            role: UserRole::Member,
            managed_by: Some(admin_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn task_for(member: &User) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Draft report".to_string(),
            description: None,
            assigned_to: member.id,
            created_by: member.managed_by.unwrap(),
            status: TaskStatus::Pending,
            completed_at: None,
            time_taken_ms: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_admin() {
        let id = Uuid::new_v4();
        assert_eq!(require_admin(&Principal::Admin { id }), Ok(id));
        assert_eq!(
            require_admin(&Principal::Member { id }),
            Err(AccessError::AdminRequired)
        );
    }

    #[test]
    fn test_require_member() {
        let id = Uuid::new_v4();
        assert_eq!(require_member(&Principal::Member { id }), Ok(id));
        assert_eq!(
            require_member(&Principal::Admin { id }),
            Err(AccessError::MemberRequired)
        );
    }

    #[test]
    fn test_ensure_first_admin() {
        assert_eq!(ensure_first_admin(false), Ok(()));
        assert_eq!(
            ensure_first_admin(true),
            Err(AccessError::AdminAlreadyExists)
        );
    }

    #[test]
    fn test_ensure_manages_member_own_roster() {
        let a = Uuid::new_v4();
        let m = member_of(a);

        assert_eq!(ensure_manages_member(a, Some(&m)), Ok(()));
    }

    #[test]
    fn test_ensure_manages_member_denials_are_uniform() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let foreign = member_of(b);
        let other_admin = admin(b);

        // Missing record, foreign member, and a non-member account all yield
        // the same not-found-shaped denial.
        assert_eq!(
            ensure_manages_member(a, None),
            Err(AccessError::MemberNotInRoster)
        );
        assert_eq!(
            ensure_manages_member(a, Some(&foreign)),
            Err(AccessError::MemberNotInRoster)
        );
        assert_eq!(
            ensure_manages_member(a, Some(&other_admin)),
            Err(AccessError::MemberNotInRoster)
        );
    }

    #[test]
    fn test_ensure_assignable() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let own = member_of(a);
        let foreign = member_of(b);
        let some_admin = admin(b);

        assert_eq!(ensure_assignable(a, Some(&own)), Ok(()));
        assert_eq!(
            ensure_assignable(a, Some(&foreign)),
            Err(AccessError::AssigneeOutsideRoster)
        );
        assert_eq!(
            ensure_assignable(a, None),
            Err(AccessError::AssigneeNotMember)
        );
        // Tasks are never assigned to admin accounts
        assert_eq!(
            ensure_assignable(a, Some(&some_admin)),
            Err(AccessError::AssigneeNotMember)
        );
    }

    #[test]
    fn test_ensure_task_updatable_and_deletable() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let own = member_of(a);
        let foreign = member_of(b);

        assert_eq!(ensure_task_updatable(a, Some(&own)), Ok(()));
        assert_eq!(ensure_task_deletable(a, Some(&own)), Ok(()));

        assert_eq!(
            ensure_task_updatable(a, Some(&foreign)),
            Err(AccessError::UpdateOutsideRoster)
        );
        assert_eq!(
            ensure_task_deletable(a, Some(&foreign)),
            Err(AccessError::DeleteOutsideRoster)
        );

        // Dangling assignee reads as outside the roster too
        assert_eq!(
            ensure_task_updatable(a, None),
            Err(AccessError::UpdateOutsideRoster)
        );
        assert_eq!(
            ensure_task_deletable(a, None),
            Err(AccessError::DeleteOutsideRoster)
        );
    }

    #[test]
    fn test_ensure_own_task() {
        let a = Uuid::new_v4();
        let m = member_of(a);
        let other = member_of(a);
        let task = task_for(&m);

        assert_eq!(ensure_own_task(m.id, &task), Ok(()));
        assert_eq!(
            ensure_own_task(other.id, &task),
            Err(AccessError::NotTaskAssignee)
        );
    }

    /// Admin A must be denied on every member- and task-scoped operation
    /// against admin B's roster: deletion, tasks-by-member, assignment,
    /// update, delete.
    #[test]
    fn test_cross_roster_denied_for_every_operation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let b_member = member_of(b);

        assert!(ensure_manages_member(a, Some(&b_member)).is_err());
        assert!(ensure_assignable(a, Some(&b_member)).is_err());
        assert!(ensure_task_updatable(a, Some(&b_member)).is_err());
        assert!(ensure_task_deletable(a, Some(&b_member)).is_err());

        // And B itself passes every one of them
        assert!(ensure_manages_member(b, Some(&b_member)).is_ok());
        assert!(ensure_assignable(b, Some(&b_member)).is_ok());
        assert!(ensure_task_updatable(b, Some(&b_member)).is_ok());
        assert!(ensure_task_deletable(b, Some(&b_member)).is_ok());
    }

    #[test]
    fn test_not_found_shaping() {
        assert!(AccessError::MemberNotInRoster.is_not_found_shaped());
        assert!(AccessError::AssigneeNotMember.is_not_found_shaped());

        assert!(!AccessError::AdminRequired.is_not_found_shaped());
        assert!(!AccessError::AssigneeOutsideRoster.is_not_found_shaped());
        assert!(!AccessError::UpdateOutsideRoster.is_not_found_shaped());
        assert!(!AccessError::DeleteOutsideRoster.is_not_found_shaped());
        assert!(!AccessError::NotTaskAssignee.is_not_found_shaped());
        assert!(!AccessError::AdminAlreadyExists.is_not_found_shaped());
    }

    #[test]
    fn test_denial_messages() {
        assert_eq!(
            AccessError::AdminAlreadyExists.to_string(),
            "Admin already exists"
        );
        assert_eq!(
            AccessError::MemberNotInRoster.to_string(),
            "Member not found under your account"
        );
        assert_eq!(
            AccessError::AssigneeOutsideRoster.to_string(),
            "You can only assign tasks to your own members"
        );
        assert_eq!(
            AccessError::NotTaskAssignee.to_string(),
            "You can only complete your own tasks"
        );
    }
}
