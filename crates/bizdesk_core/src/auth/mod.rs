//! Principals and the role-based, row-scoped access policy.
//!
//! # Responsibility
//! - Describe who is acting (`Principal`).
//! - Decide whether a role may perform an action on a resource, and if so
//!   over which rows (`Scope`).
//!
//! # Invariants
//! - `admin` is never scoped.
//! - `employee` access is always scoped to its linked employee record; a
//!   user without one gets `Scope::Empty`.
//! - The policy is a pure function of `(role, employee_id, resource, action)`.

use crate::model::user::Role;
use crate::model::RecordId;
use thiserror::Error;

pub mod resource;
pub mod token;

pub use resource::{Action, Resource};

/// Authenticated actor of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: RecordId,
    pub role: Role,
    /// Employee record linked to the user, if any.
    pub employee_id: Option<RecordId>,
}

impl Principal {
    pub fn new(user_id: RecordId, role: Role, employee_id: Option<RecordId>) -> Self {
        Self {
            user_id,
            role,
            employee_id,
        }
    }
}

/// Rows an authorized action may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every active row.
    All,
    /// Rows related to this employee. The relation is resource-specific:
    /// membership or management for projects, authorship for
    /// communication logs, identity for employees.
    Own(RecordId),
    /// No rows at all.
    Empty,
}

impl Scope {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("role `{role}` may not {action} {resource} records")]
    Forbidden {
        role: Role,
        resource: Resource,
        action: Action,
    },
    #[error("{resource} {id} is outside the caller's access scope")]
    OutOfScope { resource: Resource, id: RecordId },
    #[error("`{field}` of {resource} records requires unscoped access")]
    RestrictedField {
        resource: Resource,
        field: &'static str,
    },
}

/// Decides whether `principal` may perform `action` on `resource`.
///
/// Returns the row scope the action is limited to. Callers must still apply
/// the scope: reads filter by it, writes verify the target row against it.
pub fn authorize(
    principal: &Principal,
    resource: Resource,
    action: Action,
) -> Result<Scope, AccessError> {
    let allowed = match principal.role {
        Role::Admin => Some(Scope::All),
        Role::Manager => manager_scope(resource, action),
        Role::Employee => employee_scope(principal, resource, action),
    };

    allowed.ok_or(AccessError::Forbidden {
        role: principal.role,
        resource,
        action,
    })
}

fn manager_scope(resource: Resource, action: Action) -> Option<Scope> {
    match (resource, action) {
        (Resource::AuditLog, _) => None,
        (Resource::User, Action::Read) => Some(Scope::All),
        (Resource::User, _) => None,
        (Resource::Employee, Action::Delete) => None,
        _ => Some(Scope::All),
    }
}

fn employee_scope(principal: &Principal, resource: Resource, action: Action) -> Option<Scope> {
    let own = principal.employee_id.map_or(Scope::Empty, Scope::Own);
    match (resource, action) {
        (Resource::Project | Resource::Milestone | Resource::ProjectMember, Action::Read) => {
            Some(own)
        }
        (Resource::Project, Action::Update) => Some(own),
        (Resource::Milestone, Action::Create | Action::Update) => Some(own),
        (Resource::Communication, Action::Read | Action::Create | Action::Update) => Some(own),
        (Resource::Employee, Action::Read) => Some(own),
        (Resource::User, Action::Read) => Some(Scope::Own(principal.user_id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{authorize, AccessError, Action, Principal, Resource, Scope};
    use crate::model::user::Role;
    use uuid::Uuid;

    fn principal(role: Role, employee_id: Option<Uuid>) -> Principal {
        Principal::new(Uuid::new_v4(), role, employee_id)
    }

    #[test]
    fn admin_may_do_everything_unscoped() {
        let admin = principal(Role::Admin, None);
        for resource in [Resource::AuditLog, Resource::User, Resource::Payment] {
            for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
                assert_eq!(authorize(&admin, resource, action), Ok(Scope::All));
            }
        }
    }

    #[test]
    fn manager_is_denied_audit_log_and_user_writes() {
        let manager = principal(Role::Manager, None);
        assert_eq!(
            authorize(&manager, Resource::Client, Action::Delete),
            Ok(Scope::All)
        );
        assert!(authorize(&manager, Resource::AuditLog, Action::Read).is_err());
        assert!(authorize(&manager, Resource::User, Action::Create).is_err());
        assert!(authorize(&manager, Resource::Employee, Action::Delete).is_err());
        assert_eq!(
            authorize(&manager, Resource::Employee, Action::Update),
            Ok(Scope::All)
        );
    }

    #[test]
    fn employee_reads_are_scoped_to_linked_employee() {
        let employee_id = Uuid::new_v4();
        let employee = principal(Role::Employee, Some(employee_id));
        assert_eq!(
            authorize(&employee, Resource::Project, Action::Read),
            Ok(Scope::Own(employee_id))
        );
        assert_eq!(
            authorize(&employee, Resource::Milestone, Action::Update),
            Ok(Scope::Own(employee_id))
        );
        assert_eq!(
            authorize(&employee, Resource::Employee, Action::Read),
            Ok(Scope::Own(employee_id))
        );
    }

    #[test]
    fn employee_without_link_gets_empty_scope() {
        let employee = principal(Role::Employee, None);
        assert_eq!(
            authorize(&employee, Resource::Project, Action::Read),
            Ok(Scope::Empty)
        );
    }

    #[test]
    fn employee_is_forbidden_from_finance_and_deletes() {
        let employee = principal(Role::Employee, Some(Uuid::new_v4()));
        let err = authorize(&employee, Resource::Payment, Action::Read).unwrap_err();
        assert_eq!(
            err,
            AccessError::Forbidden {
                role: Role::Employee,
                resource: Resource::Payment,
                action: Action::Read,
            }
        );
        assert!(authorize(&employee, Resource::Client, Action::Read).is_err());
        assert!(authorize(&employee, Resource::Project, Action::Create).is_err());
        assert!(authorize(&employee, Resource::Milestone, Action::Delete).is_err());
        assert!(authorize(&employee, Resource::AuditLog, Action::Read).is_err());
    }
}
