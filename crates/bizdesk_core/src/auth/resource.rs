//! Resource and action identifiers used by the access policy.

use std::fmt::{Display, Formatter};

/// Protected resource kinds. One per business entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    Client,
    Company,
    Project,
    ProjectMember,
    Milestone,
    Employee,
    Payment,
    Communication,
    User,
    AuditLog,
}

impl Resource {
    /// Stable singular name used in routes, errors and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Company => "company",
            Self::Project => "project",
            Self::ProjectMember => "project_member",
            Self::Milestone => "milestone",
            Self::Employee => "employee",
            Self::Payment => "payment",
            Self::Communication => "communication",
            Self::User => "user",
            Self::AuditLog => "audit_log",
        }
    }

    /// Backing table name; also the `entity` column of audit rows.
    pub fn table(self) -> &'static str {
        match self {
            Self::Client => "clients",
            Self::Company => "companies",
            Self::Project => "projects",
            Self::ProjectMember => "project_members",
            Self::Milestone => "milestones",
            Self::Employee => "employees",
            Self::Payment => "payments",
            Self::Communication => "communication_logs",
            Self::User => "users",
            Self::AuditLog => "audit_logs",
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn is_write(self) -> bool {
        !matches!(self, Self::Read)
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Resource};

    #[test]
    fn audit_entity_names_match_tables() {
        assert_eq!(Resource::Communication.table(), "communication_logs");
        assert_eq!(Resource::Company.table(), "companies");
        assert_eq!(Resource::AuditLog.as_str(), "audit_log");
    }

    #[test]
    fn only_read_is_not_a_write() {
        assert!(!Action::Read.is_write());
        assert!(Action::Create.is_write());
        assert!(Action::Delete.is_write());
    }
}
