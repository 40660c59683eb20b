//! Read access to the audit trail.

use crate::auth::{authorize, Action, Principal, Resource};
use crate::model::audit::AuditLog;
use crate::query::{ListQuery, Page};
use crate::repo::audit_repo::{AuditFilter, AuditRepository};
use crate::service::ServiceResult;

pub struct AuditService<A> {
    audit: A,
}

impl<A: AuditRepository> AuditService<A> {
    pub fn new(audit: A) -> Self {
        Self { audit }
    }

    /// Lists audit rows, newest first by default. Admin only.
    pub fn list(
        &self,
        principal: &Principal,
        query: &ListQuery<AuditFilter>,
    ) -> ServiceResult<Page<AuditLog>> {
        authorize(principal, Resource::AuditLog, Action::Read)?;
        Ok(self.audit.list(query)?)
    }
}
