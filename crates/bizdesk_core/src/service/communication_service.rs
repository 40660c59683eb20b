//! Communication log use-cases.
//!
//! Employees log conversations as themselves: a scoped create always records
//! the caller's employee id, and scoped updates are limited to the author.

use crate::auth::{authorize, AccessError, Action, Principal, Resource, Scope};
use crate::model::communication::{CommunicationLog, CommunicationLogPatch, NewCommunicationLog};
use crate::model::RecordId;
use crate::query::{ListQuery, Page};
use crate::repo::audit_repo::AuditRepository;
use crate::repo::communication_repo::CommunicationFilter;
use crate::repo::RecordRepository;
use crate::service::{RecordService, ServiceResult};

pub struct CommunicationService<R, A> {
    records: RecordService<CommunicationLog, R, A>,
}

impl<R, A> CommunicationService<R, A>
where
    R: RecordRepository<CommunicationLog, Filter = CommunicationFilter>,
    A: AuditRepository,
{
    pub fn new(repo: R, audit: A) -> Self {
        Self {
            records: RecordService::new(repo, audit),
        }
    }

    pub fn list(
        &self,
        principal: &Principal,
        query: &ListQuery<CommunicationFilter>,
    ) -> ServiceResult<Page<CommunicationLog>> {
        self.records.list(principal, query)
    }

    pub fn get(&self, principal: &Principal, id: RecordId) -> ServiceResult<CommunicationLog> {
        self.records.get(principal, id)
    }

    pub fn create(
        &self,
        principal: &Principal,
        mut input: NewCommunicationLog,
    ) -> ServiceResult<CommunicationLog> {
        match authorize(principal, Resource::Communication, Action::Create)? {
            Scope::All => {}
            Scope::Own(employee_id) => input.employee_id = Some(employee_id),
            Scope::Empty => {
                return Err(AccessError::Forbidden {
                    role: principal.role,
                    resource: Resource::Communication,
                    action: Action::Create,
                }
                .into());
            }
        }
        self.records
            .save_new(principal, CommunicationLog::from_new(input))
    }

    pub fn update(
        &self,
        principal: &Principal,
        id: RecordId,
        patch: CommunicationLogPatch,
    ) -> ServiceResult<CommunicationLog> {
        let scope = authorize(principal, Resource::Communication, Action::Update)?;
        let mut log = self.records.load(id)?;
        let allowed = match scope {
            Scope::All => true,
            Scope::Own(employee_id) => log.employee_id == Some(employee_id),
            Scope::Empty => false,
        };
        if !allowed {
            return Err(AccessError::OutOfScope {
                resource: Resource::Communication,
                id,
            }
            .into());
        }

        log.apply(patch);
        self.records.save_update(principal, log)
    }

    pub fn delete(&self, principal: &Principal, id: RecordId) -> ServiceResult<CommunicationLog> {
        self.records.delete(principal, id)
    }
}
