//! Project use-cases, including membership management.
//!
//! # Invariants
//! - A scoped (employee) update is only allowed for the project's manager,
//!   and may not move the project to another client or manager.
//! - Membership changes require unscoped access and are audited against the
//!   project id.

use crate::auth::{authorize, AccessError, Action, Principal, Resource, Scope};
use crate::model::audit::{AuditAction, AuditLog};
use crate::model::project::{NewProject, NewProjectMember, Project, ProjectMember, ProjectPatch};
use crate::model::RecordId;
use crate::query::{ListQuery, Page};
use crate::repo::audit_repo::AuditRepository;
use crate::repo::project_repo::{ProjectFilter, ProjectRepository};
use crate::service::{require_unscoped, snapshot, RecordService, ServiceError, ServiceResult};

pub struct ProjectService<R, A> {
    records: RecordService<Project, R, A>,
    audit: A,
}

impl<R, A> ProjectService<R, A>
where
    R: ProjectRepository,
    A: AuditRepository + Clone,
{
    pub fn new(repo: R, audit: A) -> Self {
        Self {
            records: RecordService::new(repo, audit.clone()),
            audit,
        }
    }

    pub fn list(
        &self,
        principal: &Principal,
        query: &ListQuery<ProjectFilter>,
    ) -> ServiceResult<Page<Project>> {
        self.records.list(principal, query)
    }

    pub fn get(&self, principal: &Principal, id: RecordId) -> ServiceResult<Project> {
        self.records.get(principal, id)
    }

    pub fn create(&self, principal: &Principal, input: NewProject) -> ServiceResult<Project> {
        self.records.create(principal, input)
    }

    pub fn update(
        &self,
        principal: &Principal,
        id: RecordId,
        patch: ProjectPatch,
    ) -> ServiceResult<Project> {
        let scope = authorize(principal, Resource::Project, Action::Update)?;
        let mut project = self.records.load(id)?;

        match scope {
            Scope::All => {}
            Scope::Own(employee_id) if project.is_managed_by(employee_id) => {
                if patch.client_id.is_some() {
                    return Err(restricted("client_id"));
                }
                if patch.manager_id.is_some() {
                    return Err(restricted("manager_id"));
                }
            }
            Scope::Own(_) | Scope::Empty => {
                return Err(AccessError::OutOfScope {
                    resource: Resource::Project,
                    id,
                }
                .into());
            }
        }

        project.apply(patch);
        self.records.save_update(principal, project)
    }

    pub fn delete(&self, principal: &Principal, id: RecordId) -> ServiceResult<Project> {
        self.records.delete(principal, id)
    }

    /// Lists members of a project visible to `principal`.
    pub fn list_members(
        &self,
        principal: &Principal,
        project_id: RecordId,
    ) -> ServiceResult<Vec<ProjectMember>> {
        let scope = authorize(principal, Resource::ProjectMember, Action::Read)?;
        self.records.load_in_scope(project_id, &scope)?;
        Ok(self.records.repo().list_members(project_id)?)
    }

    pub fn add_member(
        &self,
        principal: &Principal,
        project_id: RecordId,
        input: NewProjectMember,
    ) -> ServiceResult<ProjectMember> {
        require_unscoped(principal, Resource::ProjectMember, Action::Create)?;
        let member = self
            .records
            .repo()
            .add_member(project_id, input.employee_id, input.role)?;
        self.audit_member(principal, AuditAction::Create, &member)?;
        Ok(member)
    }

    pub fn remove_member(
        &self,
        principal: &Principal,
        project_id: RecordId,
        employee_id: RecordId,
    ) -> ServiceResult<ProjectMember> {
        require_unscoped(principal, Resource::ProjectMember, Action::Delete)?;
        let member = self
            .records
            .repo()
            .remove_member(project_id, employee_id)?;
        self.audit_member(principal, AuditAction::Delete, &member)?;
        Ok(member)
    }

    fn audit_member(
        &self,
        principal: &Principal,
        action: AuditAction,
        member: &ProjectMember,
    ) -> ServiceResult<()> {
        let entry = AuditLog::new(
            Some(principal.user_id),
            action,
            Resource::ProjectMember.table(),
            member.project_id,
            Some(snapshot(member)?),
        );
        self.audit.record(&entry)?;
        Ok(())
    }
}

fn restricted(field: &'static str) -> ServiceError {
    AccessError::RestrictedField {
        resource: Resource::Project,
        field,
    }
    .into()
}
