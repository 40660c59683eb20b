//! Milestone use-cases.
//!
//! Employees may create and update milestones of projects they manage;
//! deletes require unscoped access. Completion stamping lives on the model
//! (`Milestone::set_status`) and runs through `apply`.

use crate::auth::{authorize, AccessError, Action, Principal, Resource, Scope};
use crate::model::milestone::{Milestone, MilestonePatch, NewMilestone};
use crate::model::RecordId;
use crate::query::{ListQuery, Page};
use crate::repo::audit_repo::AuditRepository;
use crate::repo::milestone_repo::MilestoneFilter;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::RecordRepository;
use crate::service::{RecordService, ServiceError, ServiceResult};

pub struct MilestoneService<R, P, A> {
    records: RecordService<Milestone, R, A>,
    projects: P,
}

impl<R, P, A> MilestoneService<R, P, A>
where
    R: RecordRepository<Milestone, Filter = MilestoneFilter>,
    P: ProjectRepository,
    A: AuditRepository,
{
    pub fn new(repo: R, projects: P, audit: A) -> Self {
        Self {
            records: RecordService::new(repo, audit),
            projects,
        }
    }

    pub fn list(
        &self,
        principal: &Principal,
        query: &ListQuery<MilestoneFilter>,
    ) -> ServiceResult<Page<Milestone>> {
        self.records.list(principal, query)
    }

    pub fn get(&self, principal: &Principal, id: RecordId) -> ServiceResult<Milestone> {
        self.records.get(principal, id)
    }

    pub fn create(&self, principal: &Principal, input: NewMilestone) -> ServiceResult<Milestone> {
        let scope = authorize(principal, Resource::Milestone, Action::Create)?;
        let project_id = input.project_id;
        if self.projects.get(project_id)?.is_none() {
            return Err(ServiceError::InvalidReference(format!(
                "project {project_id} does not exist"
            )));
        }
        self.ensure_manages(&scope, project_id, Resource::Project, project_id)?;

        self.records.save_new(principal, Milestone::from_new(input))
    }

    pub fn update(
        &self,
        principal: &Principal,
        id: RecordId,
        patch: MilestonePatch,
    ) -> ServiceResult<Milestone> {
        let scope = authorize(principal, Resource::Milestone, Action::Update)?;
        let mut milestone = self.records.load(id)?;
        self.ensure_manages(&scope, milestone.project_id, Resource::Milestone, id)?;

        milestone.apply(patch);
        self.records.save_update(principal, milestone)
    }

    pub fn delete(&self, principal: &Principal, id: RecordId) -> ServiceResult<Milestone> {
        self.records.delete(principal, id)
    }

    /// Checks that a scoped caller manages `project_id`; reports `resource`/`id`
    /// as the out-of-scope target otherwise.
    fn ensure_manages(
        &self,
        scope: &Scope,
        project_id: RecordId,
        resource: Resource,
        id: RecordId,
    ) -> ServiceResult<()> {
        let allowed = match scope {
            Scope::All => true,
            Scope::Own(employee_id) => self.projects.managed_by(project_id, *employee_id)?,
            Scope::Empty => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(AccessError::OutOfScope { resource, id }.into())
        }
    }
}
