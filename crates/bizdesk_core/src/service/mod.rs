//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate authorization, repository calls and audit writes into
//!   use-case level APIs.
//! - Keep the HTTP and CLI layers decoupled from storage details.
//!
//! # Invariants
//! - Every operation authorizes the acting `Principal` before touching rows.
//! - Every successful mutation writes exactly one audit row.
//! - Writes are read back so callers observe persisted state.

use crate::auth::{authorize, AccessError, Action, Principal, Resource, Scope};
use crate::model::audit::{AuditAction, AuditLog};
use crate::model::client::{Client, ClientPatch, NewClient};
use crate::model::communication::{CommunicationLog, CommunicationLogPatch, NewCommunicationLog};
use crate::model::company::{Company, CompanyPatch, NewCompany};
use crate::model::employee::{Employee, EmployeePatch, NewEmployee};
use crate::model::milestone::{Milestone, MilestonePatch, NewMilestone};
use crate::model::payment::{NewPayment, Payment, PaymentPatch};
use crate::model::project::{NewProject, Project, ProjectPatch};
use crate::model::{RecordId, ValidationError};
use crate::query::{ListQuery, Page, QueryError};
use crate::repo::audit_repo::AuditRepository;
use crate::repo::{RecordRepository, RepoError};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

pub mod audit_service;
pub mod auth_service;
pub mod communication_service;
pub mod milestone_service;
pub mod project_service;

pub use audit_service::AuditService;
pub use auth_service::{AuthService, IssuedToken};
pub use communication_service::CommunicationService;
pub use milestone_service::MilestoneService;
pub use project_service::ProjectService;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: RecordId },
    #[error(transparent)]
    Forbidden(#[from] AccessError),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidReference(String),
    #[error(transparent)]
    Repo(RepoError),
    /// Internal consistency failure, e.g. a write that cannot be read back.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            RepoError::InvalidReference(message) => Self::InvalidReference(message),
            other => Self::Repo(other),
        }
    }
}

/// A soft-deletable record managed through [`RecordService`].
pub trait ManagedRecord: Serialize + Sized {
    type New;
    type Patch;

    const RESOURCE: Resource;

    fn from_new(input: Self::New) -> Self;
    fn apply_patch(&mut self, patch: Self::Patch);
    fn check(&self) -> Result<(), ValidationError>;
    fn record_id(&self) -> RecordId;
}

macro_rules! managed_record {
    ($record:ty, $new:ty, $patch:ty, $resource:expr) => {
        impl ManagedRecord for $record {
            type New = $new;
            type Patch = $patch;

            const RESOURCE: Resource = $resource;

            fn from_new(input: Self::New) -> Self {
                <$record>::from_new(input)
            }

            fn apply_patch(&mut self, patch: Self::Patch) {
                self.apply(patch);
            }

            fn check(&self) -> Result<(), ValidationError> {
                self.validate()
            }

            fn record_id(&self) -> RecordId {
                self.id
            }
        }
    };
}

managed_record!(Client, NewClient, ClientPatch, Resource::Client);
managed_record!(Company, NewCompany, CompanyPatch, Resource::Company);
managed_record!(Employee, NewEmployee, EmployeePatch, Resource::Employee);
managed_record!(Payment, NewPayment, PaymentPatch, Resource::Payment);
managed_record!(Project, NewProject, ProjectPatch, Resource::Project);
managed_record!(Milestone, NewMilestone, MilestonePatch, Resource::Milestone);
managed_record!(
    CommunicationLog,
    NewCommunicationLog,
    CommunicationLogPatch,
    Resource::Communication
);

/// Generic CRUD use-cases for one record type.
///
/// Writes require unscoped access; record types with scoped writes wrap this
/// service and add their own ownership checks.
pub struct RecordService<T, R, A> {
    repo: R,
    audit: A,
    _record: PhantomData<fn() -> T>,
}

impl<T, R, A> RecordService<T, R, A>
where
    T: ManagedRecord,
    R: RecordRepository<T>,
    A: AuditRepository,
{
    pub fn new(repo: R, audit: A) -> Self {
        Self {
            repo,
            audit,
            _record: PhantomData,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Lists records visible to `principal`.
    pub fn list(
        &self,
        principal: &Principal,
        query: &ListQuery<R::Filter>,
    ) -> ServiceResult<Page<T>> {
        let scope = authorize(principal, T::RESOURCE, Action::Read)?;
        Ok(self.repo.list(query, &scope)?)
    }

    /// Gets one record; `Forbidden` when it exists outside the caller's scope.
    pub fn get(&self, principal: &Principal, id: RecordId) -> ServiceResult<T> {
        let scope = authorize(principal, T::RESOURCE, Action::Read)?;
        self.load_in_scope(id, &scope)
    }

    pub fn create(&self, principal: &Principal, input: T::New) -> ServiceResult<T> {
        require_unscoped(principal, T::RESOURCE, Action::Create)?;
        self.save_new(principal, T::from_new(input))
    }

    pub fn update(&self, principal: &Principal, id: RecordId, patch: T::Patch) -> ServiceResult<T> {
        require_unscoped(principal, T::RESOURCE, Action::Update)?;
        let mut record = self.load(id)?;
        record.apply_patch(patch);
        self.save_update(principal, record)
    }

    /// Soft-deletes one record and returns its last state.
    pub fn delete(&self, principal: &Principal, id: RecordId) -> ServiceResult<T> {
        require_unscoped(principal, T::RESOURCE, Action::Delete)?;
        let record = self.load(id)?;
        self.repo.soft_delete(id)?;
        self.write_audit(principal, AuditAction::Delete, &record)?;
        Ok(record)
    }

    /// Loads an active record regardless of scope.
    pub(crate) fn load(&self, id: RecordId) -> ServiceResult<T> {
        self.repo.get(id)?.ok_or(ServiceError::NotFound {
            entity: T::RESOURCE.as_str(),
            id,
        })
    }

    pub(crate) fn load_in_scope(&self, id: RecordId, scope: &Scope) -> ServiceResult<T> {
        let record = self.load(id)?;
        if !scope.is_all() && !self.repo.in_scope(id, scope)? {
            return Err(AccessError::OutOfScope {
                resource: T::RESOURCE,
                id,
            }
            .into());
        }
        Ok(record)
    }

    pub(crate) fn save_new(&self, principal: &Principal, record: T) -> ServiceResult<T> {
        record.check()?;
        let id = self.repo.create(&record)?;
        let saved = self.read_back(id, "created record not found in read-back")?;
        self.write_audit(principal, AuditAction::Create, &saved)?;
        Ok(saved)
    }

    pub(crate) fn save_update(&self, principal: &Principal, record: T) -> ServiceResult<T> {
        record.check()?;
        self.repo.update(&record)?;
        let saved = self.read_back(record.record_id(), "updated record not found in read-back")?;
        self.write_audit(principal, AuditAction::Update, &saved)?;
        Ok(saved)
    }

    pub(crate) fn write_audit(
        &self,
        principal: &Principal,
        action: AuditAction,
        record: &T,
    ) -> ServiceResult<()> {
        let entry = AuditLog::new(
            Some(principal.user_id),
            action,
            T::RESOURCE.table(),
            record.record_id(),
            Some(snapshot(record)?),
        );
        self.audit.record(&entry)?;
        Ok(())
    }

    fn read_back(&self, id: RecordId, details: &str) -> ServiceResult<T> {
        self.repo
            .get(id)?
            .ok_or_else(|| ServiceError::Internal(details.to_string()))
    }
}

/// Authorizes `action` and rejects anything narrower than `Scope::All`.
pub(crate) fn require_unscoped(
    principal: &Principal,
    resource: Resource,
    action: Action,
) -> ServiceResult<()> {
    match authorize(principal, resource, action)? {
        Scope::All => Ok(()),
        Scope::Own(_) | Scope::Empty => Err(AccessError::Forbidden {
            role: principal.role,
            resource,
            action,
        }
        .into()),
    }
}

pub(crate) fn snapshot(value: &impl Serialize) -> ServiceResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| ServiceError::Internal(format!("audit snapshot failed: {err}")))
}

pub type ClientService<R, A> = RecordService<Client, R, A>;
pub type CompanyService<R, A> = RecordService<Company, R, A>;
pub type EmployeeService<R, A> = RecordService<Employee, R, A>;
pub type PaymentService<R, A> = RecordService<Payment, R, A>;
