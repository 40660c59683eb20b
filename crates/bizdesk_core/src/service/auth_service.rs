//! Authentication and user administration.
//!
//! # Responsibility
//! - Resolve bearer tokens into principals.
//! - Create users and issue or revoke their API tokens.
//!
//! # Invariants
//! - Operations invoked without an actor (`None`) come from local
//!   maintenance tooling and are audited with no actor id.
//! - A plaintext token leaves this module exactly once, in `IssuedToken`.

use crate::auth::token::{generate_token, hash_token, looks_like_token};
use crate::auth::{authorize, Action, Principal, Resource};
use crate::model::audit::{AuditAction, AuditLog};
use crate::model::user::{NewUser, User};
use crate::model::RecordId;
use crate::repo::audit_repo::AuditRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::{require_unscoped, snapshot, ServiceError, ServiceResult};
use serde_json::json;

/// Freshly issued token. `token` is not recoverable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub user: User,
}

pub struct AuthService<U, A> {
    users: U,
    audit: A,
}

impl<U, A> AuthService<U, A>
where
    U: UserRepository,
    A: AuditRepository,
{
    pub fn new(users: U, audit: A) -> Self {
        Self { users, audit }
    }

    /// Resolves a bearer token to the acting principal.
    pub fn authenticate(&self, token: &str) -> ServiceResult<Principal> {
        let token = token.trim();
        if !looks_like_token(token) {
            return Err(ServiceError::Unauthorized("malformed token"));
        }
        self.users
            .find_principal_by_token_hash(&hash_token(token))?
            .ok_or(ServiceError::Unauthorized("unknown or revoked token"))
    }

    pub fn create_user(&self, actor: Option<&Principal>, input: NewUser) -> ServiceResult<User> {
        if let Some(actor) = actor {
            require_unscoped(actor, Resource::User, Action::Create)?;
        }

        let user = User::from_new(input);
        user.validate()?;
        let id = self.users.create_user(&user)?;
        let saved = self.load_user(id)?;

        self.audit.record(&AuditLog::new(
            actor.map(|actor| actor.user_id),
            AuditAction::Create,
            Resource::User.table(),
            saved.id,
            Some(snapshot(&saved)?),
        ))?;
        Ok(saved)
    }

    /// Issues a new token for `user_id`. Users may issue tokens for
    /// themselves; issuing for others requires admin.
    pub fn issue_token(
        &self,
        actor: Option<&Principal>,
        user_id: RecordId,
        label: Option<&str>,
    ) -> ServiceResult<IssuedToken> {
        if let Some(actor) = actor {
            if actor.user_id != user_id {
                require_unscoped(actor, Resource::User, Action::Update)?;
            }
        }

        let user = self.load_user(user_id)?;
        let token = generate_token()
            .map_err(|err| ServiceError::Internal(format!("token generation failed: {err}")))?;
        let label = label.map(str::trim).filter(|label| !label.is_empty());
        self.users.insert_token(&hash_token(&token), user.id, label)?;

        self.audit.record(&AuditLog::new(
            actor.map(|actor| actor.user_id),
            AuditAction::Update,
            Resource::User.table(),
            user.id,
            Some(json!({ "token_issued": true, "label": label })),
        ))?;
        Ok(IssuedToken { token, user })
    }

    /// Revokes a token by its plaintext value.
    pub fn revoke_token(&self, actor: Option<&Principal>, token: &str) -> ServiceResult<()> {
        let token = token.trim();
        let owner = if looks_like_token(token) {
            self.users.revoke_token(&hash_token(token))?
        } else {
            None
        };
        let Some(user_id) = owner else {
            return Err(ServiceError::Unauthorized("unknown or revoked token"));
        };

        self.audit.record(&AuditLog::new(
            actor.map(|actor| actor.user_id),
            AuditAction::Update,
            Resource::User.table(),
            user_id,
            Some(json!({ "token_revoked": true })),
        ))?;
        Ok(())
    }

    /// Returns the user record behind `principal`.
    pub fn me(&self, principal: &Principal) -> ServiceResult<User> {
        authorize(principal, Resource::User, Action::Read)?;
        self.load_user(principal.user_id)
    }

    pub fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.users.find_by_email(email)?)
    }

    fn load_user(&self, id: RecordId) -> ServiceResult<User> {
        self.users.get_user(id)?.ok_or(ServiceError::NotFound {
            entity: Resource::User.as_str(),
            id,
        })
    }
}
