//! Users and their API tokens.
//!
//! # Invariants
//! - Only token hashes are persisted; plaintext tokens never reach SQL.
//! - Token lookups ignore revoked tokens and deleted users.
//! - A principal only carries its employee link while that employee is active.

use crate::auth::Principal;
use crate::model::now_epoch_ms;
use crate::model::user::{Role, User};
use crate::model::RecordId;
use crate::repo::{get_id, get_opt_id, parse_id, ForeignKey, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str =
    "id, email, display_name, role, employee_id, created_at, updated_at, deleted_at";

const EMPLOYEE_FK: ForeignKey = ForeignKey {
    column: "employee_id",
    table: "employees",
    entity: "employee",
};

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<RecordId>;
    fn get_user(&self, id: RecordId) -> RepoResult<Option<User>>;
    /// Case-insensitive lookup among active users.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn insert_token(
        &self,
        token_hash: &str,
        user_id: RecordId,
        label: Option<&str>,
    ) -> RepoResult<()>;
    /// Resolves a live token to its principal and records the use.
    fn find_principal_by_token_hash(&self, token_hash: &str) -> RepoResult<Option<Principal>>;
    /// Marks a token revoked and returns its owner; `None` if no live token
    /// had that hash.
    fn revoke_token(&self, token_hash: &str) -> RepoResult<Option<RecordId>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<RecordId> {
        user.validate()?;
        EMPLOYEE_FK.check_insert(self.conn, user.employee_id)?;

        self.conn
            .execute(
                "INSERT INTO users (
                    id,
                    email,
                    display_name,
                    role,
                    employee_id,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    user.id.to_string(),
                    user.email.as_str(),
                    user.display_name.as_str(),
                    user.role,
                    user.employee_id.map(|id| id.to_string()),
                    user.created_at,
                    user.updated_at,
                ],
            )
            .map_err(|err| match RepoError::from(err) {
                RepoError::Conflict(_) => {
                    RepoError::Conflict(format!("user with email {} already exists", user.email))
                }
                other => other,
            })?;

        Ok(user.id)
    }

    fn get_user(&self, id: RecordId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE email = ?1 COLLATE NOCASE
               AND deleted_at IS NULL;"
        ))?;
        let mut rows = stmt.query([email.trim()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_token(
        &self,
        token_hash: &str,
        user_id: RecordId,
        label: Option<&str>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO api_tokens (token_hash, user_id, label, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![token_hash, user_id.to_string(), label, now_epoch_ms()],
        )?;
        Ok(())
    }

    fn find_principal_by_token_hash(&self, token_hash: &str) -> RepoResult<Option<Principal>> {
        let principal = self
            .conn
            .query_row(
                "SELECT u.id, u.role, e.id AS employee_id
                 FROM api_tokens t
                 JOIN users u ON u.id = t.user_id
                 LEFT JOIN employees e
                   ON e.id = u.employee_id
                  AND e.deleted_at IS NULL
                 WHERE t.token_hash = ?1
                   AND t.revoked_at IS NULL
                   AND u.deleted_at IS NULL;",
                [token_hash],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, Role>("role")?,
                        row.get::<_, Option<String>>("employee_id")?,
                    ))
                },
            )
            .optional()?;

        let Some((user_id, role, employee_id)) = principal else {
            return Ok(None);
        };

        self.conn.execute(
            "UPDATE api_tokens SET last_used_at = ?1 WHERE token_hash = ?2;",
            params![now_epoch_ms(), token_hash],
        )?;

        Ok(Some(Principal::new(
            parse_id(&user_id, "users.id")?,
            role,
            employee_id
                .map(|id| parse_id(&id, "users.employee_id"))
                .transpose()?,
        )))
    }

    fn revoke_token(&self, token_hash: &str) -> RepoResult<Option<RecordId>> {
        let owner = self
            .conn
            .query_row(
                "SELECT user_id FROM api_tokens
                 WHERE token_hash = ?1
                   AND revoked_at IS NULL;",
                [token_hash],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let Some(owner) = owner else {
            return Ok(None);
        };

        self.conn.execute(
            "UPDATE api_tokens SET revoked_at = ?1 WHERE token_hash = ?2;",
            params![now_epoch_ms(), token_hash],
        )?;
        Ok(Some(parse_id(&owner, "api_tokens.user_id")?))
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let user = User {
        id: get_id(row, "id")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role: row.get::<_, Role>("role")?,
        employee_id: get_opt_id(row, "employee_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    user.validate()?;
    Ok(user)
}
