//! Project repository, including project membership.
//!
//! # Invariants
//! - `Scope::Own(employee)` matches projects the employee manages or is a
//!   member of.
//! - Members must reference active employees; membership rows are hard
//!   deleted since they carry no history of their own.

use crate::auth::Scope;
use crate::model::project::{MemberRole, Project, ProjectMember, ProjectStatus};
use crate::model::RecordId;
use crate::query::{
    param_enum, param_id, ListFilter, ListQuery, Page, Params, QueryError, SortDirection, SortSpec,
};
use crate::repo::{
    fetch_active, fetch_page, get_id, get_opt_id, id_value, row_matches, soft_delete_row,
    Conditions, ForeignKey, RecordRepository, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_COLUMNS: &str = "id, client_id, manager_id, name, description, status, \
    budget_cents, start_date, end_date, created_at, updated_at, deleted_at";

const CLIENT_FK: ForeignKey = ForeignKey {
    column: "client_id",
    table: "clients",
    entity: "client",
};
const MANAGER_FK: ForeignKey = ForeignKey {
    column: "manager_id",
    table: "employees",
    entity: "employee",
};
const MEMBER_FK: ForeignKey = ForeignKey {
    column: "employee_id",
    table: "employees",
    entity: "employee",
};

/// Scope predicate over `projects`; both placeholders bind the employee id.
pub(crate) const PROJECT_OWN_SCOPE_SQL: &str = "(manager_id = ? OR EXISTS (
    SELECT 1 FROM project_members pm
    WHERE pm.project_id = projects.id AND pm.employee_id = ?
))";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub client_id: Option<RecordId>,
    pub manager_id: Option<RecordId>,
    pub status: Option<ProjectStatus>,
}

impl ListFilter for ProjectFilter {
    const SORT: SortSpec = SortSpec {
        columns: &[
            "name",
            "status",
            "start_date",
            "end_date",
            "budget_cents",
            "created_at",
            "updated_at",
        ],
        default_column: "created_at",
        default_direction: SortDirection::Desc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            client_id: param_id(params, "client_id")?,
            manager_id: param_id(params, "manager_id")?,
            status: param_enum(params, "status", ProjectStatus::parse)?,
        })
    }
}

/// Membership operations on top of the project CRUD contract.
pub trait ProjectRepository: RecordRepository<Project, Filter = ProjectFilter> {
    /// Adds `employee_id` to an active project; `Conflict` if already a member.
    fn add_member(
        &self,
        project_id: RecordId,
        employee_id: RecordId,
        role: MemberRole,
    ) -> RepoResult<ProjectMember>;
    /// Removes a membership and returns it; `NotFound` if the employee is not
    /// a member. Memberships of deleted employees can still be removed.
    fn remove_member(
        &self,
        project_id: RecordId,
        employee_id: RecordId,
    ) -> RepoResult<ProjectMember>;
    /// Lists members of one project, oldest membership first.
    fn list_members(&self, project_id: RecordId) -> RepoResult<Vec<ProjectMember>>;
    /// Returns whether the employee manages or is a member of the project.
    fn is_member_or_manager(&self, project_id: RecordId, employee_id: RecordId)
        -> RepoResult<bool>;
    /// Returns whether the employee is the manager of the active project.
    fn managed_by(&self, project_id: RecordId, employee_id: RecordId) -> RepoResult<bool>;
}

pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn ensure_active_project(&self, project_id: RecordId) -> RepoResult<()> {
        if row_matches(self.conn, "projects", project_id, Conditions::active())? {
            Ok(())
        } else {
            Err(RepoError::NotFound {
                entity: "project",
                id: project_id,
            })
        }
    }
}

impl RecordRepository<Project> for SqliteProjectRepository<'_> {
    type Filter = ProjectFilter;

    fn create(&self, project: &Project) -> RepoResult<RecordId> {
        project.validate()?;
        CLIENT_FK.check_insert(self.conn, Some(project.client_id))?;
        MANAGER_FK.check_insert(self.conn, project.manager_id)?;

        self.conn.execute(
            "INSERT INTO projects (
                id,
                client_id,
                manager_id,
                name,
                description,
                status,
                budget_cents,
                start_date,
                end_date,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                project.id.to_string(),
                project.client_id.to_string(),
                project.manager_id.map(|id| id.to_string()),
                project.name.as_str(),
                project.description.as_deref(),
                project.status,
                project.budget_cents,
                project.start_date,
                project.end_date,
                project.created_at,
                project.updated_at,
            ],
        )?;

        Ok(project.id)
    }

    fn update(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        CLIENT_FK.check_update(self.conn, "projects", project.id, Some(project.client_id))?;
        MANAGER_FK.check_update(self.conn, "projects", project.id, project.manager_id)?;

        let changed = self.conn.execute(
            "UPDATE projects
             SET
                client_id = ?1,
                manager_id = ?2,
                name = ?3,
                description = ?4,
                status = ?5,
                budget_cents = ?6,
                start_date = ?7,
                end_date = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?9
               AND deleted_at IS NULL;",
            params![
                project.client_id.to_string(),
                project.manager_id.map(|id| id.to_string()),
                project.name.as_str(),
                project.description.as_deref(),
                project.status,
                project.budget_cents,
                project.start_date,
                project.end_date,
                project.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id: project.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Project>> {
        fetch_active(self.conn, "projects", PROJECT_COLUMNS, id, parse_project_row)
    }

    fn list(&self, query: &ListQuery<ProjectFilter>, scope: &Scope) -> RepoResult<Page<Project>> {
        let mut conditions = Conditions::active();
        conditions.push_eq("client_id", query.filter.client_id.map(id_value));
        conditions.push_eq("manager_id", query.filter.manager_id.map(id_value));
        conditions.push_eq(
            "status",
            query
                .filter
                .status
                .map(|status| Value::Text(status.as_str().to_string())),
        );
        conditions.push_search(&["name", "description"], query.search.as_deref());
        conditions.push_scope(scope, push_own_project);

        fetch_page(
            self.conn,
            "projects",
            PROJECT_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_project_row,
        )
    }

    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push_scope(scope, push_own_project);
        row_matches(self.conn, "projects", id, conditions)
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, "projects", "project", id)
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn add_member(
        &self,
        project_id: RecordId,
        employee_id: RecordId,
        role: MemberRole,
    ) -> RepoResult<ProjectMember> {
        self.ensure_active_project(project_id)?;
        MEMBER_FK.check_insert(self.conn, Some(employee_id))?;

        let member = ProjectMember {
            project_id,
            employee_id,
            role,
            joined_at: crate::model::now_epoch_ms(),
        };
        self.conn
            .execute(
                "INSERT INTO project_members (project_id, employee_id, role, joined_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    project_id.to_string(),
                    employee_id.to_string(),
                    member.role,
                    member.joined_at,
                ],
            )
            .map_err(|err| match RepoError::from(err) {
                RepoError::Conflict(_) => RepoError::Conflict(format!(
                    "employee {employee_id} is already a member of project {project_id}"
                )),
                other => other,
            })?;

        Ok(member)
    }

    fn remove_member(
        &self,
        project_id: RecordId,
        employee_id: RecordId,
    ) -> RepoResult<ProjectMember> {
        self.ensure_active_project(project_id)?;

        let member = self
            .conn
            .query_row(
                "SELECT project_id, employee_id, role, joined_at
                 FROM project_members
                 WHERE project_id = ?1 AND employee_id = ?2;",
                [project_id.to_string(), employee_id.to_string()],
                |row| Ok(parse_member_row(row)),
            )
            .optional()?
            .transpose()?
            .ok_or(RepoError::NotFound {
                entity: "project_member",
                id: employee_id,
            })?;

        self.conn.execute(
            "DELETE FROM project_members WHERE project_id = ?1 AND employee_id = ?2;",
            [project_id.to_string(), employee_id.to_string()],
        )?;
        Ok(member)
    }

    fn list_members(&self, project_id: RecordId) -> RepoResult<Vec<ProjectMember>> {
        self.ensure_active_project(project_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT pm.project_id, pm.employee_id, pm.role, pm.joined_at
             FROM project_members pm
             JOIN employees e ON e.id = pm.employee_id
             WHERE pm.project_id = ?1
               AND e.deleted_at IS NULL
             ORDER BY pm.joined_at ASC, pm.employee_id ASC;",
        )?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn is_member_or_manager(
        &self,
        project_id: RecordId,
        employee_id: RecordId,
    ) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                &format!(
                    "SELECT 1 FROM projects
                     WHERE id = ?
                       AND deleted_at IS NULL
                       AND {PROJECT_OWN_SCOPE_SQL};"
                ),
                [
                    project_id.to_string(),
                    employee_id.to_string(),
                    employee_id.to_string(),
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn managed_by(&self, project_id: RecordId, employee_id: RecordId) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push("manager_id = ?", [id_value(employee_id)]);
        row_matches(self.conn, "projects", project_id, conditions)
    }
}

fn push_own_project(employee_id: RecordId, conditions: &mut Conditions) {
    conditions.push(
        PROJECT_OWN_SCOPE_SQL,
        [id_value(employee_id), id_value(employee_id)],
    );
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let project = Project {
        id: get_id(row, "id")?,
        client_id: get_id(row, "client_id")?,
        manager_id: get_opt_id(row, "manager_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        budget_cents: row.get("budget_cents")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    project.validate()?;
    Ok(project)
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<ProjectMember> {
    Ok(ProjectMember {
        project_id: get_id(row, "project_id")?,
        employee_id: get_id(row, "employee_id")?,
        role: row.get("role")?,
        joined_at: row.get("joined_at")?,
    })
}
