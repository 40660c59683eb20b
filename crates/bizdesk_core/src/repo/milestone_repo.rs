//! Milestone repository and its SQLite implementation.
//!
//! Scoped access follows the parent project: an employee sees milestones of
//! the projects they manage or belong to.

use crate::auth::Scope;
use crate::model::milestone::{Milestone, MilestoneStatus};
use crate::model::RecordId;
use crate::query::{
    param_enum, param_id, ListFilter, ListQuery, Page, Params, QueryError, SortDirection, SortSpec,
};
use crate::repo::project_repo::PROJECT_OWN_SCOPE_SQL;
use crate::repo::{
    fetch_active, fetch_page, get_id, id_value, row_matches, soft_delete_row, Conditions,
    ForeignKey, RecordRepository, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const MILESTONE_COLUMNS: &str = "id, project_id, title, description, status, due_date, \
    completed_at, created_at, updated_at, deleted_at";

const PROJECT_FK: ForeignKey = ForeignKey {
    column: "project_id",
    table: "projects",
    entity: "project",
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneFilter {
    pub project_id: Option<RecordId>,
    pub status: Option<MilestoneStatus>,
}

impl ListFilter for MilestoneFilter {
    const SORT: SortSpec = SortSpec {
        columns: &["title", "status", "due_date", "completed_at", "created_at"],
        default_column: "due_date",
        default_direction: SortDirection::Asc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            project_id: param_id(params, "project_id")?,
            status: param_enum(params, "status", MilestoneStatus::parse)?,
        })
    }
}

pub struct SqliteMilestoneRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMilestoneRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository<Milestone> for SqliteMilestoneRepository<'_> {
    type Filter = MilestoneFilter;

    fn create(&self, milestone: &Milestone) -> RepoResult<RecordId> {
        milestone.validate()?;
        PROJECT_FK.check_insert(self.conn, Some(milestone.project_id))?;

        self.conn.execute(
            "INSERT INTO milestones (
                id,
                project_id,
                title,
                description,
                status,
                due_date,
                completed_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                milestone.id.to_string(),
                milestone.project_id.to_string(),
                milestone.title.as_str(),
                milestone.description.as_deref(),
                milestone.status,
                milestone.due_date,
                milestone.completed_at,
                milestone.created_at,
                milestone.updated_at,
            ],
        )?;

        Ok(milestone.id)
    }

    fn update(&self, milestone: &Milestone) -> RepoResult<()> {
        milestone.validate()?;

        let changed = self.conn.execute(
            "UPDATE milestones
             SET
                title = ?1,
                description = ?2,
                status = ?3,
                due_date = ?4,
                completed_at = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6
               AND deleted_at IS NULL;",
            params![
                milestone.title.as_str(),
                milestone.description.as_deref(),
                milestone.status,
                milestone.due_date,
                milestone.completed_at,
                milestone.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "milestone",
                id: milestone.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Milestone>> {
        fetch_active(
            self.conn,
            "milestones",
            MILESTONE_COLUMNS,
            id,
            parse_milestone_row,
        )
    }

    fn list(
        &self,
        query: &ListQuery<MilestoneFilter>,
        scope: &Scope,
    ) -> RepoResult<Page<Milestone>> {
        let mut conditions = Conditions::active();
        conditions.push_eq("project_id", query.filter.project_id.map(id_value));
        conditions.push_eq(
            "status",
            query
                .filter
                .status
                .map(|status| Value::Text(status.as_str().to_string())),
        );
        conditions.push_search(&["title", "description"], query.search.as_deref());
        conditions.push_scope(scope, push_own_milestone);

        fetch_page(
            self.conn,
            "milestones",
            MILESTONE_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_milestone_row,
        )
    }

    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push_scope(scope, push_own_milestone);
        row_matches(self.conn, "milestones", id, conditions)
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, "milestones", "milestone", id)
    }
}

fn push_own_milestone(employee_id: RecordId, conditions: &mut Conditions) {
    conditions.push(
        &format!(
            "project_id IN (
                SELECT id FROM projects
                WHERE deleted_at IS NULL
                  AND {PROJECT_OWN_SCOPE_SQL}
            )"
        ),
        [id_value(employee_id), id_value(employee_id)],
    );
}

fn parse_milestone_row(row: &Row<'_>) -> RepoResult<Milestone> {
    let milestone = Milestone {
        id: get_id(row, "id")?,
        project_id: get_id(row, "project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: row.get("status")?,
        due_date: row.get("due_date")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    milestone.validate()?;
    Ok(milestone)
}
