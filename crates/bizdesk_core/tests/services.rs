mod common;

use bizdesk_core::auth::token::TOKEN_PREFIX;
use bizdesk_core::auth::{AccessError, Principal};
use bizdesk_core::db::open_db_in_memory;
use bizdesk_core::model::audit::AuditAction;
use bizdesk_core::model::client::{ClientPatch, NewClient};
use bizdesk_core::model::communication::{Channel, CommunicationLogPatch, NewCommunicationLog};
use bizdesk_core::model::project::NewProject;
use bizdesk_core::model::user::{NewUser, Role};
use bizdesk_core::query::{ListQuery, Params};
use bizdesk_core::repo::audit_repo::{AuditFilter, SqliteAuditRepository};
use bizdesk_core::repo::client_repo::SqliteClientRepository;
use bizdesk_core::repo::communication_repo::SqliteCommunicationRepository;
use bizdesk_core::repo::project_repo::SqliteProjectRepository;
use bizdesk_core::repo::user_repo::SqliteUserRepository;
use bizdesk_core::service::{
    AuditService, AuthService, ClientService, CommunicationService, ProjectService, ServiceError,
};
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use serde_json::json;

fn auth(conn: &Connection) -> AuthService<SqliteUserRepository<'_>, SqliteAuditRepository<'_>> {
    AuthService::new(SqliteUserRepository::new(conn), SqliteAuditRepository::new(conn))
}

fn audit_for(conn: &Connection, admin: &Principal, entity_id: &str) -> Vec<AuditAction> {
    let params: Params = [("entityId".to_string(), entity_id.to_string())]
        .into_iter()
        .collect();
    let query = ListQuery::<AuditFilter>::from_params(&params).unwrap();
    let mut actions: Vec<_> = AuditService::new(SqliteAuditRepository::new(conn))
        .list(admin, &query)
        .unwrap()
        .items
        .into_iter()
        .map(|row| row.action)
        .collect();
    actions.sort_by_key(|action| action.as_str());
    actions
}

#[test]
fn every_mutation_writes_an_audit_row() {
    let conn = open_db_in_memory().unwrap();
    let admin = common::admin(&conn);
    let service = ClientService::new(
        SqliteClientRepository::new(&conn),
        SqliteAuditRepository::new(&conn),
    );

    let client = service
        .create(
            &admin,
            NewClient {
                name: "Soylent".to_string(),
                ..NewClient::default()
            },
        )
        .unwrap();
    let updated = service
        .update(
            &admin,
            client.id,
            ClientPatch {
                name: Some("Soylent Green".to_string()),
                ..ClientPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Soylent Green");
    service.delete(&admin, client.id).unwrap();

    assert_eq!(
        audit_for(&conn, &admin, &client.id.to_string()),
        vec![AuditAction::Create, AuditAction::Delete, AuditAction::Update]
    );

    let (actor, changes): (String, String) = conn
        .query_row(
            "SELECT actor_user_id, changes FROM audit_logs
             WHERE entity = 'clients' AND action = 'update';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(actor, admin.user_id.to_string());
    let changes: serde_json::Value = serde_json::from_str(&changes).unwrap();
    assert_eq!(changes["name"], json!("Soylent Green"));
}

#[test]
fn audit_log_is_admin_only() {
    let conn = open_db_in_memory().unwrap();
    let manager = common::user(&conn, "manager@bizdesk.test", Role::Manager, None);
    let err = AuditService::new(SqliteAuditRepository::new(&conn))
        .list(&manager, &ListQuery::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(AccessError::Forbidden { .. })
    ));
}

#[test]
fn failed_validation_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let admin = common::admin(&conn);
    let service = ClientService::new(
        SqliteClientRepository::new(&conn),
        SqliteAuditRepository::new(&conn),
    );
    let err = service
        .create(
            &admin,
            NewClient {
                name: "Broken".to_string(),
                email: Some("not-an-email".to_string()),
                ..NewClient::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let audit_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM audit_logs WHERE entity = 'clients';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(audit_rows, 0);
}

#[test]
fn employee_communications_are_forced_to_their_own_record() {
    let conn = open_db_in_memory().unwrap();
    let admin = common::admin(&conn);
    let client = common::client(&conn, "Tyrell");
    let author = common::employee(&conn, "Deckard");
    let other = common::employee(&conn, "Rachael");
    let principal = common::user(&conn, "deckard@bizdesk.test", Role::Employee, Some(author.id));
    let service = CommunicationService::new(
        SqliteCommunicationRepository::new(&conn),
        SqliteAuditRepository::new(&conn),
    );

    let input = |employee_id| NewCommunicationLog {
        client_id: client.id,
        employee_id,
        channel: Channel::Meeting,
        subject: "Interview".to_string(),
        summary: None,
        occurred_at: None,
    };

    let log = service.create(&principal, input(Some(other.id))).unwrap();
    assert_eq!(log.employee_id, Some(author.id));
    assert!(log.occurred_at > 0);

    let foreign = service.create(&admin, input(Some(other.id))).unwrap();
    assert_eq!(foreign.employee_id, Some(other.id));

    let page = service.list(&principal, &ListQuery::default()).unwrap();
    assert_eq!(page.items.len(), 1);

    let patch = || CommunicationLogPatch {
        subject: Some("Follow-up".to_string()),
        ..CommunicationLogPatch::default()
    };
    assert_eq!(
        service.update(&principal, log.id, patch()).unwrap().subject,
        "Follow-up"
    );
    assert!(service.update(&principal, foreign.id, patch()).is_err());
    assert!(service.delete(&principal, log.id).is_err());

    let unlinked = common::user(&conn, "temp@bizdesk.test", Role::Employee, None);
    assert!(matches!(
        service.create(&unlinked, input(None)).unwrap_err(),
        ServiceError::Forbidden(_)
    ));
}

#[test]
fn tokens_authenticate_until_revoked() {
    let conn = open_db_in_memory().unwrap();
    let service = auth(&conn);
    let user = service
        .create_user(
            None,
            NewUser {
                email: " Ops@BizDesk.test ".to_string(),
                display_name: "Ops".to_string(),
                role: Role::Manager,
                employee_id: None,
            },
        )
        .unwrap();
    assert_eq!(user.email, "ops@bizdesk.test");

    let issued = service.issue_token(None, user.id, Some("laptop")).unwrap();
    assert!(issued.token.starts_with(TOKEN_PREFIX));

    let stored: String = conn
        .query_row("SELECT token_hash FROM api_tokens;", [], |row| row.get(0))
        .unwrap();
    assert_ne!(stored, issued.token);

    let principal = service.authenticate(&issued.token).unwrap();
    assert_eq!(principal.user_id, user.id);
    assert_eq!(principal.role, Role::Manager);
    assert_eq!(service.me(&principal).unwrap().id, user.id);

    let admin = common::admin(&conn);
    service.revoke_token(Some(&admin), &issued.token).unwrap();
    let revoked: (Option<String>, String) = conn
        .query_row(
            "SELECT actor_user_id, changes FROM audit_logs
             WHERE entity = 'users' AND entity_id = ?1
             ORDER BY rowid DESC LIMIT 1;",
            [user.id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(revoked.0, Some(admin.user_id.to_string()));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&revoked.1).unwrap(),
        json!({ "token_revoked": true })
    );
    assert!(matches!(
        service.revoke_token(None, &issued.token).unwrap_err(),
        ServiceError::Unauthorized("unknown or revoked token")
    ));
    assert!(matches!(
        service.authenticate(&issued.token).unwrap_err(),
        ServiceError::Unauthorized("unknown or revoked token")
    ));
    assert!(matches!(
        service.authenticate("letmein").unwrap_err(),
        ServiceError::Unauthorized("malformed token")
    ));
}

#[test]
fn only_admins_manage_other_users() {
    let conn = open_db_in_memory().unwrap();
    let service = auth(&conn);
    let admin = common::admin(&conn);
    let manager = common::user(&conn, "boss@bizdesk.test", Role::Manager, None);

    let new_user = || NewUser {
        email: "new@bizdesk.test".to_string(),
        display_name: "New".to_string(),
        role: Role::Employee,
        employee_id: None,
    };
    assert!(service.create_user(Some(&manager), new_user()).is_err());
    let created = service.create_user(Some(&admin), new_user()).unwrap();
    assert!(matches!(
        service.create_user(Some(&admin), new_user()).unwrap_err(),
        ServiceError::Conflict(_)
    ));

    assert!(service.issue_token(Some(&manager), created.id, None).is_err());
    service.issue_token(Some(&manager), manager.user_id, None).unwrap();
    service.issue_token(Some(&admin), created.id, None).unwrap();
}

#[test]
fn deleted_client_cannot_receive_new_projects() {
    let conn = open_db_in_memory().unwrap();
    let admin = common::admin(&conn);
    let client = common::client(&conn, "Tyrell");
    ClientService::new(
        SqliteClientRepository::new(&conn),
        SqliteAuditRepository::new(&conn),
    )
    .delete(&admin, client.id)
    .unwrap();

    let err = ProjectService::new(
        SqliteProjectRepository::new(&conn),
        SqliteAuditRepository::new(&conn),
    )
    .create(
        &admin,
        NewProject {
            client_id: client.id,
            manager_id: None,
            name: "Nexus".to_string(),
            description: None,
            status: Default::default(),
            budget_cents: None,
            start_date: None,
            end_date: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));

    let projects: i64 = conn
        .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(projects, 0);
}
