use bizdesk_api::{build_router, ApiLimits, AppState};
use bizdesk_core::auth::Principal;
use bizdesk_core::model::employee::{EmployeeStatus, NewEmployee};
use bizdesk_core::model::user::{NewUser, Role};
use bizdesk_core::model::RecordId;
use bizdesk_core::open_db_in_memory;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::employee_repo::SqliteEmployeeRepository;
use bizdesk_core::repo::user_repo::SqliteUserRepository;
use bizdesk_core::service::{AuthService, EmployeeService};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct Fixture {
    addr: SocketAddr,
    admin_token: String,
    employee_token: String,
    employee_id: RecordId,
}

async fn start(limits: ApiLimits) -> Fixture {
    let conn = open_db_in_memory().expect("open db");
    let auth = AuthService::new(
        SqliteUserRepository::new(&conn),
        SqliteAuditRepository::new(&conn),
    );
    let admin = auth
        .create_user(
            None,
            NewUser {
                email: "admin@bizdesk.test".to_string(),
                display_name: "Admin".to_string(),
                role: Role::Admin,
                employee_id: None,
            },
        )
        .expect("create admin");
    let admin_token = auth.issue_token(None, admin.id, None).expect("admin token").token;

    let employees = EmployeeService::new(
        SqliteEmployeeRepository::new(&conn),
        SqliteAuditRepository::new(&conn),
    );
    let employee = employees
        .create(
            &Principal::new(admin.id, Role::Admin, None),
            NewEmployee {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: "grace@bizdesk.test".to_string(),
                position: None,
                department: Some("Engineering".to_string()),
                hire_date: None,
                status: EmployeeStatus::Active,
            },
        )
        .expect("create employee");
    let user = auth
        .create_user(
            None,
            NewUser {
                email: "grace@bizdesk.test".to_string(),
                display_name: "Grace".to_string(),
                role: Role::Employee,
                employee_id: Some(employee.id),
            },
        )
        .expect("create employee user");
    let employee_token = auth.issue_token(None, user.id, None).expect("employee token").token;
    drop(employees);
    drop(auth);

    let app = build_router(AppState::new(conn, limits));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    Fixture {
        addr,
        admin_token,
        employee_token,
        employee_id: employee.id,
    }
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (u16, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(token) = token {
        req.push_str(&format!("Authorization: Bearer {token}\r\n"));
    }
    let payload = body.map(Value::to_string).unwrap_or_default();
    if body.is_some() {
        req.push_str("Content-Type: application/json\r\n");
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n{payload}", payload.len()));
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    let json = serde_json::from_str(body).unwrap_or(Value::Null);
    (status, json)
}

fn id_of(body: &Value) -> String {
    body["data"]["id"].as_str().expect("record id").to_string()
}

#[tokio::test]
async fn health_is_public_and_records_require_a_token() {
    let fx = start(ApiLimits::default()).await;

    let (status, body) = send_raw(fx.addr, "GET", "/api/health", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = send_raw(fx.addr, "GET", "/api/client", None, None).await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, body) = send_raw(fx.addr, "GET", "/api/client", Some("bd_nope"), None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn admin_creates_and_lists_clients_in_camel_case() {
    let fx = start(ApiLimits::default()).await;
    let token = Some(fx.admin_token.as_str());

    let (status, company) = send_raw(
        fx.addr,
        "POST",
        "/api/company",
        token,
        Some(&json!({ "name": "Acme Holdings", "industry": "Manufacturing" })),
    )
    .await;
    assert_eq!(status, 201);
    let company_id = id_of(&company);

    for name in ["Beta Corp", "Alpha Inc", "Gamma LLC"] {
        let (status, body) = send_raw(
            fx.addr,
            "POST",
            "/api/client",
            token,
            Some(&json!({ "name": name, "companyId": company_id, "email": "Ops@Example.com" })),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(body["data"]["companyId"], company_id.as_str());
        assert_eq!(body["data"]["email"], "ops@example.com");
        assert!(body["data"]["createdAt"].is_i64());
        assert!(body["data"].get("created_at").is_none());
    }

    let (status, body) = send_raw(
        fx.addr,
        "GET",
        "/api/client?orderBy=name&pageSize=2",
        token,
        None,
    )
    .await;
    assert_eq!(status, 200);
    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|client| client["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Alpha Inc", "Beta Corp"]);
    assert_eq!(
        body["meta"],
        json!({ "page": 1, "pageSize": 2, "total": 3, "totalPages": 2, "hasNext": true })
    );

    let (status, body) = send_raw(fx.addr, "GET", "/api/client?orderBy=secret", token, None).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "invalid_query");
}

#[tokio::test]
async fn update_and_delete_round_through_the_envelope() {
    let fx = start(ApiLimits::default()).await;
    let token = Some(fx.admin_token.as_str());

    let (_, created) = send_raw(
        fx.addr,
        "POST",
        "/api/client",
        token,
        Some(&json!({ "name": "Initech" })),
    )
    .await;
    let id = id_of(&created);

    let (status, body) = send_raw(
        fx.addr,
        "PATCH",
        &format!("/api/client/{id}"),
        token,
        Some(&json!({ "status": "inactive", "notes": "moved" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "inactive");
    assert_eq!(body["data"]["name"], "Initech");

    let (status, _) = send_raw(fx.addr, "DELETE", &format!("/api/client/{id}"), token, None).await;
    assert_eq!(status, 200);

    let (status, body) = send_raw(fx.addr, "GET", &format!("/api/client/{id}"), token, None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = send_raw(
        fx.addr,
        "POST",
        "/api/project",
        token,
        Some(&json!({ "clientId": id, "name": "Afterlife" })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "invalid_reference");

    let (status, body) = send_raw(fx.addr, "GET", "/api/client/not-a-uuid", token, None).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "invalid_query");

    let (status, body) = send_raw(fx.addr, "GET", "/api/audit?entity=clients", token, None).await;
    assert_eq!(status, 200);
    let mut actions: Vec<&str> = body["data"]
        .as_array()
        .expect("audit rows")
        .iter()
        .map(|row| row["action"].as_str().expect("action"))
        .collect();
    actions.sort_unstable();
    assert_eq!(actions, vec!["create", "delete", "update"]);
}

#[tokio::test]
async fn invalid_bodies_report_code_and_field() {
    let fx = start(ApiLimits::default()).await;
    let token = Some(fx.admin_token.as_str());

    let (status, body) = send_raw(
        fx.addr,
        "POST",
        "/api/employee",
        token,
        Some(&json!({ "firstName": "  ", "lastName": "Lovelace", "email": "ada@bizdesk.test" })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "validation_failed");
    assert_eq!(body["error"]["field"], "firstName");

    let (status, body) = send_raw(fx.addr, "POST", "/api/client", token, Some(&json!([1, 2]))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "invalid_body");

    let (status, body) = send_raw(
        fx.addr,
        "POST",
        "/api/project",
        token,
        Some(&json!({ "name": "Orphan", "clientId": RecordId::new_v4() })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "invalid_reference");

    let (status, body) = send_raw(
        fx.addr,
        "POST",
        "/api/employee",
        token,
        Some(&json!({ "firstName": "Dup", "lastName": "Grace", "email": "GRACE@bizdesk.test" })),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let fx = start(ApiLimits { max_body_bytes: 64 }).await;
    let (status, body) = send_raw(
        fx.addr,
        "POST",
        "/api/client",
        Some(fx.admin_token.as_str()),
        Some(&json!({ "name": "x".repeat(200) })),
    )
    .await;
    assert_eq!(status, 413);
    assert_eq!(body["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn employees_only_see_their_projects() {
    let fx = start(ApiLimits::default()).await;
    let admin = Some(fx.admin_token.as_str());
    let employee = Some(fx.employee_token.as_str());

    let (_, client) = send_raw(fx.addr, "POST", "/api/client", admin, Some(&json!({ "name": "Umbrella" }))).await;
    let client_id = id_of(&client);

    let mut project_ids = Vec::new();
    for name in ["Apollo", "Zephyr"] {
        let (status, project) = send_raw(
            fx.addr,
            "POST",
            "/api/project",
            admin,
            Some(&json!({ "name": name, "clientId": client_id })),
        )
        .await;
        assert_eq!(status, 201);
        project_ids.push(id_of(&project));
    }
    let (member_project, other_project) = (&project_ids[0], &project_ids[1]);

    let (status, body) = send_raw(
        fx.addr,
        "POST",
        &format!("/api/project/{member_project}/members"),
        admin,
        Some(&json!({ "employeeId": fx.employee_id, "role": "contributor" })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["employeeId"], fx.employee_id.to_string());

    let (status, body) = send_raw(fx.addr, "GET", "/api/project", employee, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Apollo");

    let (status, _) = send_raw(fx.addr, "GET", &format!("/api/project/{member_project}"), employee, None).await;
    assert_eq!(status, 200);

    let (status, body) = send_raw(fx.addr, "GET", &format!("/api/project/{other_project}"), employee, None).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, body) = send_raw(fx.addr, "GET", "/api/payment", employee, None).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, _) = send_raw(
        fx.addr,
        "POST",
        "/api/client",
        employee,
        Some(&json!({ "name": "Sneaky" })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send_raw(fx.addr, "GET", "/api/me", employee, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["role"], "employee");
    assert_eq!(body["data"]["user"]["employeeId"], fx.employee_id.to_string());

    let (status, _) = send_raw(
        fx.addr,
        "DELETE",
        &format!("/api/project/{member_project}/members/{}", fx.employee_id),
        admin,
        None,
    )
    .await;
    assert_eq!(status, 200);

    let (_, body) = send_raw(fx.addr, "GET", "/api/project", employee, None).await;
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn employee_communications_are_attributed_to_the_author() {
    let fx = start(ApiLimits::default()).await;
    let admin = Some(fx.admin_token.as_str());
    let employee = Some(fx.employee_token.as_str());

    let (_, client) = send_raw(fx.addr, "POST", "/api/client", admin, Some(&json!({ "name": "Wayne" }))).await;
    let client_id = id_of(&client);

    let (status, body) = send_raw(
        fx.addr,
        "POST",
        "/api/communication",
        employee,
        Some(&json!({
            "clientId": client_id,
            "employeeId": RecordId::new_v4(),
            "channel": "phone",
            "subject": "Kickoff",
        })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["employeeId"], fx.employee_id.to_string());

    send_raw(
        fx.addr,
        "POST",
        "/api/communication",
        admin,
        Some(&json!({ "clientId": client_id, "channel": "email", "subject": "Invoice" })),
    )
    .await;

    let (_, body) = send_raw(fx.addr, "GET", "/api/communication", employee, None).await;
    assert_eq!(body["meta"]["total"], 1);
    let (_, body) = send_raw(fx.addr, "GET", "/api/communication", admin, None).await;
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
    let fx = start(ApiLimits::default()).await;
    let (status, body) = send_raw(fx.addr, "GET", "/api/nothing-here", None, None).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "not_found");
}
