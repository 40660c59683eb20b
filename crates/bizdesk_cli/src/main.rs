//! `bizdesk` binary.
//!
//! # Responsibility
//! - Load layered config and logging before touching the database.
//! - Run the HTTP API or one-shot admin commands (migrations, users, tokens).

use anyhow::Context;
use bizdesk_api::{ApiLimits, AppState};
use bizdesk_core::db::migrations::schema_version;
use bizdesk_core::model::user::{NewUser, Role};
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::user_repo::SqliteUserRepository;
use bizdesk_core::service::{AuthService, ServiceResult};
use bizdesk_core::{init_logging, open_db, open_db_in_memory, BizConfig};
use clap::Parser;
use rusqlite::Connection;
use tokio::net::TcpListener;

mod cli;

use cli::{Cli, Commands, ServeArgs, TokenCommands, UserCommands};

type Auth<'conn> = AuthService<SqliteUserRepository<'conn>, SqliteAuditRepository<'conn>>;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("bizdesk error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    load_dotenv()?;
    let cli = Cli::parse();

    if let Commands::Ping = cli.command {
        println!("bizdesk_core ping={}", bizdesk_core::ping());
        println!("bizdesk_core version={}", bizdesk_core::core_version());
        return Ok(());
    }

    let config = BizConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config.logging.level, config.logging.dir.as_deref())
        .context("failed to initialize logging")?;

    match cli.command {
        Commands::Serve(args) => serve(&config, args).await,
        Commands::Migrate => {
            let conn = open_db(&config.database.path)?;
            let version = schema_version(&conn).context("failed to read schema version")?;
            println!(
                "database {} at schema version {version}",
                config.database.path.display()
            );
            Ok(())
        }
        Commands::User {
            action: UserCommands::Create(args),
        } => {
            let mut conn = open_db(&config.database.path)?;
            let user = with_auth(&mut conn, |auth| {
                auth.create_user(
                    None,
                    NewUser {
                        email: args.email,
                        display_name: args.name,
                        role: args.role,
                        employee_id: args.employee_id,
                    },
                )
            })?;
            println!("created user {} ({}, {})", user.id, user.email, user.role);
            Ok(())
        }
        Commands::Token {
            action: TokenCommands::Issue(args),
        } => {
            let mut conn = open_db(&config.database.path)?;
            let token = with_auth(&mut conn, |auth| match auth.find_by_email(&args.email)? {
                Some(user) => auth
                    .issue_token(None, user.id, args.label.as_deref())
                    .map(Some),
                None => Ok(None),
            })?
            .with_context(|| format!("no active user with email `{}`", args.email))?;
            println!("{}", token.token);
            Ok(())
        }
        Commands::Token {
            action: TokenCommands::Revoke(args),
        } => {
            let mut conn = open_db(&config.database.path)?;
            with_auth(&mut conn, |auth| auth.revoke_token(None, &args.token))?;
            println!("token revoked");
            Ok(())
        }
        Commands::Ping => Ok(()),
    }
}

async fn serve(config: &BizConfig, args: ServeArgs) -> anyhow::Result<()> {
    let mut conn = if args.ephemeral {
        log::warn!("event=serve_start module=cli status=ephemeral");
        open_db_in_memory()?
    } else {
        open_db(&config.database.path)
            .with_context(|| format!("failed to open {}", config.database.path.display()))?
    };

    if let Some(email) = args.bootstrap_admin {
        let token = with_auth(&mut conn, |auth| {
            let admin = match auth.find_by_email(&email)? {
                Some(user) => user,
                None => auth.create_user(
                    None,
                    NewUser {
                        display_name: "Administrator".to_string(),
                        email,
                        role: Role::Admin,
                        employee_id: None,
                    },
                )?,
            };
            auth.issue_token(None, admin.id, Some("bootstrap"))
        })?;
        println!("admin token for {}: {}", token.user.email, token.token);
    }

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let state = AppState::new(
        conn,
        ApiLimits {
            max_body_bytes: config.server.max_body_bytes,
        },
    );
    bizdesk_api::serve(listener, state).await?;
    Ok(())
}

/// Runs `f` against the auth service inside one transaction.
fn with_auth<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Auth<'_>) -> ServiceResult<T>,
) -> anyhow::Result<T> {
    let tx = conn.transaction()?;
    let value = {
        let auth = AuthService::new(SqliteUserRepository::new(&tx), SqliteAuditRepository::new(&tx));
        f(&auth)?
    };
    tx.commit()?;
    Ok(value)
}

fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("failed to read .env"),
    }
}
