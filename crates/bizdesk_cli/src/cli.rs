use bizdesk_core::model::user::Role;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "bizdesk", version, about = "BizDesk business records backend")]
pub struct Cli {
    /// Config file. Defaults to ./bizdesk.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Open the database and apply pending migrations.
    Migrate,
    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Manage API tokens.
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },
    /// Print core linkage and version.
    Ping,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Use a throwaway in-memory database.
    #[arg(long)]
    pub ephemeral: bool,
    /// Create an admin with this email if missing and print a token for it.
    #[arg(long, value_name = "EMAIL")]
    pub bootstrap_admin: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum UserCommands {
    /// Create a user.
    Create(UserCreateArgs),
}

#[derive(Debug, Args)]
pub struct UserCreateArgs {
    #[arg(long)]
    pub email: String,
    /// Display name.
    #[arg(long)]
    pub name: String,
    /// admin, manager or employee.
    #[arg(long, value_parser = parse_role)]
    pub role: Role,
    /// Employee record linked to this user.
    #[arg(long)]
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Subcommand)]
pub enum TokenCommands {
    /// Issue a token for an existing user. The plaintext is printed once.
    Issue(TokenIssueArgs),
    /// Revoke a token by its plaintext value.
    Revoke(TokenRevokeArgs),
}

#[derive(Debug, Args)]
pub struct TokenIssueArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Debug, Args)]
pub struct TokenRevokeArgs {
    #[arg(long)]
    pub token: String,
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value.trim()).ok_or_else(|| {
        let known: Vec<&str> = Role::ALL.iter().map(|role| role.as_str()).collect();
        format!("unknown role `{value}`; expected one of {}", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, TokenCommands, UserCommands};
    use bizdesk_core::model::user::Role;
    use clap::Parser;

    #[test]
    fn parses_user_create() {
        let cli = Cli::parse_from([
            "bizdesk", "user", "create", "--email", "a@b.co", "--name", "Ada", "--role", "manager",
        ]);
        let Commands::User {
            action: UserCommands::Create(args),
        } = cli.command
        else {
            panic!("expected user create");
        };
        assert_eq!(args.role, Role::Manager);
        assert!(args.employee_id.is_none());
    }

    #[test]
    fn rejects_unknown_role() {
        let result = Cli::try_parse_from([
            "bizdesk", "user", "create", "--email", "a@b.co", "--name", "Ada", "--role", "owner",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["bizdesk", "token", "issue", "--email", "a@b.co", "--config", "x.toml"]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("x.toml")));
        assert!(matches!(
            cli.command,
            Commands::Token {
                action: TokenCommands::Issue(_)
            }
        ));
    }
}
