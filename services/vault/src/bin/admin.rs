//! Operator CLI for the vault service.
//!
//! ```bash
//! DATABASE_URL=postgres://... DEFAULT_ADMIN_PASSWORD=... vault-admin init-admin
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sea_orm::Database;
use tracing::info;

use vault_core::tracing::init_tracing;
use vault_server::error::VaultError;
use vault_server::infra::db::{DbRoleRepository, DbUserRepository};
use vault_server::usecase::admin::{InitAdminInput, InitAdminOutcome, InitAdminUseCase};

#[derive(Parser)]
#[command(about = "Vault operator commands")]
struct Args {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the first administrator, or promote an existing user, unless one exists
    InitAdmin {
        #[arg(long, env = "DEFAULT_ADMIN_USERNAME", default_value = "admin")]
        username: String,

        #[arg(long, env = "DEFAULT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, env = "DEFAULT_ADMIN_EMAIL")]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let db = Database::connect(&args.database_url)
        .await
        .context("failed to connect to database")?;

    match args.command {
        Command::InitAdmin {
            username,
            password,
            email,
        } => {
            let usecase = InitAdminUseCase {
                users: DbUserRepository { db: db.clone() },
                roles: DbRoleRepository { db },
            };
            let outcome = usecase
                .execute(InitAdminInput {
                    username: username.clone(),
                    password,
                    email,
                })
                .await
                .map_err(|e| match e {
                    VaultError::RoleNotFound => {
                        anyhow::anyhow!("admin role missing, apply migrations first")
                    }
                    other => anyhow::Error::new(other),
                })?;

            match outcome {
                InitAdminOutcome::AlreadyProvisioned => {
                    info!("an admin already exists, nothing to do")
                }
                InitAdminOutcome::Promoted { user_id } => {
                    info!(user_id, %username, "granted admin to existing user")
                }
                InitAdminOutcome::Created { user_id } => {
                    info!(user_id, %username, "created admin user")
                }
            }
        }
    }
    Ok(())
}
