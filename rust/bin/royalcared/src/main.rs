//! `royalcared`: the RoyalCare maintenance API server.
//!
//! Usage:
//!   royalcared -c <context-name-or-path> [--listen <addr>]
//!   royalcared -c <context> user add --username U --password P [--role admin|user] [--department D]
//!   royalcared -c <context> user passwd --username U --password P
//!   royalcared -c <context> user list
//!   royalcared hash-password <password>
//!
//! The context name resolves to `/etc/royalcare/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use axum::Router;
use clap::{Parser, Subcommand};
use tracing::info;

use auth::model::NewUser;
use auth::service::KvCredentialStore;
use auth::{AuthModule, HeaderClaims};
use maint::service::MaintService;
use maint::MaintModule;
use royalcare_core::{Module, Role, ServiceConfig};

use config::ServerConfig;

/// RoyalCare maintenance API server.
#[derive(Parser, Debug)]
#[command(name = "royalcared", about = "RoyalCare maintenance API server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Listen address (overrides `server.listen`).
    #[arg(long = "listen")]
    listen: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage login accounts.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Print an argon2id hash for `[admin] password_hash`.
    HashPassword { password: String },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a login account.
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// `admin` or `user`.
        #[arg(long, default_value = "user")]
        role: String,
        #[arg(long)]
        department: Option<String>,
    },
    /// Replace a login account's password.
    Passwd {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// List login accounts.
    List,
}

/// Embedded stores opened from the server configuration.
struct Stores {
    kv: Arc<dyn royalcare_kv::KVStore>,
    sql: Arc<dyn royalcare_sql::SQLStore>,
    blob: Arc<dyn royalcare_blob::BlobStore>,
    core: ServiceConfig,
}

fn open_stores(server_config: &ServerConfig) -> anyhow::Result<Stores> {
    std::fs::create_dir_all(&server_config.storage.data_dir)?;
    let core: ServiceConfig = server_config
        .storage
        .service_config(&server_config.server.listen);

    let kv: Arc<dyn royalcare_kv::KVStore> = Arc::new(
        royalcare_kv::RedbStore::open(&core.resolve_db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    let sql: Arc<dyn royalcare_sql::SQLStore> = Arc::new(
        royalcare_sql::SqliteStore::open(&core.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    let blob: Arc<dyn royalcare_blob::BlobStore> = Arc::new(
        royalcare_blob::FileStore::open(&core.resolve_blob_dir())
            .map_err(|e| anyhow::anyhow!("failed to open blob store: {}", e))?,
    );

    Ok(Stores { kv, sql, blob, core })
}

/// Open storage, bootstrap the admin account and assemble the router.
fn build_app(server_config: &ServerConfig) -> anyhow::Result<Router> {
    bootstrap::verify_config(server_config)?;
    let stores = open_stores(server_config)?;

    let credentials = Arc::new(KvCredentialStore::new(Arc::clone(&stores.kv)));
    bootstrap::ensure_admin_user(&credentials, server_config)?;

    let auth_module = AuthModule::new(credentials);
    info!("Auth module initialized");

    let service = MaintService::new(Arc::clone(&stores.sql), Arc::clone(&stores.blob))
        .map_err(|e| anyhow::anyhow!("failed to initialize maintenance service: {}", e))?
        .with_max_upload_files(server_config.server.max_upload_files);
    let maint_module = MaintModule::new(Arc::new(service), Arc::new(HeaderClaims))
        .with_max_upload_bytes(server_config.server.max_upload_bytes);
    info!("Maint module initialized");

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (maint_module.name(), maint_module.routes()),
    ];
    Ok(routes::build_router(module_routes, &stores.core.resolve_blob_dir()))
}

fn load_config(name: Option<&str>) -> anyhow::Result<ServerConfig> {
    let name = name.ok_or_else(|| anyhow::anyhow!("missing -c <context>"))?;
    let config_path = ServerConfig::resolve_path(name);
    info!("Loading configuration from {}", config_path.display());
    ServerConfig::load(&config_path)
}

fn run_user_command(server_config: &ServerConfig, action: UserCommand) -> anyhow::Result<()> {
    bootstrap::verify_config(server_config)?;
    let stores = open_stores(server_config)?;
    let store = KvCredentialStore::new(stores.kv);
    match action {
        UserCommand::Add {
            username,
            password,
            role,
            department,
        } => {
            let identity = store
                .add_user(NewUser {
                    username,
                    password,
                    role: Role::parse(&role),
                    department,
                })
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{}", serde_json::to_string_pretty(&identity)?);
        }
        UserCommand::Passwd { username, password } => {
            store
                .set_password(&username, &password)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("Password updated for {}", username);
        }
        UserCommand::List => {
            let users = store.list_users().map_err(|e| anyhow::anyhow!("{}", e))?;
            for user in users {
                println!(
                    "{}\t{}\t{}",
                    user.username,
                    user.role.as_str(),
                    user.department.unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::HashPassword { password }) => {
            let hash = auth::service::password::hash_password(&password)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{}", hash);
            return Ok(());
        }
        Some(Command::User { action }) => {
            let server_config = load_config(cli.config.as_deref())?;
            return run_user_command(&server_config, action);
        }
        None => {}
    }

    let server_config = load_config(cli.config.as_deref())?;
    let app = build_app(&server_config)?;

    let listen = cli
        .listen
        .unwrap_or_else(|| server_config.server.listen.clone());
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("RoyalCare server listening on {}", listen);
    axum::serve(listener, app).await?;

    Ok(())
}
