//! Bootstrap: first-start checks and the configured administrator account.
//!
//! When royalcared starts:
//! 1. Verify the config has an admin password hash and a data dir. If not,
//!    refuse to start.
//! 2. Ensure the configured admin exists in the credential store.

use auth::service::KvCredentialStore;
use royalcare_core::Role;
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.admin.username.trim().is_empty() {
        anyhow::bail!("Admin username is empty in configuration.");
    }
    if config.admin.password_hash.is_empty() {
        anyhow::bail!(
            "No admin password hash found in configuration.\n\
             Run `royalcared hash-password <password>` and put the result in [admin] password_hash."
        );
    }
    if !config.admin.password_hash.starts_with("$argon2") {
        anyhow::bail!("Admin password hash is not an argon2 PHC string.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.server.max_upload_files == 0 {
        anyhow::bail!("server.max_upload_files must be at least 1.");
    }
    Ok(())
}

/// Ensure the configured admin account exists. An existing account is
/// left untouched, including its password.
pub fn ensure_admin_user(store: &KvCredentialStore, config: &ServerConfig) -> anyhow::Result<()> {
    let admin = &config.admin;
    let created = store
        .ensure_user_with_hash(
            admin.username.trim(),
            &admin.password_hash,
            Role::Admin,
            admin.department.clone(),
        )
        .map_err(|e| anyhow::anyhow!("failed to provision admin user: {}", e))?;
    if created {
        info!("Created admin user {}", admin.username);
    } else {
        info!("Admin user {} already exists", admin.username);
    }
    Ok(())
}
