//! Server-side configuration file.
//!
//! One TOML file per deployment context, e.g. `/etc/royalcare/prod.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use royalcare_core::ServiceConfig;

/// Directory searched for bare context names.
pub const CONFIG_DIR: &str = "/etc/royalcare";

/// Bootstrap administrator, created in the credential store if missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    /// argon2id PHC string (`royalcared hash-password`).
    #[serde(default)]
    pub password_hash: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: String,

    /// Credential database. Defaults to `{data_dir}/data.redb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,

    /// Device and fault database. Defaults to `{data_dir}/data.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<String>,

    /// Attachment directory. Defaults to `{data_dir}/uploads`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<String>,
}

impl StorageConfig {
    pub fn service_config(&self, listen: &str) -> ServiceConfig {
        ServiceConfig {
            data_dir: Some(PathBuf::from(&self.data_dir)),
            db_path: self.db_path.as_ref().map(PathBuf::from),
            sqlite_path: self.sqlite_path.as_ref().map(PathBuf::from),
            blob_dir: self.upload_dir.as_ref().map(PathBuf::from),
            listen: listen.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_upload_files")]
    pub max_upload_files: usize,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_upload_files: default_max_upload_files(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_upload_files() -> usize {
    maint::service::DEFAULT_MAX_UPLOAD_FILES
}

fn default_max_upload_bytes() -> usize {
    maint::DEFAULT_MAX_UPLOAD_BYTES
}

/// Complete server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: HttpConfig,
}

impl ServerConfig {
    /// Resolve a context name or path. Anything containing `/` or `.` is
    /// taken as a path; a bare name maps to `/etc/royalcare/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
