//! Server configuration, read from `/etc/insure/<name>.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use policy::api::upload::DEFAULT_MAX_UPLOAD_BYTES;
use policy::model::MissingSupplement;

/// Directory searched for bare context names.
const CONFIG_DIR: &str = "/etc/insure";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding both database files.
    pub data_dir: String,

    /// SQLite file for core policy rows. Defaults to `{data_dir}/data.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<String>,

    /// redb file for supplements. Defaults to `{data_dir}/data.redb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// List policies without a supplement in the combined view.
    #[serde(default)]
    pub include_unsupplemented: bool,

    /// Largest request body accepted by `POST /upload`.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            include_unsupplemented: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl PolicyConfig {
    pub fn missing_supplement(&self) -> MissingSupplement {
        if self.include_unsupplemented {
            MissingSupplement::IncludeEmpty
        } else {
            MissingSupplement::Omit
        }
    }
}

impl ServerConfig {
    /// Resolve a context name or path to a config file.
    ///
    /// Anything containing `/` or `.` is taken as a path; a bare name maps
    /// to `/etc/insure/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{name_or_path}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Storage settings in the shape the store constructors take.
    pub fn service_config(&self, listen: &str) -> insure_core::ServiceConfig {
        insure_core::ServiceConfig {
            data_dir: Some(PathBuf::from(&self.storage.data_dir)),
            db_path: self.storage.db_path.as_ref().map(PathBuf::from),
            sqlite_path: self.storage.sqlite_path.as_ref().map(PathBuf::from),
            listen: listen.to_string(),
        }
    }
}
