//! Bootstrap — startup checks and store initialization.

use std::sync::Arc;

use insure_core::ServiceConfig;
use insure_kv::{KVStore, RedbStore};
use insure_sql::{SQLStore, SqliteStore};
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration before anything touches the disk.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if matches!(config.storage.sqlite_path.as_deref(), Some(p) if p.trim().is_empty()) {
        anyhow::bail!("Storage sqlite_path is set but empty.");
    }
    if matches!(config.storage.db_path.as_deref(), Some(p) if p.trim().is_empty()) {
        anyhow::bail!("Storage db_path is set but empty.");
    }
    if config.policy.max_upload_bytes == 0 {
        anyhow::bail!("Policy max_upload_bytes must be greater than zero.");
    }
    Ok(())
}

/// Open the relational and document stores.
pub fn open_stores(
    config: &ServiceConfig,
) -> anyhow::Result<(Arc<dyn SQLStore>, Arc<dyn KVStore>)> {
    if let Some(dir) = &config.data_dir {
        std::fs::create_dir_all(dir)?;
    }

    let sqlite_path = config.resolve_sqlite_path();
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&sqlite_path)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    info!("SQL store opened at {}", sqlite_path.display());

    let db_path = config.resolve_db_path();
    let kv: Arc<dyn KVStore> = Arc::new(
        RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("KV store opened at {}", db_path.display());

    Ok((sql, kv))
}
