//! Whole-file backup and restore.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{CopgError, Result};
use crate::store::{ConfigBackend, ConfigDocument, ConfigStore};

/// Result of a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
}

/// Result of a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub source: String,
    pub keys: usize,
}

/// `COPG_backup_<YYYYmmdd_HHMMSS>.json`
pub fn backup_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("COPG_backup_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn join(dir: &str, name: &str) -> String {
    format!("{}/{name}", dir.trim_end_matches('/'))
}

/// Copy the config file as it is on disk into `dir`.
pub async fn backup<B: ConfigBackend, Tz: TimeZone>(
    store: &ConfigStore<B>,
    dir: &str,
    at: &DateTime<Tz>,
) -> Result<BackupReport>
where
    Tz::Offset: std::fmt::Display,
{
    let text = store.backend().read(store.path()).await?;
    let path = join(dir, &backup_file_name(at));
    debug!(from = store.path(), to = %path, "Writing backup");
    store.backend().write(&path, &text).await?;

    let report = BackupReport {
        sha256: sha256_hex(text.as_bytes()),
        bytes: text.len(),
        path,
    };
    info!(path = %report.path, sha256 = %report.sha256, "Backup written");
    Ok(report)
}

/// Replace the config with the contents of `source` and save.
///
/// The source must hold a JSON object. If the save fails the previous
/// document is put back in memory.
pub async fn restore<B: ConfigBackend>(store: &mut ConfigStore<B>, source: &str) -> Result<RestoreReport> {
    let text = store.backend().read(source).await.map_err(|e| match e {
        CopgError::ConfigMissing { path } => CopgError::NotFound {
            what: format!("backup file {path}"),
        },
        other => other,
    })?;
    let doc = ConfigDocument::from_json_str(&text)?;
    let keys = doc.len();

    let before = store.snapshot();
    store.restore(doc);
    if let Err(e) = store.save().await {
        warn!(error = %e, "Restore failed to save, keeping previous config");
        store.restore(before);
        return Err(e);
    }
    info!(source, keys, "Config restored from backup");
    Ok(RestoreReport {
        source: source.to_string(),
        keys,
    })
}

/// Guards one long-running user action against re-entrant triggering.
///
/// Not a lock over the config store; it only refuses a second trigger while
/// the first is running.
#[derive(Debug, Clone, Default)]
pub struct ActionGate {
    busy: Arc<AtomicBool>,
}

impl ActionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the gate for `action`; released when the guard drops.
    pub fn try_begin(&self, action: &str) -> Result<ActionGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CopgError::Busy(action.to_string()));
        }
        debug!(action, "Action started");
        Ok(ActionGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

#[derive(Debug)]
pub struct ActionGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
