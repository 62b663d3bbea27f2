//! One editing session: config store, managers, undo and activity log.
//!
//! Every action is recorded in the [`ActivityLog`], on success and on failure.

use chrono::{DateTime, TimeZone};
use tracing::{error, warn};

use crate::activity::ActivityLog;
use crate::backup::{self, ActionGate, BackupReport, RestoreReport};
use crate::error::{CopgError, Result};
use crate::manager::{DeviceEntry, DeviceManager, GameManager, IntegrityReport, list_devices};
use crate::profile::{DeviceKey, DeviceProfile, KeyScheme, ProfilePatch};
use crate::store::{ConfigBackend, ConfigStore};
use crate::undo::{Clock, PendingUndo, SystemClock, UndoCoordinator};

pub struct Session<B, C = SystemClock> {
    store: ConfigStore<B>,
    scheme: KeyScheme,
    undo: UndoCoordinator<C>,
    activity: ActivityLog,
    gate: ActionGate,
}

impl<B: ConfigBackend, C: Clock> Session<B, C> {
    pub fn new(store: ConfigStore<B>, scheme: KeyScheme, undo: UndoCoordinator<C>) -> Self {
        Self {
            store,
            scheme,
            undo,
            activity: ActivityLog::new(),
            gate: ActionGate::new(),
        }
    }

    pub fn store(&self) -> &ConfigStore<B> {
        &self.store
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn undo_coordinator(&self) -> &UndoCoordinator<C> {
        &self.undo
    }

    pub fn undo_coordinator_mut(&mut self) -> &mut UndoCoordinator<C> {
        &mut self.undo
    }

    /// Handle for guarding long-running actions from other tasks.
    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    fn record<T>(&mut self, action: &str, result: Result<T>, done: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.activity.info(done(value)),
            Err(e) => {
                if e.is_user_recoverable() {
                    warn!(action, error = %e, "Action rejected");
                } else {
                    error!(action, error = %e, "Action failed");
                }
                self.activity.error(format!("{action} failed: {e}"));
            }
        }
        result
    }

    pub async fn load(&mut self) -> Result<()> {
        let result = self.store.load().await;
        let keys = self.store.document().len();
        self.record("Load config", result, |_| format!("Loaded config ({keys} keys)"))
    }

    pub fn devices(&self) -> Vec<DeviceEntry> {
        list_devices(self.store.document(), self.scheme)
    }

    pub fn device(&self, key: &DeviceKey) -> Result<DeviceEntry> {
        self.devices()
            .into_iter()
            .find(|e| &e.key == key)
            .ok_or_else(|| CopgError::NotFound {
                what: format!("device {key}"),
            })
    }

    pub async fn add_device(&mut self, profile: DeviceProfile) -> Result<DeviceKey> {
        let result = DeviceManager::new(&mut self.store, self.scheme).create(profile).await;
        self.record("Add device", result, |key| format!("Saved device {key}"))
    }

    /// Apply `patch` on top of the stored profile.
    pub async fn edit_device(&mut self, key: &DeviceKey, patch: &ProfilePatch) -> Result<DeviceKey> {
        let result = match self.device(key) {
            Ok(entry) => {
                let profile = entry.profile.merged(patch);
                DeviceManager::new(&mut self.store, self.scheme)
                    .update(key, profile)
                    .await
            }
            Err(e) => Err(e),
        };
        self.record("Edit device", result, |new| {
            if new == key {
                format!("Updated device {key}")
            } else {
                format!("Renamed device {key} to {new}")
            }
        })
    }

    pub async fn remove_device(&mut self, key: &DeviceKey) -> Result<PendingUndo> {
        let result = match DeviceManager::new(&mut self.store, self.scheme).delete(key).await {
            Ok(removal) => Ok(self.undo.register(removal).clone()),
            Err(e) => Err(e),
        };
        self.record("Delete device", result, |p| format!("Deleted {}", p.label))
    }

    pub async fn add_game(&mut self, package: &str, device: &DeviceKey) -> Result<()> {
        let result = GameManager::new(&mut self.store, self.scheme)
            .create(package, device)
            .await;
        self.record("Add game", result, |_| format!("Added {} to {device}", package.trim()))
    }

    pub async fn edit_game(&mut self, old: &str, new: &str, device: &DeviceKey) -> Result<()> {
        let result = GameManager::new(&mut self.store, self.scheme)
            .update(old, new, device)
            .await;
        self.record("Edit game", result, |_| format!("Saved {} on {device}", new.trim()))
    }

    pub async fn remove_game(&mut self, package: &str, device: &DeviceKey) -> Result<PendingUndo> {
        let result = match GameManager::new(&mut self.store, self.scheme)
            .delete(package, device)
            .await
        {
            Ok(removal) => Ok(self.undo.register(removal).clone()),
            Err(e) => Err(e),
        };
        self.record("Delete game", result, |p| format!("Deleted {}", p.label))
    }

    pub async fn undo(&mut self) -> Result<PendingUndo> {
        let result = self.undo.undo(&mut self.store, self.scheme).await;
        self.record("Undo", result, |p| format!("Restored {}", p.label))
    }

    pub async fn backup<Tz: TimeZone>(&mut self, dir: &str, at: &DateTime<Tz>) -> Result<BackupReport>
    where
        Tz::Offset: std::fmt::Display,
    {
        let result = match self.gate.try_begin("backup") {
            Ok(_guard) => backup::backup(&self.store, dir, at).await,
            Err(e) => Err(e),
        };
        self.record("Backup", result, |r| format!("Backup saved to {}", r.path))
    }

    pub async fn restore(&mut self, source: &str) -> Result<RestoreReport> {
        let result = match self.gate.clone().try_begin("restore") {
            Ok(_guard) => backup::restore(&mut self.store, source).await,
            Err(e) => Err(e),
        };
        // A restore replaces everything the pending undo refers to.
        if result.is_ok() {
            self.undo.finalize();
        }
        self.record("Restore", result, |r| format!("Restored {} keys from {}", r.keys, r.source))
    }

    pub fn check(&self) -> IntegrityReport {
        IntegrityReport::check(self.store.document(), self.scheme)
    }

    /// Fix what [`check`](Self::check) reports and save.
    pub async fn repair(&mut self) -> Result<usize> {
        let scheme = self.scheme;
        let report = self.check();
        let result = if report.fixable() == 0 {
            Ok(0)
        } else {
            self.store.commit(|doc| Ok(report.repair(doc, scheme))).await
        };
        self.record("Repair", result, |n| format!("Repaired {n} problem(s)"))
    }
}
