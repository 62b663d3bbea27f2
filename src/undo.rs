//! Undo/Restore Coordinator.
//!
//! A deletion yields a [`Removal`] describing what was removed and where it
//! sat. The coordinator holds at most one of them for a fixed window; undoing
//! splices the data back at its original position and saves.
//!
//! The CLI runs one process per action, so the pending undo can also be
//! persisted to an [`UndoJournal`] with an absolute expiry.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CopgError, Result, ResultExt};
use crate::manager::devices::check_unique;
use crate::manager::owners_of;
use crate::profile::{DeviceKey, DeviceProfile, KeyScheme};
use crate::store::{ConfigBackend, ConfigDocument, ConfigStore, RemovedEntry};

/// Data captured by a delete, sufficient to put it back exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Removal {
    /// Whole config entries (a device profile and its list), in removal order.
    Entries {
        label: String,
        entries: Vec<RemovedEntry>,
    },
    /// One package taken out of a device's list.
    Package {
        device: DeviceKey,
        package: String,
        index: usize,
    },
}

impl Removal {
    /// Short human description ("device Pixel 8", "game com.foo").
    pub fn label(&self) -> String {
        match self {
            Self::Entries { label, .. } => label.clone(),
            Self::Package { package, .. } => format!("game {package}"),
        }
    }

    /// Put the removed data back at its recorded position.
    ///
    /// Fails without touching `doc` if the slot has been reused since.
    pub fn restore_into(&self, doc: &mut ConfigDocument, scheme: KeyScheme) -> Result<()> {
        match self {
            Self::Entries { entries, .. } => {
                if let Some(taken) = entries.iter().find(|e| doc.contains_key(&e.key)) {
                    return Err(CopgError::UndoUnavailable(format!(
                        "{} has been re-created since",
                        taken.key
                    )));
                }
                check_restorable(doc, scheme, entries)?;
                // Later removals were indexed against the already-shrunk
                // document, so reinsert last-removed first.
                for entry in entries.iter().rev() {
                    doc.insert_at(entry.index, entry.key.clone(), entry.value.clone());
                }
                Ok(())
            }
            Self::Package {
                device,
                package,
                index,
            } => {
                let list_key = scheme.packages_key(device).filter(|_| {
                    doc.contains_key(&scheme.profile_key(device))
                });
                let Some(list_key) = list_key else {
                    return Err(CopgError::UndoUnavailable(format!(
                        "device {device} no longer exists"
                    )));
                };
                if let Some(owner) = owners_of(doc, scheme, package).first() {
                    return Err(CopgError::UndoUnavailable(format!(
                        "{package} is now assigned to {owner}"
                    )));
                }
                if !doc.contains_key(&list_key) {
                    doc.insert(list_key.clone(), Value::Array(Vec::new()));
                }
                let list = doc
                    .get_mut(&list_key)
                    .and_then(Value::as_array_mut)
                    .ok_or_else(|| CopgError::Persistence(format!("{list_key} is not a list")))?;
                let at = (*index).min(list.len());
                list.insert(at, Value::String(package.clone()));
                Ok(())
            }
        }
    }
}

/// Refuse to restore entries whose profile or packages have since been
/// claimed by another device.
fn check_restorable(doc: &ConfigDocument, scheme: KeyScheme, entries: &[RemovedEntry]) -> Result<()> {
    for entry in entries {
        if scheme.parse_profile_key(&entry.key).is_some() {
            let Ok(profile) = DeviceProfile::from_value(&entry.value) else {
                continue;
            };
            check_unique(doc, scheme, &profile, None).map_err(|e| {
                CopgError::UndoUnavailable(format!("{} conflicts with the current config: {e}", entry.key))
            })?;
        } else if scheme.parse_packages_key(&entry.key).is_some() {
            let packages = entry.value.as_array().into_iter().flatten().filter_map(Value::as_str);
            for package in packages {
                if let Some(owner) = owners_of(doc, scheme, package).first() {
                    return Err(CopgError::UndoUnavailable(format!(
                        "{package} is now assigned to {owner}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// A deletion that can still be reverted until `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUndo {
    pub id: Uuid,
    pub label: String,
    pub removal: Removal,
    pub expires_at: DateTime<Utc>,
}

impl PendingUndo {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map_or_else(|p| *p.into_inner(), |now| *now)
    }
}

/// Tracks the single pending undo.
#[derive(Debug)]
pub struct UndoCoordinator<C = SystemClock> {
    pending: Option<PendingUndo>,
    window: TimeDelta,
    clock: C,
}

impl UndoCoordinator<SystemClock> {
    pub fn new(window: std::time::Duration) -> Self {
        Self::with_clock(window, SystemClock)
    }
}

impl<C: Clock> UndoCoordinator<C> {
    pub fn with_clock(window: std::time::Duration, clock: C) -> Self {
        Self {
            pending: None,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// Start the undo window for `removal`; any previous pending undo becomes
    /// permanent.
    pub fn register(&mut self, removal: Removal) -> &PendingUndo {
        if let Some(previous) = self.pending.take() {
            debug!(label = %previous.label, "Finalizing previous deletion");
        }
        let pending = PendingUndo {
            id: Uuid::new_v4(),
            label: removal.label(),
            removal,
            expires_at: self
                .clock
                .now()
                .checked_add_signed(self.window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        debug!(label = %pending.label, expires_at = %pending.expires_at, "Undo window opened");
        self.pending.insert(pending)
    }

    /// Adopt a pending undo recorded elsewhere (the on-disk journal).
    pub fn resume(&mut self, pending: PendingUndo) {
        self.pending = Some(pending);
    }

    /// The pending undo, if its window is still open.
    pub fn pending(&self) -> Option<&PendingUndo> {
        let now = self.clock.now();
        self.pending.as_ref().filter(|p| !p.is_expired(now))
    }

    /// Make the pending deletion permanent.
    pub fn finalize(&mut self) {
        self.pending = None;
    }

    /// Remove and return the pending undo if it is still within its window.
    pub fn take(&mut self) -> Result<PendingUndo> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| CopgError::UndoUnavailable("no deletion is pending".into()))?;
        if pending.is_expired(self.clock.now()) {
            debug!(label = %pending.label, "Undo window already closed");
            return Err(CopgError::UndoUnavailable(format!(
                "the undo window for {} has closed",
                pending.label
            )));
        }
        Ok(pending)
    }

    /// Revert the pending deletion and save.
    ///
    /// A failed save is reported but the restored data stays in memory.
    pub async fn undo<B: ConfigBackend>(
        &mut self,
        store: &mut ConfigStore<B>,
        scheme: KeyScheme,
    ) -> Result<PendingUndo> {
        let pending = self.take()?;
        store
            .apply_best_effort(|doc| pending.removal.restore_into(doc, scheme))
            .await?;
        info!(label = %pending.label, "Deletion undone");
        Ok(pending)
    }
}

/// On-disk record of the pending undo.
#[derive(Debug, Clone)]
pub struct UndoJournal {
    path: PathBuf,
}

impl UndoJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The recorded undo, or `None` if there is no journal.
    pub fn load(&self) -> Result<Option<PendingUndo>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&text) {
            Ok(pending) => Ok(Some(pending)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable undo journal");
                Ok(None)
            }
        }
    }

    pub fn store(&self, pending: &PendingUndo) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(pending)?;
        fs::write(&self.path, text).with_context(|| format!("writing {}", self.path.display()))?;
        debug!(path = %self.path.display(), id = %pending.id, "Undo journal written");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
