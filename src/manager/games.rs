//! Game Association Manager: package ↔ device bindings.
//!
//! A package identifier is owned by at most one device at a time.

use serde_json::Value;
use tracing::{debug, info};

use super::owners_of;
use crate::error::{CopgError, Result};
use crate::profile::{DeviceKey, KeyScheme};
use crate::store::{ConfigBackend, ConfigDocument, ConfigStore};
use crate::undo::Removal;

/// CRUD over package lists, persisting after every change.
pub struct GameManager<'a, B> {
    store: &'a mut ConfigStore<B>,
    scheme: KeyScheme,
}

impl<'a, B: ConfigBackend> GameManager<'a, B> {
    pub fn new(store: &'a mut ConfigStore<B>, scheme: KeyScheme) -> Self {
        Self { store, scheme }
    }

    /// Device currently owning `package`, if any.
    pub fn owner(&self, package: &str) -> Option<DeviceKey> {
        owners_of(self.store.document(), self.scheme, package.trim())
            .into_iter()
            .next()
    }

    pub async fn create(&mut self, package: &str, device: &DeviceKey) -> Result<()> {
        let scheme = self.scheme;
        self.store
            .commit(|doc| create_in(doc, scheme, package, device))
            .await?;
        info!(package = package.trim(), device = %device, "Game added");
        Ok(())
    }

    pub async fn update(&mut self, old: &str, new: &str, device: &DeviceKey) -> Result<()> {
        let scheme = self.scheme;
        self.store
            .commit(|doc| update_in(doc, scheme, old, new, device))
            .await?;
        info!(old = old.trim(), new = new.trim(), device = %device, "Game updated");
        Ok(())
    }

    pub async fn delete(&mut self, package: &str, device: &DeviceKey) -> Result<Removal> {
        let scheme = self.scheme;
        let removal = self
            .store
            .commit(|doc| delete_in(doc, scheme, package, device))
            .await?;
        info!(package = package.trim(), device = %device, "Game removed");
        Ok(removal)
    }
}

fn require_lists(scheme: KeyScheme) -> Result<()> {
    if scheme.has_packages() {
        Ok(())
    } else {
        Err(CopgError::validation(
            "device",
            "the single-profile layout has no per-device game lists",
        ))
    }
}

fn require_package(package: &str) -> Result<&str> {
    let package = package.trim();
    if package.is_empty() {
        return Err(CopgError::validation("package", "package name is required"));
    }
    Ok(package)
}

/// Key of the device's list; the device profile itself must exist.
fn list_key(doc: &ConfigDocument, scheme: KeyScheme, device: &DeviceKey) -> Result<String> {
    let profile_key = scheme.profile_key(device);
    match scheme.packages_key(device) {
        Some(key) if doc.contains_key(&profile_key) => Ok(key),
        _ => Err(CopgError::validation(
            "device",
            format!("unknown device {device}"),
        )),
    }
}

fn list_mut<'d>(doc: &'d mut ConfigDocument, key: &str) -> Result<&'d mut Vec<Value>> {
    if !doc.contains_key(key) {
        doc.insert(key, Value::Array(Vec::new()));
    }
    doc.get_mut(key)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| CopgError::Persistence(format!("{key} is not a list")))
}

fn ensure_unowned(doc: &ConfigDocument, scheme: KeyScheme, package: &str) -> Result<()> {
    match owners_of(doc, scheme, package).first() {
        Some(owner) => Err(CopgError::validation(
            "package",
            format!("{package} is already assigned to {owner}"),
        )),
        None => Ok(()),
    }
}

/// Append `package` to `device`'s list.
pub fn create_in(
    doc: &mut ConfigDocument,
    scheme: KeyScheme,
    package: &str,
    device: &DeviceKey,
) -> Result<()> {
    require_lists(scheme)?;
    let package = require_package(package)?;
    let key = list_key(doc, scheme, device)?;
    ensure_unowned(doc, scheme, package)?;

    list_mut(doc, &key)?.push(Value::String(package.to_string()));
    Ok(())
}

/// Replace `old` with `new` under `device`.
///
/// On the same device the entry keeps its position; moving to another
/// device removes it from the old list and appends it to the new one.
pub fn update_in(
    doc: &mut ConfigDocument,
    scheme: KeyScheme,
    old: &str,
    new: &str,
    device: &DeviceKey,
) -> Result<()> {
    require_lists(scheme)?;
    let old = old.trim();
    let new = require_package(new)?;
    let target = list_key(doc, scheme, device)?;

    // The edited entry itself is the only owner `new` may already have.
    if new != old {
        ensure_unowned(doc, scheme, new)?;
    }

    let list = list_mut(doc, &target)?;
    if let Some(slot) = list.iter_mut().find(|p| p.as_str() == Some(old)) {
        debug!(old, new, device = %device, "Renaming game in place");
        *slot = Value::String(new.to_string());
        return Ok(());
    }

    for owner in owners_of(doc, scheme, old) {
        if let Some(key) = scheme.packages_key(&owner) {
            list_mut(doc, &key)?.retain(|p| p.as_str() != Some(old));
            debug!(package = old, from = %owner, "Game detached");
        }
    }
    list_mut(doc, &target)?.push(Value::String(new.to_string()));
    Ok(())
}

/// Remove `package` from `device`'s list, recording its index.
pub fn delete_in(
    doc: &mut ConfigDocument,
    scheme: KeyScheme,
    package: &str,
    device: &DeviceKey,
) -> Result<Removal> {
    require_lists(scheme)?;
    let package = package.trim();
    let not_found = || CopgError::NotFound {
        what: format!("game {package} on device {device}"),
    };
    let key = scheme.packages_key(device).ok_or_else(not_found)?;
    let list = doc
        .get_mut(&key)
        .and_then(Value::as_array_mut)
        .ok_or_else(not_found)?;
    let index = list
        .iter()
        .position(|p| p.as_str() == Some(package))
        .ok_or_else(not_found)?;
    list.remove(index);

    Ok(Removal::Package {
        device: device.clone(),
        package: package.to_string(),
        index,
    })
}
