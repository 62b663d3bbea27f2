//! Device Profile Manager: create, update (with key migration) and delete.

use serde_json::json;
use tracing::{debug, info};

use super::{DeviceEntry, list_devices};
use crate::error::{CopgError, Result};
use crate::profile::{DeviceKey, DeviceProfile, KeyScheme};
use crate::store::{ConfigBackend, ConfigDocument, ConfigStore};
use crate::undo::Removal;

/// CRUD over device profiles, persisting after every change.
pub struct DeviceManager<'a, B> {
    store: &'a mut ConfigStore<B>,
    scheme: KeyScheme,
}

impl<'a, B: ConfigBackend> DeviceManager<'a, B> {
    pub fn new(store: &'a mut ConfigStore<B>, scheme: KeyScheme) -> Self {
        Self { store, scheme }
    }

    pub fn list(&self) -> Vec<DeviceEntry> {
        list_devices(self.store.document(), self.scheme)
    }

    pub fn get(&self, key: &DeviceKey) -> Result<DeviceEntry> {
        self.list()
            .into_iter()
            .find(|e| &e.key == key)
            .ok_or_else(|| CopgError::NotFound {
                what: format!("device {key}"),
            })
    }

    /// Add a profile (and its empty package list); returns the new key.
    pub async fn create(&mut self, profile: DeviceProfile) -> Result<DeviceKey> {
        let scheme = self.scheme;
        let key = self
            .store
            .commit(|doc| create_in(doc, scheme, profile))
            .await?;
        info!(device = %key, "Device profile created");
        Ok(key)
    }

    /// Replace a profile; renames both paired keys in place when the DEVICE
    /// name changes. Returns the (possibly new) key.
    pub async fn update(&mut self, key: &DeviceKey, profile: DeviceProfile) -> Result<DeviceKey> {
        let scheme = self.scheme;
        let new_key = self
            .store
            .commit(|doc| update_in(doc, scheme, key, profile))
            .await?;
        info!(old = %key, new = %new_key, "Device profile updated");
        Ok(new_key)
    }

    /// Remove a profile and its package list, returning what is needed to undo.
    pub async fn delete(&mut self, key: &DeviceKey) -> Result<Removal> {
        let scheme = self.scheme;
        let removal = self
            .store
            .commit(|doc| delete_in(doc, scheme, key))
            .await?;
        info!(device = %key, "Device profile deleted");
        Ok(removal)
    }
}

fn prepare(scheme: KeyScheme, profile: DeviceProfile) -> Result<DeviceProfile> {
    let profile = profile.normalized();
    profile.validate()?;
    if !scheme.is_representable(&profile.device) {
        return Err(CopgError::validation(
            "DEVICE",
            format!("'{}' cannot be used as a device name (ends with DEVICE)", profile.device),
        ));
    }
    Ok(profile)
}

/// DEVICE and MODEL must not match any other profile (exact, case-sensitive).
pub(crate) fn check_unique(
    doc: &ConfigDocument,
    scheme: KeyScheme,
    profile: &DeviceProfile,
    editing: Option<&str>,
) -> Result<()> {
    for (raw, value) in doc.entries() {
        if scheme.parse_profile_key(raw).is_none() || Some(raw) == editing {
            continue;
        }
        let Ok(existing) = DeviceProfile::from_value(value) else {
            continue;
        };
        if existing.device == profile.device {
            return Err(CopgError::validation(
                "DEVICE",
                format!("'{}' is already used by {raw}", profile.device),
            ));
        }
        if existing.model == profile.model {
            return Err(CopgError::validation(
                "MODEL",
                format!("'{}' is already used by {raw}", profile.model),
            ));
        }
    }
    Ok(())
}

/// Insert a new profile into the document.
pub fn create_in(
    doc: &mut ConfigDocument,
    scheme: KeyScheme,
    profile: DeviceProfile,
) -> Result<DeviceKey> {
    let profile = prepare(scheme, profile)?;
    let key = scheme.key_for(&profile.device);
    let profile_key = scheme.profile_key(&key);
    let packages_key = scheme.packages_key(&key);

    // The single-profile layout overwrites its only slot.
    let editing = (scheme == KeyScheme::Single).then_some(profile_key.as_str());
    check_unique(doc, scheme, &profile, editing)?;

    if scheme == KeyScheme::Multi {
        for taken in std::iter::once(&profile_key).chain(packages_key.iter()) {
            if doc.contains_key(taken) {
                return Err(CopgError::validation(
                    "DEVICE",
                    format!("key {taken} already exists"),
                ));
            }
        }
    }

    debug!(key = %profile_key, "Inserting device profile");
    doc.insert(profile_key, profile.to_value()?);
    if let Some(packages_key) = packages_key {
        doc.insert(packages_key, json!([]));
    }
    Ok(key)
}

/// Replace an existing profile, migrating its keys if the DEVICE slug changed.
pub fn update_in(
    doc: &mut ConfigDocument,
    scheme: KeyScheme,
    key: &DeviceKey,
    profile: DeviceProfile,
) -> Result<DeviceKey> {
    let old_profile_key = scheme.profile_key(key);
    if !doc.contains_key(&old_profile_key) {
        return Err(CopgError::NotFound {
            what: format!("device {key}"),
        });
    }

    let profile = prepare(scheme, profile)?;
    check_unique(doc, scheme, &profile, Some(&old_profile_key))?;
    let value = profile.to_value_over(doc.get(&old_profile_key))?;
    let new_key = scheme.key_for(&profile.device);

    if &new_key == key {
        doc.insert(old_profile_key.clone(), value);
        ensure_packages_list(doc, scheme, key, &old_profile_key);
        return Ok(new_key);
    }

    let new_profile_key = scheme.profile_key(&new_key);
    let new_packages_key = scheme.packages_key(&new_key);
    for taken in std::iter::once(&new_profile_key).chain(new_packages_key.iter()) {
        if doc.contains_key(taken) {
            return Err(CopgError::validation(
                "DEVICE",
                format!("key {taken} already exists"),
            ));
        }
    }

    debug!(from = %old_profile_key, to = %new_profile_key, "Migrating device keys");
    doc.rename(&old_profile_key, &new_profile_key, Some(value))?;
    if let (Some(old_list), Some(new_list)) = (scheme.packages_key(key), new_packages_key) {
        if doc.contains_key(&old_list) {
            doc.rename(&old_list, &new_list, None)?;
        } else {
            ensure_packages_list(doc, scheme, &new_key, &new_profile_key);
        }
    }
    Ok(new_key)
}

/// Remove a profile and its list; the removal records both former indices.
pub fn delete_in(doc: &mut ConfigDocument, scheme: KeyScheme, key: &DeviceKey) -> Result<Removal> {
    let profile_key = scheme.profile_key(key);
    let label = doc
        .get(&profile_key)
        .and_then(|v| DeviceProfile::from_value(v).ok())
        .map_or_else(|| key.to_string(), |p| p.device);

    let profile_entry = doc.remove(&profile_key).ok_or_else(|| CopgError::NotFound {
        what: format!("device {key}"),
    })?;

    let mut entries = vec![profile_entry];
    if let Some(list_entry) = scheme.packages_key(key).and_then(|k| doc.remove(&k)) {
        entries.push(list_entry);
    }
    Ok(Removal::Entries {
        label: format!("device {label}"),
        entries,
    })
}

/// Give a profile an empty package list right after it if it has none.
fn ensure_packages_list(doc: &mut ConfigDocument, scheme: KeyScheme, key: &DeviceKey, profile_key: &str) {
    let Some(list_key) = scheme.packages_key(key) else {
        return;
    };
    if doc.contains_key(&list_key) {
        return;
    }
    let index = doc.index_of(profile_key).map_or(doc.len(), |i| i + 1);
    doc.insert_at(index, list_key, json!([]));
}
