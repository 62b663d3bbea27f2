//! Device and game managers.
//!
//! Each manager validates a request, mutates the [`ConfigDocument`] through
//! a pure function (`*_in`), and persists via [`ConfigStore::commit`] so a
//! failed save leaves memory exactly as it was.
//!
//! [`ConfigStore::commit`]: crate::store::ConfigStore::commit

pub mod devices;
pub mod games;
pub mod integrity;

pub use devices::DeviceManager;
pub use games::GameManager;
pub use integrity::IntegrityReport;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::profile::{DeviceKey, DeviceProfile, KeyScheme};
use crate::store::ConfigDocument;

/// A device profile together with its package list, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEntry {
    pub key: DeviceKey,
    pub profile_key: String,
    pub profile: DeviceProfile,
    pub packages: Vec<String>,
}

/// All readable device profiles in file order.
pub fn list_devices(doc: &ConfigDocument, scheme: KeyScheme) -> Vec<DeviceEntry> {
    doc.entries()
        .filter_map(|(raw, value)| {
            let key = scheme.parse_profile_key(raw)?;
            match DeviceProfile::from_value(value) {
                Ok(profile) => Some(DeviceEntry {
                    packages: package_list(doc, scheme, &key),
                    profile_key: raw.to_string(),
                    key,
                    profile,
                }),
                Err(e) => {
                    warn!(key = %raw, error = %e, "Skipping unreadable device profile");
                    None
                }
            }
        })
        .collect()
}

/// Package identifiers stored for a device (empty when the list is missing).
pub fn package_list(doc: &ConfigDocument, scheme: KeyScheme, key: &DeviceKey) -> Vec<String> {
    scheme
        .packages_key(key)
        .and_then(|k| doc.get(&k))
        .map(strings)
        .unwrap_or_default()
}

/// Devices whose list contains `package`, in file order.
pub fn owners_of(doc: &ConfigDocument, scheme: KeyScheme, package: &str) -> Vec<DeviceKey> {
    doc.entries()
        .filter_map(|(raw, value)| {
            let key = scheme.parse_packages_key(raw)?;
            let owned = value
                .as_array()
                .is_some_and(|list| list.iter().any(|p| p.as_str() == Some(package)));
            owned.then_some(key)
        })
        .collect()
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
