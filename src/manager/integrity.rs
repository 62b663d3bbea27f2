//! Consistency check for hand-edited config files.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::devices::check_unique;
use super::owners_of;
use crate::profile::{DeviceKey, DeviceProfile, KeyScheme};
use crate::store::ConfigDocument;

/// Problems found in a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Profiles with no package list.
    pub orphan_profiles: Vec<DeviceKey>,
    /// Package lists with no profile.
    pub orphan_lists: Vec<DeviceKey>,
    /// Packages listed under more than one device, with every owner.
    pub shared_packages: Vec<(String, Vec<DeviceKey>)>,
    /// Profile keys whose value is not a readable profile.
    pub unreadable: Vec<String>,
}

impl IntegrityReport {
    pub fn check(doc: &ConfigDocument, scheme: KeyScheme) -> Self {
        let mut report = Self::default();
        if !scheme.has_packages() {
            return report;
        }

        for (raw, value) in doc.entries() {
            if let Some(key) = scheme.parse_profile_key(raw) {
                if DeviceProfile::from_value(value).is_err() {
                    report.unreadable.push(raw.to_string());
                }
                let has_list = scheme.packages_key(&key).is_some_and(|k| doc.contains_key(&k));
                if !has_list {
                    report.orphan_profiles.push(key);
                }
            } else if let Some(key) = scheme.parse_packages_key(raw) {
                if !doc.contains_key(&scheme.profile_key(&key)) {
                    report.orphan_lists.push(key);
                }
                for package in value.as_array().into_iter().flatten().filter_map(Value::as_str) {
                    let seen = report.shared_packages.iter().any(|(p, _)| p == package);
                    if seen {
                        continue;
                    }
                    let owners = owners_of(doc, scheme, package);
                    if owners.len() > 1 {
                        report.shared_packages.push((package.to_string(), owners));
                    }
                }
            }
        }
        report
    }

    pub fn is_clean(&self) -> bool {
        self.orphan_profiles.is_empty()
            && self.orphan_lists.is_empty()
            && self.shared_packages.is_empty()
            && self.unreadable.is_empty()
    }

    /// Number of problems `repair` can fix.
    pub fn fixable(&self) -> usize {
        self.orphan_profiles.len() + self.orphan_lists.len() + self.shared_packages.len()
    }

    /// Restore pairing and package exclusivity; returns the number of fixes.
    ///
    /// Orphan profiles get an empty list right after them; orphan lists get a
    /// minimal profile named after their slug right before them; a shared
    /// package stays with its first owner. Unreadable profiles are left for
    /// the user.
    pub fn repair(&self, doc: &mut ConfigDocument, scheme: KeyScheme) -> usize {
        let mut fixed = 0;

        for key in &self.orphan_profiles {
            let (profile_key, Some(list_key)) = (scheme.profile_key(key), scheme.packages_key(key)) else {
                continue;
            };
            let at = doc.index_of(&profile_key).map_or(doc.len(), |i| i + 1);
            doc.insert_at(at, list_key, json!([]));
            fixed += 1;
        }

        for key in &self.orphan_lists {
            let Some(list_key) = scheme.packages_key(key) else {
                continue;
            };
            let placeholder = placeholder_profile(doc, scheme, key);
            let at = doc.index_of(&list_key).unwrap_or(doc.len());
            doc.insert_at(
                at,
                scheme.profile_key(key),
                json!({"DEVICE": placeholder.device, "MODEL": placeholder.model}),
            );
            fixed += 1;
        }

        for (package, owners) in &self.shared_packages {
            for owner in owners.iter().skip(1) {
                let list = scheme
                    .packages_key(owner)
                    .and_then(|k| doc.get_mut(&k))
                    .and_then(Value::as_array_mut);
                if let Some(list) = list {
                    list.retain(|p| p.as_str() != Some(package.as_str()));
                }
            }
            fixed += 1;
        }

        for raw in &self.unreadable {
            warn!(key = %raw, "Unreadable profile left untouched");
        }
        info!(fixed, "Config repaired");
        fixed
    }
}

/// Minimal profile for an orphan list, named after its slug. A numeric
/// suffix is added while the name clashes with another profile.
fn placeholder_profile(doc: &ConfigDocument, scheme: KeyScheme, key: &DeviceKey) -> DeviceProfile {
    let mut candidate = DeviceProfile::new(key.as_str(), key.as_str());
    // Each clash is with a distinct profile, so this ends within doc.len() tries.
    for n in 2..=doc.len() + 1 {
        if check_unique(doc, scheme, &candidate, None).is_ok() {
            break;
        }
        let name = format!("{}_{n}", key.as_str());
        candidate = DeviceProfile::new(name.clone(), name);
    }
    candidate
}
