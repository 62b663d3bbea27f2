//! Mapping between device identities and config keys.
//!
//! All knowledge of the `PACKAGES_<SLUG>_DEVICE` / `PACKAGES_<SLUG>` naming
//! convention lives here; the managers only deal in [`DeviceKey`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

const PACKAGES_PREFIX: &str = "PACKAGES_";
const DEVICE_SUFFIX: &str = "_DEVICE";

/// Stable identifier of a device profile: the slug of its DEVICE name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceKey(String);

impl DeviceKey {
    /// Derive the identifier from a device name: trimmed, uppercased, runs
    /// of whitespace collapsed to `_`.
    pub fn from_device_name(name: &str) -> Self {
        let slug = name
            .split_whitespace()
            .map(str::to_uppercase)
            .collect::<Vec<_>>()
            .join("_");
        Self(slug)
    }

    /// Wrap an already-derived slug.
    pub fn from_slug(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How device profiles are laid out in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// One `PACKAGES_<SLUG>_DEVICE` profile plus one `PACKAGES_<SLUG>` list per device.
    #[default]
    Multi,
    /// A single profile under the fixed key `COPG`, no package lists.
    Single,
}

impl KeyScheme {
    /// Fixed key of the single-profile layout.
    pub const SINGLE_KEY: &'static str = "COPG";

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "multi" => Some(Self::Multi),
            "single" => Some(Self::Single),
            _ => None,
        }
    }

    /// Whether devices own package lists in this layout.
    pub const fn has_packages(self) -> bool {
        matches!(self, Self::Multi)
    }

    /// Identifier for the device with this DEVICE name.
    pub fn key_for(self, device_name: &str) -> DeviceKey {
        match self {
            Self::Multi => DeviceKey::from_device_name(device_name),
            Self::Single => DeviceKey::from_slug(Self::SINGLE_KEY),
        }
    }

    /// Config key holding the profile record.
    pub fn profile_key(self, key: &DeviceKey) -> String {
        match self {
            Self::Multi => format!("{PACKAGES_PREFIX}{key}{DEVICE_SUFFIX}"),
            Self::Single => Self::SINGLE_KEY.to_string(),
        }
    }

    /// Config key holding the package list, if the layout has one.
    pub fn packages_key(self, key: &DeviceKey) -> Option<String> {
        match self {
            Self::Multi => Some(format!("{PACKAGES_PREFIX}{key}")),
            Self::Single => None,
        }
    }

    /// Recognize a profile key.
    pub fn parse_profile_key(self, raw: &str) -> Option<DeviceKey> {
        match self {
            Self::Multi => raw
                .strip_prefix(PACKAGES_PREFIX)
                .and_then(|rest| rest.strip_suffix(DEVICE_SUFFIX))
                .filter(|slug| !slug.is_empty())
                .map(DeviceKey::from_slug),
            Self::Single => (raw == Self::SINGLE_KEY).then(|| DeviceKey::from_slug(raw)),
        }
    }

    /// Recognize a package-list key.
    pub fn parse_packages_key(self, raw: &str) -> Option<DeviceKey> {
        match self {
            Self::Multi => raw
                .strip_prefix(PACKAGES_PREFIX)
                .filter(|slug| !slug.is_empty() && !slug.ends_with(DEVICE_SUFFIX))
                .map(DeviceKey::from_slug),
            Self::Single => None,
        }
    }

    /// Whether a DEVICE name yields a slug this layout can store unambiguously.
    ///
    /// A slug ending in `_DEVICE` would make the package-list key look like
    /// another device's profile key.
    pub fn is_representable(self, device_name: &str) -> bool {
        match self {
            Self::Multi => {
                let slug = DeviceKey::from_device_name(device_name);
                !slug.as_str().is_empty() && !slug.as_str().ends_with(DEVICE_SUFFIX)
            }
            Self::Single => true,
        }
    }

    /// Resolve user input (full key, DEVICE name or slug) to a device key.
    pub fn resolve(self, input: &str) -> DeviceKey {
        if let Some(key) = self.parse_profile_key(input.trim()) {
            return key;
        }
        if let Some(key) = self.parse_packages_key(input.trim()) {
            return key;
        }
        self.key_for(input)
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Multi => "multi",
            Self::Single => "single",
        })
    }
}
