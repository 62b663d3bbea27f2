//! Device identity profiles and the key layout that stores them.

pub mod android;
mod scheme;

pub use scheme::{DeviceKey, KeyScheme};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CopgError, Result};

/// Spoofed Android build properties presented to mapped games.
///
/// DEVICE and MODEL identify the profile and must be unique across the
/// config. Unknown fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DeviceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootloader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub android_version: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub sdk_int: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

/// Fields that may be stored as JSON numbers.
const NUMERIC_FIELDS: [&str; 2] = ["ANDROID_VERSION", "SDK_INT"];

impl DeviceProfile {
    pub fn new(device: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| CopgError::Persistence(format!("malformed device profile: {e}")))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Serialize, writing ANDROID_VERSION and SDK_INT back as numbers when
    /// `previous` stored them as numbers and the text is unchanged.
    pub fn to_value_over(&self, previous: Option<&Value>) -> Result<Value> {
        let mut value = self.to_value()?;
        let (Some(object), Some(previous)) = (value.as_object_mut(), previous.and_then(Value::as_object))
        else {
            return Ok(value);
        };
        for field in NUMERIC_FIELDS {
            let Some(Value::Number(old)) = previous.get(field) else {
                continue;
            };
            if let Some(slot) = object.get_mut(field) {
                if slot.as_str() == Some(old.to_string().as_str()) {
                    *slot = Value::Number(old.clone());
                }
            }
        }
        Ok(value)
    }

    /// Trim every field and turn blank optional fields into `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        fn clean(field: &mut Option<String>) {
            *field = field
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }

        self.device = self.device.trim().to_string();
        self.model = self.model.trim().to_string();
        for field in [
            &mut self.brand,
            &mut self.manufacturer,
            &mut self.fingerprint,
            &mut self.product,
            &mut self.board,
            &mut self.bootloader,
            &mut self.hardware,
            &mut self.id,
            &mut self.display,
            &mut self.host,
            &mut self.android_version,
            &mut self.sdk_int,
        ] {
            clean(field);
        }
        self
    }

    /// Required-field checks; uniqueness is checked by the device manager.
    pub fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            return Err(CopgError::validation("DEVICE", "device name is required"));
        }
        if self.model.trim().is_empty() {
            return Err(CopgError::validation("MODEL", "model is required"));
        }
        if let Some(sdk) = &self.sdk_int {
            if sdk.trim().parse::<u32>().is_err() {
                return Err(CopgError::validation(
                    "SDK_INT",
                    format!("'{sdk}' is not a number"),
                ));
            }
        }
        Ok(())
    }

    /// Overlay the fields set in `patch` onto this profile.
    ///
    /// Empty strings in `patch` clear optional fields.
    #[must_use]
    pub fn merged(mut self, patch: &ProfilePatch) -> Self {
        fn apply(target: &mut Option<String>, value: Option<&String>) {
            if let Some(v) = value {
                *target = if v.trim().is_empty() { None } else { Some(v.clone()) };
            }
        }

        if let Some(device) = &patch.device {
            self.device.clone_from(device);
        }
        if let Some(model) = &patch.model {
            self.model.clone_from(model);
        }
        apply(&mut self.brand, patch.brand.as_ref());
        apply(&mut self.manufacturer, patch.manufacturer.as_ref());
        apply(&mut self.fingerprint, patch.fingerprint.as_ref());
        apply(&mut self.product, patch.product.as_ref());
        apply(&mut self.board, patch.board.as_ref());
        apply(&mut self.bootloader, patch.bootloader.as_ref());
        apply(&mut self.hardware, patch.hardware.as_ref());
        apply(&mut self.id, patch.id.as_ref());
        apply(&mut self.display, patch.display.as_ref());
        apply(&mut self.host, patch.host.as_ref());

        let previous_release = self.android_version.clone();
        let previous_sdk = self.sdk_int.clone();
        apply(&mut self.android_version, patch.android_version.as_ref());
        apply(&mut self.sdk_int, patch.sdk_int.as_ref());

        match (&patch.android_version, &patch.sdk_int) {
            (Some(release), None) => {
                self.sdk_int =
                    android::prefill_sdk(previous_release.as_deref(), previous_sdk.as_deref(), release);
            }
            (None, Some(sdk)) => {
                self.android_version = android::prefill_release(
                    previous_sdk.as_deref(),
                    previous_release.as_deref(),
                    sdk,
                );
            }
            _ => {}
        }
        self
    }
}

/// Partial profile from a form or the command line; `None` means "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub brand: Option<String>,
    pub device: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub fingerprint: Option<String>,
    pub product: Option<String>,
    pub board: Option<String>,
    pub bootloader: Option<String>,
    pub hardware: Option<String>,
    pub id: Option<String>,
    pub display: Option<String>,
    pub host: Option<String>,
    pub android_version: Option<String>,
    pub sdk_int: Option<String>,
}
