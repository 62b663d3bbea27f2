//! Robot mode JSON output implementation.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument, trace, warn};

use crate::activity::ActivityEntry;
use crate::backup::{BackupReport, RestoreReport};
use crate::error::CopgError;
use crate::manager::{DeviceEntry, IntegrityReport};
use crate::profile::DeviceKey;
use crate::undo::PendingUndo;

use super::{AndroidVersion, Output, RobotFormat};

/// JSON output implementation for scripts.
///
/// Every command prints exactly one JSON document to stdout; errors go to
/// stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match rendered {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize robot output");
                None
            }
        }
    }

    /// Output any serializable data as JSON to stdout.
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    fn output_json_stderr<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&json!({ "success": true, "message": message }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &CopgError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&json!({
            "error": true,
            "message": error.to_string(),
            "field": error.field(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    fn warning(&self, message: &str) {
        self.output_json_stderr(&json!({ "warning": true, "message": message }));
    }

    fn info(&self, message: &str) {
        self.output_json(&json!({ "info": true, "message": message }));
    }

    #[instrument(skip(self, devices), fields(count = devices.len()))]
    fn device_list(&self, devices: &[DeviceEntry]) {
        debug!("Robot: device_list");
        self.output_json(devices);
    }

    fn device_detail(&self, device: &DeviceEntry) {
        self.output_json(device);
    }

    fn device_saved(&self, key: &DeviceKey, previous: Option<&DeviceKey>) {
        self.output_json(&json!({
            "ok": true,
            "device": key,
            "renamed_from": previous,
        }));
    }

    fn game_saved(&self, package: &str, device: &DeviceKey) {
        self.output_json(&json!({ "ok": true, "package": package, "device": device }));
    }

    fn removed(&self, pending: &PendingUndo) {
        self.output_json(&json!({
            "ok": true,
            "removed": pending.label,
            "undo_token": pending.id,
            "undo_expires_at": pending.expires_at,
        }));
    }

    fn undone(&self, pending: &PendingUndo) {
        self.output_json(&json!({ "ok": true, "restored": pending.label }));
    }

    fn backup_written(&self, report: &BackupReport) {
        self.output_json(report);
    }

    fn restored(&self, report: &RestoreReport) {
        self.output_json(report);
    }

    fn integrity(&self, report: &IntegrityReport, repaired: Option<usize>) {
        self.output_json(&json!({
            "clean": report.is_clean(),
            "report": report,
            "repaired": repaired,
        }));
    }

    fn android_versions(&self, versions: &[AndroidVersion]) {
        self.output_json(versions);
    }

    fn activity(&self, entries: &[ActivityEntry]) {
        self.output_json(entries);
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        self.output_json(&json!({
            "version": version,
            "git_sha": git_sha,
            "build_time": build_time,
            "rustc": option_env!("VERGEN_RUSTC_SEMVER"),
            "target": option_env!("VERGEN_CARGO_TARGET_TRIPLE"),
        }));
    }
}
