//! Human-friendly output implementation using console styles.

use tracing::{debug, instrument, trace};

use crate::activity::{ActivityEntry, ActivityLevel};
use crate::backup::{BackupReport, RestoreReport};
use crate::error::CopgError;
use crate::manager::{DeviceEntry, IntegrityReport};
use crate::profile::DeviceKey;
use crate::theme::CopgTheme;
use crate::undo::PendingUndo;

use super::{AndroidVersion, Output};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    theme: CopgTheme,
    quiet: bool,
}

impl HumanOutput {
    #[instrument]
    pub fn new(color: bool, quiet: bool) -> Self {
        debug!("Creating HumanOutput");
        if !color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        Self {
            theme: CopgTheme::default(),
            quiet,
        }
    }

    fn field(&self, name: &str, value: &str) {
        println!("    {} {}", self.theme.label.apply_to(format!("{name:<16}")), value);
    }
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.theme.success.apply_to("[OK]"));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &CopgError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!();
        eprintln!("  {} {}", self.theme.error.apply_to("[ERR]"), self.theme.value.apply_to(error));
        if let Some(field) = error.field() {
            eprintln!("  {} {field}", self.theme.label.apply_to("Field:"));
        }
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!();
            eprintln!("  {}", self.theme.label.apply_to("Suggestion:"));
            eprintln!("  {}", self.theme.muted.apply_to(suggestion));
        }
        eprintln!();
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {message}", self.theme.warning.apply_to("[WARN]"));
    }

    fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.theme.accent.apply_to("[INFO]"));
    }

    #[instrument(skip(self, devices), fields(device_count = devices.len()))]
    fn device_list(&self, devices: &[DeviceEntry]) {
        if devices.is_empty() {
            self.warning("No device profiles configured");
            return;
        }
        println!("{}", self.theme.header.apply_to("Device profiles:"));
        for entry in devices {
            let games = match entry.packages.len() {
                0 => "no games".to_string(),
                1 => "1 game".to_string(),
                n => format!("{n} games"),
            };
            println!(
                "  {} {} {}",
                self.theme.value.apply_to(&entry.profile.device),
                self.theme.device_key.apply_to(format!("[{}]", entry.key)),
                self.theme.muted.apply_to(format!("{} · {games}", entry.profile.model)),
            );
            for package in &entry.packages {
                println!("    - {}", self.theme.package.apply_to(package));
            }
        }
    }

    fn device_detail(&self, device: &DeviceEntry) {
        let p = &device.profile;
        println!(
            "{} {}",
            self.theme.header.apply_to(&p.device),
            self.theme.device_key.apply_to(format!("[{}]", device.profile_key))
        );
        self.field("MODEL", &p.model);
        let optional = [
            ("BRAND", &p.brand),
            ("MANUFACTURER", &p.manufacturer),
            ("FINGERPRINT", &p.fingerprint),
            ("PRODUCT", &p.product),
            ("BOARD", &p.board),
            ("BOOTLOADER", &p.bootloader),
            ("HARDWARE", &p.hardware),
            ("ID", &p.id),
            ("DISPLAY", &p.display),
            ("HOST", &p.host),
            ("ANDROID_VERSION", &p.android_version),
            ("SDK_INT", &p.sdk_int),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                self.field(name, value);
            }
        }
        for (name, value) in &p.extra {
            self.field(name, &value.to_string());
        }
        if !device.packages.is_empty() {
            println!("  {}", self.theme.label.apply_to("Games:"));
            for package in &device.packages {
                println!("    - {}", self.theme.package.apply_to(package));
            }
        }
    }

    fn device_saved(&self, key: &DeviceKey, previous: Option<&DeviceKey>) {
        match previous {
            Some(old) if old != key => self.success(&format!("Device {old} renamed to {key}")),
            _ => self.success(&format!("Device {key} saved")),
        }
    }

    fn game_saved(&self, package: &str, device: &DeviceKey) {
        self.success(&format!("{package} mapped to {device}"));
    }

    fn removed(&self, pending: &PendingUndo) {
        self.success(&format!("Deleted {}", pending.label));
        println!(
            "  {}",
            self.theme.muted.apply_to(format!(
                "Run `copg undo` before {} to restore it",
                pending.expires_at.with_timezone(&chrono::Local).format("%H:%M:%S")
            ))
        );
    }

    fn undone(&self, pending: &PendingUndo) {
        self.success(&format!("Restored {}", pending.label));
    }

    fn backup_written(&self, report: &BackupReport) {
        self.success(&format!("Backup saved to {}", report.path));
        self.field("Size", &format!("{} bytes", report.bytes));
        self.field("SHA-256", &report.sha256);
    }

    fn restored(&self, report: &RestoreReport) {
        self.success(&format!("Restored {} keys from {}", report.keys, report.source));
    }

    fn integrity(&self, report: &IntegrityReport, repaired: Option<usize>) {
        if report.is_clean() {
            self.success("Config is consistent");
            return;
        }
        for key in &report.orphan_profiles {
            self.warning(&format!("Device {key} has no game list"));
        }
        for key in &report.orphan_lists {
            self.warning(&format!("Game list {key} has no device profile"));
        }
        for (package, owners) in &report.shared_packages {
            let owners: Vec<&str> = owners.iter().map(DeviceKey::as_str).collect();
            self.warning(&format!("{package} is mapped to {}", owners.join(", ")));
        }
        for raw in &report.unreadable {
            self.warning(&format!("{raw} is not a valid device profile"));
        }
        match repaired {
            Some(n) => self.success(&format!("Repaired {n} problem(s)")),
            None if report.fixable() > 0 => self.info("Run `copg check --repair` to fix"),
            None => {}
        }
    }

    fn android_versions(&self, versions: &[AndroidVersion]) {
        println!("{}", self.theme.header.apply_to("Android releases:"));
        for v in versions {
            println!(
                "  {:<6} {}",
                self.theme.value.apply_to(&v.release),
                self.theme.muted.apply_to(format!("SDK {}", v.sdk))
            );
        }
    }

    fn activity(&self, entries: &[ActivityEntry]) {
        if entries.is_empty() {
            self.info("No activity recorded");
            return;
        }
        for entry in entries {
            let line = entry.to_string();
            match entry.level {
                ActivityLevel::Info => println!("{}", self.theme.timestamp.apply_to(line)),
                ActivityLevel::Error => println!("{}", self.theme.error.apply_to(line)),
            }
        }
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        debug!(version, ?git_sha, ?build_time, "Outputting version info");
        println!("{}", self.theme.header.apply_to("copg"));
        self.field("Version", version);
        if let Some(sha) = git_sha {
            self.field("Git SHA", sha);
        }
        if let Some(time) = build_time {
            self.field("Built", time);
        }
        if let Some(rustc) = option_env!("VERGEN_RUSTC_SEMVER") {
            self.field("Rust", rustc);
        }
        if let Some(target) = option_env!("VERGEN_CARGO_TARGET_TRIPLE") {
            self.field("Target", target);
        }
    }
}
