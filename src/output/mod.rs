//! Output mode abstraction for robot and human output.

use serde::Serialize;

use crate::activity::ActivityEntry;
use crate::backup::{BackupReport, RestoreReport};
use crate::cli::Cli;
use crate::error::CopgError;
use crate::manager::{DeviceEntry, IntegrityReport};
use crate::profile::DeviceKey;
use crate::undo::PendingUndo;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// One row of the Android release table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidVersion {
    pub release: String,
    pub sdk: u32,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for scripts.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { color: bool, quiet: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub const fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human {
                color: !cli.no_color,
                quiet: cli.quiet,
            }
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color, quiet } => Box::new(HumanOutput::new(color, quiet)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &CopgError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Devices and games
    fn device_list(&self, devices: &[DeviceEntry]);
    fn device_detail(&self, device: &DeviceEntry);
    fn device_saved(&self, key: &DeviceKey, previous: Option<&DeviceKey>);
    fn game_saved(&self, package: &str, device: &DeviceKey);

    // Deletion and undo
    fn removed(&self, pending: &PendingUndo);
    fn undone(&self, pending: &PendingUndo);

    // Whole-file operations
    fn backup_written(&self, report: &BackupReport);
    fn restored(&self, report: &RestoreReport);
    fn integrity(&self, report: &IntegrityReport, repaired: Option<usize>);

    // Android release table
    fn android_versions(&self, versions: &[AndroidVersion]);

    // Activity log
    fn activity(&self, entries: &[ActivityEntry]);

    // Metadata
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>);
}
