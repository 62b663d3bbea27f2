//! CLI argument definitions.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::profile::{KeyScheme, ProfilePatch};
use crate::settings::BackendKind;

/// COPG config manager - device profiles and game mappings for the COPG module.
///
/// Robot Mode: Use --robot or --format json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "copg", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "COPG_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file (.toml, .yaml or .yml)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Config file path (overrides settings and COPG_CONFIG)
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Key layout of the config file
    #[arg(long, global = true, value_enum)]
    pub scheme: Option<SchemeArg>,

    /// How the config file is accessed
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Shell used by the shell backend (e.g. su, sh)
    #[arg(long, global = true)]
    pub shell: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemeArg {
    /// PACKAGES_<NAME>_DEVICE + PACKAGES_<NAME> per device
    Multi,
    /// One profile under the COPG key
    Single,
}

impl From<SchemeArg> for KeyScheme {
    fn from(value: SchemeArg) -> Self {
        match value {
            SchemeArg::Multi => Self::Multi,
            SchemeArg::Single => Self::Single,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    /// Through the privileged shell
    Shell,
    /// Local filesystem
    File,
}

impl From<BackendArg> for BackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Shell => Self::Shell,
            BackendArg::File => Self::File,
        }
    }
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Browsing ===
    /// List device profiles and their games
    List,

    /// Show one device profile in full
    Show(ShowArgs),

    // === Editing ===
    /// Add, edit or remove device profiles
    #[command(subcommand)]
    Device(DeviceCommand),

    /// Map, move or unmap games
    #[command(subcommand)]
    Game(GameCommand),

    /// Revert the last deletion (within the undo window)
    Undo,

    // === Whole-file operations ===
    /// Copy the config file into the backup directory
    Backup(BackupArgs),

    /// Replace the config file with a backup
    Restore(RestoreArgs),

    /// Check device/list pairing and game exclusivity
    Check(CheckArgs),

    // === Utilities ===
    /// Android release <-> SDK level lookup
    Android(AndroidArgs),

    /// Show recent activity
    Log(LogArgs),

    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Device name, slug or config key
    pub device: String,
}

#[derive(Subcommand, Debug)]
pub enum DeviceCommand {
    /// Add a device profile (DEVICE and MODEL are required)
    Add(ProfileArgs),

    /// Change fields of a device profile; changing DEVICE renames its keys
    Edit {
        /// Device name, slug or config key
        target: String,

        #[command(flatten)]
        fields: ProfileArgs,
    },

    /// Delete a device profile and its game list
    #[command(visible_alias = "rm")]
    Remove {
        /// Device name, slug or config key
        target: String,
    },
}

/// Device profile fields. An empty value clears an optional field.
#[derive(Args, Debug, Default, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    pub device: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub manufacturer: Option<String>,
    #[arg(long)]
    pub fingerprint: Option<String>,
    #[arg(long)]
    pub product: Option<String>,
    #[arg(long)]
    pub board: Option<String>,
    #[arg(long)]
    pub bootloader: Option<String>,
    #[arg(long)]
    pub hardware: Option<String>,
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub display: Option<String>,
    #[arg(long)]
    pub host: Option<String>,
    /// Android release (fills --sdk-int when omitted)
    #[arg(long, visible_alias = "release")]
    pub android_version: Option<String>,
    /// API level (fills --android-version when omitted)
    #[arg(long, visible_alias = "sdk")]
    pub sdk_int: Option<String>,
}

impl From<&ProfileArgs> for ProfilePatch {
    fn from(args: &ProfileArgs) -> Self {
        Self {
            brand: args.brand.clone(),
            device: args.device.clone(),
            manufacturer: args.manufacturer.clone(),
            model: args.model.clone(),
            fingerprint: args.fingerprint.clone(),
            product: args.product.clone(),
            board: args.board.clone(),
            bootloader: args.bootloader.clone(),
            hardware: args.hardware.clone(),
            id: args.id.clone(),
            display: args.display.clone(),
            host: args.host.clone(),
            android_version: args.android_version.clone(),
            sdk_int: args.sdk_int.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum GameCommand {
    /// Map a game package to a device
    Add {
        /// Package name (e.g. com.tencent.ig)
        package: String,

        /// Device name, slug or config key
        #[arg(long, short = 'd')]
        device: String,
    },

    /// Rename a mapped package and/or move it to another device
    Edit {
        /// Currently mapped package name
        package: String,

        /// New package name (defaults to the current one)
        #[arg(long)]
        rename: Option<String>,

        /// Target device (defaults to the current owner)
        #[arg(long, short = 'd')]
        device: Option<String>,
    },

    /// Unmap a game package
    #[command(visible_alias = "rm")]
    Remove {
        package: String,

        /// Device to remove it from (defaults to the current owner)
        #[arg(long, short = 'd')]
        device: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct BackupArgs {
    /// Directory to write the backup into (defaults to the settings' backup_dir)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RestoreArgs {
    /// Backup file to restore
    pub file: String,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Fix what can be fixed and save
    #[arg(long)]
    pub repair: bool,
}

#[derive(Parser, Debug)]
#[group(multiple = false)]
pub struct AndroidArgs {
    /// Release to look up (e.g. 12L)
    #[arg(long)]
    pub release: Option<String>,

    /// API level to look up (e.g. 34)
    #[arg(long)]
    pub sdk: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct LogArgs {
    /// Number of entries to show
    #[arg(long, short = 'n', default_value = "20")]
    pub lines: usize,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(id = "completion_shell", value_name = "SHELL")]
    pub shell: clap_complete::Shell,
}
