//! COPG config manager - device profiles and game mappings for the COPG
//! Magisk module.
//!
//! Provides both human-friendly and script-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use console::style;
use serde::Serialize;
use tracing::{debug, warn};

use copg::activity::ActivityLog;
use copg::bridge::ProcessExecutor;
use copg::cli::{self, Cli, Commands, DeviceCommand, GameCommand};
use copg::error::{CopgError, Result};
use copg::logging;
use copg::manager::owners_of;
use copg::output::{AndroidVersion, Output, OutputMode};
use copg::profile::android::{ANDROID_RELEASES, release_for_sdk, sdk_for_release};
use copg::profile::{DeviceKey, DeviceProfile, ProfilePatch};
use copg::session::Session;
use copg::settings::{BackendKind, Settings};
use copg::store::{AnyBackend, ConfigStore, FileBackend, ShellBackend};
use copg::undo::{PendingUndo, UndoCoordinator, UndoJournal};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> Option<&'static str> {
        option_env!("VERGEN_GIT_SHA")
    }

    pub fn build_timestamp() -> Option<&'static str> {
        option_env!("VERGEN_BUILD_TIMESTAMP")
    }
}

type CliSession = Session<AnyBackend>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.use_json(), cli.verbose, cli.quiet);
    let output = OutputMode::from_cli(&cli).into_output();

    match run(&cli, output.as_ref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, out: &dyn Output) -> Result<()> {
    match &cli.command {
        None => {
            print_quick_start(cli);
            Ok(())
        }
        Some(Commands::Android(args)) => cmd_android(out, args),
        Some(Commands::Version) => {
            out.version_info(
                build_info::VERSION,
                build_info::git_sha(),
                build_info::build_timestamp(),
            );
            Ok(())
        }
        Some(Commands::Completions(args)) => {
            cmd_completions(args);
            Ok(())
        }
        Some(Commands::Log(args)) => {
            let settings = resolve_settings(cli)?;
            let entries = ActivityLog::read_recent(&settings.activity_path(), args.lines)?;
            out.activity(&entries);
            Ok(())
        }
        Some(command) => {
            let settings = resolve_settings(cli)?;
            let mut session = open_session(&settings, creates_config(command)).await?;
            let result = dispatch(command, &settings, &mut session, out).await;
            if let Err(e) = session.activity().append_to(&settings.activity_path()) {
                warn!(error = %e, "Could not persist activity log");
            }
            result
        }
    }
}

/// Commands that may run against a config file that does not exist yet.
fn creates_config(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Device(DeviceCommand::Add(_)) | Commands::Restore(_)
    )
}

/// Settings file, then `COPG_*` variables, then command-line flags.
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::discover(cli.settings.as_deref())?;
    settings.apply_env()?;
    if let Some(path) = &cli.config {
        settings.config_path.clone_from(path);
    }
    if let Some(scheme) = cli.scheme {
        settings.scheme = scheme.into();
    }
    if let Some(backend) = cli.backend {
        settings.backend = backend.into();
    }
    if let Some(shell) = &cli.shell {
        settings.shell.clone_from(shell);
    }
    settings.validate()?;
    debug!(?settings, "Effective settings");
    Ok(settings)
}

fn backend_for(settings: &Settings) -> AnyBackend {
    match settings.backend {
        BackendKind::Shell => {
            let mut backend = ShellBackend::new(ProcessExecutor::new(settings.shell.clone()));
            if let Some(context) = &settings.selinux_context {
                backend = backend.with_selinux_context(context.clone());
            }
            AnyBackend::Shell(backend)
        }
        BackendKind::File => AnyBackend::File(FileBackend),
    }
}

async fn open_session(settings: &Settings, allow_missing: bool) -> Result<CliSession> {
    let store = ConfigStore::new(backend_for(settings), settings.config_path.clone());
    let undo = UndoCoordinator::new(settings.undo_window());
    let mut session = Session::new(store, settings.scheme, undo);
    match session.load().await {
        Ok(()) => Ok(session),
        Err(CopgError::ConfigMissing { path }) if allow_missing => {
            debug!(path, "Config missing, starting empty");
            Ok(session)
        }
        Err(e) => Err(e),
    }
}

async fn dispatch(
    command: &Commands,
    settings: &Settings,
    session: &mut CliSession,
    out: &dyn Output,
) -> Result<()> {
    let journal = UndoJournal::new(settings.journal_path());
    match command {
        Commands::List => {
            out.device_list(&session.devices());
            Ok(())
        }
        Commands::Show(args) => {
            let key = session.scheme().resolve(&args.device);
            out.device_detail(&session.device(&key)?);
            Ok(())
        }
        Commands::Device(cmd) => cmd_device(session, &journal, out, cmd).await,
        Commands::Game(cmd) => cmd_game(session, &journal, out, cmd).await,
        Commands::Undo => cmd_undo(session, &journal, out).await,
        Commands::Backup(args) => {
            let dir = args.dir.as_deref().unwrap_or(&settings.backup_dir);
            let report = session.backup(dir, &Local::now()).await?;
            out.backup_written(&report);
            Ok(())
        }
        Commands::Restore(args) => {
            let report = session.restore(&args.file).await?;
            clear_journal(&journal);
            out.restored(&report);
            Ok(())
        }
        Commands::Check(args) => {
            let report = session.check();
            let repaired = if args.repair {
                Some(session.repair().await?)
            } else {
                None
            };
            out.integrity(&report, repaired);
            Ok(())
        }
        // Handled before a session is opened.
        Commands::Android(_) | Commands::Log(_) | Commands::Version | Commands::Completions(_) => {
            Ok(())
        }
    }
}

// === Devices ===

async fn cmd_device(
    session: &mut CliSession,
    journal: &UndoJournal,
    out: &dyn Output,
    cmd: &DeviceCommand,
) -> Result<()> {
    let scheme = session.scheme();
    match cmd {
        DeviceCommand::Add(fields) => {
            let profile = DeviceProfile::default().merged(&ProfilePatch::from(fields));
            let key = session.add_device(profile).await?;
            out.device_saved(&key, None);
        }
        DeviceCommand::Edit { target, fields } => {
            let key = scheme.resolve(target);
            let new_key = session.edit_device(&key, &ProfilePatch::from(fields)).await?;
            out.device_saved(&new_key, Some(&key));
        }
        DeviceCommand::Remove { target } => {
            let key = scheme.resolve(target);
            let pending = session.remove_device(&key).await?;
            remember_undo(journal, &pending, out);
            out.removed(&pending);
        }
    }
    Ok(())
}

// === Games ===

/// The device a mapped package currently belongs to.
fn current_owner(session: &CliSession, package: &str) -> Result<DeviceKey> {
    owners_of(session.store().document(), session.scheme(), package.trim())
        .into_iter()
        .next()
        .ok_or_else(|| CopgError::NotFound {
            what: format!("game {}", package.trim()),
        })
}

async fn cmd_game(
    session: &mut CliSession,
    journal: &UndoJournal,
    out: &dyn Output,
    cmd: &GameCommand,
) -> Result<()> {
    let scheme = session.scheme();
    match cmd {
        GameCommand::Add { package, device } => {
            let key = scheme.resolve(device);
            session.add_game(package, &key).await?;
            out.game_saved(package.trim(), &key);
        }
        GameCommand::Edit {
            package,
            rename,
            device,
        } => {
            let key = match device {
                Some(device) => scheme.resolve(device),
                None => current_owner(session, package)?,
            };
            let new = rename.as_deref().unwrap_or(package);
            session.edit_game(package, new, &key).await?;
            out.game_saved(new.trim(), &key);
        }
        GameCommand::Remove { package, device } => {
            let key = match device {
                Some(device) => scheme.resolve(device),
                None => current_owner(session, package)?,
            };
            let pending = session.remove_game(package, &key).await?;
            remember_undo(journal, &pending, out);
            out.removed(&pending);
        }
    }
    Ok(())
}

// === Undo ===

fn remember_undo(journal: &UndoJournal, pending: &PendingUndo, out: &dyn Output) {
    if let Err(e) = journal.store(pending) {
        warn!(error = %e, "Could not record undo journal");
        out.warning("This deletion cannot be undone from a later command");
    }
}

fn clear_journal(journal: &UndoJournal) {
    if let Err(e) = journal.clear() {
        warn!(error = %e, "Could not clear undo journal");
    }
}

async fn cmd_undo(session: &mut CliSession, journal: &UndoJournal, out: &dyn Output) -> Result<()> {
    if let Some(pending) = journal.load()? {
        session.undo_coordinator_mut().resume(pending);
    }
    match session.undo().await {
        Ok(pending) => {
            clear_journal(journal);
            out.undone(&pending);
            Ok(())
        }
        // A failed save leaves the removal on disk; keep the journal for a retry.
        Err(e) if e.is_persistence() => Err(e),
        Err(e) => {
            clear_journal(journal);
            Err(e)
        }
    }
}

// === Utilities ===

fn cmd_android(out: &dyn Output, args: &cli::AndroidArgs) -> Result<()> {
    let versions: Vec<AndroidVersion> = match (&args.release, args.sdk) {
        (Some(release), _) => {
            let sdk = sdk_for_release(release).ok_or_else(|| CopgError::NotFound {
                what: format!("Android release {}", release.trim()),
            })?;
            let release = release_for_sdk(sdk).unwrap_or(release.as_str());
            vec![AndroidVersion {
                release: release.to_string(),
                sdk,
            }]
        }
        (None, Some(sdk)) => {
            let release = release_for_sdk(sdk).ok_or_else(|| CopgError::NotFound {
                what: format!("SDK level {sdk}"),
            })?;
            vec![AndroidVersion {
                release: release.to_string(),
                sdk,
            }]
        }
        (None, None) => ANDROID_RELEASES
            .iter()
            .map(|&(release, sdk)| AndroidVersion {
                release: release.to_string(),
                sdk,
            })
            .collect(),
    };
    out.android_versions(&versions);
    Ok(())
}

fn cmd_completions(args: &cli::CompletionsArgs) {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "copg", &mut io::stdout());
}

// === Quick Start ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    browse: RobotBrowse,
    edit: RobotEdit,
    files: RobotFiles,
    output_modes: OutputModes,
    settings: &'static str,
}

#[derive(Serialize)]
struct RobotBrowse {
    list_devices: &'static str,
    show_device: &'static str,
    check: &'static str,
}

#[derive(Serialize)]
struct RobotEdit {
    add_device: &'static str,
    edit_device: &'static str,
    remove_device: &'static str,
    add_game: &'static str,
    move_game: &'static str,
    remove_game: &'static str,
    undo: &'static str,
}

#[derive(Serialize)]
struct RobotFiles {
    backup: &'static str,
    restore: &'static str,
    repair: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

fn print_quick_start(cli: &Cli) {
    if cli.use_json() {
        print_robot_quick_start(cli.use_compact_json());
    } else if !cli.quiet {
        print_human_quick_start();
    }
}

fn print_robot_quick_start(compact: bool) {
    let help = RobotQuickStart {
        tool: "copg",
        version: build_info::VERSION,
        description: "Device profile and game mapping editor for the COPG module config",
        browse: RobotBrowse {
            list_devices: "copg list --robot",
            show_device: "copg show <DEVICE> --robot",
            check: "copg check --robot",
        },
        edit: RobotEdit {
            add_device: "copg device add --device <NAME> --model <MODEL> [--release <ANDROID>]",
            edit_device: "copg device edit <DEVICE> [--device <NEW_NAME>] [--model <MODEL>]",
            remove_device: "copg device remove <DEVICE>",
            add_game: "copg game add <PACKAGE> --device <DEVICE>",
            move_game: "copg game edit <PACKAGE> [--rename <NEW>] [--device <DEVICE>]",
            remove_game: "copg game remove <PACKAGE>",
            undo: "copg undo",
        },
        files: RobotFiles {
            backup: "copg backup [--dir <DIR>]",
            restore: "copg restore <FILE>",
            repair: "copg check --repair",
        },
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
        },
        settings: "--settings <FILE> or COPG_CONFIG / COPG_SCHEME / COPG_BACKEND / COPG_SHELL",
    };
    let rendered = if compact {
        serde_json::to_string(&help)
    } else {
        serde_json::to_string_pretty(&help)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "Failed to render quick start"),
    }
}

fn print_human_quick_start() {
    println!(
        "{} {} - COPG config manager\n",
        style("copg").bold().cyan(),
        style(build_info::VERSION).dim()
    );
    let sections: [(&str, &[(&str, &str)]); 3] = [
        (
            "Browse",
            &[
                ("copg list", "Device profiles and their games"),
                ("copg show <DEVICE>", "One profile in full"),
                ("copg check", "Find orphaned lists and shared games"),
            ],
        ),
        (
            "Edit",
            &[
                ("copg device add --device <NAME> --model <MODEL>", "Add a profile"),
                ("copg game add <PACKAGE> -d <DEVICE>", "Map a game"),
                ("copg device remove <DEVICE>", "Delete a profile"),
                ("copg undo", "Revert the last deletion"),
            ],
        ),
        (
            "Files",
            &[
                ("copg backup", "Copy the config to the backup directory"),
                ("copg restore <FILE>", "Replace the config with a backup"),
            ],
        ),
    ];
    for (title, rows) in sections {
        println!("{}", style(title).bold().underlined());
        for (command, what) in rows {
            println!("  {:<50} {}", style(command).green(), style(what).dim());
        }
        println!();
    }
    println!(
        "Scripts: add {} for JSON output. Config: {}",
        style("--robot").yellow(),
        style(describe_default_config()).dim()
    );
}

fn describe_default_config() -> String {
    match Settings::discover(None) {
        Ok(settings) => settings.config_path,
        Err(e) => format!("settings error: {e}"),
    }
}
