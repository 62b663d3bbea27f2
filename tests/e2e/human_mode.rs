//! Human-mode output tests.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::assertions::{assert_contains_all, assert_no_ansi};
use crate::common::cli::CliRunner;
use crate::common::fixtures::TestWorkspace;

fn copg(ws: &TestWorkspace) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_copg"));
    cmd.arg("--settings")
        .arg(ws.settings_path())
        .env("RUST_LOG", "off")
        .env("NO_COLOR", "1")
        .env_remove("COPG_CONFIG")
        .env_remove("COPG_FORMAT");
    cmd
}

#[test]
fn quick_start_lists_commands() {
    let result = CliRunner::new().run(&[]);
    result.assert_success();
    assert_contains_all(&result.stdout, &["copg list", "copg device add", "copg undo", "--robot"]);
    assert_no_ansi(&result.stdout);
}

#[test]
fn list_shows_devices_and_games() {
    let ws = TestWorkspace::sample();
    copg(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Pixel 8")
                .and(predicate::str::contains("[ROG_PHONE_8]"))
                .and(predicate::str::contains("2 games"))
                .and(predicate::str::contains("- com.tencent.ig")),
        );
}

#[test]
fn show_prints_profile_fields() {
    let ws = TestWorkspace::sample();
    copg(&ws)
        .args(["show", "PACKAGES_PIXEL_8_DEVICE"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("MANUFACTURER")
                .and(predicate::str::contains("Google"))
                .and(predicate::str::contains("SDK_INT"))
                .and(predicate::str::is_match(r"ANDROID_VERSION\s+14").unwrap()),
        );
}

#[test]
fn removal_mentions_undo_deadline() {
    let ws = TestWorkspace::sample();
    CliRunner::new()
        .in_workspace(&ws)
        .run(&["device", "remove", "Pixel 8"])
        .assert_success()
        .assert_stdout_contains("Deleted device Pixel 8")
        .assert_stdout_matches(r"copg undo` before \d{2}:\d{2}:\d{2}");
}

#[test]
fn validation_error_names_the_field() {
    let ws = TestWorkspace::sample();
    copg(&ws)
        .args(["device", "add", "--device", "  ", "--model", "X1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[ERR]").and(predicate::str::contains("Field: DEVICE")));
}

#[test]
fn quiet_mode_prints_nothing_on_success() {
    let ws = TestWorkspace::sample();
    copg(&ws)
        .args(["-q", "game", "add", "com.pubg.krmobile", "-d", "Pixel 8"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn log_shows_timestamped_lines() {
    let ws = TestWorkspace::sample();
    let cli = CliRunner::new().in_workspace(&ws);
    cli.run(&["game", "add", "com.pubg.krmobile", "-d", "Pixel 8"])
        .assert_success();
    cli.run(&["log"])
        .assert_success()
        .assert_stdout_matches(r"(?m)^\[\d{2}:\d{2}:\d{2}\] Added com\.pubg\.krmobile to PIXEL_8$");
}

#[test]
fn completions_generate_for_bash() {
    Command::new(env!("CARGO_BIN_EXE_copg"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_copg"));
}
