//! Undo across separate invocations through the on-disk journal.

use serde_json::json;

use crate::common::cli::CliRunner;
use crate::common::fixtures::{SAMPLE_CONFIG, TestWorkspace};

#[test]
fn undo_restores_deleted_device_in_next_run() {
    let ws = TestWorkspace::sample();
    let cli = CliRunner::new().in_workspace(&ws);

    let removed = cli.run_robot(&["device", "remove", "Pixel 8"]);
    removed
        .assert_success()
        .assert_json_field("/removed", &json!("device Pixel 8"));
    assert!(removed.json()["undo_expires_at"].is_string());
    assert_eq!(
        ws.config_keys(),
        ["PACKAGES_ROG_PHONE_8_DEVICE", "PACKAGES_ROG_PHONE_8"]
    );

    cli.run_robot(&["undo"])
        .assert_success()
        .assert_json_field("/restored", &json!("device Pixel 8"));
    assert_eq!(ws.read_config(), SAMPLE_CONFIG);

    // The journal is consumed.
    cli.run_robot(&["undo"]).assert_failure();
}

#[test]
fn only_the_latest_deletion_can_be_undone() {
    let ws = TestWorkspace::sample();
    let cli = CliRunner::new().in_workspace(&ws);

    cli.run_robot(&["game", "remove", "com.tencent.ig"]).assert_success();
    cli.run_robot(&["game", "remove", "com.miHoYo.GenshinImpact"])
        .assert_success();
    cli.run_robot(&["undo"])
        .assert_success()
        .assert_json_field("/restored", &json!("game com.miHoYo.GenshinImpact"));

    let config = ws.config_json();
    assert_eq!(config["PACKAGES_PIXEL_8"], json!([]));
    assert_eq!(
        config["PACKAGES_ROG_PHONE_8"],
        json!(["com.miHoYo.GenshinImpact", "com.activision.callofduty.shooter"])
    );
}

#[test]
fn expired_undo_is_refused() {
    let ws = TestWorkspace::sample();
    // Zero-length window: the deletion is final immediately.
    let settings = std::fs::read_to_string(ws.settings_path())
        .unwrap()
        .replace("undo_window_secs = 60", "undo_window_secs = 0");
    std::fs::write(ws.settings_path(), settings).unwrap();
    let cli = CliRunner::new().in_workspace(&ws);

    cli.run_robot(&["device", "remove", "ROG_PHONE_8"]).assert_success();
    let result = cli.run_robot(&["undo"]);
    result.assert_failure();
    assert!(
        result.stderr_json()["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Nothing to undo"))
    );
    assert_eq!(ws.config_keys(), ["PACKAGES_PIXEL_8_DEVICE", "PACKAGES_PIXEL_8"]);
}
