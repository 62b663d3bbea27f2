//! Robot-mode end-to-end tests.

use serde_json::{Value, json};

use crate::common::cli::CliRunner;
use crate::common::fixtures::{SAMPLE_CONFIG, TestWorkspace};
use crate::common::init_test_logging;

#[test]
fn robot_quick_start_outputs_json() {
    init_test_logging();
    let result = CliRunner::new().run(&["--robot"]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json.get("tool").and_then(Value::as_str), Some("copg"));
    assert!(json.get("edit").is_some());
    assert!(json.get("output_modes").is_some());
}

#[test]
fn robot_list_reports_devices_with_games() {
    init_test_logging();
    let ws = TestWorkspace::sample();
    let result = CliRunner::new().in_workspace(&ws).run_robot(&["list"]);

    result
        .assert_success()
        .assert_json_array_len("", 2)
        .assert_json_field("/0/key", &json!("PIXEL_8"))
        .assert_json_field("/0/profile/MODEL", &json!("GKWS6"))
        .assert_json_field("/1/packages/0", &json!("com.miHoYo.GenshinImpact"));
}

#[test]
fn add_device_prefills_sdk_and_appends() {
    init_test_logging();
    let ws = TestWorkspace::sample();
    let cli = CliRunner::new().in_workspace(&ws);

    cli.run_robot(&[
        "device", "add", "--device", "Galaxy S24", "--model", "SM-S921B", "--release", "14",
    ])
    .assert_success()
    .assert_json_field("/device", &json!("GALAXY_S24"))
    .assert_json_field("/renamed_from", &Value::Null);

    let keys = ws.config_keys();
    assert_eq!(&keys[4..], ["PACKAGES_GALAXY_S24_DEVICE", "PACKAGES_GALAXY_S24"]);
    let config = ws.config_json();
    assert_eq!(config["PACKAGES_GALAXY_S24_DEVICE"]["SDK_INT"], json!("34"));
    assert_eq!(config["PACKAGES_GALAXY_S24"], json!([]));
}

#[test]
fn duplicate_model_fails_with_field() {
    init_test_logging();
    let ws = TestWorkspace::sample();
    let result = CliRunner::new()
        .in_workspace(&ws)
        .run_robot(&["device", "add", "--device", "Pixel 9", "--model", "GKWS6"]);

    result.assert_failure();
    let err = result.stderr_json();
    assert_eq!(err["error"], json!(true));
    assert_eq!(err["field"], json!("MODEL"));
    assert_eq!(err["recoverable"], json!(true));
    assert_eq!(ws.read_config(), SAMPLE_CONFIG);
}

#[test]
fn rename_device_moves_both_keys() {
    init_test_logging();
    let ws = TestWorkspace::sample();
    CliRunner::new()
        .in_workspace(&ws)
        .run_robot(&["device", "edit", "Pixel 8", "--device", "Pixel 8a"])
        .assert_success()
        .assert_json_field("/device", &json!("PIXEL_8A"))
        .assert_json_field("/renamed_from", &json!("PIXEL_8"));

    assert_eq!(
        ws.config_keys(),
        [
            "PACKAGES_PIXEL_8A_DEVICE",
            "PACKAGES_PIXEL_8A",
            "PACKAGES_ROG_PHONE_8_DEVICE",
            "PACKAGES_ROG_PHONE_8"
        ]
    );
}

#[test]
fn game_commands_find_the_owner() {
    init_test_logging();
    let ws = TestWorkspace::sample();
    let cli = CliRunner::new().in_workspace(&ws);

    cli.run_robot(&["game", "add", "com.pubg.krmobile", "-d", "PIXEL_8"])
        .assert_success();
    cli.run_robot(&["game", "edit", "com.tencent.ig", "-d", "rog phone 8"])
        .assert_success()
        .assert_json_field("/device", &json!("ROG_PHONE_8"));
    cli.run_robot(&["game", "remove", "com.pubg.krmobile"])
        .assert_success()
        .assert_json_field("/removed", &json!("game com.pubg.krmobile"));

    let config = ws.config_json();
    assert_eq!(config["PACKAGES_PIXEL_8"], json!([]));
    assert_eq!(config["PACKAGES_ROG_PHONE_8"][2], json!("com.tencent.ig"));

    let result = cli.run_robot(&["game", "remove", "com.not.mapped"]);
    result.assert_failure();
    assert!(
        result.stderr_json()["message"]
            .as_str()
            .is_some_and(|m| m.contains("com.not.mapped"))
    );
}

#[test]
fn missing_config_blocks_reads_but_not_first_device() {
    init_test_logging();
    let ws = TestWorkspace::without_config();
    let cli = CliRunner::new().in_workspace(&ws);

    let result = cli.run_robot(&["list"]);
    result.assert_failure();
    assert!(result.stderr_json()["suggestion"].is_string());

    cli.run_robot(&["device", "add", "--device", "Pixel 8", "--model", "GKWS6"])
        .assert_success();
    assert_eq!(ws.config_keys(), ["PACKAGES_PIXEL_8_DEVICE", "PACKAGES_PIXEL_8"]);
}

#[test]
fn check_and_repair() {
    init_test_logging();
    let ws = TestWorkspace::with_config(
        r#"{
  "PACKAGES_A_DEVICE": {"DEVICE": "A", "MODEL": "a"},
  "PACKAGES_B": ["com.x"]
}"#,
    );
    let cli = CliRunner::new().in_workspace(&ws);

    cli.run_robot(&["check"])
        .assert_success()
        .assert_json_field("/clean", &json!(false))
        .assert_json_field("/repaired", &Value::Null);
    cli.run_robot(&["check", "--repair"])
        .assert_success()
        .assert_json_field("/repaired", &json!(2));
    cli.run_robot(&["check"])
        .assert_success()
        .assert_json_field("/clean", &json!(true));
}

#[test]
fn backup_and_restore_commands() {
    init_test_logging();
    let ws = TestWorkspace::sample();
    let cli = CliRunner::new().in_workspace(&ws);

    let backup = cli.run_robot(&["backup"]);
    backup.assert_success();
    let path = backup.json()["path"].as_str().unwrap().to_string();
    assert_eq!(ws.backups().len(), 1);

    cli.run_robot(&["device", "remove", "ROG_PHONE_8"]).assert_success();
    cli.run_robot(&["restore", &path])
        .assert_success()
        .assert_json_field("/keys", &json!(4));
    assert_eq!(ws.read_config(), SAMPLE_CONFIG);
}

#[test]
fn android_lookup() {
    init_test_logging();
    let cli = CliRunner::new();
    cli.run_robot(&["android", "--release", "12l"])
        .assert_success()
        .assert_json_field("/0/release", &json!("12L"))
        .assert_json_field("/0/sdk", &json!(32));
    cli.run_robot(&["android"]).assert_success().assert_json_array_len("", 8);
    cli.run_robot(&["android", "--sdk", "28"]).assert_failure();
}

#[test]
fn activity_log_accumulates_across_runs() {
    init_test_logging();
    let ws = TestWorkspace::sample();
    let cli = CliRunner::new().in_workspace(&ws);

    cli.run_robot(&["game", "add", "com.pubg.krmobile", "-d", "Pixel 8"])
        .assert_success();
    cli.run_robot(&["game", "add", "com.pubg.krmobile", "-d", "ROG Phone 8"])
        .assert_failure();

    let log = cli.run_robot(&["log", "-n", "2"]);
    log.assert_success().assert_json_array_len("", 2);
    let entries = log.json();
    assert_eq!(entries[0]["level"], json!("info"));
    assert_eq!(entries[1]["level"], json!("error"));
    assert!(
        entries[1]["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Add game failed"))
    );
}
