//! Loading and saving the config through the shell and file backends.

use copg::bridge::mock::MockExecutor;
use copg::error::CopgError;
use copg::manager::DeviceManager;
use copg::profile::{DeviceProfile, KeyScheme};
use copg::store::{ConfigStore, FileBackend, ShellBackend};
use serde_json::json;

use crate::common::assertions::assert_key_order;
use crate::common::fixtures::{SAMPLE_CONFIG, TestWorkspace};
use crate::common::init_test_logging;

const PATH: &str = "/data/adb/modules/COPG/config.json";

fn shell_store(mock: &MockExecutor) -> ConfigStore<ShellBackend<MockExecutor>> {
    ConfigStore::new(ShellBackend::new(mock.clone()), PATH)
}

#[tokio::test]
async fn unchanged_config_saves_byte_identical() {
    init_test_logging();
    let mock = MockExecutor::new().with_file(PATH, SAMPLE_CONFIG);
    let mut store = shell_store(&mock);
    store.load().await.unwrap();
    store.save().await.unwrap();

    assert_eq!(mock.file(PATH).as_deref(), Some(SAMPLE_CONFIG));
    mock.assert_ran("cat ");
    mock.assert_ran("printf '%s' ");
}

#[tokio::test]
async fn untouched_values_keep_their_json_types() {
    init_test_logging();
    let config = r#"{
  "PACKAGES_OLD_DEVICE": {
    "DEVICE": "Old",
    "MODEL": "O1",
    "SDK_INT": 30,
    "CUSTOM_FLAG": true
  },
  "PACKAGES_OLD": []
}
"#;
    let mock = MockExecutor::new().with_file(PATH, config);
    let mut store = shell_store(&mock);
    store.load().await.unwrap();

    DeviceManager::new(&mut store, KeyScheme::Multi)
        .create(DeviceProfile::new("New", "N1"))
        .await
        .unwrap();

    let saved: serde_json::Value = serde_json::from_str(&mock.file(PATH).unwrap()).unwrap();
    assert_eq!(saved["PACKAGES_OLD_DEVICE"]["SDK_INT"], json!(30));
    assert_eq!(saved["PACKAGES_OLD_DEVICE"]["CUSTOM_FLAG"], json!(true));
    let keys: Vec<&String> = saved.as_object().unwrap().keys().collect();
    assert_key_order(
        &keys,
        &["PACKAGES_OLD_DEVICE", "PACKAGES_OLD", "PACKAGES_NEW_DEVICE", "PACKAGES_NEW"],
    );
}

#[tokio::test]
async fn shell_write_relabels_when_context_configured() {
    let mock = MockExecutor::new().with_file(PATH, "{}\n");
    let backend = ShellBackend::new(mock.clone()).with_selinux_context("u:object_r:system_file:s0");
    let mut store = ConfigStore::new(backend, PATH);
    store.load().await.unwrap();
    store.save().await.unwrap();
    mock.assert_ran("chcon ");

    // A failed relabel does not fail the save.
    mock.fail_matching("chcon", "chcon: Operation not permitted");
    store.save().await.unwrap();
}

#[tokio::test]
async fn invalid_json_starts_empty_and_reports() {
    let mock = MockExecutor::new().with_file(PATH, "{ not json");
    let mut store = shell_store(&mock);
    let err = store.load().await.unwrap_err();
    assert!(err.is_persistence(), "unexpected error: {err}");
    assert!(store.document().is_empty());
}

#[tokio::test]
async fn missing_file_is_config_missing_on_both_backends() {
    let mock = MockExecutor::new();
    let err = shell_store(&mock).load().await.unwrap_err();
    assert!(matches!(err, CopgError::ConfigMissing { .. }));

    let ws = TestWorkspace::without_config();
    let mut store = ConfigStore::new(FileBackend, ws.config_str());
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, CopgError::ConfigMissing { .. }));
}

#[tokio::test]
async fn file_backend_creates_config_on_first_save() {
    let ws = TestWorkspace::without_config();
    let nested = ws.path().join("module").join("config.json");
    let mut store = ConfigStore::new(FileBackend, nested.display().to_string());
    let _ = store.load().await;

    DeviceManager::new(&mut store, KeyScheme::Multi)
        .create(DeviceProfile::new("Pixel 8", "GKWS6"))
        .await
        .unwrap();

    let text = std::fs::read_to_string(&nested).unwrap();
    assert!(text.ends_with("]\n}\n"), "unexpected layout:\n{text}");
    assert!(text.contains("\n  \"PACKAGES_PIXEL_8_DEVICE\": {\n"));
    assert!(!nested.with_extension("json.tmp").exists());
}
