//! Device profile lifecycle against a store backed by the mock bridge.

use copg::bridge::mock::MockExecutor;
use copg::error::CopgError;
use copg::manager::{DeviceManager, list_devices, package_list};
use copg::profile::{DeviceKey, DeviceProfile, KeyScheme, ProfilePatch};
use copg::store::{ConfigStore, ShellBackend};

use crate::common::assertions::assert_key_order;
use crate::common::fixtures::SAMPLE_CONFIG;

const PATH: &str = "/data/adb/modules/COPG/config.json";

async fn loaded(config: &str) -> (MockExecutor, ConfigStore<ShellBackend<MockExecutor>>) {
    let mock = MockExecutor::new().with_file(PATH, config);
    let mut store = ConfigStore::new(ShellBackend::new(mock.clone()), PATH);
    store.load().await.unwrap();
    (mock, store)
}

fn saved_keys(mock: &MockExecutor) -> Vec<String> {
    let saved: serde_json::Value = serde_json::from_str(&mock.file(PATH).unwrap()).unwrap();
    saved.as_object().unwrap().keys().cloned().collect()
}

#[tokio::test]
async fn rename_keeps_position_and_games() {
    let (mock, mut store) = loaded(SAMPLE_CONFIG).await;
    let old = DeviceKey::from_slug("PIXEL_8");
    let profile = {
        let manager = DeviceManager::new(&mut store, KeyScheme::Multi);
        manager.get(&old).unwrap().profile
    };
    let patch = ProfilePatch {
        device: Some("Pixel 8 Pro".into()),
        model: Some("G1MNW".into()),
        ..ProfilePatch::default()
    };

    let new = DeviceManager::new(&mut store, KeyScheme::Multi)
        .update(&old, profile.merged(&patch))
        .await
        .unwrap();

    assert_eq!(new.as_str(), "PIXEL_8_PRO");
    assert_key_order(
        &saved_keys(&mock),
        &[
            "PACKAGES_PIXEL_8_PRO_DEVICE",
            "PACKAGES_PIXEL_8_PRO",
            "PACKAGES_ROG_PHONE_8_DEVICE",
            "PACKAGES_ROG_PHONE_8",
        ],
    );
    assert_eq!(
        package_list(store.document(), KeyScheme::Multi, &new),
        ["com.tencent.ig"]
    );
    let entry = &list_devices(store.document(), KeyScheme::Multi)[0];
    assert_eq!(entry.profile.brand.as_deref(), Some("google"));
    assert_eq!(entry.profile.sdk_int.as_deref(), Some("34"));
}

#[tokio::test]
async fn duplicate_model_is_rejected_before_any_write() {
    let (mock, mut store) = loaded(SAMPLE_CONFIG).await;
    mock.clear_commands();

    let err = DeviceManager::new(&mut store, KeyScheme::Multi)
        .create(DeviceProfile::new("Pixel 9", "GKWS6"))
        .await
        .unwrap_err();

    assert_eq!(err.field(), Some("MODEL"));
    assert!(mock.commands().is_empty(), "nothing should be written");
    assert_eq!(store.document().len(), 4);
}

#[tokio::test]
async fn failed_save_rolls_back_memory() {
    let (mock, mut store) = loaded(SAMPLE_CONFIG).await;
    mock.fail_matching("printf", "sh: can't create: Read-only file system");

    let err = DeviceManager::new(&mut store, KeyScheme::Multi)
        .create(DeviceProfile::new("Galaxy S24", "SM-S921B"))
        .await
        .unwrap_err();

    assert!(err.is_persistence(), "unexpected error: {err}");
    assert_eq!(store.document().len(), 4);
    assert_eq!(mock.file(PATH).as_deref(), Some(SAMPLE_CONFIG));
}

#[tokio::test]
async fn android_release_fills_sdk_on_create() {
    let (_mock, mut store) = loaded("{}").await;
    let patch = ProfilePatch {
        device: Some("Galaxy S24".into()),
        model: Some("SM-S921B".into()),
        android_version: Some("12L".into()),
        ..ProfilePatch::default()
    };

    let key = DeviceManager::new(&mut store, KeyScheme::Multi)
        .create(DeviceProfile::default().merged(&patch))
        .await
        .unwrap();

    let entry = DeviceManager::new(&mut store, KeyScheme::Multi).get(&key).unwrap();
    assert_eq!(entry.profile.sdk_int.as_deref(), Some("32"));
}

#[tokio::test]
async fn single_profile_layout_overwrites_in_place() {
    let (mock, mut store) = loaded(r#"{"COPG": {"DEVICE": "Old", "MODEL": "O1"}}"#).await;

    DeviceManager::new(&mut store, KeyScheme::Single)
        .create(DeviceProfile::new("Pixel 8", "GKWS6"))
        .await
        .unwrap();

    assert_key_order(&saved_keys(&mock), &["COPG"]);
    let devices = list_devices(store.document(), KeyScheme::Single);
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].profile.device, "Pixel 8");
}

#[tokio::test]
async fn deleting_unknown_device_is_not_found() {
    let (_mock, mut store) = loaded(SAMPLE_CONFIG).await;
    let err = DeviceManager::new(&mut store, KeyScheme::Multi)
        .delete(&DeviceKey::from_slug("NOPE"))
        .await
        .unwrap_err();
    assert!(matches!(err, CopgError::NotFound { .. }));
}
