//! Package mapping through the game manager.

use copg::bridge::mock::MockExecutor;
use copg::error::CopgError;
use copg::manager::{GameManager, IntegrityReport, owners_of, package_list};
use copg::profile::{DeviceKey, KeyScheme};
use copg::store::{ConfigStore, ShellBackend};
use copg::undo::Removal;

use crate::common::fixtures::SAMPLE_CONFIG;

const PATH: &str = "/data/adb/modules/COPG/config.json";

async fn sample_store() -> ConfigStore<ShellBackend<MockExecutor>> {
    let mock = MockExecutor::new().with_file(PATH, SAMPLE_CONFIG);
    let mut store = ConfigStore::new(ShellBackend::new(mock), PATH);
    store.load().await.unwrap();
    store
}

fn pixel() -> DeviceKey {
    DeviceKey::from_slug("PIXEL_8")
}

fn rog() -> DeviceKey {
    DeviceKey::from_slug("ROG_PHONE_8")
}

#[tokio::test]
async fn package_belongs_to_at_most_one_device() {
    let mut store = sample_store().await;

    let err = GameManager::new(&mut store, KeyScheme::Multi)
        .create("com.tencent.ig", &rog())
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("package"));
    assert!(err.to_string().contains("PIXEL_8"), "{err}");

    GameManager::new(&mut store, KeyScheme::Multi)
        .create("  com.pubg.krmobile ", &rog())
        .await
        .unwrap();
    assert_eq!(
        owners_of(store.document(), KeyScheme::Multi, "com.pubg.krmobile"),
        [rog()]
    );
    assert!(IntegrityReport::check(store.document(), KeyScheme::Multi).is_clean());
}

#[tokio::test]
async fn moving_a_game_appends_to_the_target() {
    let mut store = sample_store().await;

    GameManager::new(&mut store, KeyScheme::Multi)
        .update("com.tencent.ig", "com.tencent.ig", &rog())
        .await
        .unwrap();

    assert!(package_list(store.document(), KeyScheme::Multi, &pixel()).is_empty());
    assert_eq!(
        package_list(store.document(), KeyScheme::Multi, &rog()),
        [
            "com.miHoYo.GenshinImpact",
            "com.activision.callofduty.shooter",
            "com.tencent.ig"
        ]
    );
}

#[tokio::test]
async fn renaming_in_place_keeps_index() {
    let mut store = sample_store().await;

    GameManager::new(&mut store, KeyScheme::Multi)
        .update("com.miHoYo.GenshinImpact", "com.HoYoverse.GenshinImpact", &rog())
        .await
        .unwrap();

    assert_eq!(
        package_list(store.document(), KeyScheme::Multi, &rog()),
        ["com.HoYoverse.GenshinImpact", "com.activision.callofduty.shooter"]
    );
}

#[tokio::test]
async fn delete_reports_original_index() {
    let mut store = sample_store().await;

    let removal = GameManager::new(&mut store, KeyScheme::Multi)
        .delete("com.activision.callofduty.shooter", &rog())
        .await
        .unwrap();

    assert_eq!(
        removal,
        Removal::Package {
            device: rog(),
            package: "com.activision.callofduty.shooter".into(),
            index: 1,
        }
    );
    let err = GameManager::new(&mut store, KeyScheme::Multi)
        .delete("com.activision.callofduty.shooter", &rog())
        .await
        .unwrap_err();
    assert!(matches!(err, CopgError::NotFound { .. }));
}

#[tokio::test]
async fn games_need_the_multi_device_layout() {
    let mut store = sample_store().await;
    let err = GameManager::new(&mut store, KeyScheme::Single)
        .create("com.example.game", &DeviceKey::from_slug("COPG"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("device"));
}
