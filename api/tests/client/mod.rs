//! `DataClient` against a real server on a local port.

use std::sync::Arc;
use std::time::Duration;

use db::test_utils::setup_test_db;
use serial_test::serial;
use services::providers::{ApiProvider, DatabaseProvider};
use services::types::{ClientInfo, DeviceType, DiagnosticResult, DiagnosticStatus, HistoryFilter, NewDevice};
use services::{AppError, DataClient, DataProvider};
use util::config::AppConfig;
use util::test_helpers::setup_test_config;

use crate::helpers::app::{ctx, sign_up, spawn_server};

fn dead_api() -> Arc<dyn DataProvider> {
    Arc::new(ApiProvider::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap())
}

#[tokio::test]
#[serial]
async fn api_provider_round_trips_through_the_server() {
    setup_test_config();
    let db = setup_test_db().await;
    let session = sign_up(&db, "remote@shop.example").await;
    let base = spawn_server(db).await;

    let api = ApiProvider::new(&base, Duration::from_secs(5)).unwrap();
    assert!(api.health().await.alive);

    let client = DataClient::new(vec![Arc::new(api.clone()) as Arc<dyn DataProvider>]);
    let ctx = ctx(&session);

    let device = client
        .create_device(&ctx, &NewDevice::named("Counter Laptop", DeviceType::Laptop))
        .await
        .unwrap();
    let fetched = client.get_device(&ctx, &device.id).await.unwrap();
    assert_eq!(fetched.id, device.id);
    assert_eq!(fetched.user_id, session.user.id);

    let mut record = DiagnosticResult::pending(&device.id, &session.user.id, &ClientInfo::default());
    let saved = client.save_diagnostic(&ctx, &record).await.unwrap();
    assert_eq!(saved.id, record.id);

    record.status = DiagnosticStatus::Running;
    client.update_diagnostic(&ctx, &record).await.unwrap();
    record.status = DiagnosticStatus::Completed;
    record.health_score = Some(85);
    let done = client.update_diagnostic(&ctx, &record).await.unwrap();
    assert_eq!(done.health_score, Some(85));

    let page = client
        .get_diagnostic_history(&ctx, &HistoryFilter::page(1, 10))
        .await;
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].status, DiagnosticStatus::Completed);

    let missing = client.get_device(&ctx, "ghost").await.unwrap_err();
    assert!(missing.is_not_found(), "got {missing:?}");
}

#[tokio::test]
#[serial]
async fn invalid_transitions_come_back_as_validation_errors() {
    setup_test_config();
    let db = setup_test_db().await;
    let session = sign_up(&db, "strict@shop.example").await;
    let base = spawn_server(db).await;
    let api = ApiProvider::new(&base, Duration::from_secs(5)).unwrap();
    let ctx = ctx(&session);

    let device = api
        .create_device(&ctx, &NewDevice::named("Bench", DeviceType::Desktop))
        .await
        .unwrap();
    let mut record = DiagnosticResult::pending(&device.id, &session.user.id, &ClientInfo::default());
    api.save_diagnostic(&ctx, &record).await.unwrap();

    record.status = DiagnosticStatus::Completed;
    record.health_score = Some(50);
    let err = api.update_diagnostic(&ctx, &record).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}

#[tokio::test]
#[serial]
async fn falls_back_to_the_local_store_when_the_api_is_down() {
    setup_test_config();
    let db = setup_test_db().await;
    let session = sign_up(&db, "fallback@shop.example").await;
    let local = DatabaseProvider::new(db);
    let client = DataClient::new(vec![dead_api(), Arc::new(local.clone())]);
    let ctx = ctx(&session);

    let device = client
        .create_device(&ctx, &NewDevice::named("Offline PC", DeviceType::Desktop))
        .await
        .unwrap();
    let devices = client.get_devices(&ctx).await;
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, device.id);
    assert_eq!(local.get_device(&ctx, &device.id).await.unwrap().name, "Offline PC");
}

#[tokio::test]
#[serial]
async fn serves_fixtures_when_everything_is_down() {
    setup_test_config();
    let client = DataClient::new(vec![dead_api()]);
    let ctx = services::Context::anonymous();

    let devices = client.get_devices(&ctx).await;
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "mock-device-1");

    let err = client
        .create_device(&ctx, &NewDevice::named("Nowhere", DeviceType::Desktop))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AllProvidersFailed(_)), "got {err:?}");
}

#[tokio::test]
#[serial]
async fn full_diagnostic_runs_on_the_api_host() {
    setup_test_config();
    let db = setup_test_db().await;
    let session = sign_up(&db, "bench@shop.example").await;
    let base = spawn_server(db).await;
    let api = ApiProvider::new(&base, Duration::from_secs(30)).unwrap();
    let ctx = ctx(&session);

    let device = api
        .create_device(&ctx, &NewDevice::named("Repair Bench", DeviceType::Desktop))
        .await
        .unwrap();
    let client = ClientInfo {
        name: Some("Naledi".into()),
        phone: None,
    };
    let done = api.run_full_diagnostic(&ctx, &device.id, &client).await.unwrap();
    assert_eq!(done.status, DiagnosticStatus::Completed);
    assert_eq!(done.device_id, device.id);
    assert_eq!(done.client_name.as_deref(), Some("Naledi"));
    assert!(done.health_score.is_some());

    let linked = api.get_device(&ctx, &device.id).await.unwrap();
    assert_eq!(linked.last_diagnostic_id.as_deref(), Some(done.id.as_str()));

    let err = api
        .run_full_diagnostic(&ctx, "ghost", &client)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
#[serial]
async fn client_from_config_uses_api_url_and_mock_write_setting() {
    setup_test_config();
    let db = setup_test_db().await;
    let session = sign_up(&db, "config@shop.example").await;
    let base = spawn_server(db.clone()).await;

    AppConfig::set_api_url(format!("{base}/"));
    let client = DataClient::from_config(Some(db)).unwrap();
    assert_eq!(client.provider_names(), vec!["api", "database"]);
    let device = client
        .create_device(&ctx(&session), &NewDevice::named("Configured", DeviceType::Laptop))
        .await
        .unwrap();
    assert_eq!(device.user_id, session.user.id);

    AppConfig::set_api_url("http://127.0.0.1:9");
    let offline = DataClient::from_config(None).unwrap();
    assert_eq!(offline.provider_names(), vec!["api"]);
    let err = offline
        .create_device(&ctx(&session), &NewDevice::named("Lost", DeviceType::Laptop))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AllProvidersFailed(_)), "got {err:?}");

    AppConfig::set_allow_mock_writes(true);
    let fabricating = DataClient::from_config(None).unwrap();
    AppConfig::set_allow_mock_writes(false);
    let fake = fabricating
        .create_device(&ctx(&session), &NewDevice::named("Pretend", DeviceType::Laptop))
        .await
        .unwrap();
    assert_eq!(fake.name, "Pretend");
    assert!(fake.id.starts_with("mock-"));
}

#[tokio::test]
#[serial]
async fn history_far_past_the_end_is_empty_not_a_panic() {
    setup_test_config();
    let client = DataClient::new(vec![dead_api()]);
    let page = client
        .get_diagnostic_history(&services::Context::anonymous(), &HistoryFilter::page(u64::MAX, 10))
        .await;
    assert!(page.data.is_empty());
    assert_eq!(page.total, 3);
}
