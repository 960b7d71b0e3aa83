use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use util::filters::FilterParam;

use crate::models::device::{self, DeviceType};
use crate::models::diagnostic::{self, DiagnosticStatus};
use crate::models::user;
use crate::repository::Repository;
use crate::test_utils::setup_test_db;

type Diagnostics = Repository<diagnostic::Entity, diagnostic::Column>;

async fn seed(db: &sea_orm::DatabaseConnection) -> String {
    let owner = user::Model::create(db, "repo@shop.example", "h", None).await.unwrap();
    let now = Utc::now();
    device::ActiveModel {
        id: Set("dev-1".into()),
        user_id: Set(owner.id.clone()),
        name: Set("Front desk laptop".into()),
        device_type: Set(DeviceType::Laptop),
        os_name: Set(None),
        os_version: Set(None),
        processor: Set(None),
        ram: Set(None),
        storage: Set(None),
        last_diagnostic_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap();

    for i in 0..5 {
        let status = if i % 2 == 0 {
            DiagnosticStatus::Completed
        } else {
            DiagnosticStatus::Failed
        };
        let at = now - Duration::days(i);
        diagnostic::ActiveModel {
            id: Set(format!("diag-{i}")),
            device_id: Set("dev-1".into()),
            user_id: Set(owner.id.clone()),
            status: Set(status),
            health_score: Set((status == DiagnosticStatus::Completed).then_some(90)),
            issues: Set(json!([])),
            recommendations: Set(json!([])),
            created_at: Set(at),
            updated_at: Set(at),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }
    owner.id
}

#[tokio::test]
async fn filter_paginates_and_counts() {
    let db = setup_test_db().await;
    let owner = seed(&db).await;
    let filters = vec![FilterParam::eq("user_id", owner.as_str())];

    let (page, total) = Diagnostics::filter(&db, &filters, 2, 2, Some("-created_at"))
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, "diag-2");

    let (last, _) = Diagnostics::filter(&db, &filters, 3, 2, Some("-created_at"))
        .await
        .unwrap();
    assert_eq!(last.len(), 1);

    let (beyond, total) = Diagnostics::filter(&db, &filters, u64::MAX, u64::MAX, None)
        .await
        .unwrap();
    assert!(beyond.is_empty());
    assert_eq!(total, 5);
}

#[tokio::test]
async fn status_and_date_filters_combine() {
    let db = setup_test_db().await;
    let owner = seed(&db).await;
    let since = Utc::now() - Duration::days(3) - Duration::hours(1);

    let filters = vec![
        FilterParam::eq("user_id", owner.as_str()),
        FilterParam::eq("status", "completed"),
        FilterParam::gte("created_at", since),
    ];
    let rows = Diagnostics::find_all(&db, &filters, None).await.unwrap();
    let mut ids: Vec<_> = rows.into_iter().map(|d| d.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["diag-0", "diag-2"]);
}

#[tokio::test]
async fn unknown_column_is_rejected() {
    let db = setup_test_db().await;
    let err = Diagnostics::count(&db, &[FilterParam::eq("no_such_column", "x")])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no_such_column"));
}
