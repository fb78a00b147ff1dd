use chrono::{Duration, Utc};
use pulseboard_core::ai_models::ModelStatus;
use pulseboard_db::models::ai_model::{CreateAiModel, UpdateAiModel};
use pulseboard_db::models::audit::{AuditFilter, CreateAuditLog};
use pulseboard_db::models::config_entry::UpsertConfig;
use pulseboard_db::models::metric::{CreateMetric, MetricFilter};
use pulseboard_db::repositories::{AiModelRepo, AuditLogRepo, ConfigRepo, MetricRepo};
use serde_json::json;
use sqlx::PgPool;

fn upsert(key: &str, value: &str) -> UpsertConfig {
    UpsertConfig {
        key: key.to_string(),
        value: value.to_string(),
        description: Some(format!("{key} setting")),
        updated_by: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_config_upsert_keeps_last_write(pool: PgPool) {
    let mut previous = None;
    for n in 1..=5 {
        let entry = ConfigRepo::upsert(&pool, &upsert("refresh_interval", &n.to_string()))
            .await
            .unwrap();
        assert_eq!(entry.value, n.to_string());
        if let Some(prev) = previous {
            assert!(entry.updated_at >= prev, "updated_at moved backwards");
        }
        previous = Some(entry.updated_at);
    }

    let stored = ConfigRepo::get(&pool, "refresh_interval").await.unwrap().unwrap();
    assert_eq!(stored.value, "5");
    assert_eq!(ConfigRepo::list(&pool).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_config_updated_at_never_decreases(pool: PgPool) {
    ConfigRepo::upsert(&pool, &upsert("theme", "dark")).await.unwrap();
    let future = Utc::now() + Duration::hours(1);
    sqlx::query("UPDATE config_entries SET updated_at = $1 WHERE key = 'theme'")
        .bind(future)
        .execute(&pool)
        .await
        .unwrap();

    let entry = ConfigRepo::upsert(&pool, &upsert("theme", "light")).await.unwrap();
    assert_eq!(entry.value, "light");
    assert_eq!(entry.updated_at.timestamp_micros(), future.timestamp_micros());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_config_list_is_ordered_by_key(pool: PgPool) {
    for key in ["zeta", "alpha", "mid"] {
        ConfigRepo::upsert(&pool, &upsert(key, "v")).await.unwrap();
    }
    let keys: Vec<String> = ConfigRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    assert!(ConfigRepo::get(&pool, "missing").await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_metric_query_filters_and_orders(pool: PgPool) {
    for (t, v) in [("cpu_utilization", 10), ("memory_usage", 40), ("cpu_utilization", 20)] {
        MetricRepo::create(
            &pool,
            &CreateMetric {
                metric_type: t.to_string(),
                value: v,
                metadata: Some(json!({ "unit": "percentage" })),
            },
        )
        .await
        .unwrap();
    }

    let cpu = MetricRepo::query(
        &pool,
        &MetricFilter {
            metric_type: Some("cpu_utilization".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cpu.iter().map(|m| m.value).collect::<Vec<_>>(), vec![20, 10]);

    let latest = MetricRepo::latest(&pool, 2).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].value, 20);

    let future_only = MetricRepo::query(
        &pool,
        &MetricFilter {
            from: Some(Utc::now() + Duration::hours(1)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(future_only.is_empty());

    let counts = MetricRepo::count_by_type(&pool, None, None).await.unwrap();
    assert_eq!(counts[0].metric_type, "cpu_utilization");
    assert_eq!(counts[0].count, 2);

    let later = MetricRepo::count_by_type(&pool, Some(Utc::now() + Duration::hours(1)), None)
        .await
        .unwrap();
    assert!(later.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_system_audit_entries_have_no_user(pool: PgPool) {
    let entry = AuditLogRepo::create(
        &pool,
        &CreateAuditLog::new("SYSTEM_BACKUP", "DATABASE").with_details(json!({ "automated": true })),
    )
    .await
    .unwrap();
    assert!(entry.user_id.is_none());

    let all = AuditLogRepo::query(&pool, &AuditFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].details, Some(json!({ "automated": true })));

    let by_user = AuditLogRepo::query(
        &pool,
        &AuditFilter {
            user_id: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(by_user.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ai_model_crud(pool: PgPool) {
    let created = AiModelRepo::create(
        &pool,
        &CreateAiModel {
            name: "Sentinel".to_string(),
            version: "1.0.0".to_string(),
            status: ModelStatus::Training,
            compliance: "SOC2".to_string(),
            security: "HIGH".to_string(),
            config: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.status, "training");

    let updated = AiModelRepo::update(
        &pool,
        created.id,
        &UpdateAiModel {
            status: Some(ModelStatus::Deployed),
            config: Some(json!({ "replicas": 2 })),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.status, "deployed");
    assert_eq!(updated.name, "Sentinel");
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(AiModelRepo::count_active(&pool).await.unwrap(), 1);

    assert!(AiModelRepo::delete(&pool, created.id).await.unwrap());
    assert!(!AiModelRepo::delete(&pool, created.id).await.unwrap());
    assert!(AiModelRepo::find_by_id(&pool, created.id).await.unwrap().is_none());
}
