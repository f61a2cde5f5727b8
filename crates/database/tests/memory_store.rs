//! Behaviour of the in-memory store against the `IndicatorStore` / `AlertSink` contracts.

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{
    AlertCategory, AlertSeverity, Category, Confidence, IndicatorFamily, IndicatorRecord, NewAlert,
    SourceOrganization, TriggerData,
};
use database::{AlertSink, DbError, IndicatorStore, MemoryStore, UpsertOutcome};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap()
}

fn record(country: &str, code: &str, year: i32, value: Decimal) -> IndicatorRecord {
    IndicatorRecord {
        country_code: country.into(),
        indicator_code: code.into(),
        indicator_name: code.into(),
        year,
        value: Some(value),
        unit: "%".into(),
        source: SourceOrganization::WorldBank,
        category: Category::Employment,
        family: Some(IndicatorFamily::Unemployment),
        is_projected: false,
        confidence: Confidence::High,
        fetched_at: t0(),
        last_updated: t0(),
    }
}

fn alert(country: &str) -> NewAlert {
    NewAlert {
        title: "Threshold Alert: Unemployment".into(),
        message: format!("{} unemployment breached", country),
        severity: AlertSeverity::High,
        category: AlertCategory::Economic,
        country_code: Some(country.into()),
        trigger_data: Some(TriggerData {
            indicator_code: "SL.UEM.TOTL.ZS".into(),
            threshold: dec!(10),
            actual_value: dec!(12.5),
        }),
    }
}

#[tokio::test]
async fn find_filters_by_country_indicator_and_years() {
    let store = MemoryStore::new();
    for (country, code, year) in [
        ("USA", "B", 2020),
        ("USA", "A", 2022),
        ("USA", "A", 2019),
        ("USA", "A", 2021),
        ("CAN", "A", 2021),
    ] {
        store.upsert(&record(country, code, year, dec!(1))).await.unwrap();
    }

    let found = store.find("USA", None, 2020..=2022).await.unwrap();
    let keys: Vec<(String, i32)> =
        found.iter().map(|r| (r.indicator_code.clone(), r.year)).collect();
    assert_eq!(
        keys,
        vec![("A".to_string(), 2021), ("A".to_string(), 2022), ("B".to_string(), 2020)]
    );

    let only_a = store.find("USA", Some("A"), 1960..=2030).await.unwrap();
    assert_eq!(only_a.len(), 3);
    assert!(store.find("MEX", None, 1960..=2030).await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_keeps_one_record_per_key_and_honours_fetch_order() {
    let store = MemoryStore::new();
    let first = record("USA", "A", 2023, dec!(4.0));
    assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Unchanged);

    let mut newer = record("USA", "A", 2023, dec!(4.4));
    newer.fetched_at = t0() + Duration::hours(1);
    newer.last_updated = newer.fetched_at;
    assert_eq!(store.upsert(&newer).await.unwrap(), UpsertOutcome::Updated);

    let mut older = record("USA", "A", 2023, dec!(3.0));
    older.fetched_at = t0() - Duration::hours(1);
    assert_eq!(store.upsert(&older).await.unwrap(), UpsertOutcome::Stale);

    assert_eq!(store.len().await, 1);
    let stored = store.find_one(&first.key()).await.unwrap().unwrap();
    assert_eq!(stored.value, Some(dec!(4.4)));
}

#[tokio::test]
async fn unchanged_write_preserves_last_updated() {
    let store = MemoryStore::new();
    let original = record("USA", "A", 2023, dec!(4.0));
    store.upsert(&original).await.unwrap();

    let mut replay = original.clone();
    replay.last_updated = t0() + Duration::days(1);
    assert_eq!(store.upsert(&replay).await.unwrap(), UpsertOutcome::Unchanged);

    let stored = store.find_one(&original.key()).await.unwrap().unwrap();
    assert_eq!(stored.last_updated, t0());
}

#[tokio::test]
async fn aggregates_for_status_reporting() {
    let store = MemoryStore::new();
    store.upsert(&record("USA", "A", 2021, dec!(1))).await.unwrap();
    store.upsert(&record("USA", "A", 2022, dec!(1))).await.unwrap();
    let mut imf = record("USA", "NGDP_RPCH", 2022, dec!(2));
    imf.source = SourceOrganization::Imf;
    imf.category = Category::Gdp;
    store.upsert(&imf).await.unwrap();

    let by_year = store.count_by_year().await.unwrap();
    assert_eq!(by_year, vec![(2022, 2), (2021, 1)]);

    let by_category = store.count_by_category().await.unwrap();
    assert_eq!(by_category, vec![(Category::Gdp, 1), (Category::Employment, 2)]);

    let sources = store.source_breakdown().await.unwrap();
    assert_eq!(sources[0].source, SourceOrganization::WorldBank);
    assert_eq!(sources[0].count, 2);
    assert_eq!(sources[1].categories, vec![Category::Gdp]);
}

#[tokio::test]
async fn alerts_are_listed_newest_first_and_acknowledged() {
    let store = MemoryStore::new();
    let first = store.create(alert("USA")).await.unwrap();
    let second = store.create(alert("BRA")).await.unwrap();

    let all = store.list(None).await.unwrap();
    assert_eq!(all.iter().map(|a| a.id).collect::<Vec<_>>(), vec![second, first]);

    let acknowledged = store.acknowledge(first, "analyst@example.org", t0()).await.unwrap();
    assert!(!acknowledged.is_active);
    assert_eq!(acknowledged.acknowledged_at, Some(t0()));

    let active = store.list(Some(true)).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second);
    assert_eq!(store.list(Some(false)).await.unwrap()[0].id, first);
}

#[tokio::test]
async fn acknowledging_unknown_alert_is_not_found() {
    let store = MemoryStore::new();
    let result = store.acknowledge(Uuid::new_v4(), "analyst", t0()).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}
