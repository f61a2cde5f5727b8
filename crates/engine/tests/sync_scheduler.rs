//! End-to-end sync runs with hand-written source adapters on a paused clock.

use alerter::ThresholdAlerter;
use api_client::{ApiError, SourceAdapter, Throttle};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use configuration::AlertThresholds;
use core_types::{Category, Confidence, IndicatorFamily, RawObservation, SourceOrganization};
use database::{AlertSink, MemoryStore};
use engine::SyncScheduler;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// --- Mock adapter ---

struct MockAdapter {
    organization: SourceOrganization,
    indicators: Vec<String>,
    interval: Duration,
    /// Value served per indicator code; a missing entry fails the fetch.
    values: HashMap<String, f64>,
    /// Requests served per indicator, like a paginated agency.
    pages: usize,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl MockAdapter {
    fn new(
        organization: SourceOrganization,
        interval: Duration,
        values: &[(&str, Option<f64>)],
    ) -> Self {
        Self {
            organization,
            indicators: values.iter().map(|(code, _)| code.to_string()).collect(),
            interval,
            values: values
                .iter()
                .filter_map(|(code, value)| value.map(|v| (code.to_string(), v)))
                .collect(),
            pages: 1,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn paged(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

fn fetched_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap()
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn organization(&self) -> SourceOrganization {
        self.organization
    }

    fn indicator_codes(&self) -> &[String] {
        &self.indicators
    }

    fn min_request_interval(&self) -> Duration {
        self.interval
    }

    fn indicator_name(&self, indicator_code: &str) -> String {
        indicator_code.to_string()
    }

    fn unit(&self, _indicator_code: &str) -> String {
        "%".to_string()
    }

    fn category(&self, _indicator_code: &str) -> Category {
        Category::Employment
    }

    fn family(&self, indicator_code: &str) -> Option<IndicatorFamily> {
        indicator_code.contains("UEM").then_some(IndicatorFamily::Unemployment)
    }

    async fn fetch_indicator_data(
        &self,
        indicator_code: &str,
        countries: &[String],
        throttle: &Throttle,
    ) -> Result<Vec<RawObservation>, ApiError> {
        for _ in 0..self.pages {
            throttle.acquire().await;
            self.calls.lock().unwrap().push((indicator_code.to_string(), Instant::now()));
        }
        let value = self
            .values
            .get(indicator_code)
            .copied()
            .ok_or_else(|| ApiError::Upstream(format!("HTTP 503 for {indicator_code}")))?;

        Ok(countries
            .iter()
            .map(|country| RawObservation {
                country_code: country.clone(),
                indicator_code: indicator_code.to_string(),
                indicator_name: self.indicator_name(indicator_code),
                year: 2023,
                value: Some(value),
                unit: self.unit(indicator_code),
                source: self.organization,
                category: self.category(indicator_code),
                family: self.family(indicator_code),
                is_projected: false,
                confidence: Confidence::High,
                fetched_at: fetched_at(),
            })
            .collect())
    }
}

fn scheduler(store: &Arc<MemoryStore>, sources: &[Arc<MockAdapter>]) -> SyncScheduler {
    let mut scheduler = SyncScheduler::new(
        store.clone(),
        store.clone(),
        ThresholdAlerter::new(AlertThresholds::default()),
        vec!["ESP".to_string(), "ZAF".to_string()],
        Duration::from_secs(5),
        NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
    );
    for source in sources {
        scheduler = scheduler.with_source(source.clone());
    }
    scheduler
}

#[tokio::test(start_paused = true)]
async fn a_failing_indicator_does_not_stop_the_run() {
    let store = Arc::new(MemoryStore::new());
    let world_bank = Arc::new(MockAdapter::new(
        SourceOrganization::WorldBank,
        Duration::from_secs(1),
        &[("SL.UEM.TOTL.ZS", Some(6.0)), ("NY.GDP.MKTP.CD", None), ("SP.POP.TOTL", Some(5.0))],
    ));
    let imf = Arc::new(MockAdapter::new(
        SourceOrganization::Imf,
        Duration::from_secs(2),
        &[("PCPIPCH", Some(3.1))],
    ));

    let report = scheduler(&store, &[world_bank.clone(), imf.clone()]).run_sync().await;
    assert_eq!(report.sources.len(), 2);
    assert!(!report.all_succeeded());

    let wb = &report.sources[0];
    assert_eq!(wb.source, "World Bank");
    assert!(!wb.success);
    assert_eq!(wb.indicators.len(), 3);
    assert!(!wb.indicators[1].success);
    assert!(wb.indicators[1].transient);
    assert!(!wb.indicators[0].transient);
    assert!(wb.error.as_deref().unwrap().contains("NY.GDP.MKTP.CD"));
    assert_eq!(wb.records_fetched, 4);
    assert_eq!(wb.written, 4);

    let imf_result = &report.sources[1];
    assert!(imf_result.success);
    assert_eq!(imf_result.written, 2);
    assert_eq!(imf.call_times().len(), 1);

    assert_eq!(store.len().await, 6);
}

#[tokio::test(start_paused = true)]
async fn requests_respect_source_and_inter_source_spacing() {
    let store = Arc::new(MemoryStore::new());
    let first = Arc::new(MockAdapter::new(
        SourceOrganization::WorldBank,
        Duration::from_secs(1),
        &[("A", Some(1.0)), ("B", Some(1.0)), ("C", Some(1.0))],
    ));
    let second = Arc::new(MockAdapter::new(
        SourceOrganization::Imf,
        Duration::from_secs(2),
        &[("D", Some(1.0)), ("E", Some(1.0))],
    ));
    let scheduler = scheduler(&store, &[first.clone(), second.clone()]);

    scheduler.run_sync().await;

    let a = first.call_times();
    let b = second.call_times();
    assert!(a.windows(2).all(|w| w[1] - w[0] >= Duration::from_secs(1)));
    assert!(b[0] - a[2] >= Duration::from_secs(5));
    assert!(b[1] - b[0] >= Duration::from_secs(2));

    // A second run shares the throttles with the first.
    scheduler.run_sync().await;
    let a = first.call_times();
    assert_eq!(a.len(), 6);
    assert!(a[3] - b[1] >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn every_page_of_a_paginated_fetch_is_spaced() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(
        MockAdapter::new(
            SourceOrganization::WorldBank,
            Duration::from_secs(1),
            &[("SL.UEM.TOTL.ZS", Some(6.0)), ("SP.POP.TOTL", Some(5.0))],
        )
        .paged(3),
    );

    let report = scheduler(&store, &[source.clone()]).run_sync().await;
    assert!(report.all_succeeded());

    let times = source.call_times();
    assert_eq!(times.len(), 6);
    assert!(times.windows(2).all(|w| w[1] - w[0] >= Duration::from_secs(1)));
}

#[tokio::test(start_paused = true)]
async fn persistent_breaches_alert_on_every_run() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(MockAdapter::new(
        SourceOrganization::Imf,
        Duration::from_secs(2),
        &[("SL.UEM.TOTL.ZS", Some(27.5))],
    ));
    let scheduler = scheduler(&store, &[source]);

    let first = scheduler.run_sync().await;
    assert_eq!(first.sources[0].written, 2);
    assert_eq!(first.total_alerts(), 2);

    let second = scheduler.run_sync().await;
    assert_eq!(second.sources[0].written, 0);
    assert_eq!(second.sources[0].unchanged, 2);
    assert_eq!(second.total_alerts(), 2);

    let alerts = store.list(Some(true)).await.unwrap();
    assert_eq!(alerts.len(), 4);
    assert!(alerts.iter().all(|a| a.title == "Threshold Alert: SL.UEM.TOTL.ZS"));
}
