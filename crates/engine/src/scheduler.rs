use crate::error::EngineError;
use crate::reconciler::Reconciler;
use crate::report::{IndicatorSyncResult, SourceSyncResult, SyncReport};
use alerter::ThresholdAlerter;
use api_client::{ImfClient, SourceAdapter, Throttle, WorldBankClient};
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use configuration::Config;
use core_types::RawObservation;
use database::{AlertSink, IndicatorStore};
use std::sync::Arc;
use std::time::Duration;

/// A source adapter with the throttle that spaces its requests.
struct ScheduledSource {
    adapter: Arc<dyn SourceAdapter>,
    throttle: Throttle,
}

/// Drives the fetch → reconcile → alert pipeline over every configured source.
///
/// Sources run one after another. The throttles live on the scheduler, so a manual
/// run that overlaps the daily one still respects every spacing rule.
pub struct SyncScheduler {
    sources: Vec<ScheduledSource>,
    reconciler: Reconciler,
    alerter: ThresholdAlerter,
    alert_sink: Arc<dyn AlertSink>,
    countries: Vec<String>,
    inter_source: Throttle,
    daily_at: NaiveTime,
}

impl SyncScheduler {
    pub fn new(
        store: Arc<dyn IndicatorStore>,
        alert_sink: Arc<dyn AlertSink>,
        alerter: ThresholdAlerter,
        countries: Vec<String>,
        inter_source_delay: Duration,
        daily_at: NaiveTime,
    ) -> Self {
        Self {
            sources: Vec::new(),
            reconciler: Reconciler::new(store),
            alerter,
            alert_sink,
            countries,
            inter_source: Throttle::new(inter_source_delay),
            daily_at,
        }
    }

    /// Registers an adapter; sources run in registration order.
    pub fn with_source(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        let throttle = Throttle::new(adapter.min_request_interval());
        self.sources.push(ScheduledSource { adapter, throttle });
        self
    }

    /// Builds a scheduler with the World Bank and IMF adapters enabled in `config`.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn IndicatorStore>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> Result<Self, EngineError> {
        let timeout = Duration::from_secs(config.sync.request_timeout_secs);
        let mut scheduler = Self::new(
            store,
            alert_sink,
            ThresholdAlerter::new(config.alerts.thresholds.clone()),
            config.sync.countries.clone(),
            Duration::from_secs(config.sync.inter_source_delay_secs),
            config.sync.daily_at,
        );

        if config.sources.world_bank.enabled {
            let client = WorldBankClient::new(&config.sources.world_bank, timeout)?;
            scheduler = scheduler.with_source(Arc::new(client));
        }
        if config.sources.imf.enabled {
            let client = ImfClient::new(&config.sources.imf, timeout)?;
            scheduler = scheduler.with_source(Arc::new(client));
        }
        if scheduler.sources.is_empty() {
            tracing::warn!("No data sources are enabled; sync runs will do nothing.");
        }
        Ok(scheduler)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.adapter.name()).collect()
    }

    /// Runs one full sync over every source. Never fails as a whole: each source's
    /// problems are recorded in its own entry of the report.
    pub async fn run_sync(&self) -> SyncReport {
        let started_at = Utc::now();
        tracing::info!(
            sources = self.sources.len(),
            countries = self.countries.len(),
            "Data sync started."
        );

        let mut results = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            self.inter_source.acquire().await;
            let result = self.sync_source(source).await;
            // The delay runs from the end of one source to the start of the next.
            self.inter_source.touch().await;

            if result.success {
                tracing::info!(
                    source = %result.source,
                    fetched = result.records_fetched,
                    written = result.written,
                    alerts = result.alerts_raised,
                    "Source synchronized."
                );
            } else {
                tracing::warn!(
                    source = %result.source,
                    error = ?result.error,
                    "Source synchronized with errors."
                );
            }
            results.push(result);
        }

        let report = SyncReport { started_at, finished_at: Utc::now(), sources: results };
        tracing::info!(
            written = report.total_written(),
            alerts = report.total_alerts(),
            ok = report.all_succeeded(),
            "Data sync completed."
        );
        report
    }

    async fn sync_source(&self, source: &ScheduledSource) -> SourceSyncResult {
        let adapter = &source.adapter;
        let mut result = SourceSyncResult::new(adapter.name());
        let mut batch: Vec<RawObservation> = Vec::new();

        for indicator_code in adapter.indicator_codes() {
            let fetched = adapter
                .fetch_indicator_data(indicator_code, &self.countries, &source.throttle)
                .await;
            match fetched {
                Ok(mut observations) => {
                    result.indicators.push(IndicatorSyncResult {
                        indicator_code: indicator_code.clone(),
                        success: true,
                        records_fetched: observations.len(),
                        transient: false,
                        error: None,
                    });
                    result.records_fetched += observations.len();
                    batch.append(&mut observations);
                }
                Err(e) => {
                    tracing::error!(
                        source = adapter.name(),
                        indicator = %indicator_code,
                        transient = e.is_transient(),
                        error = %e,
                        "Indicator fetch failed."
                    );
                    result.indicators.push(IndicatorSyncResult {
                        indicator_code: indicator_code.clone(),
                        success: false,
                        records_fetched: 0,
                        transient: e.is_transient(),
                        error: Some(e.to_string()),
                    });
                    result.fail(format!("{indicator_code}: {e}"));
                }
            }
        }

        let reconciled = match self.reconciler.reconcile(batch).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(source = adapter.name(), error = %e, "Reconciliation failed.");
                result.fail(format!("reconciliation: {e}"));
                return result;
            }
        };
        result.written = reconciled.written;
        result.unchanged = reconciled.unchanged;
        result.skipped = reconciled.skipped;

        // Every accepted record is evaluated, unchanged ones included.
        for record in &reconciled.records {
            match self.alerter.raise(self.alert_sink.as_ref(), record).await {
                Ok(Some(_)) => result.alerts_raised += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        country = %record.country_code,
                        indicator = %record.indicator_code,
                        error = %e,
                        "Failed to create alert."
                    );
                    result.alert_failures += 1;
                }
            }
        }

        result
    }

    /// Runs `run_sync` every day at the configured UTC time. Never returns.
    pub async fn run_daily(self: Arc<Self>) {
        tracing::info!(at = %self.daily_at, "Daily sync schedule started.");
        loop {
            let now = Utc::now();
            let next = next_run_after(now, self.daily_at);
            tracing::info!(next_run = %next, "Waiting for the next scheduled sync.");
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            let report = self.run_sync().await;
            if !report.all_succeeded() {
                tracing::warn!("Scheduled sync finished with failing sources.");
            }
        }
    }
}

/// The first instant strictly after `now` whose UTC time of day is `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_run_is_today_or_tomorrow() {
        let two_am = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        let at = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap();

        let before = Utc.with_ymd_and_hms(2024, 3, 10, 1, 59, 0).unwrap();
        assert_eq!(next_run_after(before, two_am), at(2024, 3, 10, 2));

        let exactly = Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap();
        assert_eq!(next_run_after(exactly, two_am), at(2024, 3, 11, 2));

        let after = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(next_run_after(after, two_am), at(2025, 1, 1, 2));
    }
}
