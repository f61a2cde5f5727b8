use crate::error::EngineError;
use chrono::{DateTime, Utc};
use core_types::{IndicatorKey, IndicatorRecord, RawObservation};
use database::{IndicatorStore, UpsertOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The outcome of merging one batch of observations into the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Records inserted or overwritten.
    pub written: usize,
    /// Records whose stored content was already identical.
    pub unchanged: usize,
    /// Invalid observations, duplicates superseded within the batch and stale writes.
    pub skipped: usize,
    /// Every record that is now current in the store (written or unchanged), in key order.
    #[serde(skip)]
    pub records: Vec<IndicatorRecord>,
}

/// The "Source of Truth" writer for the canonical indicator store.
///
/// Validates raw observations, collapses duplicates and upserts the survivors. The store
/// decides each key atomically, so two reconcilers may run concurrently on the same
/// store and still converge on the latest fetch.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn IndicatorStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn IndicatorStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile(
        &self,
        observations: Vec<RawObservation>,
    ) -> Result<ReconcileReport, EngineError> {
        self.reconcile_at(observations, Utc::now()).await
    }

    /// Same as `reconcile`, with `now` used for validation and as `last_updated`.
    ///
    /// A store error aborts the batch. Records upserted before the failure stay
    /// written; replaying the batch converges.
    pub async fn reconcile_at(
        &self,
        observations: Vec<RawObservation>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileReport, EngineError> {
        let mut report = ReconcileReport::default();
        let (batch, dropped) = collapse_batch(observations, now);
        report.skipped += dropped;

        for (key, record) in batch {
            match self.store.upsert(&record).await? {
                UpsertOutcome::Inserted | UpsertOutcome::Updated => {
                    report.written += 1;
                    report.records.push(record);
                }
                UpsertOutcome::Unchanged => {
                    report.unchanged += 1;
                    report.records.push(record);
                }
                UpsertOutcome::Stale => {
                    tracing::debug!(
                        country = %key.country_code,
                        indicator = %key.indicator_code,
                        year = key.year,
                        "Stored record is newer than the incoming one; skipping."
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            written = report.written,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "Reconciliation finished."
        );
        Ok(report)
    }
}

/// Validates a batch and keeps one record per natural key: the latest `fetched_at`,
/// and on equal timestamps the later one in the batch. Returns the survivors in key
/// order and the number of observations dropped.
pub fn collapse_batch(
    observations: Vec<RawObservation>,
    now: DateTime<Utc>,
) -> (BTreeMap<IndicatorKey, IndicatorRecord>, usize) {
    let mut dropped = 0;
    let mut batch: BTreeMap<IndicatorKey, IndicatorRecord> = BTreeMap::new();

    for observation in observations {
        let record = match observation.into_record(now) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping invalid observation.");
                dropped += 1;
                continue;
            }
        };

        let key = record.key();
        match batch.get(&key) {
            Some(current) if current.fetched_at > record.fetched_at => dropped += 1,
            Some(_) => {
                batch.insert(key, record);
                dropped += 1;
            }
            None => {
                batch.insert(key, record);
            }
        }
    }

    (batch, dropped)
}
