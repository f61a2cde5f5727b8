use crate::error::DbError;
use crate::store::{decide_upsert, AlertSink, IndicatorStore, SourceStats, UpsertOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Alert, Category, IndicatorKey, IndicatorRecord, NewAlert, SourceOrganization};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A process-local store implementing both `IndicatorStore` and `AlertSink`.
///
/// Each upsert runs under the write lock, which gives the same per-key atomicity
/// as the single-row transaction of `DbRepository`. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<IndicatorKey, IndicatorRecord>>,
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record in key order.
    pub async fn snapshot(&self) -> Vec<IndicatorRecord> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl IndicatorStore for MemoryStore {
    async fn find(
        &self,
        country_code: &str,
        indicator_code: Option<&str>,
        years: RangeInclusive<i32>,
    ) -> Result<Vec<IndicatorRecord>, DbError> {
        let records = self.records.read().await;
        // BTreeMap key order is (country, indicator, year), which is the contract's order.
        Ok(records
            .values()
            .filter(|r| r.country_code == country_code)
            .filter(|r| indicator_code.is_none_or(|code| r.indicator_code == code))
            .filter(|r| years.contains(&r.year))
            .cloned()
            .collect())
    }

    async fn find_one(&self, key: &IndicatorKey) -> Result<Option<IndicatorRecord>, DbError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn upsert(&self, record: &IndicatorRecord) -> Result<UpsertOutcome, DbError> {
        let mut records = self.records.write().await;
        let key = record.key();
        let outcome = decide_upsert(records.get(&key), record);

        match outcome {
            UpsertOutcome::Inserted | UpsertOutcome::Updated => {
                records.insert(key, record.clone());
            }
            UpsertOutcome::Unchanged => {
                // Content is identical; only remember the newer fetch time.
                if let Some(current) = records.get_mut(&key) {
                    current.fetched_at = current.fetched_at.max(record.fetched_at);
                }
            }
            UpsertOutcome::Stale => {}
        }
        Ok(outcome)
    }

    async fn count_by_category(&self) -> Result<Vec<(Category, i64)>, DbError> {
        let mut counts: BTreeMap<Category, i64> = BTreeMap::new();
        for record in self.records.read().await.values() {
            *counts.entry(record.category).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_by_year(&self) -> Result<Vec<(i32, i64)>, DbError> {
        let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
        for record in self.records.read().await.values() {
            *counts.entry(record.year).or_default() += 1;
        }
        Ok(counts.into_iter().rev().collect())
    }

    async fn source_breakdown(&self) -> Result<Vec<SourceStats>, DbError> {
        type Tally = (i64, Option<DateTime<Utc>>, BTreeSet<Category>);
        let mut by_source: HashMap<SourceOrganization, Tally> = HashMap::new();
        for record in self.records.read().await.values() {
            let entry = by_source.entry(record.source).or_default();
            entry.0 += 1;
            entry.1 = entry.1.max(Some(record.last_updated));
            entry.2.insert(record.category);
        }

        let mut stats: Vec<SourceStats> = by_source
            .into_iter()
            .map(|(source, (count, latest_update, categories))| SourceStats {
                source,
                count,
                latest_update,
                categories: categories.into_iter().collect(),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.source.as_str().cmp(b.source.as_str()))
        });
        Ok(stats)
    }
}

#[async_trait]
impl AlertSink for MemoryStore {
    async fn create(&self, alert: NewAlert) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        self.alerts.write().await.push(Alert::from_new(alert, id, Utc::now()));
        Ok(id)
    }

    async fn acknowledge(
        &self,
        id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Alert, DbError> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts.iter_mut().find(|a| a.id == id).ok_or(DbError::NotFound)?;
        alert.acknowledge(actor, at);
        Ok(alert.clone())
    }

    async fn list(&self, is_active: Option<bool>) -> Result<Vec<Alert>, DbError> {
        let alerts = self.alerts.read().await;
        // Insertion order is creation order, so reversing gives newest first.
        Ok(alerts
            .iter()
            .rev()
            .filter(|a| is_active.is_none_or(|active| a.is_active == active))
            .cloned()
            .collect())
    }
}
