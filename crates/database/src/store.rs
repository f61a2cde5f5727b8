use crate::error::DbError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Alert, Category, IndicatorKey, IndicatorRecord, NewAlert, SourceOrganization};
use serde::Serialize;
use std::ops::RangeInclusive;
use uuid::Uuid;

/// What a single-key upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed for the key.
    Inserted,
    /// The stored record was replaced by the incoming one.
    Updated,
    /// The stored record already held the same content; nothing observable changed.
    Unchanged,
    /// The stored record came from a later fetch, so the incoming one was discarded.
    Stale,
}

/// Decides how `incoming` is applied on top of `existing`.
///
/// Last writer wins by fetch completion time. An equal-content write keeps the stored
/// `last_updated`, which is what makes replaying a batch a no-op.
pub fn decide_upsert(
    existing: Option<&IndicatorRecord>,
    incoming: &IndicatorRecord,
) -> UpsertOutcome {
    match existing {
        None => UpsertOutcome::Inserted,
        Some(current) if current.fetched_at > incoming.fetched_at => UpsertOutcome::Stale,
        Some(current) if current.same_content(incoming) => UpsertOutcome::Unchanged,
        Some(_) => UpsertOutcome::Updated,
    }
}

/// Corrects a decided write with what the guarded statement actually did: a write
/// that changed no row lost to a newer concurrent fetch.
pub fn settle_write(decided: UpsertOutcome, rows_affected: u64) -> UpsertOutcome {
    match decided {
        UpsertOutcome::Inserted | UpsertOutcome::Updated if rows_affected == 0 => {
            UpsertOutcome::Stale
        }
        other => other,
    }
}

/// Per-source aggregate used by the data source status report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    pub source: SourceOrganization,
    pub count: i64,
    pub latest_update: Option<DateTime<Utc>>,
    pub categories: Vec<Category>,
}

/// The canonical indicator store keyed by (country, indicator, year).
///
/// Every upsert must be atomic per key; the reconciliation engine relies on this
/// instead of holding locks of its own.
#[async_trait]
pub trait IndicatorStore: Send + Sync {
    /// Records for one country within `years`, optionally restricted to one indicator code.
    /// Results are ordered by indicator code, then year ascending.
    async fn find(
        &self,
        country_code: &str,
        indicator_code: Option<&str>,
        years: RangeInclusive<i32>,
    ) -> Result<Vec<IndicatorRecord>, DbError>;

    async fn find_one(&self, key: &IndicatorKey) -> Result<Option<IndicatorRecord>, DbError>;

    async fn upsert(&self, record: &IndicatorRecord) -> Result<UpsertOutcome, DbError>;

    /// Record counts per category, ordered by category.
    async fn count_by_category(&self) -> Result<Vec<(Category, i64)>, DbError>;

    /// Record counts per year, most recent year first.
    async fn count_by_year(&self) -> Result<Vec<(i32, i64)>, DbError>;

    /// Record counts per source organization, largest first.
    async fn source_breakdown(&self) -> Result<Vec<SourceStats>, DbError>;
}

/// Where threshold alerts are persisted.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn create(&self, alert: NewAlert) -> Result<Uuid, DbError>;

    /// Deactivates an alert and stamps who acknowledged it. Returns `DbError::NotFound`
    /// for an unknown id.
    async fn acknowledge(
        &self,
        id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Alert, DbError>;

    /// Alerts newest first, optionally filtered on the active flag.
    async fn list(&self, is_active: Option<bool>) -> Result<Vec<Alert>, DbError>;
}
