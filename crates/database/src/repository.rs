use crate::error::DbError;
use crate::store::{
    decide_upsert, settle_write, AlertSink, IndicatorStore, SourceStats, UpsertOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    Alert, AlertCategory, AlertSeverity, Category, Confidence, CoreError, IndicatorFamily,
    IndicatorKey, IndicatorRecord, NewAlert, SourceOrganization, TriggerData,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::{FromRow, Row};
use std::ops::RangeInclusive;
use uuid::Uuid;

const INDICATOR_COLUMNS: &str = "country_code, indicator_code, year, indicator_name, value, unit, \
     source_organization, category, family, is_projected, confidence, fetched_at, last_updated";

const ALERT_COLUMNS: &str = "alert_id, title, message, severity, category, country_code, \
     trigger_indicator_code, trigger_threshold, trigger_actual_value, is_active, \
     acknowledged_by, acknowledged_at, created_at";

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// This struct represents a row fetched from the indicator_records table.
/// Enumerations are stored as text and parsed on the way out.
#[derive(FromRow, Debug, Clone)]
struct IndicatorRow {
    country_code: String,
    indicator_code: String,
    year: i32,
    indicator_name: String,
    value: Option<Decimal>,
    unit: String,
    source_organization: String,
    category: String,
    family: Option<String>,
    is_projected: bool,
    confidence: String,
    fetched_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl TryFrom<IndicatorRow> for IndicatorRecord {
    type Error = CoreError;

    fn try_from(row: IndicatorRow) -> Result<Self, Self::Error> {
        Ok(IndicatorRecord {
            country_code: row.country_code.trim().to_string(),
            indicator_code: row.indicator_code,
            year: row.year,
            indicator_name: row.indicator_name,
            value: row.value,
            unit: row.unit,
            source: row.source_organization.parse()?,
            category: row.category.parse()?,
            family: row.family.as_deref().map(str::parse::<IndicatorFamily>).transpose()?,
            is_projected: row.is_projected,
            confidence: row.confidence.parse::<Confidence>()?,
            fetched_at: row.fetched_at,
            last_updated: row.last_updated,
        })
    }
}

/// Represents a row from the `alerts` table with the trigger snapshot flattened.
#[derive(FromRow, Debug, Clone)]
struct AlertRow {
    alert_id: Uuid,
    title: String,
    message: String,
    severity: String,
    category: String,
    country_code: Option<String>,
    trigger_indicator_code: Option<String>,
    trigger_threshold: Option<Decimal>,
    trigger_actual_value: Option<Decimal>,
    is_active: bool,
    acknowledged_by: Option<String>,
    acknowledged_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = CoreError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let trigger_data = match (
            row.trigger_indicator_code,
            row.trigger_threshold,
            row.trigger_actual_value,
        ) {
            (Some(indicator_code), Some(threshold), Some(actual_value)) => Some(TriggerData {
                indicator_code,
                threshold,
                actual_value,
            }),
            _ => None,
        };
        Ok(Alert {
            id: row.alert_id,
            title: row.title,
            message: row.message,
            severity: row.severity.parse::<AlertSeverity>()?,
            category: row.category.parse::<AlertCategory>()?,
            country_code: row.country_code.map(|c| c.trim().to_string()),
            trigger_data,
            is_active: row.is_active,
            acknowledged_by: row.acknowledged_by,
            acknowledged_at: row.acknowledged_at,
            created_at: row.created_at,
        })
    }
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IndicatorStore for DbRepository {
    async fn find(
        &self,
        country_code: &str,
        indicator_code: Option<&str>,
        years: RangeInclusive<i32>,
    ) -> Result<Vec<IndicatorRecord>, DbError> {
        let sql = format!(
            "SELECT {INDICATOR_COLUMNS} FROM indicator_records \
             WHERE country_code = $1 AND year >= $2 AND year <= $3 \
               AND ($4::text IS NULL OR indicator_code = $4) \
             ORDER BY indicator_code ASC, year ASC"
        );
        let rows = sqlx::query_as::<_, IndicatorRow>(&sql)
            .bind(country_code)
            .bind(*years.start())
            .bind(*years.end())
            .bind(indicator_code)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| IndicatorRecord::try_from(row).map_err(DbError::from))
            .collect()
    }

    async fn find_one(&self, key: &IndicatorKey) -> Result<Option<IndicatorRecord>, DbError> {
        let sql = format!(
            "SELECT {INDICATOR_COLUMNS} FROM indicator_records \
             WHERE country_code = $1 AND indicator_code = $2 AND year = $3"
        );
        let row = sqlx::query_as::<_, IndicatorRow>(&sql)
            .bind(&key.country_code)
            .bind(&key.indicator_code)
            .bind(key.year)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(IndicatorRecord::try_from).transpose()?)
    }

    /// Applies one record inside its own transaction.
    ///
    /// The existing row is locked with `FOR UPDATE`; the insert path uses
    /// `ON CONFLICT` guarded by `fetched_at` so two first-time writers racing on
    /// the same key still converge on the later fetch.
    async fn upsert(&self, record: &IndicatorRecord) -> Result<UpsertOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {INDICATOR_COLUMNS} FROM indicator_records \
             WHERE country_code = $1 AND indicator_code = $2 AND year = $3 FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, IndicatorRow>(&select)
            .bind(&record.country_code)
            .bind(&record.indicator_code)
            .bind(record.year)
            .fetch_optional(&mut *tx)
            .await?
            .map(IndicatorRecord::try_from)
            .transpose()?;

        let mut outcome = decide_upsert(existing.as_ref(), record);
        match outcome {
            UpsertOutcome::Inserted | UpsertOutcome::Updated => {
                let written = sqlx::query(
                    r#"
                    INSERT INTO indicator_records (
                        country_code, indicator_code, year, indicator_name, value, unit,
                        source_organization, category, family, is_projected, confidence,
                        fetched_at, last_updated
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                    ON CONFLICT (country_code, indicator_code, year) DO UPDATE SET
                        indicator_name = EXCLUDED.indicator_name,
                        value = EXCLUDED.value,
                        unit = EXCLUDED.unit,
                        source_organization = EXCLUDED.source_organization,
                        category = EXCLUDED.category,
                        family = EXCLUDED.family,
                        is_projected = EXCLUDED.is_projected,
                        confidence = EXCLUDED.confidence,
                        fetched_at = EXCLUDED.fetched_at,
                        last_updated = EXCLUDED.last_updated
                    WHERE indicator_records.fetched_at <= EXCLUDED.fetched_at
                    "#,
                )
                .bind(&record.country_code)
                .bind(&record.indicator_code)
                .bind(record.year)
                .bind(&record.indicator_name)
                .bind(record.value)
                .bind(&record.unit)
                .bind(record.source.as_str())
                .bind(record.category.as_str())
                .bind(record.family.map(|f| f.key()))
                .bind(record.is_projected)
                .bind(record.confidence.as_str())
                .bind(record.fetched_at)
                .bind(record.last_updated)
                .execute(&mut *tx)
                .await?;
                // A concurrent first insert for the key is not covered by FOR UPDATE;
                // the conflict guard may then have rejected this row.
                outcome = settle_write(outcome, written.rows_affected());
            }
            UpsertOutcome::Unchanged => {
                sqlx::query(
                    r#"
                    UPDATE indicator_records SET fetched_at = GREATEST(fetched_at, $4)
                    WHERE country_code = $1 AND indicator_code = $2 AND year = $3
                    "#,
                )
                .bind(&record.country_code)
                .bind(&record.indicator_code)
                .bind(record.year)
                .bind(record.fetched_at)
                .execute(&mut *tx)
                .await?;
            }
            UpsertOutcome::Stale => {}
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn count_by_category(&self) -> Result<Vec<(Category, i64)>, DbError> {
        let rows = sqlx::query(
            "SELECT category, COUNT(*) AS count FROM indicator_records \
             GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = rows
            .into_iter()
            .map(|row| {
                let category: String = row.get("category");
                Ok((category.parse::<Category>()?, row.get::<i64, _>("count")))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        counts.sort_by_key(|(category, _)| *category);
        Ok(counts)
    }

    async fn count_by_year(&self) -> Result<Vec<(i32, i64)>, DbError> {
        let rows = sqlx::query(
            "SELECT year, COUNT(*) AS count FROM indicator_records \
             GROUP BY year ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<i32, _>("year"), row.get::<i64, _>("count")))
            .collect())
    }

    async fn source_breakdown(&self) -> Result<Vec<SourceStats>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT source_organization,
                   COUNT(*) AS count,
                   MAX(last_updated) AS latest_update,
                   ARRAY_AGG(DISTINCT category) AS categories
            FROM indicator_records
            GROUP BY source_organization
            ORDER BY count DESC, source_organization ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let stats = rows
            .into_iter()
            .map(|row| {
                let source: String = row.get("source_organization");
                let categories: Vec<String> = row.get("categories");
                let mut categories = categories
                    .iter()
                    .map(|c| c.parse::<Category>())
                    .collect::<Result<Vec<_>, _>>()?;
                categories.sort();
                Ok(SourceStats {
                    source: source.parse::<SourceOrganization>()?,
                    count: row.get("count"),
                    latest_update: row.get("latest_update"),
                    categories,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        Ok(stats)
    }
}

#[async_trait]
impl AlertSink for DbRepository {
    async fn create(&self, alert: NewAlert) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let trigger = alert.trigger_data.as_ref();
        sqlx::query(
            r#"
            INSERT INTO alerts (
                alert_id, title, message, severity, category, country_code,
                trigger_indicator_code, trigger_threshold, trigger_actual_value,
                is_active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10)
            "#,
        )
        .bind(id)
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(alert.severity.as_str())
        .bind(alert.category.as_str())
        .bind(alert.country_code.as_deref())
        .bind(trigger.map(|t| t.indicator_code.as_str()))
        .bind(trigger.map(|t| t.threshold))
        .bind(trigger.map(|t| t.actual_value))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn acknowledge(
        &self,
        id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Alert, DbError> {
        let sql = format!(
            "UPDATE alerts SET is_active = FALSE, acknowledged_by = $2, acknowledged_at = $3 \
             WHERE alert_id = $1 RETURNING {ALERT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AlertRow>(&sql)
            .bind(id)
            .bind(actor)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(Alert::try_from(row)?)
    }

    async fn list(&self, is_active: Option<bool>) -> Result<Vec<Alert>, DbError> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts \
             WHERE ($1::boolean IS NULL OR is_active = $1) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, AlertRow>(&sql)
            .bind(is_active)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| Alert::try_from(row).map_err(DbError::from))
            .collect()
    }
}
