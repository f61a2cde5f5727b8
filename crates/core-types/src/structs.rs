use crate::enums::{
    AlertCategory, AlertSeverity, Category, Confidence, IndicatorFamily, SourceOrganization,
};
use crate::error::CoreError;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The earliest year an indicator record may carry.
pub const MIN_YEAR: i32 = 1960;

/// The latest year an indicator record may carry at `now` (one year of projections).
pub fn max_year(now: DateTime<Utc>) -> i32 {
    now.year() + 1
}

/// The natural key of an indicator record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorKey {
    pub country_code: String,
    pub indicator_code: String,
    pub year: i32,
}

/// A single value as delivered by a source adapter, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    pub country_code: String,
    pub indicator_code: String,
    pub indicator_name: String,
    pub year: i32,
    /// Upstream value; `None` when the agency has no data point.
    pub value: Option<f64>,
    pub unit: String,
    pub source: SourceOrganization,
    pub category: Category,
    pub family: Option<IndicatorFamily>,
    pub is_projected: bool,
    pub confidence: Confidence,
    /// When the fetch that produced this observation completed.
    pub fetched_at: DateTime<Utc>,
}

impl RawObservation {
    /// Validates the observation and converts it into a canonical record stamped with `now`.
    ///
    /// Codes are trimmed and upper-cased. A missing or non-finite value, a country code
    /// that is not three ASCII letters, an empty indicator code or a year outside
    /// `[MIN_YEAR, max_year(now)]` is rejected.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<IndicatorRecord, CoreError> {
        let value = match self.value {
            Some(v) if v.is_finite() => Decimal::from_f64(v)
                .ok_or_else(|| CoreError::InvalidInput("value".into(), v.to_string()))?
                .normalize(),
            Some(v) => return Err(CoreError::InvalidInput("value".into(), v.to_string())),
            None => return Err(CoreError::InvalidInput("value".into(), "null".into())),
        };

        let country_code = self.country_code.trim().to_ascii_uppercase();
        if country_code.len() != 3 || !country_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::InvalidInput("country_code".into(), self.country_code));
        }

        let indicator_code = self.indicator_code.trim().to_ascii_uppercase();
        if indicator_code.is_empty() {
            return Err(CoreError::InvalidInput(
                "indicator_code".into(),
                "empty indicator code".into(),
            ));
        }

        if self.year < MIN_YEAR || self.year > max_year(now) {
            return Err(CoreError::InvalidInput("year".into(), self.year.to_string()));
        }

        Ok(IndicatorRecord {
            country_code,
            indicator_code,
            indicator_name: self.indicator_name.trim().to_string(),
            year: self.year,
            value: Some(value),
            unit: self.unit.trim().to_string(),
            source: self.source,
            category: self.category,
            family: self.family,
            is_projected: self.is_projected,
            confidence: self.confidence,
            fetched_at: self.fetched_at,
            last_updated: now,
        })
    }
}

/// The canonical, reconciled value of one indicator for one country and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorRecord {
    pub country_code: String,
    pub indicator_code: String,
    pub indicator_name: String,
    pub year: i32,
    pub value: Option<Decimal>,
    pub unit: String,
    #[serde(rename = "sourceOrganization")]
    pub source: SourceOrganization,
    pub category: Category,
    pub family: Option<IndicatorFamily>,
    pub is_projected: bool,
    pub confidence: Confidence,
    pub fetched_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl IndicatorRecord {
    pub fn key(&self) -> IndicatorKey {
        IndicatorKey {
            country_code: self.country_code.clone(),
            indicator_code: self.indicator_code.clone(),
            year: self.year,
        }
    }

    /// Compares everything an upstream agency controls, ignoring the timestamps.
    pub fn same_content(&self, other: &IndicatorRecord) -> bool {
        self.country_code == other.country_code
            && self.indicator_code == other.indicator_code
            && self.year == other.year
            && self.indicator_name == other.indicator_name
            && self.value == other.value
            && self.unit == other.unit
            && self.source == other.source
            && self.category == other.category
            && self.family == other.family
            && self.is_projected == other.is_projected
            && self.confidence == other.confidence
    }
}

/// The indicator snapshot that caused a threshold alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerData {
    pub indicator_code: String,
    pub threshold: Decimal,
    pub actual_value: Decimal,
}

/// An alert that has been decided on but not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub country_code: Option<String>,
    pub trigger_data: Option<TriggerData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub country_code: Option<String>,
    pub trigger_data: Option<TriggerData>,
    pub is_active: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Materializes a fresh, active alert.
    pub fn from_new(new: NewAlert, id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            message: new.message,
            severity: new.severity,
            category: new.category,
            country_code: new.country_code,
            trigger_data: new.trigger_data,
            is_active: true,
            acknowledged_by: None,
            acknowledged_at: None,
            created_at,
        }
    }

    pub fn acknowledge(&mut self, actor: &str, at: DateTime<Utc>) {
        self.is_active = false;
        self.acknowledged_by = Some(actor.to_string());
        self.acknowledged_at = Some(at);
    }
}
