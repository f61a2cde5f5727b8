use configuration::AlertThresholds;
use core_types::{AlertCategory, AlertSeverity, IndicatorRecord, NewAlert, TriggerData};
use database::AlertSink;
use uuid::Uuid;

pub mod error;

pub use error::AlerterError;

/// Evaluates freshly reconciled records against the per-family alert cutoffs.
///
/// Holds nothing but immutable thresholds; built once at startup and shared.
#[derive(Debug, Clone)]
pub struct ThresholdAlerter {
    thresholds: AlertThresholds,
}

impl ThresholdAlerter {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    /// Returns the alert a record raises, if any.
    ///
    /// Records without a family, without a configured cutoff or without a value never
    /// alert. GDP growth breaches at or below its cutoff, the other families at or above.
    pub fn evaluate(&self, record: &IndicatorRecord) -> Option<NewAlert> {
        let family = record.family?;
        let threshold = self.thresholds.cutoff(family)?;
        let value = record.value?;

        if !family.polarity().breaches(value, threshold) {
            return None;
        }

        Some(NewAlert {
            title: format!("Threshold Alert: {}", record.indicator_name),
            message: format!(
                "{} {} = {}{}, exceeded threshold of {}{}",
                record.country_code,
                record.indicator_name,
                value.normalize(),
                record.unit,
                threshold.normalize(),
                record.unit
            ),
            severity: AlertSeverity::High,
            category: AlertCategory::Economic,
            country_code: Some(record.country_code.clone()),
            trigger_data: Some(TriggerData {
                indicator_code: record.indicator_code.clone(),
                threshold,
                actual_value: value,
            }),
        })
    }

    /// Evaluates `record` and persists the resulting alert. No deduplication is done
    /// against alerts raised earlier for the same key.
    pub async fn raise(
        &self,
        sink: &dyn AlertSink,
        record: &IndicatorRecord,
    ) -> Result<Option<Uuid>, AlerterError> {
        let Some(alert) = self.evaluate(record) else {
            return Ok(None);
        };
        let id = sink.create(alert).await?;
        tracing::info!(
            alert_id = %id,
            country = %record.country_code,
            indicator = %record.indicator_code,
            year = record.year,
            "Threshold alert raised."
        );
        Ok(Some(id))
    }
}
