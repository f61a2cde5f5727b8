use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fetch outcome of one indicator code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSyncResult {
    pub indicator_code: String,
    pub success: bool,
    pub records_fetched: usize,
    /// The failure was network-level, so the next run will likely succeed.
    pub transient: bool,
    pub error: Option<String>,
}

/// Summary of one source adapter within a sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSyncResult {
    pub source: String,
    /// `true` when every indicator was fetched and the batch was reconciled.
    pub success: bool,
    pub records_fetched: usize,
    pub written: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub alerts_raised: usize,
    pub alert_failures: usize,
    pub indicators: Vec<IndicatorSyncResult>,
    pub error: Option<String>,
}

impl SourceSyncResult {
    pub(crate) fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            success: true,
            records_fetched: 0,
            written: 0,
            unchanged: 0,
            skipped: 0,
            alerts_raised: 0,
            alert_failures: 0,
            indicators: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.success = false;
        self.error = Some(match self.error.take() {
            Some(previous) => format!("{previous}; {error}"),
            None => error,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceSyncResult>,
}

impl SyncReport {
    pub fn all_succeeded(&self) -> bool {
        self.sources.iter().all(|s| s.success)
    }

    pub fn total_written(&self) -> usize {
        self.sources.iter().map(|s| s.written).sum()
    }

    pub fn total_alerts(&self) -> usize {
        self.sources.iter().map(|s| s.alerts_raised).sum()
    }
}
