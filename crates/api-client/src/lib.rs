use async_trait::async_trait;
use core_types::{Category, IndicatorFamily, RawObservation, SourceOrganization};
use std::time::Duration;

pub mod error;
pub mod imf;
pub mod responses;
pub mod throttle;
pub mod world_bank;

// --- Public API ---
pub use error::ApiError;
pub use imf::ImfClient;
pub use throttle::Throttle;
pub use world_bank::WorldBankClient;

/// The generic, abstract interface for an upstream statistical agency.
/// The sync scheduler only talks to this trait, so adapters can be swapped
/// for hand-written mocks in tests.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn organization(&self) -> SourceOrganization;

    /// Human-readable adapter name used in logs and sync reports.
    fn name(&self) -> &'static str {
        self.organization().as_str()
    }

    /// The key indicators this adapter fetches on each sync run.
    fn indicator_codes(&self) -> &[String];

    /// Minimum spacing between two requests to this agency.
    fn min_request_interval(&self) -> Duration;

    fn indicator_name(&self, indicator_code: &str) -> String;

    fn unit(&self, indicator_code: &str) -> String;

    fn category(&self, indicator_code: &str) -> Category;

    /// The canonical family of a code, if it feeds alerting or risk scoring.
    fn family(&self, indicator_code: &str) -> Option<IndicatorFamily>;

    /// Fetches every available year of `indicator_code` for `countries`.
    /// An empty country slice means "all countries" where the agency supports it.
    ///
    /// Every HTTP request, including each page of a paginated response, must first
    /// take a permit from `throttle`.
    async fn fetch_indicator_data(
        &self,
        indicator_code: &str,
        countries: &[String],
        throttle: &Throttle,
    ) -> Result<Vec<RawObservation>, ApiError>;
}
