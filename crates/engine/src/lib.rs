//! The sync pipeline: source adapters feed the `Reconciler`, whose accepted records
//! are checked by the threshold alerter. `SyncScheduler` sequences the sources with
//! the rate-limit `Throttle`s and runs the whole pipeline daily or on demand.

pub mod error;
pub mod reconciler;
pub mod report;
pub mod scheduler;
pub mod status;

pub use error::EngineError;
pub use reconciler::{collapse_batch, ReconcileReport, Reconciler};
pub use report::{IndicatorSyncResult, SourceSyncResult, SyncReport};
pub use scheduler::{next_run_after, SyncScheduler};
pub use status::{data_source_status, CategoryCount, DataSourceStatus, YearCount};
pub use api_client::Throttle;
