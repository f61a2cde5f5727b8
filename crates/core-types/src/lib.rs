pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{
    AlertCategory, AlertSeverity, Category, Confidence, IndicatorFamily, Polarity,
    SourceOrganization,
};
pub use error::CoreError;
pub use structs::{
    max_year, Alert, IndicatorKey, IndicatorRecord, NewAlert, RawObservation, TriggerData,
    MIN_YEAR,
};
