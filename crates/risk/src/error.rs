use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid country code: '{0}'")]
    InvalidCountry(String),

    #[error("Year {0} is outside the supported range {1}..={2}")]
    YearOutOfRange(i32, i32, i32),

    #[error("Failed to read indicators from the store: {0}")]
    Store(#[from] DbError),
}
