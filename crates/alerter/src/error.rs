use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlerterError {
    #[error("Failed to persist alert: {0}")]
    Sink(#[from] DbError),
}
