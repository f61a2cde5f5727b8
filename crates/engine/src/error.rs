use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::ApiError),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
}
