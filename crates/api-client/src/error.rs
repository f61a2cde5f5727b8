use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The upstream API returned an error: {0}")]
    Upstream(String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

impl ApiError {
    /// Network-level failures (timeouts, refused connections) rather than bad payloads.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Upstream(_) => true,
            ApiError::Deserialization(_) | ApiError::InvalidData(_) => false,
        }
    }
}
