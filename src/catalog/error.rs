use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("source read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid feed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no usable records in {0} entries")]
    NoRecords(usize),
}
