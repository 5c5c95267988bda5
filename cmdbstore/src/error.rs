use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API rejected request: code {code} - {message}")]
    Api { code: i64, message: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
