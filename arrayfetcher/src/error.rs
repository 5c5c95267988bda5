use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("login rejected: {0}")]
    Login(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
