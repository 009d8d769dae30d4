//! Crate-wide error type. Every failure here is non-fatal to the running
//! process; the worst case is stale or missing data.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Wrong admin secret; role state is unchanged
    #[error("Invalid secret")]
    InvalidSecret,

    /// Mutation attempted while in viewer mode
    #[error("Read-only mode: unlock admin first")]
    ReadOnly,

    #[error("Internal error: {0}")]
    Internal(String),
}
