//! Error types for Concilia
//!
//! Pipeline failure modes (model unavailable, unparseable output, supplier
//! not found) are NOT errors: they become `RunOutcome` variants so callers
//! handle every exit path exhaustively. `Error` covers only transport,
//! serialization and IO faults.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
