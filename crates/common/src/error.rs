//! Error types for cardlab

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A paginated fetch failed. Hierarchy resolution needs the complete
    /// collection, so this aborts the run.
    #[error("store error: {0}")]
    Store(String),

    /// Subject, book, or document selection found nothing to work with.
    #[error("setup error: {0}")]
    Setup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
