use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("input table is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("input table has no batches")]
    NoBatches,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
