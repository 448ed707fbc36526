use arrow::error::ArrowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("catalog has no rows")]
    Empty,

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}
