use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported table format: {0} (expected .csv or .parquet; export spreadsheets to CSV first)")]
    UnsupportedFormat(PathBuf),

    #[error("table has no rows to write")]
    NoBatches,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Catalog(#[from] paperlink_core::CatalogError),
}
