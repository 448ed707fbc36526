//! Storage layer: CSV and Parquet table files, plus catalog row filters.

mod error;
pub use error::StoreError;

pub mod filter;
pub mod table;

pub use filter::{LanguageFilter, filter_english};
pub use table::{TableFormat, read_table, write_table};
