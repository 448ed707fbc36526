//! Row filters applied between enrichment and link verification.

use std::collections::BTreeMap;

use arrow::array::{Array, BooleanArray};
use arrow::compute::{concat_batches, filter_record_batch};
use arrow::record_batch::RecordBatch;
use paperlink_core::CatalogError;
use paperlink_core::columns;
use paperlink_core::schema::cells::{cell_i32, cell_str};
use tracing::info;

use crate::StoreError;

/// Result of [`filter_english`].
pub struct LanguageFilter {
    /// Rows that have an English version.
    pub kept: RecordBatch,
    pub total: usize,
    /// Rows without an English version, per (year, type). Rows missing
    /// either key are counted only in the totals.
    pub missing_by_year_type: BTreeMap<(i32, String), u64>,
}

impl LanguageFilter {
    pub fn kept_count(&self) -> usize {
        self.kept.num_rows()
    }

    pub fn dropped_count(&self) -> usize {
        self.total - self.kept.num_rows()
    }
}

/// Keep only rows whose `E` (English availability) column is non-empty.
pub fn filter_english(batches: &[RecordBatch]) -> Result<LanguageFilter, StoreError> {
    let first = batches.first().ok_or(StoreError::NoBatches)?;
    let table = concat_batches(&first.schema(), batches)?;

    let english = table
        .column_by_name(columns::ENGLISH)
        .ok_or_else(|| CatalogError::MissingColumn(columns::ENGLISH.to_string()))?;
    let year_col = table.column_by_name(columns::YEAR);
    let type_col = table.column_by_name(columns::TYPE);

    let mask: BooleanArray = (0..table.num_rows())
        .map(|row| Some(has_value(english.as_ref(), row)))
        .collect();

    let mut missing_by_year_type = BTreeMap::new();
    for row in (0..table.num_rows()).filter(|&row| !mask.value(row)) {
        let year = year_col.and_then(|c| cell_i32(c.as_ref(), row));
        let doc_type = type_col.and_then(|c| cell_str(c.as_ref(), row));
        if let (Some(year), Some(doc_type)) = (year, doc_type) {
            *missing_by_year_type
                .entry((year, doc_type.to_string()))
                .or_insert(0) += 1;
        }
    }

    let kept = filter_record_batch(&table, &mask)?;
    info!(
        total = table.num_rows(),
        english = kept.num_rows(),
        "filtered to English documents"
    );
    Ok(LanguageFilter {
        kept,
        total: table.num_rows(),
        missing_by_year_type,
    })
}

/// Non-null and, for string columns, non-empty.
fn has_value(col: &dyn Array, row: usize) -> bool {
    if col.is_null(row) {
        return false;
    }
    match col.data_type() {
        arrow::datatypes::DataType::Utf8 | arrow::datatypes::DataType::LargeUtf8 => {
            cell_str(col, row).is_some()
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int32Array, StringArray};
    use std::sync::Arc;

    fn table() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            (
                "E",
                Arc::new(StringArray::from(vec![Some("x"), None, Some(""), Some("x")])) as ArrayRef,
            ),
            (
                "Year",
                Arc::new(Int32Array::from(vec![Some(2006), Some(2006), Some(2002), None])) as ArrayRef,
            ),
            (
                "Type",
                Arc::new(StringArray::from(vec![Some("WP"), Some("WP"), Some("IP"), Some("IP")])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_english_rows() {
        let out = filter_english(&[table()]).unwrap();
        assert_eq!(out.total, 4);
        assert_eq!(out.kept_count(), 2);
        assert_eq!(out.dropped_count(), 2);
    }

    #[test]
    fn counts_missing_by_year_type() {
        let out = filter_english(&[table()]).unwrap();
        assert_eq!(out.missing_by_year_type.len(), 2);
        assert_eq!(out.missing_by_year_type[&(2006, "WP".to_string())], 1);
        assert_eq!(out.missing_by_year_type[&(2002, "IP".to_string())], 1);
    }

    #[test]
    fn requires_language_column() {
        let batch = RecordBatch::try_from_iter(vec![(
            "Title",
            Arc::new(StringArray::from(vec!["a"])) as ArrayRef,
        )])
        .unwrap();
        assert!(matches!(
            filter_english(&[batch]),
            Err(StoreError::Catalog(CatalogError::MissingColumn(_)))
        ));
    }
}
