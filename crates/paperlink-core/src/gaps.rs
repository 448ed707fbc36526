//! Document numbering gap analysis.
//!
//! Within a meeting year, each document type is numbered sequentially. A
//! number inside the observed `[min, max]` range that never appears in the
//! catalog is a gap: a document that was withdrawn, or one the catalog
//! failed to capture.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray, UInt32Array, UInt64Array};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::identity::search_doc_number;
use crate::record::CatalogRecord;
use crate::schema::catalog::{gap_report_schema, year_type_count_schema};
use crate::schema::cells::{cell_i32, cell_str};
use crate::schema::columns;

/// Exported `Missing_Numbers` text is cut at this many characters.
pub const MISSING_TEXT_LIMIT: usize = 100;

/// Widest `[min, max]` range enumerated for one group. Meetings number their
/// papers in the hundreds; a wider range comes from a mistyped code.
pub const MAX_GAP_SPAN: u32 = 10_000;

/// One logical document, independent of how many extension variants exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    pub year: i32,
    pub doc_type: String,
    pub number: u32,
}

impl DocumentKey {
    /// Key for an enriched record; `None` without a year or parsed code.
    pub fn from_record(record: &CatalogRecord) -> Option<Self> {
        let identity = record.identity.as_ref()?;
        Some(Self {
            year: record.year?,
            doc_type: identity.doc_type.clone(),
            number: identity.number,
        })
    }
}

/// Keys for every record that has a year and a parsed document code.
pub fn keys_from_records(records: &[CatalogRecord]) -> Vec<DocumentKey> {
    records.iter().filter_map(DocumentKey::from_record).collect()
}

/// Keys from a previously exported enriched table.
///
/// Reads `Year`, `Type` and the number part of `No.`; rows missing any of
/// them are skipped.
pub fn keys_from_batches(batches: &[RecordBatch]) -> Result<Vec<DocumentKey>, CatalogError> {
    let mut keys = Vec::new();
    for batch in batches {
        let required = |name: &str| {
            batch
                .column_by_name(name)
                .ok_or_else(|| CatalogError::MissingColumn(name.to_string()))
        };
        let year_col = required(columns::YEAR)?;
        let type_col = required(columns::TYPE)?;
        let code_col = required(columns::DOC_CODE)?;

        for row in 0..batch.num_rows() {
            let year = cell_i32(year_col.as_ref(), row);
            let doc_type = cell_str(type_col.as_ref(), row);
            let number = cell_str(code_col.as_ref(), row).and_then(search_doc_number);
            if let (Some(year), Some(doc_type), Some(number)) = (year, doc_type, number) {
                keys.push(DocumentKey {
                    year,
                    doc_type: doc_type.to_string(),
                    number,
                });
            }
        }
    }
    Ok(keys)
}

/// Numbering gaps for one (year, type) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub year: i32,
    pub doc_type: String,
    pub min_number: u32,
    pub max_number: u32,
    /// Size of the inclusive `[min, max]` range.
    pub expected_count: u64,
    /// Distinct numbers observed.
    pub actual_count: u64,
    /// Full ascending list of absent numbers.
    pub missing_numbers: Vec<u32>,
}

impl GapReport {
    pub fn missing_count(&self) -> u64 {
        self.missing_numbers.len() as u64
    }

    pub fn gap_percentage(&self) -> f64 {
        if self.expected_count == 0 {
            return 0.0;
        }
        self.missing_count() as f64 / self.expected_count as f64 * 100.0
    }

    /// Missing numbers as `[3, 5, 6]`, cut to [`MISSING_TEXT_LIMIT`]
    /// characters with a trailing `...` when longer.
    pub fn missing_numbers_text(&self) -> String {
        let items: Vec<String> = self.missing_numbers.iter().map(u32::to_string).collect();
        let text = format!("[{}]", items.join(", "));
        if text.len() > MISSING_TEXT_LIMIT {
            format!("{}...", &text[..MISSING_TEXT_LIMIT])
        } else {
            text
        }
    }
}

/// Compute gap reports, one per (year, type) group with at least two
/// distinct numbers. Output is ordered by year, then type.
///
/// Groups spanning more than [`MAX_GAP_SPAN`] numbers are skipped with a
/// warning.
pub fn analyze_gaps<'a, I>(keys: I) -> Vec<GapReport>
where
    I: IntoIterator<Item = &'a DocumentKey>,
{
    let mut groups: BTreeMap<(i32, &str), BTreeSet<u32>> = BTreeMap::new();
    for key in keys {
        groups
            .entry((key.year, key.doc_type.as_str()))
            .or_default()
            .insert(key.number);
    }

    let reports: Vec<GapReport> = groups
        .into_iter()
        .filter(|(_, numbers)| numbers.len() >= 2)
        .filter_map(|((year, doc_type), numbers)| {
            let min = *numbers.first()?;
            let max = *numbers.last()?;
            if max - min > MAX_GAP_SPAN {
                warn!(year, doc_type, min, max, "numbering range too wide; skipping gap analysis");
                return None;
            }
            let missing: Vec<u32> = (min..=max).filter(|n| !numbers.contains(n)).collect();
            Some(GapReport {
                year,
                doc_type: doc_type.to_string(),
                min_number: min,
                max_number: max,
                expected_count: u64::from(max - min) + 1,
                actual_count: numbers.len() as u64,
                missing_numbers: missing,
            })
        })
        .collect();

    info!(groups = reports.len(), "numbering gap analysis complete");
    reports
}

/// Sort reports by gap percentage, highest first. Ties keep (year, type) order.
pub fn rank_by_gap(reports: &mut [GapReport]) {
    reports.sort_by(|a, b| b.gap_percentage().total_cmp(&a.gap_percentage()));
}

/// Flat export of the reports, with `Missing_Numbers` rendered as text.
pub fn gap_report_batch(reports: &[GapReport]) -> Result<RecordBatch, CatalogError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from_iter_values(reports.iter().map(|r| r.year))),
        Arc::new(StringArray::from_iter_values(reports.iter().map(|r| r.doc_type.as_str()))),
        Arc::new(UInt32Array::from_iter_values(reports.iter().map(|r| r.min_number))),
        Arc::new(UInt32Array::from_iter_values(reports.iter().map(|r| r.max_number))),
        Arc::new(UInt64Array::from_iter_values(reports.iter().map(|r| r.expected_count))),
        Arc::new(UInt64Array::from_iter_values(reports.iter().map(|r| r.actual_count))),
        Arc::new(UInt64Array::from_iter_values(reports.iter().map(GapReport::missing_count))),
        Arc::new(Float64Array::from_iter_values(reports.iter().map(GapReport::gap_percentage))),
        Arc::new(StringArray::from_iter_values(reports.iter().map(GapReport::missing_numbers_text))),
    ];
    Ok(RecordBatch::try_new(Arc::new(gap_report_schema()), columns)?)
}

/// Distinct documents per (year, type), ordered by year then type.
pub fn count_by_year_type<'a, I>(keys: I) -> BTreeMap<(i32, String), u64>
where
    I: IntoIterator<Item = &'a DocumentKey>,
{
    let unique: BTreeSet<&DocumentKey> = keys.into_iter().collect();
    let mut counts = BTreeMap::new();
    for key in unique {
        *counts.entry((key.year, key.doc_type.clone())).or_insert(0) += 1;
    }
    counts
}

/// Render (year, type) counts as a `Year, Type, Count` table.
pub fn year_type_count_batch(
    counts: &BTreeMap<(i32, String), u64>,
) -> Result<RecordBatch, CatalogError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from_iter_values(counts.keys().map(|(y, _)| *y))),
        Arc::new(StringArray::from_iter_values(counts.keys().map(|(_, t)| t.as_str()))),
        Arc::new(UInt64Array::from_iter_values(counts.values().copied())),
    ];
    Ok(RecordBatch::try_new(Arc::new(year_type_count_schema()), columns)?)
}
