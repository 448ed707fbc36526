//! Catalog enrichment: normalization, meeting parsing and link synthesis over
//! Arrow batches.
//!
//! Records are derived from the catalog rows by pure functions; the enriched
//! table is then assembled by taking every pass-through column at each
//! record's `source_row` and appending the derived columns. Fan-out copies
//! therefore carry the full source row without any positional bookkeeping.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array, StringArray, UInt32Array};
use arrow::compute::{concat_batches, take_record_batch};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::info;

use crate::error::CatalogError;
use crate::links::{LinkTemplate, synthesize_links};
use crate::meeting::apply_meeting;
use crate::normalize::{drop_columns, merge_prefixed_columns};
use crate::record::{CatalogRecord, Ordinal};
use crate::schema::catalog::enrichment_fields;
use crate::schema::cells::cell_str;
use crate::schema::columns;

/// A repeated-column group folded into one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    pub prefix: String,
    pub target: String,
}

impl MergeGroup {
    /// Merge `name`, `name.1`, `name.2`, ... back into `name`.
    pub fn same_name(name: &str) -> Self {
        Self {
            prefix: name.to_string(),
            target: name.to_string(),
        }
    }
}

/// Settings for [`enrich_catalog`].
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub template: LinkTemplate,
    pub merge_groups: Vec<MergeGroup>,
    pub drop_columns: Vec<String>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            template: LinkTemplate::default(),
            merge_groups: vec![
                MergeGroup::same_name(columns::SUBMITTED_BY),
                MergeGroup::same_name(columns::AGENDA_ITEMS),
            ],
            drop_columns: columns::OTHER_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Counts describing one enrichment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichStats {
    pub source_rows: usize,
    pub records: usize,
    pub with_identity: usize,
    pub with_link: usize,
    pub fan_out: usize,
}

/// Enriched records plus the table they export to.
pub struct EnrichedCatalog {
    pub records: Vec<CatalogRecord>,
    pub table: RecordBatch,
    pub stats: EnrichStats,
}

/// Run normalization, meeting parsing and link synthesis over a catalog.
///
/// Requires the `Meeting` and `No.` columns; `Title` is optional. Primary
/// records keep catalog order and transition-year variants follow them.
pub fn enrich_catalog(
    batches: &[RecordBatch],
    options: &EnrichOptions,
) -> Result<EnrichedCatalog, CatalogError> {
    let first = batches.first().ok_or(CatalogError::Empty)?;
    let mut table = concat_batches(&first.schema(), batches)?;

    for group in &options.merge_groups {
        table = merge_prefixed_columns(&table, &group.prefix, &group.target)?;
    }
    let mut dropped: Vec<&str> = options.drop_columns.iter().map(String::as_str).collect();
    // Re-enriching an exported table replaces the derived columns.
    dropped.extend([
        columns::YEAR,
        columns::MEETING_NUMBER,
        columns::CEP_NUMBER,
        columns::TYPE,
        columns::DOWNLOAD_LINK,
        columns::EXTENSION,
    ]);
    let table = drop_columns(&table, &dropped)?;

    let records = build_records(&table, &options.template)?;
    let enriched = assemble_table(&table, &records)?;

    let stats = EnrichStats {
        source_rows: table.num_rows(),
        records: records.len(),
        with_identity: records.iter().filter(|r| r.identity.is_some()).count(),
        with_link: records.iter().filter(|r| r.download_link.is_some()).count(),
        fan_out: records.len() - table.num_rows(),
    };
    info!(
        rows = stats.source_rows,
        records = stats.records,
        links = stats.with_link,
        fan_out = stats.fan_out,
        "catalog enriched"
    );

    Ok(EnrichedCatalog {
        records,
        table: enriched,
        stats,
    })
}

/// Parse every row into records: primaries in row order, then fan-out variants.
fn build_records(
    table: &RecordBatch,
    template: &LinkTemplate,
) -> Result<Vec<CatalogRecord>, CatalogError> {
    let required = |name: &str| {
        table
            .column_by_name(name)
            .ok_or_else(|| CatalogError::MissingColumn(name.to_string()))
    };
    let meeting_col = required(columns::MEETING)?;
    let code_col = required(columns::DOC_CODE)?;
    let title_col = table.column_by_name(columns::TITLE);

    let mut primaries = Vec::with_capacity(table.num_rows());
    let mut variants = Vec::new();
    for row in 0..table.num_rows() {
        let record = CatalogRecord::from_row(
            row,
            cell_str(meeting_col.as_ref(), row),
            cell_str(code_col.as_ref(), row),
            title_col.and_then(|c| cell_str(c.as_ref(), row)),
        );
        let mut out = synthesize_links(apply_meeting(record), template).into_iter();
        if let Some(primary) = out.next() {
            primaries.push(primary);
        }
        variants.extend(out);
    }
    primaries.extend(variants);
    Ok(primaries)
}

fn assemble_table(
    table: &RecordBatch,
    records: &[CatalogRecord],
) -> Result<RecordBatch, CatalogError> {
    let indices = UInt32Array::from_iter_values(records.iter().map(|r| r.source_row as u32));
    let base = take_record_batch(table, &indices)?;

    let ordinal_text = |o: &Option<Ordinal>| o.as_ref().map(Ordinal::to_string);
    let derived: Vec<ArrayRef> = vec![
        Arc::new(records.iter().map(|r| r.year).collect::<Int32Array>()),
        Arc::new(
            records
                .iter()
                .map(|r| ordinal_text(&r.meeting_number))
                .collect::<StringArray>(),
        ),
        Arc::new(
            records
                .iter()
                .map(|r| ordinal_text(&r.cep_number))
                .collect::<StringArray>(),
        ),
        Arc::new(records.iter().map(|r| r.doc_type()).collect::<StringArray>()),
        Arc::new(
            records
                .iter()
                .map(|r| r.download_link.as_deref())
                .collect::<StringArray>(),
        ),
        Arc::new(
            records
                .iter()
                .map(|r| r.extension.map(|e| e.as_str()))
                .collect::<StringArray>(),
        ),
    ];

    let base_schema = base.schema();
    let mut fields: Vec<Field> = base_schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.extend(enrichment_fields());
    let mut cols: Vec<ArrayRef> = base.columns().to_vec();
    cols.extend(derived);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), cols)?)
}
